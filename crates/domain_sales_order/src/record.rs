//! Dynamic-mode record buffer
//!
//! A `Record` is the local, request-scoped copy of a platform record. It is
//! produced by `RecordPort::load` or `RecordPort::create` and handed back to
//! `RecordPort::save` once mutated. Mutations follow the platform's dynamic
//! mode: body fields are set directly, while sublist lines are built by
//! selecting a new line, setting values on it, and committing it.
//!
//! Every mutation is appended to a journal so adapters can send only what
//! changed and tests can observe the exact call order.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use core_kernel::{InternalId, RecordType};

use crate::error::RecordError;

/// Field values keyed by field id
pub type FieldMap = Map<String, Value>;

/// Field ids the record buffer refuses to overwrite
const READ_ONLY_FIELDS: &[&str] = &["id"];

/// Well-known field and sublist ids for sales orders
pub mod fields {
    /// Customer the order is placed for
    pub const ENTITY: &str = "entity";
    /// Item sublist id
    pub const ITEM_SUBLIST: &str = "item";
    /// Item reference on an item sublist line
    pub const ITEM: &str = "item";
}

/// A single mutation applied to a record buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RecordChange {
    SetValue {
        field_id: String,
        value: Value,
    },
    SelectNewLine {
        sublist_id: String,
    },
    SetCurrentSublistValue {
        sublist_id: String,
        field_id: String,
        value: Value,
    },
    CommitLine {
        sublist_id: String,
        line: usize,
    },
}

/// Local buffer for one platform record
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: Option<InternalId>,
    record_type: RecordType,
    fields: FieldMap,
    sublists: BTreeMap<String, Vec<FieldMap>>,
    current_lines: BTreeMap<String, FieldMap>,
    changes: Vec<RecordChange>,
    changed_fields: BTreeSet<String>,
    changed_sublists: BTreeSet<String>,
}

impl Record {
    /// Creates an unsaved record seeded with default values
    ///
    /// Defaults are not journaled; they are part of the initial state the
    /// record service is asked to create.
    pub fn new(record_type: RecordType, defaults: FieldMap) -> Self {
        Self {
            id: None,
            record_type,
            fields: defaults,
            sublists: BTreeMap::new(),
            current_lines: BTreeMap::new(),
            changes: Vec::new(),
            changed_fields: BTreeSet::new(),
            changed_sublists: BTreeSet::new(),
        }
    }

    /// Rebuilds a record from data returned by the record service
    pub fn loaded(
        record_type: RecordType,
        id: InternalId,
        fields: FieldMap,
        sublists: BTreeMap<String, Vec<FieldMap>>,
    ) -> Self {
        Self {
            id: Some(id),
            sublists,
            ..Self::new(record_type, fields)
        }
    }

    pub fn id(&self) -> Option<InternalId> {
        self.id
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    /// True until the record has been saved once
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn sublists(&self) -> &BTreeMap<String, Vec<FieldMap>> {
        &self.sublists
    }

    /// Returns a body field value
    pub fn get_value(&self, field_id: &str) -> Option<&Value> {
        self.fields.get(field_id)
    }

    /// Sets a body field value
    pub fn set_value(&mut self, field_id: &str, value: Value) -> Result<(), RecordError> {
        if READ_ONLY_FIELDS.contains(&field_id) {
            return Err(RecordError::ReadOnlyField(field_id.to_string()));
        }
        self.fields.insert(field_id.to_string(), value.clone());
        self.changed_fields.insert(field_id.to_string());
        self.changes.push(RecordChange::SetValue {
            field_id: field_id.to_string(),
            value,
        });
        Ok(())
    }

    /// Opens a new, empty line on a sublist
    pub fn select_new_line(&mut self, sublist_id: &str) -> Result<(), RecordError> {
        if self.current_lines.contains_key(sublist_id) {
            return Err(RecordError::LineAlreadySelected(sublist_id.to_string()));
        }
        self.current_lines.insert(sublist_id.to_string(), FieldMap::new());
        self.changes.push(RecordChange::SelectNewLine {
            sublist_id: sublist_id.to_string(),
        });
        Ok(())
    }

    /// Sets a value on the currently selected line of a sublist
    pub fn set_current_sublist_value(
        &mut self,
        sublist_id: &str,
        field_id: &str,
        value: Value,
    ) -> Result<(), RecordError> {
        let line = self
            .current_lines
            .get_mut(sublist_id)
            .ok_or_else(|| RecordError::NoCurrentLine(sublist_id.to_string()))?;
        line.insert(field_id.to_string(), value.clone());
        self.changes.push(RecordChange::SetCurrentSublistValue {
            sublist_id: sublist_id.to_string(),
            field_id: field_id.to_string(),
            value,
        });
        Ok(())
    }

    /// Appends the selected line to its sublist, returning the line index
    pub fn commit_line(&mut self, sublist_id: &str) -> Result<usize, RecordError> {
        let line = self
            .current_lines
            .remove(sublist_id)
            .ok_or_else(|| RecordError::NoCurrentLine(sublist_id.to_string()))?;
        let lines = self.sublists.entry(sublist_id.to_string()).or_default();
        lines.push(line);
        let index = lines.len() - 1;
        self.changed_sublists.insert(sublist_id.to_string());
        self.changes.push(RecordChange::CommitLine {
            sublist_id: sublist_id.to_string(),
            line: index,
        });
        Ok(index)
    }

    /// Number of committed lines on a sublist
    pub fn line_count(&self, sublist_id: &str) -> usize {
        self.sublists.get(sublist_id).map_or(0, Vec::len)
    }

    /// Committed lines on a sublist, in order
    pub fn lines(&self, sublist_id: &str) -> &[FieldMap] {
        self.sublists.get(sublist_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns a value from a committed line
    pub fn get_sublist_value(&self, sublist_id: &str, field_id: &str, line: usize) -> Option<&Value> {
        self.lines(sublist_id).get(line)?.get(field_id)
    }

    /// Mutations applied since the record was loaded, created, or last saved
    pub fn changes(&self) -> &[RecordChange] {
        &self.changes
    }

    /// Body fields set since the record was loaded or last saved
    pub fn changed_fields(&self) -> impl Iterator<Item = &str> {
        self.changed_fields.iter().map(String::as_str)
    }

    /// Sublists with newly committed lines
    pub fn changed_sublists(&self) -> impl Iterator<Item = &str> {
        self.changed_sublists.iter().map(String::as_str)
    }

    /// Fails if any sublist still has a selected, uncommitted line
    pub fn ensure_no_pending_line(&self) -> Result<(), RecordError> {
        match self.current_lines.keys().next() {
            Some(sublist_id) => Err(RecordError::PendingLine(sublist_id.clone())),
            None => Ok(()),
        }
    }

    /// Marks the buffer as persisted under the given id and clears the journal
    pub fn mark_saved(&mut self, id: InternalId) {
        self.id = Some(id);
        self.changes.clear();
        self.changed_fields.clear();
        self.changed_sublists.clear();
    }

    /// Serializable view of the record as returned to HTTP callers
    pub fn representation(&self) -> RecordRepresentation {
        RecordRepresentation {
            id: self.id,
            record_type: self.record_type,
            is_dynamic: true,
            fields: self.fields.clone(),
            sublists: self.sublists.clone(),
        }
    }
}

/// Read-only JSON view of a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRepresentation {
    pub id: Option<InternalId>,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub is_dynamic: bool,
    pub fields: FieldMap,
    pub sublists: BTreeMap<String, Vec<FieldMap>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_order() -> Record {
        let mut defaults = FieldMap::new();
        defaults.insert(fields::ENTITY.to_string(), json!(534));
        Record::new(RecordType::SalesOrder, defaults)
    }

    #[test]
    fn test_new_record_has_defaults_and_no_changes() {
        let record = new_order();
        assert!(record.is_new());
        assert_eq!(record.get_value(fields::ENTITY), Some(&json!(534)));
        assert!(record.changes().is_empty());
        assert_eq!(record.changed_fields().count(), 0);
    }

    #[test]
    fn test_line_lifecycle() {
        let mut record = new_order();
        record.select_new_line(fields::ITEM_SUBLIST).unwrap();
        record
            .set_current_sublist_value(fields::ITEM_SUBLIST, fields::ITEM, json!(338))
            .unwrap();
        assert_eq!(record.line_count(fields::ITEM_SUBLIST), 0);

        let index = record.commit_line(fields::ITEM_SUBLIST).unwrap();
        assert_eq!(index, 0);
        assert_eq!(record.line_count(fields::ITEM_SUBLIST), 1);
        assert_eq!(
            record.get_sublist_value(fields::ITEM_SUBLIST, fields::ITEM, 0),
            Some(&json!(338))
        );
        assert_eq!(record.changed_sublists().collect::<Vec<_>>(), vec!["item"]);
        assert_eq!(record.changes().len(), 3);
    }

    #[test]
    fn test_set_value_without_line_fails() {
        let mut record = new_order();
        let err = record
            .set_current_sublist_value(fields::ITEM_SUBLIST, fields::ITEM, json!(1))
            .unwrap_err();
        assert_eq!(err, RecordError::NoCurrentLine("item".to_string()));
        assert_eq!(
            record.commit_line(fields::ITEM_SUBLIST),
            Err(RecordError::NoCurrentLine("item".to_string()))
        );
    }

    #[test]
    fn test_double_select_fails() {
        let mut record = new_order();
        record.select_new_line(fields::ITEM_SUBLIST).unwrap();
        assert_eq!(
            record.select_new_line(fields::ITEM_SUBLIST),
            Err(RecordError::LineAlreadySelected("item".to_string()))
        );
        assert_eq!(
            record.ensure_no_pending_line(),
            Err(RecordError::PendingLine("item".to_string()))
        );
    }

    #[test]
    fn test_id_is_read_only() {
        let mut record = new_order();
        assert_eq!(
            record.set_value("id", json!(5)),
            Err(RecordError::ReadOnlyField("id".to_string()))
        );
    }

    #[test]
    fn test_mark_saved_clears_journal() {
        let mut record = new_order();
        record.set_value("memo", json!("rush")).unwrap();
        record.mark_saved(InternalId::new(77).unwrap());

        assert!(!record.is_new());
        assert_eq!(record.id().map(|id| id.value()), Some(77));
        assert!(record.changes().is_empty());
        assert_eq!(record.get_value("memo"), Some(&json!("rush")));
    }

    #[test]
    fn test_representation_shape() {
        let mut record = new_order();
        record.select_new_line(fields::ITEM_SUBLIST).unwrap();
        record
            .set_current_sublist_value(fields::ITEM_SUBLIST, fields::ITEM, json!(338))
            .unwrap();
        record.commit_line(fields::ITEM_SUBLIST).unwrap();
        record.mark_saved(InternalId::new(23327).unwrap());

        let json = serde_json::to_value(record.representation()).unwrap();
        assert_eq!(json["id"], json!(23327));
        assert_eq!(json["type"], json!("salesorder"));
        assert_eq!(json["isDynamic"], json!(true));
        assert_eq!(json["fields"]["entity"], json!(534));
        assert_eq!(json["sublists"]["item"][0]["item"], json!(338));
    }
}
