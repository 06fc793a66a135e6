//! Sales order request dispatcher
//!
//! `SalesOrderService` translates the four HTTP verbs into record service
//! calls. Each operation performs at most one load or create, a handful of
//! field mutations, and one save or delete. Failures are returned unchanged
//! as `PortError` so the HTTP layer can decide how to render them; nothing is
//! retried here.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, instrument};

use core_kernel::{
    EntityId, HealthCheckResult, InternalId, ItemId, OperationMetadata, PortError, RecordType,
    SalesOrderId,
};

use crate::ports::RecordPort;
use crate::record::{fields, FieldMap, RecordRepresentation};

/// Input for creating a sales order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSalesOrder {
    /// Customer the order is placed for
    pub entity: EntityId,
    /// Items to add, one line per entry, in order
    pub items: Vec<ItemId>,
}

/// Input for re-assigning a sales order to another customer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalesOrderEntityUpdate {
    pub sales_order_id: SalesOrderId,
    pub entity: EntityId,
}

/// Dispatches sales order operations to the record service
#[derive(Clone)]
pub struct SalesOrderService {
    port: Arc<dyn RecordPort>,
}

impl SalesOrderService {
    /// Creates a dispatcher bound to an explicit record service handle
    pub fn new(port: Arc<dyn RecordPort>) -> Self {
        Self { port }
    }

    /// Loads a sales order and returns its representation
    #[instrument(skip(self, metadata), fields(sales_order_id = %id))]
    pub async fn read(
        &self,
        id: SalesOrderId,
        metadata: Option<OperationMetadata>,
    ) -> Result<RecordRepresentation, PortError> {
        let record = self
            .port
            .load(RecordType::SalesOrder, id.into(), metadata)
            .await?;

        debug!(record = ?record.representation(), "Record retrieved");
        Ok(record.representation())
    }

    /// Points an existing sales order at a different customer
    ///
    /// Only the `entity` field is written.
    #[instrument(skip(self, metadata), fields(sales_order_id = %update.sales_order_id))]
    pub async fn update(
        &self,
        update: SalesOrderEntityUpdate,
        metadata: Option<OperationMetadata>,
    ) -> Result<SalesOrderId, PortError> {
        debug!(?update, "Request body");

        let mut record = self
            .port
            .load(RecordType::SalesOrder, update.sales_order_id.into(), metadata.clone())
            .await?;
        record.set_value(fields::ENTITY, json!(update.entity.value()))?;

        let updated_id: SalesOrderId = self.port.save(&mut record, metadata).await?.into();
        debug!(%updated_id, "Sales order updated");
        Ok(updated_id)
    }

    /// Creates a sales order with one item line per requested item
    ///
    /// Lines are committed in input order before the single save.
    #[instrument(skip(self, order, metadata), fields(entity = %order.entity, lines = order.items.len()))]
    pub async fn create(
        &self,
        order: NewSalesOrder,
        metadata: Option<OperationMetadata>,
    ) -> Result<SalesOrderId, PortError> {
        debug!(?order, "Request body");

        let mut defaults = FieldMap::new();
        defaults.insert(fields::ENTITY.to_string(), json!(order.entity.value()));

        let mut record = self
            .port
            .create(RecordType::SalesOrder, defaults, metadata.clone())
            .await?;

        for item in &order.items {
            record.select_new_line(fields::ITEM_SUBLIST)?;
            record.set_current_sublist_value(fields::ITEM_SUBLIST, fields::ITEM, json!(item.value()))?;
            record.commit_line(fields::ITEM_SUBLIST)?;
        }

        let sales_order_id: SalesOrderId = self.port.save(&mut record, metadata).await?.into();
        debug!(%sales_order_id, "Sales order created");
        Ok(sales_order_id)
    }

    /// Deletes a sales order, returning the id the record service deleted
    #[instrument(skip(self, metadata), fields(sales_order_id = %id))]
    pub async fn delete(
        &self,
        id: SalesOrderId,
        metadata: Option<OperationMetadata>,
    ) -> Result<SalesOrderId, PortError> {
        debug!(%id, "Sales order to delete");

        let deleted: InternalId = self
            .port
            .delete(RecordType::SalesOrder, id.into(), metadata)
            .await?;

        debug!(deleted_id = %deleted, "Sales order deleted");
        Ok(deleted.into())
    }

    /// Health of the underlying record service
    pub async fn health(&self) -> HealthCheckResult {
        self.port.health_check().await
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::ports::mock::{MockRecordPort, PortCall};
    use crate::record::RecordChange;
    use proptest::prelude::*;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    proptest! {
        #[test]
        fn create_commits_one_line_per_item_in_order(
            items in prop::collection::vec(1u64..1_000_000u64, 0..25)
        ) {
            let rt = runtime();
            let port = Arc::new(MockRecordPort::new());
            let service = SalesOrderService::new(port.clone());

            let order = NewSalesOrder {
                entity: EntityId::new(534).unwrap(),
                items: items.iter().map(|v| ItemId::new(*v).unwrap()).collect(),
            };
            let id = rt.block_on(service.create(order, None)).unwrap();

            let calls = rt.block_on(port.calls());
            prop_assert_eq!(calls.len(), 2);
            let committed = match &calls[1] {
                PortCall::Save { changes, .. } => changes
                    .iter()
                    .filter(|c| matches!(c, RecordChange::CommitLine { .. }))
                    .count(),
                other => return Err(TestCaseError::fail(format!("expected save, got {other:?}"))),
            };
            prop_assert_eq!(committed, items.len());

            let order = rt.block_on(service.read(id, None)).unwrap();
            let stored: Vec<u64> = order
                .sublists
                .get("item")
                .map(|lines| lines.iter().filter_map(|l| l["item"].as_u64()).collect())
                .unwrap_or_default();
            prop_assert_eq!(stored, items);
            prop_assert_eq!(&order.fields["entity"], &json!(534));
        }
    }
}
