//! Pre-built Test Fixtures
//!
//! Ids used throughout the suite. They mirror the shape of real platform
//! internal ids so request bodies read like production traffic.

use serde_json::json;

use core_kernel::{EntityId, InternalId, ItemId, SalesOrderId};
use domain_sales_order::{FieldMap, StoredRecord};

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    /// An existing sales order
    pub fn sales_order_id() -> SalesOrderId {
        SalesOrderId::new(23327).expect("fixture id is positive")
    }

    /// First id the seeded mock allocates for new records
    pub fn next_sales_order_id() -> u64 {
        30001
    }

    /// Customer on the existing sales order
    pub fn customer_id() -> EntityId {
        EntityId::new(534).expect("fixture id is positive")
    }

    /// A different customer for re-assignment
    pub fn other_customer_id() -> EntityId {
        EntityId::new(777).expect("fixture id is positive")
    }

    /// Items on the existing sales order, in line order
    pub fn item_ids() -> Vec<ItemId> {
        [338, 12, 99]
            .into_iter()
            .map(|id| ItemId::new(id).expect("fixture id is positive"))
            .collect()
    }

    /// A sales order id nothing is stored under
    pub fn missing_sales_order_id() -> SalesOrderId {
        SalesOrderId::new(999_999).expect("fixture id is positive")
    }
}

/// Fixture for stored record data
pub struct RecordFixtures;

impl RecordFixtures {
    /// The existing sales order as the record store holds it
    pub fn sales_order() -> StoredRecord {
        let mut fields = FieldMap::new();
        fields.insert("entity".to_string(), json!(IdFixtures::customer_id().value()));
        fields.insert("memo".to_string(), json!("Existing order"));
        fields.insert("tranId".to_string(), json!("SO-1042"));

        let lines = IdFixtures::item_ids()
            .into_iter()
            .map(|item| {
                let mut line = FieldMap::new();
                line.insert("item".to_string(), json!(item.value()));
                line
            })
            .collect();

        StoredRecord {
            fields,
            sublists: [("item".to_string(), lines)].into_iter().collect(),
        }
    }

    /// Key of the existing sales order
    pub fn sales_order_key() -> InternalId {
        IdFixtures::sales_order_id().into()
    }
}
