//! Test Data Builders
//!
//! Builders for request bodies and for mock record ports pre-seeded with
//! records, so tests only spell out what they care about.

use std::sync::Arc;

use serde_json::{json, Value};

use core_kernel::{EntityId, InternalId, ItemId, PortError, RecordType, SalesOrderId};
use domain_sales_order::{MockRecordPort, StoredRecord};

use crate::fixtures::{IdFixtures, RecordFixtures};

/// Builder for POST request bodies
#[derive(Debug, Clone)]
pub struct CreateSalesOrderBodyBuilder {
    entity: Value,
    items: Vec<Value>,
}

impl Default for CreateSalesOrderBodyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CreateSalesOrderBodyBuilder {
    /// Creates a builder for the fixture customer and items
    pub fn new() -> Self {
        Self {
            entity: json!(IdFixtures::customer_id().value()),
            items: IdFixtures::item_ids()
                .into_iter()
                .map(|item| json!(item.value()))
                .collect(),
        }
    }

    /// Sets the customer
    pub fn with_entity(mut self, entity: EntityId) -> Self {
        self.entity = json!(entity.value());
        self
    }

    /// Sets the customer to an arbitrary JSON value
    pub fn with_raw_entity(mut self, entity: Value) -> Self {
        self.entity = entity;
        self
    }

    /// Replaces the item lines
    pub fn with_items(mut self, items: &[ItemId]) -> Self {
        self.items = items.iter().map(|item| json!(item.value())).collect();
        self
    }

    /// Removes every item line
    pub fn without_items(mut self) -> Self {
        self.items.clear();
        self
    }

    /// Builds the JSON body
    pub fn build(self) -> Value {
        let items: Vec<Value> = self
            .items
            .into_iter()
            .map(|itemid| json!({ "itemid": itemid }))
            .collect();
        json!({ "entity": self.entity, "items": items })
    }
}

/// Builds a PUT request body
pub fn update_sales_order_body(sales_order_id: SalesOrderId, entity: EntityId) -> Value {
    json!({
        "sales_order_id": sales_order_id.value(),
        "entity": entity.value(),
    })
}

/// Builder for mock record ports seeded with sales orders
pub struct MockRecordPortBuilder {
    first_id: u64,
    records: Vec<(InternalId, StoredRecord)>,
    failures: Vec<PortError>,
}

impl Default for MockRecordPortBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRecordPortBuilder {
    /// Creates an empty builder that allocates ids from the fixture start
    pub fn new() -> Self {
        Self {
            first_id: IdFixtures::next_sales_order_id(),
            records: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Seeds the fixture sales order
    pub fn with_fixture_sales_order(self) -> Self {
        self.with_sales_order(RecordFixtures::sales_order_key(), RecordFixtures::sales_order())
    }

    /// Seeds a sales order under the given id
    pub fn with_sales_order(mut self, id: InternalId, record: StoredRecord) -> Self {
        self.records.push((id, record));
        self
    }

    /// Sets the first id allocated for new records
    pub fn starting_at(mut self, first_id: u64) -> Self {
        self.first_id = first_id;
        self
    }

    /// Queues a failure for the next port call
    pub fn failing_with(mut self, error: PortError) -> Self {
        self.failures.push(error);
        self
    }

    /// Builds the seeded port
    pub async fn build(self) -> Arc<MockRecordPort> {
        let port = MockRecordPort::starting_at(self.first_id);
        for (id, record) in self.records {
            port.insert(RecordType::SalesOrder, id, record).await;
        }
        for error in self.failures {
            port.fail_next(error).await;
        }
        Arc::new(port)
    }
}
