//! Record Service Ports
//!
//! This module defines the port interface the sales order domain needs from
//! the external record platform, enabling swappable implementations
//! (SuiteTalk REST adapter, in-memory mock).
//!
//! # Architecture
//!
//! The `RecordPort` trait mirrors the platform's record API: records are
//! loaded or created into a local `Record` buffer, mutated in dynamic mode,
//! and then saved or deleted. Adapters implementing the trait:
//!
//! - **SuiteTalk Adapter**: Calls the NetSuite REST record API
//! - **Mock Adapter**: In-memory store for tests and local development
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_sales_order::ports::RecordPort;
//! use std::sync::Arc;
//!
//! // The dispatcher receives the port explicitly
//! let port: Arc<dyn RecordPort> = Arc::new(SuiteTalkAdapter::new(config)?);
//! let service = SalesOrderService::new(port);
//! ```

use async_trait::async_trait;

use core_kernel::{
    InternalId, RecordType, PortError, DomainPort, OperationMetadata, HealthCheckable,
};

use crate::record::{FieldMap, Record};

/// The port trait for record service operations
///
/// All methods are async and return `Result<T, PortError>` for consistent
/// error handling across adapter implementations. Each call is a single
/// attempt; retry policy is left to the caller.
#[async_trait]
pub trait RecordPort: DomainPort + HealthCheckable {
    /// Loads a record into a dynamic-mode buffer
    ///
    /// # Returns
    ///
    /// The record if found, or `PortError::NotFound`
    async fn load(
        &self,
        record_type: RecordType,
        id: InternalId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Record, PortError>;

    /// Creates a new, unsaved record seeded with default values
    ///
    /// Nothing is persisted until `save` is called.
    async fn create(
        &self,
        record_type: RecordType,
        defaults: FieldMap,
        metadata: Option<OperationMetadata>,
    ) -> Result<Record, PortError>;

    /// Persists a record buffer
    ///
    /// New records are inserted; loaded records are updated with the changes
    /// made since they were loaded. On success the buffer is marked saved.
    ///
    /// # Returns
    ///
    /// The internal id of the saved record
    async fn save(
        &self,
        record: &mut Record,
        metadata: Option<OperationMetadata>,
    ) -> Result<InternalId, PortError>;

    /// Deletes a record
    ///
    /// # Returns
    ///
    /// The internal id of the deleted record
    async fn delete(
        &self,
        record_type: RecordType,
        id: InternalId,
        metadata: Option<OperationMetadata>,
    ) -> Result<InternalId, PortError>;
}

/// Extension trait for RecordPort with convenience methods
#[async_trait]
pub trait RecordPortExt: RecordPort {
    /// Checks if a record exists
    async fn exists(
        &self,
        record_type: RecordType,
        id: InternalId,
        metadata: Option<OperationMetadata>,
    ) -> Result<bool, PortError> {
        match self.load(record_type, id, metadata).await {
            Ok(_) => Ok(true),
            Err(PortError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

// Blanket implementation for all RecordPort implementors
impl<T: RecordPort + ?Sized> RecordPortExt for T {}

/// Mock implementation of RecordPort for testing
///
/// Records are kept in memory and every call is logged, so tests can assert
/// on the exact sequence of operations the dispatcher performed.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::{BTreeMap, HashMap, VecDeque};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use tokio::sync::{Mutex, RwLock};
    use chrono::Utc;

    use core_kernel::{AdapterHealth, HealthCheckResult};

    use crate::record::{fields, RecordChange};

    /// Stored copy of a saved record
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct StoredRecord {
        pub fields: FieldMap,
        pub sublists: BTreeMap<String, Vec<FieldMap>>,
    }

    /// One call received by the mock port
    #[derive(Debug, Clone, PartialEq)]
    pub enum PortCall {
        Load {
            record_type: RecordType,
            id: InternalId,
        },
        Create {
            record_type: RecordType,
            defaults: FieldMap,
        },
        Save {
            record_type: RecordType,
            id: Option<InternalId>,
            changes: Vec<RecordChange>,
        },
        Delete {
            record_type: RecordType,
            id: InternalId,
        },
    }

    /// In-memory mock implementation of RecordPort
    #[derive(Debug)]
    pub struct MockRecordPort {
        records: Arc<RwLock<HashMap<(RecordType, InternalId), StoredRecord>>>,
        calls: Arc<RwLock<Vec<PortCall>>>,
        failures: Arc<Mutex<VecDeque<PortError>>>,
        next_id: AtomicU64,
    }

    impl Default for MockRecordPort {
        fn default() -> Self {
            Self {
                records: Arc::default(),
                calls: Arc::default(),
                failures: Arc::default(),
                next_id: AtomicU64::new(1),
            }
        }
    }

    impl MockRecordPort {
        /// Creates a new mock port
        pub fn new() -> Self {
            Self::default()
        }

        /// Creates a mock port that allocates ids starting at `first_id`
        pub fn starting_at(first_id: u64) -> Self {
            Self {
                next_id: AtomicU64::new(first_id.max(1)),
                ..Self::default()
            }
        }

        /// Pre-populates a record for testing
        pub async fn insert(&self, record_type: RecordType, id: InternalId, record: StoredRecord) {
            self.records.write().await.insert((record_type, id), record);
        }

        /// Returns the stored copy of a record, if any
        pub async fn stored(&self, record_type: RecordType, id: InternalId) -> Option<StoredRecord> {
            self.records.read().await.get(&(record_type, id)).cloned()
        }

        /// Returns all calls received so far
        pub async fn calls(&self) -> Vec<PortCall> {
            self.calls.read().await.clone()
        }

        /// Makes the next port call fail with the given error
        pub async fn fail_next(&self, error: PortError) {
            self.failures.lock().await.push_back(error);
        }

        async fn record_call(&self, call: PortCall) -> Result<(), PortError> {
            self.calls.write().await.push(call);
            match self.failures.lock().await.pop_front() {
                Some(error) => Err(error),
                None => Ok(()),
            }
        }

        fn allocate_id(&self) -> Result<InternalId, PortError> {
            let next = self.next_id.fetch_add(1, Ordering::Relaxed);
            InternalId::new(next).map_err(|e| PortError::internal(e.to_string()))
        }
    }

    fn validate_mandatory(record: &Record) -> Result<(), PortError> {
        match record.record_type() {
            RecordType::SalesOrder => {
                let has_entity = record
                    .get_value(fields::ENTITY)
                    .is_some_and(|v| !v.is_null());
                if !has_entity {
                    return Err(PortError::validation_field(
                        "Please enter value(s) for: Customer",
                        fields::ENTITY,
                    ));
                }
            }
        }
        Ok(())
    }

    impl DomainPort for MockRecordPort {}

    #[async_trait]
    impl HealthCheckable for MockRecordPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "mock-record-port".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("Mock adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl RecordPort for MockRecordPort {
        async fn load(
            &self,
            record_type: RecordType,
            id: InternalId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Record, PortError> {
            self.record_call(PortCall::Load { record_type, id }).await?;
            let stored = self
                .records
                .read()
                .await
                .get(&(record_type, id))
                .cloned()
                .ok_or_else(|| PortError::not_found(record_type.script_id(), id))?;
            Ok(Record::loaded(record_type, id, stored.fields, stored.sublists))
        }

        async fn create(
            &self,
            record_type: RecordType,
            defaults: FieldMap,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Record, PortError> {
            self.record_call(PortCall::Create {
                record_type,
                defaults: defaults.clone(),
            })
            .await?;
            Ok(Record::new(record_type, defaults))
        }

        async fn save(
            &self,
            record: &mut Record,
            _metadata: Option<OperationMetadata>,
        ) -> Result<InternalId, PortError> {
            self.record_call(PortCall::Save {
                record_type: record.record_type(),
                id: record.id(),
                changes: record.changes().to_vec(),
            })
            .await?;
            record.ensure_no_pending_line()?;
            validate_mandatory(record)?;

            let record_type = record.record_type();
            let mut records = self.records.write().await;
            let id = match record.id() {
                Some(id) => {
                    if !records.contains_key(&(record_type, id)) {
                        return Err(PortError::not_found(record_type.script_id(), id));
                    }
                    id
                }
                None => self.allocate_id()?,
            };
            records.insert(
                (record_type, id),
                StoredRecord {
                    fields: record.fields().clone(),
                    sublists: record.sublists().clone(),
                },
            );
            record.mark_saved(id);
            Ok(id)
        }

        async fn delete(
            &self,
            record_type: RecordType,
            id: InternalId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<InternalId, PortError> {
            self.record_call(PortCall::Delete { record_type, id }).await?;
            self.records
                .write()
                .await
                .remove(&(record_type, id))
                .map(|_| id)
                .ok_or_else(|| PortError::not_found(record_type.script_id(), id))
        }
    }
}
