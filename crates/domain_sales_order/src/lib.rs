//! Sales Order Domain
//!
//! This crate owns everything between the HTTP layer and the hosted record
//! platform for sales orders:
//!
//! - **Record**: local dynamic-mode buffer for a platform record
//! - **Ports**: the `RecordPort` contract and its in-memory mock
//! - **Adapters**: the SuiteTalk REST implementation of the port
//! - **Service**: `SalesOrderService`, which maps read/update/create/delete
//!   onto record service calls
//!
//! # Examples
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use domain_sales_order::{SalesOrderService, NewSalesOrder};
//! use domain_sales_order::ports::mock::MockRecordPort;
//!
//! let service = SalesOrderService::new(Arc::new(MockRecordPort::new()));
//! let id = service
//!     .create(NewSalesOrder { entity, items: vec![item] }, None)
//!     .await?;
//! let order = service.read(id, None).await?;
//! ```

pub mod record;
pub mod error;
pub mod ports;
pub mod adapters;
pub mod service;

pub use record::{FieldMap, Record, RecordChange, RecordRepresentation};
pub use error::RecordError;
pub use ports::{RecordPort, RecordPortExt};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{MockRecordPort, PortCall, StoredRecord};
pub use adapters::{SuiteTalkAdapter, SuiteTalkConfig};
pub use service::{NewSalesOrder, SalesOrderEntityUpdate, SalesOrderService};
