//! Record Service Adapters
//!
//! Adapter implementations of the `RecordPort` trait. The SuiteTalk adapter
//! talks to the hosted record platform; the in-memory mock lives in
//! `ports::mock` behind the `mock` feature.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_sales_order::adapters::{SuiteTalkAdapter, SuiteTalkConfig};
//! use domain_sales_order::RecordPort;
//! use std::sync::Arc;
//!
//! let adapter = SuiteTalkAdapter::new(SuiteTalkConfig {
//!     base_url: "https://1234567.suitetalk.api.netsuite.com".to_string(),
//!     ..Default::default()
//! })?;
//! let port: Arc<dyn RecordPort> = Arc::new(adapter);
//! ```

pub mod suitetalk;

pub use suitetalk::{SuiteTalkAdapter, SuiteTalkConfig};
