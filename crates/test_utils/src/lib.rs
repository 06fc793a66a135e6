//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! sales order test suite.
//!
//! # Modules
//!
//! - `fixtures`: Well-known ids and stored records
//! - `builders`: Builders for request bodies and seeded mock record ports
//! - `assertions`: Assertion helpers for response envelopes and records
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
