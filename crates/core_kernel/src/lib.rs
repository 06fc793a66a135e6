//! Core Kernel - Foundational types shared by the sales order gateway
//!
//! This crate provides the building blocks used across the workspace:
//! - Strongly-typed internal identifiers for platform records
//! - Port contracts and the unified `PortError` for record service adapters
//! - Health check and operation metadata types

pub mod identifiers;
pub mod ports;
pub mod error;

pub use identifiers::{InternalId, SalesOrderId, EntityId, ItemId, RecordType, IdError};
pub use ports::{
    PortError, DomainPort, AdapterHealth, HealthCheckResult, HealthCheckable,
    OperationMetadata, CircuitBreakerConfig, ExternalAuthConfig,
};
pub use error::CoreError;
