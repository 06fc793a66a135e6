//! Request handlers

pub mod health;
pub mod sales_order;

use axum::http::HeaderMap;

use core_kernel::OperationMetadata;

use crate::auth::Claims;

/// Builds port metadata from the request id header and the caller
pub(crate) fn operation_metadata(headers: &HeaderMap, claims: &Claims) -> OperationMetadata {
    let metadata = match headers.get("x-request-id").and_then(|h| h.to_str().ok()) {
        Some(request_id) => OperationMetadata::with_correlation_id(request_id),
        None => OperationMetadata::default(),
    };
    metadata
        .initiated_by(claims.sub.clone())
        .with_context("source", "interface_api")
}
