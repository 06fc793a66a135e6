//! HTTP API Layer
//!
//! This crate exposes sales order read, update, create and delete over a
//! single REST path using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: one handler per verb on `/api/v1/sales-orders`, plus health
//! - **Middleware**: Authentication, authorization, tracing, audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent `{ success: false, ... }` error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let port = Arc::new(SuiteTalkAdapter::new(config.suitetalk()?)?);
//! let app = create_router(port, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use domain_sales_order::{RecordPort, SalesOrderService};

use crate::config::ApiConfig;
use crate::handlers::{health, sales_order};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: SalesOrderService,
    pub config: ApiConfig,
}

/// Creates the main API router
///
/// # Arguments
///
/// * `port` - Record service the sales order handlers delegate to
/// * `config` - API configuration
pub fn create_router(port: Arc<dyn RecordPort>, config: ApiConfig) -> Router {
    let state = AppState {
        service: SalesOrderService::new(port),
        config,
    };

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Protected API routes
    let api_routes = Router::new()
        .route(
            "/sales-orders",
            get(sales_order::get_sales_order)
                .put(sales_order::update_sales_order)
                .post(sales_order::create_sales_order)
                .delete(sales_order::delete_sales_order),
        )
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(axum_middleware::from_fn(audit_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
