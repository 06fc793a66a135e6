//! Sales Order API - Server Binary
//!
//! This binary starts the HTTP API server in front of the NetSuite record
//! service.
//!
//! # Usage
//!
//! ```bash
//! # Run against a NetSuite account
//! API_NETSUITE_BASE_URL=https://1234567.suitetalk.api.netsuite.com \
//! API_NETSUITE_ACCESS_TOKEN=... cargo run --bin sales-order-api
//!
//! # Run against the in-memory record store
//! API_RECORD_SOURCE=mock cargo run --bin sales-order-api --features mock
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `API_RECORD_SOURCE` - `suitetalk` (default) or `mock`
//! * `API_NETSUITE_BASE_URL` - Account REST base URL
//! * `API_NETSUITE_ACCESS_TOKEN` - OAuth 2.0 access token
//! * `API_NETSUITE_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! * `API_CIRCUIT_FAILURE_THRESHOLD` - Failures before the circuit opens; 0 disables (default: 5)

use std::net::SocketAddr;
use std::sync::Arc;

use domain_sales_order::{RecordPort, SuiteTalkAdapter};
use interface_api::{
    config::{ApiConfig, RecordSource},
    create_router,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Main entry point for the API server.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded from environment
/// - The record service client cannot be constructed
/// - Server fails to bind to the configured address
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env()?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        record_source = ?config.record_source,
        "Starting Sales Order API Server"
    );

    let port = create_record_port(&config)?;

    let health = port.health_check().await;
    if health.is_operational() {
        tracing::info!(latency_ms = health.latency_ms, "Record service reachable");
    } else {
        tracing::warn!(message = ?health.message, "Record service not reachable at startup");
    }

    let app = create_router(port, config.clone());

    let addr: SocketAddr = config.server_addr().parse()?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Constructs the record service handle shared by every request.
fn create_record_port(
    config: &ApiConfig,
) -> Result<Arc<dyn RecordPort>, Box<dyn std::error::Error>> {
    match config.record_source {
        RecordSource::Suitetalk => {
            let adapter = SuiteTalkAdapter::new(config.suitetalk()?)?;
            tracing::info!(base_url = %adapter.base_url(), "Using SuiteTalk record service");
            Ok(Arc::new(adapter))
        }
        #[cfg(feature = "mock")]
        RecordSource::Mock => {
            tracing::warn!("Using in-memory record store; data is lost on shutdown");
            Ok(Arc::new(domain_sales_order::MockRecordPort::new()))
        }
        #[cfg(not(feature = "mock"))]
        RecordSource::Mock => {
            Err("API_RECORD_SOURCE=mock requires building with the `mock` feature".into())
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
