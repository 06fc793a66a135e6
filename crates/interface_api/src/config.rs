//! API configuration

use serde::Deserialize;

use core_kernel::{CircuitBreakerConfig, CoreError, ExternalAuthConfig};
use domain_sales_order::SuiteTalkConfig;

/// Which record service implementation the server talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    /// NetSuite SuiteTalk REST record API
    Suitetalk,
    /// In-memory record store, only available with the `mock` feature
    Mock,
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Log level
    pub log_level: String,
    /// Record service implementation
    pub record_source: RecordSource,
    /// Account base URL, e.g. `https://1234567.suitetalk.api.netsuite.com`
    pub netsuite_base_url: String,
    /// OAuth 2.0 access token for the record service
    pub netsuite_access_token: Option<String>,
    /// Per-request timeout against the record service
    pub netsuite_timeout_secs: u64,
    /// Consecutive transient failures before the circuit opens; 0 disables it
    pub circuit_failure_threshold: u32,
    pub circuit_reset_timeout_secs: u64,
    pub circuit_success_threshold: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let breaker = CircuitBreakerConfig::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            log_level: "info".to_string(),
            record_source: RecordSource::Suitetalk,
            netsuite_base_url: String::new(),
            netsuite_access_token: None,
            netsuite_timeout_secs: 30,
            circuit_failure_threshold: breaker.failure_threshold,
            circuit_reset_timeout_secs: breaker.reset_timeout_secs,
            circuit_success_threshold: breaker.success_threshold,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `API_*` environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the SuiteTalk adapter configuration
    pub fn suitetalk(&self) -> Result<SuiteTalkConfig, CoreError> {
        if self.netsuite_base_url.trim().is_empty() {
            return Err(CoreError::configuration(
                "API_NETSUITE_BASE_URL is required when the record source is suitetalk",
            ));
        }

        let auth = match &self.netsuite_access_token {
            Some(token) if !token.is_empty() => ExternalAuthConfig::BearerToken {
                token: token.clone(),
            },
            _ => ExternalAuthConfig::None,
        };

        let circuit_breaker = (self.circuit_failure_threshold > 0).then(|| CircuitBreakerConfig {
            failure_threshold: self.circuit_failure_threshold,
            reset_timeout_secs: self.circuit_reset_timeout_secs,
            success_threshold: self.circuit_success_threshold,
        });

        Ok(SuiteTalkConfig {
            base_url: self.netsuite_base_url.clone(),
            auth,
            timeout_secs: self.netsuite_timeout_secs,
            circuit_breaker,
        })
    }
}
