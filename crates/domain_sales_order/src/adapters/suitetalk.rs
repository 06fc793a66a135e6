//! SuiteTalk REST Adapter
//!
//! This module provides an adapter for the NetSuite REST record API. It
//! implements the `RecordPort` trait, translating between the local dynamic
//! record buffer and the platform's JSON record format.
//!
//! # Wire format
//!
//! | Port call         | Request                                                    |
//! |-------------------|------------------------------------------------------------|
//! | `load`            | `GET  {base}/services/rest/record/v1/{type}/{id}?expandSubResources=true` |
//! | `save` (new)      | `POST {base}/services/rest/record/v1/{type}`, id read from `Location` |
//! | `save` (loaded)   | `PATCH {base}/services/rest/record/v1/{type}/{id}` with changed fields |
//! | `delete`          | `DELETE {base}/services/rest/record/v1/{type}/{id}`       |
//!
//! `create` only builds a local buffer; nothing is sent until `save`.
//!
//! Reference fields (`entity`, `item`, ...) are kept as plain ids locally and
//! sent as `{ "id": "<n>" }` objects. Sublists travel as `{ "items": [...] }`.
//!
//! # Error Handling
//!
//! Platform errors are mapped to `PortError` variants:
//! - 400 -> `PortError::Validation`
//! - 401/403 -> `PortError::Unauthorized`
//! - 404 -> `PortError::NotFound`
//! - 409 -> `PortError::Conflict`
//! - 429 -> `PortError::RateLimited`
//! - 5xx -> `PortError::ServiceUnavailable`
//! - Timeouts -> `PortError::Timeout`
//! - Unreadable responses -> `PortError::Transformation`
//! - Other -> `PortError::Connection` / `PortError::Internal`

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{ACCEPT, LOCATION, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use url::Url;

use core_kernel::{
    AdapterHealth, CircuitBreakerConfig, DomainPort, ExternalAuthConfig, HealthCheckResult,
    HealthCheckable, InternalId, OperationMetadata, PortError, RecordType,
};

use crate::ports::RecordPort;
use crate::record::{FieldMap, Record};

const RECORD_API_PATH: &str = "services/rest/record/v1";

/// Header used to forward the caller's correlation id
const CORRELATION_HEADER: &str = "X-Request-Id";

/// Fields holding references to other records
const REFERENCE_FIELDS: &[&str] = &[
    "entity",
    "item",
    "subsidiary",
    "location",
    "department",
    "class",
    "currency",
    "terms",
    "salesRep",
];

/// Configuration for the SuiteTalk adapter
#[derive(Debug, Clone)]
pub struct SuiteTalkConfig {
    /// Account base URL (e.g., "https://1234567.suitetalk.api.netsuite.com")
    pub base_url: String,

    /// Credentials sent with every request
    pub auth: ExternalAuthConfig,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Circuit breaker configuration
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

impl Default for SuiteTalkConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth: ExternalAuthConfig::None,
            timeout_secs: 30,
            circuit_breaker: Some(CircuitBreakerConfig::default()),
        }
    }
}

/// Circuit breaker state for fault tolerance
#[derive(Debug)]
struct CircuitBreaker {
    config: CircuitBreakerConfig,
    failure_count: AtomicU64,
    success_count: AtomicU64,
    is_open: AtomicBool,
    last_failure_time: RwLock<Option<Instant>>,
}

impl CircuitBreaker {
    fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            failure_count: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            is_open: AtomicBool::new(false),
            last_failure_time: RwLock::new(None),
        }
    }

    async fn is_available(&self) -> bool {
        if !self.is_open.load(Ordering::Relaxed) {
            return true;
        }

        // Half-open once the reset timeout has elapsed
        let last_failure = self.last_failure_time.read().await;
        if let Some(time) = *last_failure {
            if time.elapsed() > Duration::from_secs(self.config.reset_timeout_secs) {
                return true;
            }
        }

        false
    }

    fn record_success(&self) {
        self.failure_count.store(0, Ordering::Relaxed);
        if !self.is_open.load(Ordering::Relaxed) {
            return;
        }
        let success = self.success_count.fetch_add(1, Ordering::Relaxed) + 1;
        if success >= self.config.success_threshold as u64 {
            self.is_open.store(false, Ordering::Relaxed);
            self.success_count.store(0, Ordering::Relaxed);
        }
    }

    async fn record_failure(&self) {
        self.success_count.store(0, Ordering::Relaxed);
        let failures = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= self.config.failure_threshold as u64 {
            self.is_open.store(true, Ordering::Relaxed);
            *self.last_failure_time.write().await = Some(Instant::now());
        }
    }
}

/// What a request was for, used to build errors
#[derive(Debug, Clone, Copy)]
struct RequestContext<'a> {
    operation: &'static str,
    record_type: RecordType,
    id: Option<InternalId>,
    metadata: Option<&'a OperationMetadata>,
}

/// Error body returned by the REST record API
#[derive(Debug, Deserialize)]
struct ErrorBody {
    title: Option<String>,
    #[serde(rename = "o:errorDetails", default)]
    error_details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    detail: Option<String>,
    #[serde(rename = "o:errorCode")]
    error_code: Option<String>,
}

impl ErrorBody {
    fn message(&self) -> Option<String> {
        self.error_details
            .iter()
            .find_map(|d| d.detail.clone())
            .or_else(|| self.title.clone())
    }

    fn code(&self) -> Option<&str> {
        self.error_details.iter().find_map(|d| d.error_code.as_deref())
    }
}

/// SuiteTalk REST adapter implementing the RecordPort trait
///
/// # Example
///
/// ```rust,ignore
/// use domain_sales_order::adapters::{SuiteTalkAdapter, SuiteTalkConfig};
///
/// let adapter = SuiteTalkAdapter::new(SuiteTalkConfig {
///     base_url: "https://1234567.suitetalk.api.netsuite.com".to_string(),
///     auth: ExternalAuthConfig::BearerToken { token },
///     ..Default::default()
/// })?;
///
/// let record = adapter.load(RecordType::SalesOrder, id, None).await?;
/// ```
#[derive(Debug)]
pub struct SuiteTalkAdapter {
    config: SuiteTalkConfig,
    base_url: Url,
    client: Client,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
}

impl SuiteTalkAdapter {
    /// Creates a new adapter with the given configuration
    ///
    /// # Errors
    ///
    /// Returns `PortError::Validation` if the base URL cannot be parsed and
    /// `PortError::Internal` if the HTTP client cannot be built.
    pub fn new(config: SuiteTalkConfig) -> Result<Self, PortError> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| {
            PortError::validation_field(format!("invalid record service URL: {e}"), "base_url")
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PortError::Internal {
                message: "failed to build HTTP client".to_string(),
                source: Some(Box::new(e)),
            })?;

        let circuit_breaker = config
            .circuit_breaker
            .clone()
            .map(|cb| Arc::new(CircuitBreaker::new(cb)));

        Ok(Self {
            config,
            base_url,
            client,
            circuit_breaker,
        })
    }

    /// Returns the base URL of the record service
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Checks if the circuit breaker is open (blocking requests)
    pub async fn is_circuit_open(&self) -> bool {
        if let Some(ref cb) = self.circuit_breaker {
            !cb.is_available().await
        } else {
            false
        }
    }

    fn api_root(&self) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), RECORD_API_PATH)
    }

    fn record_url(&self, record_type: RecordType, id: Option<InternalId>) -> String {
        match id {
            Some(id) => format!("{}/{}/{}", self.api_root(), record_type.rest_path(), id),
            None => format!("{}/{}", self.api_root(), record_type.rest_path()),
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth {
            ExternalAuthConfig::None => request,
            ExternalAuthConfig::BearerToken { token } => request.bearer_auth(token),
        }
    }

    /// Sends a request through the circuit breaker and maps failures
    async fn send(
        &self,
        request: RequestBuilder,
        context: RequestContext<'_>,
    ) -> Result<Response, PortError> {
        if let Some(ref cb) = self.circuit_breaker {
            if !cb.is_available().await {
                return Err(PortError::ServiceUnavailable {
                    service: "Circuit breaker is open".to_string(),
                });
            }
        }

        let mut request = self.authorize(request).header(ACCEPT, "application/json");
        if let Some(correlation_id) = context.metadata.and_then(|m| m.correlation_id.as_deref()) {
            request = request.header(CORRELATION_HEADER, correlation_id);
        }

        let outcome = match request.send().await {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => Err(self.error_from_response(response, &context).await),
            Err(err) => Err(self.error_from_transport(err, &context)),
        };

        if let Some(ref cb) = self.circuit_breaker {
            match &outcome {
                Err(e) if e.is_transient() => cb.record_failure().await,
                _ => cb.record_success(),
            }
        }

        if let Err(ref e) = outcome {
            warn!(operation = context.operation, error = %e, "Record service call failed");
        }
        outcome
    }

    async fn error_from_response(&self, response: Response, context: &RequestContext<'_>) -> PortError {
        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<ErrorBody>(&text).ok();
        let detail = body
            .as_ref()
            .and_then(ErrorBody::message)
            .unwrap_or_else(|| {
                if text.is_empty() {
                    status.canonical_reason().unwrap_or("unknown error").to_string()
                } else {
                    text.clone()
                }
            });

        debug!(
            status = status.as_u16(),
            code = body.as_ref().and_then(ErrorBody::code),
            %detail,
            "Record service returned an error"
        );

        match status.as_u16() {
            400 => PortError::validation(detail),
            401 | 403 => PortError::unauthorized(detail),
            404 => PortError::not_found(
                context.record_type.script_id(),
                context
                    .id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "new record".to_string()),
            ),
            409 => PortError::Conflict { message: detail },
            429 => PortError::RateLimited {
                retry_after_secs: retry_after.unwrap_or(1),
            },
            500..=599 => PortError::ServiceUnavailable {
                service: format!("record service ({status}): {detail}"),
            },
            _ => PortError::internal(format!("unexpected status {status}: {detail}")),
        }
    }

    fn error_from_transport(&self, err: reqwest::Error, context: &RequestContext<'_>) -> PortError {
        if err.is_timeout() {
            PortError::Timeout {
                operation: context.operation.to_string(),
                duration_ms: self.config.timeout_secs * 1000,
            }
        } else if err.is_decode() {
            PortError::transformation(err.to_string())
        } else {
            PortError::Connection {
                message: err.to_string(),
                source: Some(Box::new(err)),
            }
        }
    }

    /// Reads the new record id from the `Location` header
    fn id_from_location(&self, response: &Response) -> Result<InternalId, PortError> {
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| PortError::transformation("record service response has no Location header"))?;

        let url = self
            .base_url
            .join(location)
            .map_err(|e| PortError::transformation(format!("invalid Location header {location:?}: {e}")))?;

        url.path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .ok_or_else(|| PortError::transformation(format!("no record id in Location {location:?}")))?
            .parse::<InternalId>()
            .map_err(|e| PortError::transformation(format!("no record id in Location {location:?}: {e}")))
    }
}

// =============================================================================
// REST record format conversion
// =============================================================================

/// Converts a local field value into the REST representation
fn field_to_rest(field_id: &str, value: &Value) -> Value {
    if !REFERENCE_FIELDS.contains(&field_id) {
        return value.clone();
    }
    match value {
        Value::Number(n) => json!({ "id": n.to_string() }),
        Value::String(s) => json!({ "id": s }),
        other => other.clone(),
    }
}

fn line_to_rest(line: &FieldMap) -> Value {
    Value::Object(
        line.iter()
            .map(|(k, v)| (k.clone(), field_to_rest(k, v)))
            .collect(),
    )
}

fn sublist_to_rest(lines: &[FieldMap]) -> Value {
    json!({ "items": lines.iter().map(line_to_rest).collect::<Vec<_>>() })
}

/// Full body for inserting a new record
fn insert_body(record: &Record) -> Value {
    let mut body = FieldMap::new();
    for (field_id, value) in record.fields() {
        body.insert(field_id.clone(), field_to_rest(field_id, value));
    }
    for (sublist_id, lines) in record.sublists() {
        body.insert(sublist_id.clone(), sublist_to_rest(lines));
    }
    Value::Object(body)
}

/// Partial body for updating a loaded record, plus the sublists it replaces
fn update_body(record: &Record) -> (Value, Vec<String>) {
    let mut body = FieldMap::new();
    for field_id in record.changed_fields() {
        if let Some(value) = record.get_value(field_id) {
            body.insert(field_id.to_string(), field_to_rest(field_id, value));
        }
    }
    let mut replaced = Vec::new();
    for sublist_id in record.changed_sublists() {
        body.insert(sublist_id.to_string(), sublist_to_rest(record.lines(sublist_id)));
        replaced.push(sublist_id.to_string());
    }
    (Value::Object(body), replaced)
}

/// Normalizes a REST value into the local representation
///
/// Reference objects collapse to their id (as a number when numeric) and
/// `links` arrays are dropped.
fn field_from_rest(value: Value) -> Value {
    match value {
        Value::Object(mut obj) => {
            obj.remove("links");
            let is_reference = obj.contains_key("id")
                && obj.keys().all(|k| k == "id" || k == "refName");
            if is_reference {
                match obj.remove("id") {
                    Some(Value::String(s)) => s.parse::<u64>().map(Value::from).unwrap_or(Value::String(s)),
                    Some(other) => other,
                    None => Value::Null,
                }
            } else {
                Value::Object(obj.into_iter().map(|(k, v)| (k, field_from_rest(v))).collect())
            }
        }
        other => other,
    }
}

fn line_from_rest(line: Value) -> Result<FieldMap, PortError> {
    match field_from_rest(line) {
        Value::Object(map) => Ok(map),
        other => Err(PortError::transformation(format!(
            "sublist line is not an object: {other}"
        ))),
    }
}

/// Builds a record buffer from a REST record body
fn record_from_rest(record_type: RecordType, id: InternalId, body: Value) -> Result<Record, PortError> {
    let Value::Object(body) = body else {
        return Err(PortError::transformation("record body is not a JSON object"));
    };

    let mut fields = FieldMap::new();
    let mut sublists = BTreeMap::new();
    for (key, value) in body {
        if key == "links" || key == "id" {
            continue;
        }
        let items = match &value {
            Value::Object(obj) => match obj.get("items") {
                Some(Value::Array(items)) => Some(items.clone()),
                _ => None,
            },
            _ => None,
        };
        match items {
            Some(items) => {
                let lines = items
                    .into_iter()
                    .map(line_from_rest)
                    .collect::<Result<Vec<_>, _>>()?;
                sublists.insert(key, lines);
            }
            None => {
                fields.insert(key, field_from_rest(value));
            }
        }
    }

    Ok(Record::loaded(record_type, id, fields, sublists))
}

impl DomainPort for SuiteTalkAdapter {}

#[async_trait]
impl HealthCheckable for SuiteTalkAdapter {
    /// Performs a health check against the record service
    ///
    /// Fetches the metadata catalog entry for sales orders to verify
    /// connectivity and credentials.
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();

        if self.is_circuit_open().await {
            return HealthCheckResult {
                adapter_id: "suitetalk-adapter".to_string(),
                status: AdapterHealth::Degraded,
                latency_ms: 0,
                message: Some("Circuit breaker is open".to_string()),
                checked_at: Utc::now(),
            };
        }

        let request = self
            .client
            .get(format!("{}/metadata-catalog", self.api_root()))
            .query(&[("select", RecordType::SalesOrder.rest_path())]);
        let result = self
            .authorize(request)
            .header(ACCEPT, "application/json")
            .send()
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;
        let (status, message) = match result {
            Ok(response) if response.status().is_success() => (AdapterHealth::Healthy, None),
            Ok(response) => (
                AdapterHealth::Unhealthy,
                Some(format!("record service returned {}", response.status())),
            ),
            Err(err) => (AdapterHealth::Unhealthy, Some(err.to_string())),
        };

        HealthCheckResult {
            adapter_id: "suitetalk-adapter".to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl RecordPort for SuiteTalkAdapter {
    #[instrument(skip(self, metadata), fields(record_type = %record_type, id = %id))]
    async fn load(
        &self,
        record_type: RecordType,
        id: InternalId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Record, PortError> {
        let context = RequestContext {
            operation: "load",
            record_type,
            id: Some(id),
            metadata: metadata.as_ref(),
        };
        let request = self
            .client
            .get(self.record_url(record_type, Some(id)))
            .query(&[("expandSubResources", "true")]);

        let response = self.send(request, context).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| PortError::transformation(format!("unreadable record body: {e}")))?;

        debug!("Record loaded");
        record_from_rest(record_type, id, body)
    }

    #[instrument(skip(self, defaults, _metadata), fields(record_type = %record_type))]
    async fn create(
        &self,
        record_type: RecordType,
        defaults: FieldMap,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Record, PortError> {
        debug!(fields = defaults.len(), "New record buffer");
        Ok(Record::new(record_type, defaults))
    }

    #[instrument(skip(self, record, metadata), fields(record_type = %record.record_type(), id = ?record.id()))]
    async fn save(
        &self,
        record: &mut Record,
        metadata: Option<OperationMetadata>,
    ) -> Result<InternalId, PortError> {
        record.ensure_no_pending_line()?;

        let record_type = record.record_type();
        let context = RequestContext {
            operation: "save",
            record_type,
            id: record.id(),
            metadata: metadata.as_ref(),
        };

        let id = match record.id() {
            None => {
                let request = self
                    .client
                    .post(self.record_url(record_type, None))
                    .json(&insert_body(record));
                let response = self.send(request, context).await?;
                self.id_from_location(&response)?
            }
            Some(id) => {
                let (body, replaced) = update_body(record);
                let mut request = self.client.patch(self.record_url(record_type, Some(id))).json(&body);
                if !replaced.is_empty() {
                    request = request.query(&[("replace", replaced.join(","))]);
                }
                self.send(request, context).await?;
                id
            }
        };

        record.mark_saved(id);
        debug!(%id, "Record saved");
        Ok(id)
    }

    #[instrument(skip(self, metadata), fields(record_type = %record_type, id = %id))]
    async fn delete(
        &self,
        record_type: RecordType,
        id: InternalId,
        metadata: Option<OperationMetadata>,
    ) -> Result<InternalId, PortError> {
        let context = RequestContext {
            operation: "delete",
            record_type,
            id: Some(id),
            metadata: metadata.as_ref(),
        };
        self.send(self.client.delete(self.record_url(record_type, Some(id))), context)
            .await?;

        debug!("Record deleted");
        Ok(id)
    }
}
