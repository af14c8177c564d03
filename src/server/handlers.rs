//! Gateway route handlers.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{error, info, warn};

use super::response::{ApiError, SendSuccess};
use super::{AppState, SERVICE_NAME};
use crate::domain::{DeliveryReport, SendSms};

/// Fields accepted by `POST /` and `POST /test`.
///
/// Field types are not enforced at decode time so that a wrongly typed value
/// gets the same validation answer as a wrongly formatted one.
#[derive(Debug, Default, Deserialize)]
pub struct SendSmsBody {
    #[serde(default, deserialize_with = "json_text")]
    pub to: Option<String>,
    #[serde(default, deserialize_with = "json_text")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "string_only")]
    pub from: Option<String>,
}

/// Strings as-is, `null` as absent, any other value as its JSON text.
fn json_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// A sender ID that is not a string is ignored.
fn string_only<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Empty bodies count as `{}`.
fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|err| ApiError::BadRequest(format!("invalid JSON body: {err}")))
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

async fn forward(state: &AppState, request: SendSms) -> Response {
    let to = request.to().to_string();
    let has_sender = request.from().is_some();

    match state.sender.send_sms(request).await {
        Ok(data) => {
            info!(
                to = %to,
                has_sender,
                recipients = data.recipients().len(),
                accepted = data.accepted_count(),
                "sms accepted by provider"
            );
            SendSuccess::new(data).into_response()
        }
        Err(err) => {
            error!(to = %to, error = %err, "sms provider call failed");
            ApiError::upstream(&err, state.environment).into_response()
        }
    }
}

/// POST / - validate and forward one SMS.
pub async fn send_sms(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let body: SendSmsBody = match parse_body(&body) {
        Ok(body) => body,
        Err(err) => return err.into_response(),
    };

    let request = match SendSms::from_fields(
        body.to.as_deref(),
        body.message.as_deref(),
        body.from.as_deref(),
    ) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "rejected send request");
            return ApiError::from(err).into_response();
        }
    };

    forward(&state, request).await
}

/// POST /test - like `POST /` but every field falls back to a configured default.
pub async fn send_test_sms(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let body: SendSmsBody = match parse_body(&body) {
        Ok(body) => body,
        Err(err) => return err.into_response(),
    };

    let or_default = |value: Option<String>, default: String| {
        value.filter(|v| !v.trim().is_empty()).unwrap_or(default)
    };
    let to = or_default(body.to, state.test_recipient.as_str().to_owned());
    let from = or_default(body.from, state.test_sender.as_str().to_owned());
    let message = or_default(
        body.message,
        format!("Test SMS from {SERVICE_NAME} at {}", now_rfc3339()),
    );

    let request = match SendSms::from_fields(Some(&to), Some(&message), Some(&from)) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "rejected test send request");
            return ApiError::from(err).into_response();
        }
    };

    forward(&state, request).await
}

#[derive(Debug, Serialize)]
pub struct Acknowledgement {
    pub status: &'static str,
    pub message: &'static str,
}

/// POST /delivery - acknowledge a provider delivery report, whatever it contains.
pub async fn delivery_report(body: Bytes) -> (StatusCode, Json<Acknowledgement>) {
    match serde_json::from_slice::<DeliveryReport>(&body) {
        Ok(report) => info!(
            id = report.id.as_deref().unwrap_or("-"),
            status = report.status.as_deref().unwrap_or("-"),
            phone_number = report.phone_number.as_deref().unwrap_or("-"),
            network_code = report.network_code.as_deref().unwrap_or("-"),
            failure_reason = report.failure_reason.as_deref().unwrap_or("-"),
            retry_count = report.retry_count.unwrap_or(0),
            "delivery report received"
        ),
        Err(err) => warn!(
            error = %err,
            bytes = body.len(),
            "delivery report not understood, acknowledging anyway"
        ),
    }

    (
        StatusCode::OK,
        Json(Acknowledgement {
            status: "success",
            message: "Delivery report received",
        }),
    )
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: String,
    pub uptime_seconds: u64,
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        timestamp: now_rfc3339(),
        uptime_seconds: state.uptime().as_secs(),
    })
}

#[derive(Debug, Serialize)]
pub struct DebugResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub environment: &'static str,
    pub port: u16,
    pub username: String,
    pub sandbox: bool,
    pub endpoint: String,
    pub api_key_length: usize,
    pub api_key_suffix: String,
    pub timestamp: String,
}

/// GET /debug - configuration diagnostics. The API key is reduced to length and suffix.
pub async fn debug_info(State(state): State<Arc<AppState>>) -> Json<DebugResponse> {
    Json(DebugResponse {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        environment: state.environment.as_str(),
        port: state.port,
        username: state.username.as_str().to_owned(),
        sandbox: state.username.is_sandbox(),
        endpoint: state.endpoint.clone(),
        api_key_length: state.api_key.len(),
        api_key_suffix: state.api_key.redacted_suffix(),
        timestamp: now_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/", "Service description and endpoint catalogue"),
    ("GET", "/health", "Health check"),
    ("GET", "/debug", "Redacted credential diagnostics"),
    ("POST", "/", "Send an SMS: {to, message, from?}"),
    ("POST", "/test", "Send a test SMS; every field is optional"),
    ("POST", "/delivery", "Delivery report callback"),
];

/// GET /
pub async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        description: "Forwards SMS to Africa's Talking for queued delivery and accepts delivery reports",
        endpoints: ENDPOINTS
            .iter()
            .map(|&(method, path, description)| EndpointInfo {
                method,
                path,
                description,
            })
            .collect(),
    })
}

pub async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::NotFound(format!("route not found: {method} {}", uri.path()))
}
