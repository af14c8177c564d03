//! JSON envelopes returned by the gateway.

use std::any::Any;

use axum::{
    Json,
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
};
use serde::Serialize;
use tracing::error;

use crate::client::SmsError;
use crate::config::Environment;
use crate::domain::{SendSmsResponse, ValidationError};

pub const SEND_SUCCESS_MESSAGE: &str = "SMS sent successfully";

/// Body of a successful send.
///
/// `enqueued` is always `true`: the provider accepted the message into its queue,
/// which says nothing yet about delivery. Delivery outcomes arrive on `/delivery`.
#[derive(Debug, Serialize)]
pub struct SendSuccess {
    pub success: bool,
    pub data: SendSmsResponse,
    pub message: &'static str,
    pub enqueued: bool,
}

impl SendSuccess {
    pub fn new(data: SendSmsResponse) -> Self {
        Self {
            success: true,
            data,
            message: SEND_SUCCESS_MESSAGE,
            enqueued: true,
        }
    }
}

impl IntoResponse for SendSuccess {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Failure of a gateway request, rendered as `{success: false, error}`.
#[derive(Debug)]
pub enum ApiError {
    /// Caller sent something unusable (400).
    BadRequest(String),
    /// The provider call failed (500). `details` is only set in development.
    Upstream {
        message: String,
        details: Option<String>,
    },
    NotFound(String),
}

impl ApiError {
    pub fn upstream(err: &SmsError, environment: Environment) -> Self {
        let details = if environment.exposes_diagnostics() {
            err.diagnostic()
        } else {
            None
        };
        Self::Upstream {
            message: err.to_string(),
            details,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let (error, details) = match self {
            Self::BadRequest(error) | Self::NotFound(error) => (error, None),
            Self::Upstream { message, details } => (message, details),
        };
        (
            status,
            Json(ErrorBody {
                success: false,
                error,
                details,
            }),
        )
            .into_response()
    }
}

/// Last-resort response for a handler that panicked.
pub fn panic_response(_payload: Box<dyn Any + Send + 'static>) -> Response<Body> {
    error!("request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            success: false,
            error: "internal server error".to_owned(),
            details: None,
        }),
    )
        .into_response()
}
