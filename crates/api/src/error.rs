//! Application-level error type for HTTP handlers.
//!
//! Every failure is converted into an [`HttpError`] that travels on the
//! response as an extension. The error-rendering middleware turns it into the
//! final envelope (adding the correlation id) and logs it; handlers never
//! write error bodies themselves.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use crm_core::error::CoreError;
use serde::Serialize;
use serde_json::Value;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Uniform error description: `{code, message, details?}` plus the status.
///
/// `internal` holds diagnostic detail for the logs and is never serialized.
#[derive(Debug, Clone, Serialize)]
pub struct HttpError {
    #[serde(skip)]
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip)]
    pub internal: Option<String>,
}

impl HttpError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
            internal: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// 500 with a fixed public message; `detail` only reaches the logs.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            internal: Some(detail.into()),
            ..Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred",
            )
        }
    }

    /// Generic envelope for an error response that carried no [`HttpError`].
    pub fn from_status(status: StatusCode) -> Self {
        let code = match status {
            StatusCode::BAD_REQUEST => "BAD_REQUEST",
            StatusCode::UNAUTHORIZED => "UNAUTHORIZED",
            StatusCode::FORBIDDEN => "FORBIDDEN",
            StatusCode::NOT_FOUND => "NOT_FOUND",
            StatusCode::METHOD_NOT_ALLOWED => "METHOD_NOT_ALLOWED",
            StatusCode::REQUEST_TIMEOUT => "REQUEST_TIMEOUT",
            StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
            StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
            StatusCode::UNPROCESSABLE_ENTITY => "VALIDATION_ERROR",
            StatusCode::SERVICE_UNAVAILABLE => "SERVICE_UNAVAILABLE",
            s if s.is_client_error() => "BAD_REQUEST",
            _ => "INTERNAL_ERROR",
        };
        let message = if status.is_server_error() {
            "An internal error occurred"
        } else {
            status.canonical_reason().unwrap_or("Request failed")
        };
        Self::new(status, code, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(&self)).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `crm_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Field-level validation failures from `validator`.
    #[error("Validation failed: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Route not found")]
    RouteNotFound,

    /// A fully described error with an explicit status and code.
    #[error("{}: {}", .0.code, .0.message)]
    Http(HttpError),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn to_http(&self) -> HttpError {
        match self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => HttpError::new(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => HttpError::validation(msg.clone()),
                CoreError::Conflict(msg) => {
                    HttpError::new(StatusCode::CONFLICT, "CONFLICT", msg.clone())
                }
                CoreError::Unauthorized(msg) => {
                    HttpError::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => {
                    HttpError::new(StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone())
                }
                CoreError::Internal(msg) => HttpError::internal(msg.clone()),
            },
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::Invalid(errors) => HttpError::validation("Request validation failed")
                .with_details(validation_details(errors)),
            AppError::BadRequest(msg) => {
                HttpError::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
            }
            AppError::RouteNotFound => {
                HttpError::new(StatusCode::NOT_FOUND, "ROUTE_NOT_FOUND", "Route not found")
            }
            AppError::Http(err) => err.clone(),
            AppError::InternalError(msg) => HttpError::internal(msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_http().into_response()
    }
}

/// Classify a sqlx error.
///
/// - `RowNotFound` maps to 404.
/// - Unique violations (`23505`) on a `uq_*` constraint map to 409.
/// - Everything else maps to 500 with the driver message kept internal.
fn classify_sqlx_error(err: &sqlx::Error) -> HttpError {
    match err {
        sqlx::Error::RowNotFound => {
            HttpError::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found")
        }
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            match db_err.constraint() {
                Some(constraint) if constraint.starts_with("uq_") => HttpError::new(
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    format!("Duplicate value violates unique constraint: {constraint}"),
                ),
                _ => HttpError::internal(format!("Database error: {db_err}")),
            }
        }
        other => HttpError::internal(format!("Database error: {other}")),
    }
}

/// Flatten `validator` errors into `{ "field": ["message", ...] }`.
///
/// Nested structs use dotted paths (`metadata.duration_minutes`) and list
/// items use indices (`items[2].name`).
pub fn validation_details(errors: &ValidationErrors) -> Value {
    let mut out = BTreeMap::new();
    collect_messages("", errors, &mut out);
    serde_json::to_value(out).unwrap_or(Value::Null)
}

fn collect_messages(prefix: &str, errors: &ValidationErrors, out: &mut BTreeMap<String, Vec<String>>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                let messages = out.entry(path).or_default();
                for err in list {
                    messages.push(
                        err.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("failed `{}` check", err.code)),
                    );
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_messages(&format!("{path}[{index}]"), inner, out);
                }
            }
        }
    }
}
