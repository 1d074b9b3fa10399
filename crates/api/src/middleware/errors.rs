//! Terminal error rendering.
//!
//! Sits outside the panic and timeout layers, so every error response the
//! application produces passes through [`render_errors`]: handler errors,
//! extractor rejections, panics, timeouts, and unmatched routes or methods.

use std::any::Any;

use axum::extract::Request;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::error::HttpError;
use crate::extract::CorrelationId;

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope<'a> {
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
    correlation_id: Option<&'a str>,
}

/// Rewrite error responses into the `{code, message, details?, correlationId}`
/// envelope and log them: 4xx at WARN, 5xx at ERROR with internal detail.
///
/// Responses produced from an [`HttpError`] keep their code and message;
/// any other 4xx/5xx is given a generic envelope derived from its status.
pub async fn render_errors(request: Request, next: Next) -> Response {
    let correlation_id = CorrelationId::from_headers(request.headers()).into_inner();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;
    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let (parts, _body) = response.into_parts();
    let error = parts
        .extensions
        .get::<HttpError>()
        .cloned()
        .unwrap_or_else(|| HttpError::from_status(status));

    if status.is_server_error() {
        tracing::error!(
            %method,
            path = %path,
            status = status.as_u16(),
            code = error.code,
            correlation_id = correlation_id.as_deref(),
            internal = error.internal.as_deref(),
            "Request failed",
        );
    } else {
        tracing::warn!(
            %method,
            path = %path,
            status = status.as_u16(),
            code = error.code,
            message = %error.message,
            correlation_id = correlation_id.as_deref(),
            "Request rejected",
        );
    }

    let envelope = ErrorEnvelope {
        code: error.code,
        message: &error.message,
        details: error.details.as_ref(),
        correlation_id: correlation_id.as_deref(),
    };
    let mut rendered = (status, Json(&envelope)).into_response();

    // Keep headers other layers set (CORS, Allow, request id).
    for (name, value) in parts.headers.iter() {
        if *name != CONTENT_TYPE && *name != CONTENT_LENGTH {
            rendered.headers_mut().append(name.clone(), value.clone());
        }
    }
    rendered
}

/// Panic handler for `CatchPanicLayer::custom`.
///
/// The panic payload is kept for the log line only.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    HttpError::internal(format!("handler panicked: {detail}")).into_response()
}
