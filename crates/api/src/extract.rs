//! Request extractors shared by the resource handlers.

use std::convert::Infallible;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use validator::Validate;

use crate::error::{AppError, HttpError};

/// Header carrying the per-request correlation id.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// JSON body that must deserialize and then pass its `validator` rules.
///
/// Both failure kinds become `400 VALIDATION_ERROR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Prefix axum puts in front of every typed-deserialization failure.
const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

fn json_rejection(rejection: JsonRejection) -> AppError {
    match &rejection {
        JsonRejection::MissingJsonContentType(_) => AppError::Http(HttpError::validation(
            "Expected request with `Content-Type: application/json`",
        )),
        JsonRejection::JsonDataError(_) => {
            let text = rejection.body_text();
            let error = HttpError::validation(text.clone());
            match data_error_field(&text) {
                Some((field, message)) => {
                    let mut details = Map::new();
                    details.insert(field, json!([message]));
                    AppError::Http(error.with_details(Value::Object(details)))
                }
                None => AppError::Http(error),
            }
        }
        _ => AppError::Http(HttpError::validation(rejection.body_text())),
    }
}

/// Split a typed-deserialization failure into the offending field path and
/// the serde message, e.g. `metadata.direction` and "unknown variant ...".
///
/// Root-level failures carry no path; a missing field is keyed by its name.
fn data_error_field(text: &str) -> Option<(String, String)> {
    let detail = text.strip_prefix(DATA_ERROR_PREFIX)?;
    if let Some((path, message)) = detail.split_once(": ") {
        if !path.is_empty() && !path.contains(char::is_whitespace) {
            return Some((path.to_string(), message.to_string()));
        }
    }
    let field = detail.strip_prefix("missing field `")?.split('`').next()?;
    Some((field.to_string(), detail.to_string()))
}

/// Query string that must deserialize and then pass its `validator` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| {
                AppError::Http(HttpError::validation(rejection.body_text()))
            })?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// The request's correlation id, as set or echoed by the request-id layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrelationId(pub Option<String>);

impl CorrelationId {
    pub fn from_headers(headers: &axum::http::HeaderMap) -> Self {
        Self(
            headers
                .get(CORRELATION_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        )
    }

    pub fn into_inner(self) -> Option<String> {
        self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CorrelationId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
