//! Request extractors
//!
//! `ValidJson` deserializes and validates a JSON body in one step and
//! renders both failure kinds as the usual error envelope.

use crate::error::ApiError;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

pub const INVALID_JSON: &str = "Invalid JSON format in request body";

/// JSON body that passed `validator` checks
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        value.validate().map_err(|e| validation_failed(&e))?;
        Ok(Self(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    match rejection {
        // Well-formed JSON with missing or mistyped fields
        JsonRejection::JsonDataError(err) => {
            let detail = std::error::Error::source(&err)
                .map(ToString::to_string)
                .unwrap_or_else(|| err.body_text());
            ApiError::Validation(format!("Validation failed: {}", detail))
        }
        JsonRejection::MissingJsonContentType(err) => ApiError::BadRequest(err.body_text()),
        _ => ApiError::BadRequest(INVALID_JSON.to_string()),
    }
}

/// `Validation failed: field: message, ...` with fields in a stable order
pub fn validation_failed(errors: &ValidationErrors) -> ApiError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let details: Vec<String> = fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{}: {}", field, message)
            })
        })
        .collect();

    ApiError::Validation(format!("Validation failed: {}", details.join(", ")))
}

/// Validation failure from a single hand-checked field
pub fn field_failed(message: String) -> ApiError {
    ApiError::Validation(format!("Validation failed: {}", message))
}
