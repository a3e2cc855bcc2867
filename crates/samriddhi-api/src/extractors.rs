//! # Request Body Extraction
//!
//! [`extract_json`] maps JSON rejections to [`AppError::BadRequest`] so
//! malformed bodies get the same error envelope as everything else.
//! [`Validate`] adds request-level rules serde cannot express.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Business rules checked after deserialization.
pub trait Validate {
    /// Returns a message describing the first broken rule.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and check it with [`Validate`].
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::validation)?;
    Ok(value)
}
