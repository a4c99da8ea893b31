use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use validator::ValidationErrors;

use crate::logic::ReconcileError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Field name to failure messages, only present for validation failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
            fields: None,
        }
    }

    pub fn with_fields(message: &str, errors: &ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let messages = errors
                    .iter()
                    .map(|e| match &e.message {
                        Some(message) => message.to_string(),
                        None => e.code.to_string(),
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();

        Self {
            error: message.to_string(),
            fields: Some(fields),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("One or more validation errors occurred")]
    Validation(ValidationErrors),
    #[error("A problem happened while saving your changes")]
    PersistenceFailure,
    #[error("A problem happened while handling your request")]
    Unexpected(#[source] anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Unexpected(e)
    }
}

impl From<ReconcileError> for ApiError {
    fn from(e: ReconcileError) -> Self {
        match e {
            ReconcileError::CityNotFound(_) | ReconcileError::PointNotFound { .. } => {
                ApiError::NotFound(e.to_string())
            }
            ReconcileError::InvalidPatch(patch_error) => {
                ApiError::BadRequest(patch_error.to_string())
            }
            ReconcileError::Validation(errors) => ApiError::Validation(errors),
            ReconcileError::Persistence => ApiError::PersistenceFailure,
            ReconcileError::Store(e) => ApiError::Unexpected(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorResponse::new(&message)),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, ErrorResponse::new(&message)),
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::with_fields(&message, errors),
            ),
            ApiError::PersistenceFailure => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new(&message),
            ),
            ApiError::Unexpected(e) => {
                // Details stay in the log; the client only gets the generic message
                log::error!("Unexpected fault while handling request: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(&message),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
