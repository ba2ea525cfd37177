use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use divbridge_core::error::{self, ApiError, BuildError, ConfigStoreError};

/// Internal error type that converts to structured API responses
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400)
    Validation {
        message: String,
        field: Option<String>,
        received: Option<serde_json::Value>,
        docs_hint: Option<String>,
    },
    /// Resource not found (404)
    NotFound { resource: String },
    /// No builder registered under this name (404)
    UnknownFunction { function_name: String },
    /// Builder rejected the payload (422)
    InvalidInput { function_name: String, reason: String },
    /// Internal error (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation {
                message,
                field,
                received,
                docs_hint,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: error::codes::VALIDATION_FAILED.to_string(),
                    message,
                    field,
                    received,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                ApiError {
                    error: error::codes::NOT_FOUND.to_string(),
                    message: format!("{resource} not found"),
                    field: None,
                    received: None,
                    request_id,
                    docs_hint: None,
                },
            ),
            AppError::UnknownFunction { function_name } => (
                StatusCode::NOT_FOUND,
                ApiError {
                    error: error::codes::UNKNOWN_FUNCTION.to_string(),
                    message: format!("No widget builder named '{function_name}'"),
                    field: Some("function_name".to_string()),
                    received: Some(serde_json::Value::String(function_name)),
                    request_id,
                    docs_hint: Some(
                        "GET /chat/v3/functions lists every registered builder.".to_string(),
                    ),
                },
            ),
            AppError::InvalidInput {
                function_name,
                reason,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError {
                    error: error::codes::INVALID_INPUT.to_string(),
                    message: format!("backend_output does not fit '{function_name}': {reason}"),
                    field: Some("backend_output".to_string()),
                    received: None,
                    request_id,
                    docs_hint: Some(
                        "Payloads are normalized by adapters only on /chat/v3 routes.".to_string(),
                    ),
                },
            ),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::INTERNAL_ERROR.to_string(),
                        message: "An internal error occurred".to_string(),
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
        };

        (status, Json(api_error)).into_response()
    }
}

impl From<BuildError> for AppError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::UnknownFunction(function_name) => {
                AppError::UnknownFunction { function_name }
            }
            BuildError::InvalidInput { function, reason } => AppError::InvalidInput {
                function_name: function,
                reason,
            },
            BuildError::DuplicateFunction(name) => {
                AppError::Internal(format!("duplicate builder registration: {name}"))
            }
        }
    }
}

impl From<ConfigStoreError> for AppError {
    fn from(err: ConfigStoreError) -> Self {
        match err {
            ConfigStoreError::NotFound { id, .. } => AppError::NotFound {
                resource: format!("config/{id}"),
            },
            ConfigStoreError::InvalidUser(user_id) => AppError::Validation {
                message: format!("Invalid user id '{user_id}'"),
                field: Some("x-user-id".to_string()),
                received: Some(serde_json::Value::String(user_id)),
                docs_hint: Some("User ids are 1-64 characters of [A-Za-z0-9_-].".to_string()),
            },
            ConfigStoreError::Invalid(message) => AppError::Validation {
                message,
                field: Some("widgets".to_string()),
                received: None,
                docs_hint: None,
            },
            ConfigStoreError::UnsafePath(path) => {
                tracing::error!(path = %path, "config registry points outside its root");
                AppError::Internal(format!("unsafe config path: {path}"))
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}
