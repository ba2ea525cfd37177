use std::any::Any;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use divbridge_core::error::{self, ApiError};

/// `CatchPanicLayer` handler: log the panic and answer with a JSON 500.
pub fn json_panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    let request_id = uuid::Uuid::now_v7().to_string();
    tracing::error!(request_id = %request_id, panic = %detail, "handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError {
            error: error::codes::INTERNAL_ERROR.to_string(),
            message: "An internal error occurred".to_string(),
            field: None,
            received: None,
            request_id,
            docs_hint: None,
        }),
    )
        .into_response()
}
