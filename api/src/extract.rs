//! Custom extractors that convert axum rejections to structured AppError responses.
//!
//! Use `AppJson<T>` as a drop-in replacement for `axum::Json<T>` in handler signatures.
//! Unlike the standard extractor, deserialization failures produce a JSON `AppError`
//! instead of axum's default plain-text 422 response.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request, rejection::JsonRejection},
    http::request::Parts,
};
use divbridge_core::config_store::validate_user_id;

use crate::error::AppError;

/// Header carrying the caller's user id for config storage.
pub const USER_ID_HEADER: &str = "x-user-id";

/// User id used when the header is absent.
pub const ANONYMOUS_USER: &str = "anonymous";

/// JSON extractor that converts deserialization errors to structured `AppError` responses.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(map_json_rejection(rejection)),
        }
    }
}

/// Convert a `JsonRejection` to a structured `AppError::Validation`.
pub fn map_json_rejection(rejection: JsonRejection) -> AppError {
    let body_text = rejection.body_text();

    // Extract a useful field hint from common serde error patterns:
    // "missing field `function_name`" → field = "function_name"
    // "unknown field `foo`" → field = "foo"
    let field_hint = extract_field_from_serde_message(&body_text);

    AppError::Validation {
        message: format!("Invalid request body: {body_text}"),
        field: Some(field_hint.unwrap_or("body".to_string())),
        received: None,
        docs_hint: Some(
            "Check the request body against the endpoint's schema (GET /api-doc/openapi.json)."
                .to_string(),
        ),
    }
}

/// Try to extract a field name from serde's error messages.
fn extract_field_from_serde_message(msg: &str) -> Option<String> {
    for pattern in ["missing field `", "unknown field `"] {
        if let Some(start) = msg.find(pattern) {
            let after = &msg[start + pattern.len()..];
            if let Some(end) = after.find('`') {
                return Some(after[..end].to_string());
            }
        }
    }
    None
}

/// Caller identity from the `x-user-id` header, `anonymous` when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(UserId(ANONYMOUS_USER.to_string()));
        };

        let value = raw.to_str().map(str::trim).map_err(|_| AppError::Validation {
            message: "x-user-id header is not valid UTF-8".to_string(),
            field: Some(USER_ID_HEADER.to_string()),
            received: None,
            docs_hint: None,
        })?;

        validate_user_id(value)?;
        Ok(UserId(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request as HttpRequest;

    use super::*;

    #[test]
    fn extracts_missing_field_name() {
        let msg = "Failed to deserialize: missing field `function_name` at line 1 column 72";
        assert_eq!(
            extract_field_from_serde_message(msg),
            Some("function_name".to_string())
        );
    }

    #[test]
    fn extracts_unknown_field_name() {
        let msg = "unknown field `foo`, expected one of `bar`, `baz`";
        assert_eq!(
            extract_field_from_serde_message(msg),
            Some("foo".to_string())
        );
    }

    #[test]
    fn returns_none_for_generic_error() {
        let msg = "invalid type: string, expected u64";
        assert_eq!(extract_field_from_serde_message(msg), None);
    }

    async fn user_id_from(header: Option<&str>) -> Result<UserId, AppError> {
        let mut builder = HttpRequest::builder().uri("/config");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let (mut parts, _) = builder
            .body(())
            .expect("request should build")
            .into_parts();
        UserId::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn missing_header_is_anonymous() {
        let user = user_id_from(None).await.expect("should extract");
        assert_eq!(user, UserId(ANONYMOUS_USER.to_string()));
    }

    #[tokio::test]
    async fn header_value_is_trimmed_and_validated() {
        let user = user_id_from(Some(" alice_01 ")).await.expect("should extract");
        assert_eq!(user.0, "alice_01");

        let err = user_id_from(Some("../root")).await.expect_err("must reject");
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
