use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::CorsLayer;

use crate::extract::USER_ID_HEADER;

/// Build a CORS layer from the configured origins (`DIVBRIDGE_CORS_ORIGINS`).
///
/// - Methods: GET, POST, PUT, DELETE, OPTIONS
/// - Headers: Content-Type, X-User-Id
/// - Max age: 3600s
pub fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static(USER_ID_HEADER),
        ])
        .max_age(std::time::Duration::from_secs(3600))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use super::*;

    async fn ok() -> StatusCode {
        StatusCode::OK
    }

    #[tokio::test]
    async fn preflight_allows_configured_origin_only() {
        let app = Router::new()
            .route("/config", get(ok))
            .layer(build_cors_layer(&["https://app.example".to_string()]));

        let preflight = |origin: &'static str| {
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/config")
                .header("origin", origin)
                .header("access-control-request-method", "PUT")
                .body(Body::empty())
                .expect("request should build")
        };

        let allowed = app
            .clone()
            .oneshot(preflight("https://app.example"))
            .await
            .expect("request should succeed");
        assert_eq!(
            allowed
                .headers()
                .get("access-control-allow-origin")
                .expect("allow-origin header should exist"),
            "https://app.example"
        );

        let denied = app
            .oneshot(preflight("https://evil.example"))
            .await
            .expect("request should succeed");
        assert!(denied.headers().get("access-control-allow-origin").is_none());
    }
}
