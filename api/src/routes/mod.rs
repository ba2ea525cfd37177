pub mod build;
pub mod chat;
pub mod config;
pub mod health;
pub mod system;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::middleware;
use crate::middleware::rate_limit::RateLimitLayer;
use crate::settings::Settings;
use crate::state::AppState;

/// Assemble every route group with its middleware stack.
pub fn build_router(state: AppState, settings: &Settings) -> Router {
    with_middleware(routes(settings), &state, settings).with_state(state)
}

fn routes(settings: &Settings) -> Router<AppState> {
    let limited = |router: Router<AppState>, layer: fn() -> RateLimitLayer| {
        if settings.rate_limit {
            router.layer(layer())
        } else {
            router
        }
    };

    Router::new()
        .merge(crate::docs())
        .merge(health::router())
        .merge(system::router())
        .merge(limited(chat::router(), middleware::rate_limit::chat_layer))
        .merge(limited(config::router(), middleware::rate_limit::config_layer))
        .merge(limited(build::router(), middleware::rate_limit::config_layer))
}

/// Panics are turned into JSON 500s inside the access log, so they are
/// logged and counted like any other server error.
fn with_middleware(
    router: Router<AppState>,
    state: &AppState,
    settings: &Settings,
) -> Router<AppState> {
    router
        .layer(CatchPanicLayer::custom(
            middleware::panic::json_panic_response,
        ))
        .layer(middleware::access_log::AccessLogLayer::new(
            state.metrics.clone(),
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::cors::build_cors_layer(&settings.cors_origins))
                .layer(axum::middleware::from_fn(middleware::security_headers::apply)),
        )
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use axum::routing::get as get_route;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;

    fn test_settings(temp: &TempDir) -> Settings {
        Settings {
            config_dir: temp.path().join("configs"),
            plugin_dir: temp.path().join("plugins"),
            rate_limit: false,
            ..Settings::default()
        }
    }

    /// The router plus the temp dir guard that owns its config storage.
    fn test_app() -> (TempDir, Router) {
        let temp = TempDir::new().expect("tempdir");
        let settings = test_settings(&temp);
        let state = AppState::from_settings(&settings).expect("state should build");
        (temp, build_router(state, &settings))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-user-id", "tester")
            .body(Body::from(body.to_string()))
            .expect("request should build")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-user-id", "tester")
            .body(Body::empty())
            .expect("request should build")
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response: Response = app
            .clone()
            .oneshot(request)
            .await
            .expect("request should succeed");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be JSON")
        };
        (status, body)
    }

    #[tokio::test]
    async fn health_reports_function_count() {
        let (_temp, app) = test_app();
        let (status, body) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["functions"], 11);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let (_temp, app) = test_app();
        let (status, body) = send(&app, get("/api-doc/openapi.json")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/chat/v3/build_ui"].is_object());
        assert!(body["paths"]["/build/ui/{id}"].is_object());
    }

    #[tokio::test]
    async fn v3_adapts_and_caches() {
        let (_temp, app) = test_app();
        let payload = json!({
            "function_name": "notification",
            "llm_output": "Heads up",
            "backend_output": {"data": {"title": "Card blocked", "message": "Call support", "level": "warning"}}
        });

        let (status, first) = send(&app, json_request("POST", "/chat/v3/build_ui", payload.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["adapters"], json!(["envelope"]));
        assert_eq!(first["cached"], false);
        assert_eq!(first["widget"]["type"], "banner");
        assert_eq!(first["card"]["card"]["log_id"], "notification");

        let (_, second) = send(&app, json_request("POST", "/chat/v3/build_ui", payload)).await;
        assert_eq!(second["cached"], true);

        let (_, metrics) = send(&app, get("/metrics")).await;
        assert_eq!(metrics["counters"]["builds_ok"], 2);
        assert_eq!(metrics["cache"]["hits"], 1);
    }

    #[tokio::test]
    async fn v3_named_route_takes_function_from_path() {
        let (_temp, app) = test_app();
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/chat/v3/build_ui/key_value",
                json!({"backend_output": {"Status": "Active", "Verified": true}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["widget"]["name"], "key_value");
        assert_eq!(body["adapters"], json!(["passthrough"]));
    }

    #[tokio::test]
    async fn v2_returns_bare_card_without_adapters() {
        let (_temp, app) = test_app();
        let (status, card) = send(
            &app,
            json_request(
                "POST",
                "/chat/v2/build_ui",
                json!({"function_name": "notification", "backend_output": {"title": "Hi", "message": "there"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(card["card"]["log_id"], "notification");
        assert!(card.get("widget").is_none());

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/chat/v2/build_ui",
                json!({"function_name": "notification", "backend_output": {"data": {"title": "Hi", "message": "there"}}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "invalid_input");
    }

    #[tokio::test]
    async fn unknown_function_and_bad_body_are_structured() {
        let (_temp, app) = test_app();
        let (status, body) = send(
            &app,
            json_request("POST", "/chat/v3/build_ui", json!({"function_name": "horoscope"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "unknown_function");

        let (status, body) = send(
            &app,
            json_request("POST", "/chat/v3/build_ui", json!({"backend_output": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_failed");
        assert_eq!(body["field"], "function_name");
    }

    #[tokio::test]
    async fn config_crud_and_screen_build() {
        let (_temp, app) = test_app();
        let config = json!({
            "name": "Home",
            "widgets": [
                {"function_name": "notification", "order": 2,
                 "backend_output": {"title": "Tip", "message": "Save more"}},
                {"function_name": "horoscope", "order": 1, "backend_output": {}},
                {"name": "Rates", "function_name": "currency_rates", "order": 0,
                 "backend_output": {"result": {"base": "RUB", "rates": [{"currency": "USD", "buy": 91.0, "sell": 93.5}]}}}
            ]
        });

        let (status, record) = send(&app, json_request("POST", "/config", config.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(record["id"], 1);
        assert_eq!(record["user_id"], "tester");
        assert_eq!(record["widget_count"], 3);

        let (status, list) = send(&app, get("/config")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().map(Vec::len), Some(1));

        let (status, stored) = send(&app, get("/config/1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored["name"], "Home");

        let (status, screen) = send(&app, get("/build/ui/1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(screen["config_id"], 1);
        let widgets = screen["widgets"].as_array().expect("widgets should be an array");
        assert_eq!(widgets.len(), 2);
        assert_eq!(widgets[0]["name"], "Rates");
        assert_eq!(widgets[1]["name"], "notification");
        assert_eq!(widgets[1]["order"], 2);
        assert_eq!(screen["errors"][0]["index"], 1);
        assert_eq!(screen["errors"][0]["function_name"], "horoscope");
        let slots = screen["card"]["card"]["states"][0]["div"]["items"]
            .as_array()
            .expect("screen should stack slots");
        assert_eq!(slots.len(), 3);

        let mut renamed = config;
        renamed["name"] = json!("Home v2");
        let (status, updated) = send(&app, json_request("PUT", "/config/1", renamed)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Home v2");

        let (status, deleted) = send(
            &app,
            Request::builder()
                .method("DELETE")
                .uri("/config/1")
                .header("x-user-id", "tester")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["deleted"], 1);

        let (status, body) = send(&app, get("/config/1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn configs_are_scoped_per_user() {
        let (_temp, app) = test_app();
        let config = json!({"name": "Mine", "widgets": [{"function_name": "text_message", "llm_output": "hello"}]});
        let (status, _) = send(&app, json_request("POST", "/config", config)).await;
        assert_eq!(status, StatusCode::CREATED);

        let other = Request::builder()
            .uri("/config/1")
            .header("x-user-id", "someone_else")
            .body(Body::empty())
            .expect("request should build");
        let (status, _) = send(&app, other).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let bad_user = Request::builder()
            .uri("/config")
            .header("x-user-id", "../etc")
            .body(Body::empty())
            .expect("request should build");
        let (status, body) = send(&app, bad_user).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "x-user-id");
    }

    #[tokio::test]
    async fn functions_catalog_lists_builtins_sorted() {
        let (_temp, app) = test_app();
        let (status, body) = send(&app, get("/chat/v3/functions")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 11);

        let functions = body["functions"].as_array().expect("functions should be an array");
        assert_eq!(functions.len(), 11);
        assert!(functions.iter().all(|f| f["source"] == "builtin"));
        let names: Vec<&str> = functions.iter().filter_map(|f| f["name"].as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert!(names.contains(&"payment_approval"));
    }

    #[tokio::test]
    async fn plugin_manifests_are_registered_at_startup() {
        let temp = TempDir::new().expect("tempdir");
        let settings = test_settings(&temp);
        std::fs::create_dir_all(&settings.plugin_dir).expect("create plugin dir");
        std::fs::write(
            settings.plugin_dir.join("loyalty.json"),
            r#"{"name": "loyalty_points", "widget_type": "badge",
                "required_fields": ["points"],
                "template": {"type": "text", "text": "${points} points"}}"#,
        )
        .expect("write plugin");
        std::fs::write(
            settings.plugin_dir.join("shadow.json"),
            r#"{"name": "weather", "template": {"type": "text", "text": "always sunny"}}"#,
        )
        .expect("write colliding plugin");

        let state = AppState::from_settings(&settings).expect("state should build");
        let app = build_router(state, &settings);

        let (_, catalog) = send(&app, get("/chat/v3/functions")).await;
        assert_eq!(catalog["count"], 12);
        let sources: Vec<(&str, &str)> = catalog["functions"]
            .as_array()
            .expect("functions should be an array")
            .iter()
            .filter_map(|f| Some((f["name"].as_str()?, f["source"].as_str()?)))
            .collect();
        assert!(sources.contains(&("loyalty_points", "plugin")));
        assert!(sources.contains(&("weather", "builtin")));

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/chat/v3/build_ui",
                json!({"function_name": "loyalty_points", "backend_output": {"points": 120}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["widget"]["type"], "badge");
        assert!(body["card"].to_string().contains("120 points"));

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/chat/v3/build_ui",
                json!({"function_name": "weather", "backend_output": {"city": "Kazan", "temperature": 3, "condition": "Snow"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body["card"].to_string().contains("always sunny"));
    }

    async fn exploding_handler() -> &'static str {
        panic!("handler exploded")
    }

    #[tokio::test]
    async fn handler_panic_is_logged_and_counted() {
        let temp = TempDir::new().expect("tempdir");
        let settings = test_settings(&temp);
        let state = AppState::from_settings(&settings).expect("state should build");
        let routes = Router::new().route("/explode", get_route(exploding_handler));
        let app = with_middleware(routes, &state, &settings).with_state(state.clone());

        let (status, body) = send(&app, get("/explode")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal_error");

        let snapshot = state.metrics.snapshot();
        assert_eq!(snapshot.requests, 1);
        assert_eq!(snapshot.server_errors, 1);
    }
}
