use std::net::SocketAddr;

use axum::Router;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod error;
mod extract;
mod metrics;
mod middleware;
mod routes;
mod settings;
mod state;

use settings::{LogFormat, Settings};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "DivBridge API",
        version = "0.1.0",
        description = "Turns chat tool outputs into DivKit widget cards and composes stored screens."
    ),
    paths(
        routes::health::health_check,
        routes::system::get_metrics,
        routes::chat::list_functions,
        routes::chat::build_ui_v2,
        routes::chat::build_ui_v3,
        routes::chat::build_ui_named,
        routes::config::create_config,
        routes::config::list_configs,
        routes::config::get_config,
        routes::config::update_config,
        routes::config::delete_config,
        routes::build::build_screen,
    ),
    components(schemas(
        HealthResponse,
        divbridge_core::error::ApiError,
        divbridge_core::widget::BuildRequest,
        divbridge_core::widget::Widget,
        divbridge_core::widget::WidgetLayout,
        divbridge_core::builders::FunctionInfo,
        divbridge_core::builders::FunctionSource,
        divbridge_core::cache::CacheStats,
        divbridge_core::config_store::UiConfig,
        divbridge_core::config_store::WidgetSpec,
        divbridge_core::config_store::ConfigRecord,
        metrics::MetricsSnapshot,
        routes::system::MetricsResponse,
        routes::chat::FunctionsResponse,
        routes::chat::BuildUiBody,
        routes::chat::BuildUiResponse,
        routes::config::ConfigDeletedResponse,
        routes::build::WidgetFailure,
        routes::build::ScreenResponse,
    ))
)]
struct ApiDoc;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Registered builder functions, builtins plus plugins
    pub functions: usize,
}

/// Swagger UI and the OpenAPI document.
pub fn docs<S: Clone + Send + Sync + 'static>() -> Router<S> {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    let settings = Settings::from_env();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "divbridge_api=debug,divbridge_core=info,tower_http=info".into());
    match settings.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
    }

    let app_state = match state::AppState::from_settings(&settings) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(
                error = %e,
                config_dir = %settings.config_dir.display(),
                "failed to open config storage"
            );
            std::process::exit(1);
        }
    };

    if !settings.rate_limit {
        tracing::warn!("rate limiting disabled (DIVBRIDGE_RATE_LIMIT)");
    }

    let app = routes::build_router(app_state, &settings);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!("DivBridge API listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind");
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!(error = %e, "server stopped");
        std::process::exit(1);
    }
}
