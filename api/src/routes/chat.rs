use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use divbridge_core::builders::FunctionInfo;
use divbridge_core::error::ApiError;
use divbridge_core::render::{Mode, Rendered};
use divbridge_core::widget::{BuildRequest, Widget};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chat/v3/functions", get(list_functions))
        .route("/chat/v2/build_ui", post(build_ui_v2))
        .route("/chat/v3/build_ui", post(build_ui_v3))
        .route("/chat/v3/build_ui/{function_name}", post(build_ui_named))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FunctionsResponse {
    pub count: usize,
    pub functions: Vec<FunctionInfo>,
}

/// Body of POST /chat/v3/build_ui/{function_name}
#[derive(Deserialize, utoipa::ToSchema)]
pub struct BuildUiBody {
    #[serde(default)]
    pub llm_output: Option<String>,
    #[serde(default)]
    pub backend_output: serde_json::Value,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BuildUiResponse {
    pub widget: Widget,
    /// DivKit card
    #[schema(value_type = Object)]
    pub card: serde_json::Value,
    /// Adapters applied to `backend_output`, or `["passthrough"]`
    pub adapters: Vec<String>,
    pub cached: bool,
}

/// List every registered builder function
#[utoipa::path(
    get,
    path = "/chat/v3/functions",
    responses(
        (status = 200, description = "Builder catalog sorted by name", body = FunctionsResponse)
    ),
    tag = "chat"
)]
pub async fn list_functions(State(state): State<AppState>) -> Json<FunctionsResponse> {
    let functions = state.renderer.builders().functions();
    Json(FunctionsResponse {
        count: functions.len(),
        functions,
    })
}

/// Build a widget and return the bare DivKit card
///
/// Legacy contract: `backend_output` must already be in the builder's
/// canonical shape. No adapters run and nothing is cached.
#[utoipa::path(
    post,
    path = "/chat/v2/build_ui",
    request_body = BuildRequest,
    responses(
        (status = 200, description = "DivKit card", body = serde_json::Value),
        (status = 400, description = "Malformed body", body = ApiError),
        (status = 404, description = "Unknown function", body = ApiError),
        (status = 422, description = "Payload does not fit the builder", body = ApiError)
    ),
    tag = "chat"
)]
pub async fn build_ui_v2(
    State(state): State<AppState>,
    AppJson(request): AppJson<BuildRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let rendered = render(&state, &request, Mode::Direct)?;
    let card = rendered
        .output
        .ui
        .ok_or_else(|| AppError::Internal(format!("'{}' produced no card", request.function_name)))?;
    Ok(Json(card))
}

/// Build a widget, normalizing `backend_output` through the adapters first
#[utoipa::path(
    post,
    path = "/chat/v3/build_ui",
    request_body = BuildRequest,
    responses(
        (status = 200, description = "Widget descriptor and card", body = BuildUiResponse),
        (status = 400, description = "Malformed body", body = ApiError),
        (status = 404, description = "Unknown function", body = ApiError),
        (status = 422, description = "Payload does not fit the builder", body = ApiError)
    ),
    tag = "chat"
)]
pub async fn build_ui_v3(
    State(state): State<AppState>,
    AppJson(request): AppJson<BuildRequest>,
) -> Result<Json<BuildUiResponse>, AppError> {
    let rendered = render(&state, &request, Mode::Adapted)?;
    respond(rendered, &request.function_name)
}

/// Same as POST /chat/v3/build_ui with the function taken from the path
#[utoipa::path(
    post,
    path = "/chat/v3/build_ui/{function_name}",
    params(("function_name" = String, Path, description = "Registered builder name")),
    request_body = BuildUiBody,
    responses(
        (status = 200, description = "Widget descriptor and card", body = BuildUiResponse),
        (status = 400, description = "Malformed body", body = ApiError),
        (status = 404, description = "Unknown function", body = ApiError),
        (status = 422, description = "Payload does not fit the builder", body = ApiError)
    ),
    tag = "chat"
)]
pub async fn build_ui_named(
    State(state): State<AppState>,
    Path(function_name): Path<String>,
    AppJson(body): AppJson<BuildUiBody>,
) -> Result<Json<BuildUiResponse>, AppError> {
    let request = BuildRequest {
        function_name,
        llm_output: body.llm_output,
        backend_output: body.backend_output,
    };
    let rendered = render(&state, &request, Mode::Adapted)?;
    respond(rendered, &request.function_name)
}

fn render(state: &AppState, request: &BuildRequest, mode: Mode) -> Result<Rendered, AppError> {
    let result = state.renderer.render(request, mode);
    state.metrics.record_build(result.is_ok());
    match &result {
        Ok(rendered) => tracing::debug!(
            function = %request.function_name,
            adapters = ?rendered.adapters,
            cached = rendered.cached,
            "widget built"
        ),
        Err(e) => tracing::info!(function = %request.function_name, error = %e, "build rejected"),
    }
    result.map_err(AppError::from)
}

fn respond(rendered: Rendered, function_name: &str) -> Result<Json<BuildUiResponse>, AppError> {
    let card = rendered
        .output
        .ui
        .ok_or_else(|| AppError::Internal(format!("'{function_name}' produced no card")))?;
    Ok(Json(BuildUiResponse {
        widget: rendered.output.widget,
        card,
        adapters: rendered.adapters,
        cached: rendered.cached,
    }))
}
