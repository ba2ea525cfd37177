use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use divbridge_core::builders::{banner, compose_screen};
use divbridge_core::config_store::WidgetSpec;
use divbridge_core::divkit::make_div;
use divbridge_core::error::ApiError;
use divbridge_core::render::Mode;
use divbridge_core::widget::{BuildRequest, Widget};
use serde::Serialize;

use crate::error::AppError;
use crate::extract::UserId;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/build/ui/{id}", get(build_screen))
}

/// A widget that could not be built; its slot shows an error banner instead.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct WidgetFailure {
    /// Position in the sorted widget list
    pub index: usize,
    pub function_name: String,
    pub message: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ScreenResponse {
    pub config_id: u64,
    pub name: String,
    /// Descriptors of the widgets that built, in screen order
    pub widgets: Vec<Widget>,
    pub errors: Vec<WidgetFailure>,
    /// One DivKit card stacking every slot vertically
    #[schema(value_type = Object)]
    pub card: serde_json::Value,
}

/// Build every widget of a stored config into one screen
///
/// Widgets are sorted by `order`; ties keep their stored order. A widget that
/// fails is replaced by an error banner and listed in `errors`.
#[utoipa::path(
    get,
    path = "/build/ui/{id}",
    params(
        ("id" = u64, Path, description = "Config id"),
        ("x-user-id" = Option<String>, Header, description = "Owner; defaults to anonymous")
    ),
    responses(
        (status = 200, description = "Composed screen", body = ScreenResponse),
        (status = 404, description = "No such config for this user", body = ApiError)
    ),
    tag = "config"
)]
pub async fn build_screen(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(id): Path<u64>,
) -> Result<Json<ScreenResponse>, AppError> {
    let owner = user_id.clone();
    let config = state
        .with_configs(move |configs| configs.get(&owner, id))
        .await?;

    let mut specs = config.widgets;
    specs.sort_by_key(|spec| spec.order);

    let mut widgets = Vec::with_capacity(specs.len());
    let mut errors = Vec::new();
    let mut cards = Vec::with_capacity(specs.len());

    for (index, spec) in specs.into_iter().enumerate() {
        match build_slot(&state, &spec) {
            Ok((widget, card)) => {
                widgets.push(widget);
                cards.push(card);
            }
            Err(message) => {
                tracing::warn!(
                    user_id = %user_id,
                    config_id = id,
                    index,
                    function = %spec.function_name,
                    error = %message,
                    "widget replaced by error banner"
                );
                cards.push(
                    make_div(
                        spec.function_name.as_str(),
                        banner("Widget unavailable", &message, "error"),
                    )
                    .to_value(),
                );
                errors.push(WidgetFailure {
                    index,
                    function_name: spec.function_name,
                    message,
                });
            }
        }
    }

    let log_id = format!("screen_{id}");
    Ok(Json(ScreenResponse {
        config_id: id,
        name: config.name,
        widgets,
        errors,
        card: compose_screen(&log_id, &cards),
    }))
}

fn build_slot(state: &AppState, spec: &WidgetSpec) -> Result<(Widget, serde_json::Value), String> {
    let request = BuildRequest {
        function_name: spec.function_name.clone(),
        llm_output: spec.llm_output.clone(),
        backend_output: spec.backend_output.clone(),
    };

    let result = state.renderer.render(&request, Mode::Adapted);
    state.metrics.record_build(result.is_ok());
    let rendered = result.map_err(|e| e.to_string())?;

    let mut widget = rendered.output.widget;
    widget.order = spec.order;
    if let Some(name) = &spec.name {
        widget.name = name.clone();
    }
    let card = rendered
        .output
        .ui
        .ok_or_else(|| format!("'{}' produced no card", spec.function_name))?;
    Ok((widget, card))
}
