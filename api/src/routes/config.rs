use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use divbridge_core::config_store::{ConfigRecord, UiConfig};
use divbridge_core::error::ApiError;
use serde::Serialize;

use crate::error::AppError;
use crate::extract::{AppJson, UserId};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/config", get(list_configs).post(create_config))
        .route(
            "/config/{id}",
            get(get_config).put(update_config).delete(delete_config),
        )
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ConfigDeletedResponse {
    pub deleted: u64,
}

/// Store a new screen config for the calling user
#[utoipa::path(
    post,
    path = "/config",
    request_body = UiConfig,
    params(("x-user-id" = Option<String>, Header, description = "Owner; defaults to anonymous")),
    responses(
        (status = 201, description = "Config stored", body = ConfigRecord),
        (status = 400, description = "Invalid config or user id", body = ApiError)
    ),
    tag = "config"
)]
pub async fn create_config(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    AppJson(config): AppJson<UiConfig>,
) -> Result<(StatusCode, Json<ConfigRecord>), AppError> {
    let record = state
        .with_configs(move |configs| configs.create(&user_id, config))
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// List the calling user's configs in ascending id order
#[utoipa::path(
    get,
    path = "/config",
    params(("x-user-id" = Option<String>, Header, description = "Owner; defaults to anonymous")),
    responses(
        (status = 200, description = "Stored configs", body = Vec<ConfigRecord>),
        (status = 400, description = "Invalid user id", body = ApiError)
    ),
    tag = "config"
)]
pub async fn list_configs(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> Result<Json<Vec<ConfigRecord>>, AppError> {
    let records = state
        .with_configs(move |configs| configs.list(&user_id))
        .await?;
    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/config/{id}",
    params(
        ("id" = u64, Path, description = "Config id"),
        ("x-user-id" = Option<String>, Header, description = "Owner; defaults to anonymous")
    ),
    responses(
        (status = 200, description = "Stored config", body = UiConfig),
        (status = 404, description = "No such config for this user", body = ApiError)
    ),
    tag = "config"
)]
pub async fn get_config(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(id): Path<u64>,
) -> Result<Json<UiConfig>, AppError> {
    let config = state
        .with_configs(move |configs| configs.get(&user_id, id))
        .await?;
    Ok(Json(config))
}

/// Replace a stored config
#[utoipa::path(
    put,
    path = "/config/{id}",
    request_body = UiConfig,
    params(
        ("id" = u64, Path, description = "Config id"),
        ("x-user-id" = Option<String>, Header, description = "Owner; defaults to anonymous")
    ),
    responses(
        (status = 200, description = "Config replaced", body = ConfigRecord),
        (status = 400, description = "Invalid config", body = ApiError),
        (status = 404, description = "No such config for this user", body = ApiError)
    ),
    tag = "config"
)]
pub async fn update_config(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(id): Path<u64>,
    AppJson(config): AppJson<UiConfig>,
) -> Result<Json<ConfigRecord>, AppError> {
    let record = state
        .with_configs(move |configs| configs.update(&user_id, id, config))
        .await?;
    Ok(Json(record))
}

#[utoipa::path(
    delete,
    path = "/config/{id}",
    params(
        ("id" = u64, Path, description = "Config id"),
        ("x-user-id" = Option<String>, Header, description = "Owner; defaults to anonymous")
    ),
    responses(
        (status = 200, description = "Config removed", body = ConfigDeletedResponse),
        (status = 404, description = "No such config for this user", body = ApiError)
    ),
    tag = "config"
)]
pub async fn delete_config(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(id): Path<u64>,
) -> Result<Json<ConfigDeletedResponse>, AppError> {
    state
        .with_configs(move |configs| configs.delete(&user_id, id))
        .await?;
    Ok(Json(ConfigDeletedResponse { deleted: id }))
}
