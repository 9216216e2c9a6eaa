//! HTTP路由handlers

use std::fmt::Write;

use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, post},
    Router,
};

use crate::http::{middleware::require_bearer, models::HttpServerError, state::AppState};

/// 创建所有路由（鉴权层覆盖全部请求，包括未知路径）
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/stream/:name/enable", post(enable_handler))
        .route("/stream/:name/disable", post(disable_handler))
        .route("/stream/:name/status", get(status_handler))
        .route("/streams", get(list_handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_bearer))
        .with_state(state)
}

/// POST /stream/:name/enable - 启动流
async fn enable_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<String, HttpServerError> {
    state.registry.enable(&name).await?;
    Ok(format!("OK. Started the {name} stream\n"))
}

/// POST /stream/:name/disable - 请求停止流（异步生效）
async fn disable_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<String, HttpServerError> {
    state.registry.disable(&name).await?;
    Ok(format!("OK. Stopped the {name} stream\n"))
}

/// GET /stream/:name/status
async fn status_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<String, HttpServerError> {
    let status = state.registry.status(&name).await?;
    Ok(format!("Stream {name} is {status}\n"))
}

/// GET /streams
async fn list_handler(State(state): State<AppState>) -> String {
    let mut body = String::new();
    for (name, status) in state.registry.list().await {
        let _ = writeln!(body, "Stream {name} is {status}");
    }
    body
}
