//! Request handlers.

use crate::dashboard::{render_index, static_asset};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

/// Health check endpoint with the number of live viewers.
pub async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "viewers": state.registry().len(),
    }))
}

/// `/api`: always answers 200 with a single plain-text line.
///
/// The operation runs in its own task. A client that hangs up mid-`add`
/// drops only this handler, so a viewer that outlives the grace period is
/// still registered and can be removed later.
pub async fn handle_api(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> String {
    debug!("API call: {:?}", params);
    let task = tokio::spawn(async move { state.endpoint.handle(&params).await });
    match task.await {
        Ok(rsp) => rsp,
        Err(e) => {
            error!("API task failed: {}", e);
            e.to_string()
        }
    }
}

/// Dashboard page listing the live viewers.
pub async fn handle_index(State(state): State<Arc<AppState>>) -> Html<String> {
    // Snapshot first; rendering never holds the registry lock.
    let viewers = state.registry().list();
    Html(render_index(&viewers))
}

/// Bundled, read-only dashboard assets.
pub async fn handle_static(Path(path): Path<String>) -> Response {
    match static_asset(&path) {
        Some(asset) => ([(header::CONTENT_TYPE, asset.content_type)], asset.body).into_response(),
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}
