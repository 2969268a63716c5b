use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::{db, AppState};

/// Liveness plus a database round trip.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service health")),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = match db::ping(&state.db).await {
        Ok(()) => "up",
        Err(_) => "down",
    };

    Json(json!({
        "status": "ok",
        "database": database,
    }))
}
