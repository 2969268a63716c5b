use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    errors::ServiceError,
    handlers::common::{created_response, success_response},
    services::settings::SettingsUpdate,
    AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddNeighborhoodRequest {
    pub name: Option<String>,
}

pub async fn get_settings(State(state): State<AppState>) -> impl IntoResponse {
    success_response(state.services.settings.get().await)
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(payload): Json<SettingsUpdate>,
) -> Result<impl IntoResponse, ServiceError> {
    let settings = state.services.settings.update(payload).await?;
    Ok(success_response(settings))
}

pub async fn list_neighborhoods(State(state): State<AppState>) -> impl IntoResponse {
    success_response(state.services.settings.neighborhoods().await)
}

pub async fn add_neighborhood(
    State(state): State<AppState>,
    Json(payload): Json<AddNeighborhoodRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let name = payload
        .name
        .as_deref()
        .ok_or_else(|| ServiceError::ValidationError("Neighborhood name is required".to_string()))?;
    let neighborhood = state.services.settings.add_neighborhood(name).await?;
    Ok(created_response(neighborhood))
}
