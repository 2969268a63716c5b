use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    errors::ServiceError,
    handlers::common::{created_response, success_response},
    services::flavors::{CreateFlavorRequest, UpdateFlavorRequest},
    AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct FlavorListQuery {
    /// Flavor-category slug filter.
    pub category: Option<String>,
}

pub async fn list_flavors(
    State(state): State<AppState>,
    Query(query): Query<FlavorListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let flavors = state
        .services
        .flavors
        .list(query.category.as_deref())
        .await?;
    Ok(success_response(flavors))
}

pub async fn get_flavor(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let flavor = state.services.flavors.get(id).await?;
    Ok(success_response(flavor))
}

pub async fn create_flavor(
    State(state): State<AppState>,
    Json(payload): Json<CreateFlavorRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let flavor = state.services.flavors.create(payload).await?;
    Ok(created_response(flavor))
}

pub async fn update_flavor(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateFlavorRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let flavor = state.services.flavors.update(id, payload).await?;
    Ok(success_response(flavor))
}

pub async fn toggle_flavor(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let flavor = state.services.flavors.toggle_availability(id).await?;
    Ok(success_response(flavor))
}

pub async fn delete_flavor(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let flavor = state.services.flavors.delete(id).await?;
    Ok(success_response(flavor))
}
