use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use crate::{
    errors::ServiceError,
    handlers::common::{created_response, success_response},
    services::borders::{CreateBorderRequest, UpdateBorderRequest},
    AppState,
};

pub async fn list_borders(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let borders = state.services.borders.list().await?;
    Ok(success_response(borders))
}

pub async fn get_border(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let border = state.services.borders.get(id).await?;
    Ok(success_response(border))
}

pub async fn create_border(
    State(state): State<AppState>,
    Json(payload): Json<CreateBorderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let border = state.services.borders.create(payload).await?;
    Ok(created_response(border))
}

pub async fn update_border(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateBorderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let border = state.services.borders.update(id, payload).await?;
    Ok(success_response(border))
}

pub async fn toggle_border(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let border = state.services.borders.toggle_availability(id).await?;
    Ok(success_response(border))
}

pub async fn delete_border(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let border = state.services.borders.delete(id).await?;
    Ok(success_response(border))
}
