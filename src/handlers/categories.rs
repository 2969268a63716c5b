use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use crate::{
    errors::ServiceError,
    handlers::common::{created_response, success_response},
    services::categories::{CreateCategoryRequest, UpdateCategoryRequest},
    AppState,
};

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let categories = state.services.categories.list().await?;
    Ok(success_response(categories))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state.services.categories.get(id).await?;
    Ok(success_response(category))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state.services.categories.create(payload).await?;
    Ok(created_response(category))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state.services.categories.update(id, payload).await?;
    Ok(success_response(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state.services.categories.delete(id).await?;
    Ok(success_response(category))
}

pub async fn list_flavor_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let categories = state.services.categories.list_flavor_categories().await?;
    Ok(success_response(categories))
}

pub async fn create_flavor_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state.services.categories.create_flavor_category(payload).await?;
    Ok(created_response(category))
}
