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
    services::products::{CreateProductRequest, UpdateProductRequest},
    AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductListQuery {
    /// Category slug filter.
    pub category: Option<String>,
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let products = state
        .services
        .products
        .list(query.category.as_deref())
        .await?;
    Ok(success_response(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.get(id).await?;
    Ok(success_response(product))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.create(payload).await?;
    Ok(created_response(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.update(id, payload).await?;
    Ok(success_response(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.delete(id).await?;
    Ok(success_response(product))
}
