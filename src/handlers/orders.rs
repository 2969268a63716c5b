use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    entities::order,
    errors::ServiceError,
    handlers::common::{created_response, success_response},
    models::OrderStatus,
    services::orders::{CreateOrderRequest, OrderListFilter},
    services::stats::StatsRange,
    AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct OrderListQuery {
    /// Status filter; `all` (or absent) disables it.
    pub status: Option<String>,
    /// Inclusive lower creation-date bound (YYYY-MM-DD).
    pub start_date: Option<String>,
    /// Inclusive upper creation-date bound (YYYY-MM-DD).
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    /// Target status; must be reachable from the order's current status.
    pub status: Option<String>,
}

/// Updated order plus the status an operator would normally advance to next.
#[derive(Debug, Serialize)]
pub struct OrderStatusResponse {
    #[serde(flatten)]
    pub order: order::Model,
    pub next_status: Option<OrderStatus>,
}

/// Place a new order (public storefront endpoint).
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created"),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 409, description = "Supplied order reference already exists", body = crate::errors::ErrorResponse),
        (status = 500, description = "Order could not be persisted", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order_model = state.services.orders.create_order(payload).await?;
    Ok(created_response(order_model))
}

/// List orders with item counts (admin).
#[utoipa::path(
    get,
    path = "/api/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders listed"),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Not an admin")
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let filter = OrderListFilter {
        status: parse_status_filter(query.status.as_deref())?,
        start_date: parse_date(query.start_date.as_deref())?,
        end_date: parse_date(query.end_date.as_deref())?,
    };

    let orders = state.services.orders.list_orders(filter).await?;
    Ok(success_response(orders))
}

/// Aggregated order statistics (admin).
#[utoipa::path(
    get,
    path = "/api/orders/stats",
    params(StatsQuery),
    responses(
        (status = 200, description = "Statistics computed"),
        (status = 400, description = "Invalid date", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Not an admin")
    ),
    tag = "orders"
)]
pub async fn order_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let range = StatsRange {
        start_date: parse_date(query.start_date.as_deref())?,
        end_date: parse_date(query.end_date.as_deref())?,
    };

    let stats = state.services.stats.order_stats(range).await?;
    Ok(success_response(stats))
}

/// Fetch one order with nested items and flavors (admin).
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order returned"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Not an admin")
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let details = state
        .services
        .orders
        .get_order(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Order {id} not found")))?;
    Ok(success_response(details))
}

/// Advance an order through its lifecycle (admin).
#[utoipa::path(
    patch,
    path = "/api/orders/{id}/status",
    params(("id" = i32, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Missing, unknown or unreachable status", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Not an admin")
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let status = payload
        .status
        .as_deref()
        .ok_or_else(|| ServiceError::ValidationError("Status is required".to_string()))?;

    let new_status = OrderStatus::from_str(status)
        .map_err(|_| ServiceError::ValidationError(format!("Unknown order status '{status}'")))?;

    let order_model = state
        .services
        .order_status
        .update_status(id, new_status)
        .await?;

    Ok(success_response(OrderStatusResponse {
        next_status: new_status.next(),
        order: order_model,
    }))
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<OrderStatus>, ServiceError> {
    match raw {
        None | Some("all") | Some("") => Ok(None),
        Some(value) => OrderStatus::from_str(value).map(Some).map_err(|_| {
            ServiceError::ValidationError(format!("Unknown order status '{value}'"))
        }),
    }
}

fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>, ServiceError> {
    match raw {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                ServiceError::ValidationError(format!(
                    "Invalid date '{value}'; expected YYYY-MM-DD"
                ))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_treats_all_as_absent() {
        assert!(parse_status_filter(None).unwrap().is_none());
        assert!(parse_status_filter(Some("all")).unwrap().is_none());
        assert_eq!(
            parse_status_filter(Some("preparing")).unwrap(),
            Some(OrderStatus::Preparing)
        );
        assert!(parse_status_filter(Some("bogus")).is_err());
    }

    #[test]
    fn dates_must_be_iso() {
        assert!(parse_date(None).unwrap().is_none());
        assert_eq!(
            parse_date(Some("2024-03-10")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 10)
        );
        assert!(parse_date(Some("10/03/2024")).is_err());
    }
}
