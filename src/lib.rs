//! Pizzeria API library
//!
//! Public storefront (catalog reads, order placement) and admin back-office
//! (orders, catalog mutation, statistics, settings, users) over a relational
//! database.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::db::DbPool;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

/// REST surface under `/api`.
///
/// Catalog reads, settings reads and order placement are public; everything
/// else sits behind the bearer-token + admin-role gate.
pub fn api_routes(auth_service: Arc<auth::AuthService>) -> Router<AppState> {
    let orders_public = Router::new().route("/orders", post(handlers::orders::create_order));
    let orders_admin = admin_gate(
        Router::new()
            .route("/orders", get(handlers::orders::list_orders))
            .route("/orders/stats", get(handlers::orders::order_stats))
            .route("/orders/:id", get(handlers::orders::get_order))
            .route(
                "/orders/:id/status",
                patch(handlers::orders::update_order_status),
            ),
        &auth_service,
    );

    let products_public = Router::new()
        .route("/products", get(handlers::products::list_products))
        .route("/products/:id", get(handlers::products::get_product));
    let products_admin = admin_gate(
        Router::new()
            .route("/products", post(handlers::products::create_product))
            .route(
                "/products/:id",
                put(handlers::products::update_product).delete(handlers::products::delete_product),
            ),
        &auth_service,
    );

    let flavors_public = Router::new()
        .route("/flavors", get(handlers::flavors::list_flavors))
        .route("/flavors/:id", get(handlers::flavors::get_flavor));
    let flavors_admin = admin_gate(
        Router::new()
            .route("/flavors", post(handlers::flavors::create_flavor))
            .route(
                "/flavors/:id",
                put(handlers::flavors::update_flavor).delete(handlers::flavors::delete_flavor),
            )
            .route("/flavors/:id/toggle", patch(handlers::flavors::toggle_flavor)),
        &auth_service,
    );

    let borders_public = Router::new()
        .route("/borders", get(handlers::borders::list_borders))
        .route("/borders/:id", get(handlers::borders::get_border));
    let borders_admin = admin_gate(
        Router::new()
            .route("/borders", post(handlers::borders::create_border))
            .route(
                "/borders/:id",
                put(handlers::borders::update_border).delete(handlers::borders::delete_border),
            )
            .route("/borders/:id/toggle", patch(handlers::borders::toggle_border)),
        &auth_service,
    );

    let categories_public = Router::new()
        .route("/categories", get(handlers::categories::list_categories))
        .route(
            "/categories/flavors",
            get(handlers::categories::list_flavor_categories),
        )
        .route("/categories/:id", get(handlers::categories::get_category));
    let categories_admin = admin_gate(
        Router::new()
            .route("/categories", post(handlers::categories::create_category))
            .route(
                "/categories/flavors",
                post(handlers::categories::create_flavor_category),
            )
            .route(
                "/categories/:id",
                put(handlers::categories::update_category)
                    .delete(handlers::categories::delete_category),
            ),
        &auth_service,
    );

    let auth_public = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh-token", post(handlers::auth::refresh_token));
    let auth_user = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/logout", post(handlers::auth::logout))
        .route_layer(middleware::from_fn_with_state(
            auth_service.clone(),
            auth::auth_middleware,
        ));
    let auth_admin = admin_gate(
        Router::new()
            .route(
                "/auth/users",
                get(handlers::auth::list_users).post(handlers::auth::create_user),
            )
            .route(
                "/auth/users/:id",
                put(handlers::auth::update_user).delete(handlers::auth::delete_user),
            ),
        &auth_service,
    );

    let settings_public = Router::new()
        .route("/settings", get(handlers::settings::get_settings))
        .route(
            "/settings/neighborhoods",
            get(handlers::settings::list_neighborhoods),
        );
    let settings_admin = admin_gate(
        Router::new()
            .route("/settings", put(handlers::settings::update_settings))
            .route(
                "/settings/neighborhoods",
                post(handlers::settings::add_neighborhood),
            ),
        &auth_service,
    );

    Router::new()
        .merge(orders_public)
        .merge(orders_admin)
        .merge(products_public)
        .merge(products_admin)
        .merge(flavors_public)
        .merge(flavors_admin)
        .merge(borders_public)
        .merge(borders_admin)
        .merge(categories_public)
        .merge(categories_admin)
        .merge(auth_public)
        .merge(auth_user)
        .merge(auth_admin)
        .merge(settings_public)
        .merge(settings_admin)
}

/// Wraps a router in the bearer-token and admin-role middleware pair.
/// Authentication runs first, the role check second.
fn admin_gate(router: Router<AppState>, auth_service: &Arc<auth::AuthService>) -> Router<AppState> {
    router
        .route_layer(middleware::from_fn(auth::require_admin))
        .route_layer(middleware::from_fn_with_state(
            auth_service.clone(),
            auth::auth_middleware,
        ))
}

/// Full application router: status + health + `/api` + Swagger UI, wrapped in
/// the shared tower layers. Used by the binary and the integration tests.
pub fn build_router(
    state: AppState,
    auth_service: Arc<auth::AuthService>,
    cors: CorsLayer,
) -> Router {
    Router::new()
        .route("/", get(|| async { "pizzeria-api up" }))
        .route("/health", get(handlers::health::health))
        .nest("/api", api_routes(auth_service))
        .merge(openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors)
        .layer(middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
