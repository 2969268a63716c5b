// Shared across integration test binaries; not every binary uses every helper.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

use pizzeria_api::{
    auth::{hash_password, AuthConfig, AuthService},
    build_router,
    config::AppConfig,
    db,
    entities::{border, category, flavor, flavor_category, product, user},
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "senha-super-secreta";
pub const STAFF_EMAIL: &str = "staff@example.com";
pub const STAFF_PASSWORD: &str = "outra-senha-secreta";

static DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Test harness backed by a per-test SQLite database, driving the real
/// application router through `tower::ServiceExt::oneshot`.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    admin_token: String,
    staff_token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        let n = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let db_file = std::env::temp_dir().join(format!(
            "pizzeria_test_{}_{n}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&db_file);

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_file.display()),
            "test_secret_key_for_testing_purposes_only",
            3600,
            "127.0.0.1",
            0,
            "test",
        );
        // A single pooled connection keeps every query on the same SQLite
        // handle.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        tokio::spawn(events::process_events(event_rx));

        let auth_service = Arc::new(AuthService::new(AuthConfig::new(
            cfg.jwt_secret.clone(),
            "pizzeria-api".to_string(),
            Duration::from_secs(cfg.jwt_expiration),
        )));

        let services = AppServices::new(
            db_arc.clone(),
            Some(Arc::new(event_sender)),
            auth_service.clone(),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            services,
        };

        let admin = seed_user(&state, "Admin", ADMIN_EMAIL, ADMIN_PASSWORD, "admin").await;
        let staff = seed_user(&state, "Staff", STAFF_EMAIL, STAFF_PASSWORD, "user").await;

        let admin_token = auth_service.issue_token(&admin).expect("admin token").token;
        let staff_token = auth_service.issue_token(&staff).expect("staff token").token;

        let router = build_router(state.clone(), auth_service, CorsLayer::permissive());

        Self {
            router,
            state,
            admin_token,
            staff_token,
        }
    }

    pub fn admin_token(&self) -> &str {
        &self.admin_token
    }

    pub fn staff_token(&self) -> &str {
        &self.staff_token
    }

    /// Unauthenticated request.
    pub async fn public(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.request(method, uri, None, body).await
    }

    /// Request carrying the seeded admin's token.
    pub async fn admin(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.request(method, uri, Some(self.admin_token.as_str()), body)
            .await
    }

    /// Request carrying the seeded non-admin staff token.
    pub async fn as_staff(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.request(method, uri, Some(self.staff_token.as_str()), body)
            .await
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("build request"),
            None => builder.body(Body::empty()).expect("build request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("dispatch request");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    /// Seeds a small catalog: two products (a pizza with selectable flavors
    /// and a drink), one border and two flavors.
    pub async fn seed_catalog(&self) -> CatalogFixture {
        let db = &*self.state.db;

        let pizzas = category::ActiveModel {
            name: Set("Pizzas".to_string()),
            slug: Set("pizzas".to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("seed category");

        let drinks = category::ActiveModel {
            name: Set("Bebidas".to_string()),
            slug: Set("bebidas".to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("seed category");

        let traditional = flavor_category::ActiveModel {
            name: Set("Tradicionais".to_string()),
            slug: Set("tradicionais".to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("seed flavor category");

        let pizza = product::ActiveModel {
            name: Set("Pizza Grande".to_string()),
            description: Set(Some("Large pizza, up to two flavors".to_string())),
            price: Set(dec!(35.50)),
            category_id: Set(Some(pizzas.id)),
            max_flavors: Set(Some(2)),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("seed pizza");

        let drink = product::ActiveModel {
            name: Set("Guaraná 2L".to_string()),
            price: Set(dec!(6.00)),
            category_id: Set(Some(drinks.id)),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("seed drink");

        let catupiry = border::ActiveModel {
            name: Set("Catupiry".to_string()),
            price: Set(dec!(6.00)),
            is_available: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("seed border");

        let margherita = flavor::ActiveModel {
            name: Set("Margherita".to_string()),
            ingredients: Set(Some("Molho, mussarela, tomate, manjericão".to_string())),
            category_id: Set(Some(traditional.id)),
            is_available: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("seed flavor");

        let calabresa = flavor::ActiveModel {
            name: Set("Calabresa".to_string()),
            ingredients: Set(Some("Molho, mussarela, calabresa, cebola".to_string())),
            category_id: Set(Some(traditional.id)),
            is_available: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("seed flavor");

        CatalogFixture {
            pizza,
            drink,
            catupiry,
            margherita,
            calabresa,
        }
    }
}

pub struct CatalogFixture {
    pub pizza: product::Model,
    pub drink: product::Model,
    pub catupiry: border::Model,
    pub margherita: flavor::Model,
    pub calabresa: flavor::Model,
}

async fn seed_user(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> user::Model {
    user::ActiveModel {
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(hash_password(password).expect("hash password")),
        role: Set(role.to_string()),
        ..Default::default()
    }
    .insert(&*state.db)
    .await
    .expect("seed user")
}
