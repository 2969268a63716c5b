pub mod auth;
pub mod borders;
pub mod categories;
pub mod common;
pub mod flavors;
pub mod health;
pub mod orders;
pub mod products;
pub mod settings;

use std::sync::Arc;

use crate::auth::AuthService;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    borders::BorderService, categories::CategoryService, flavors::FlavorService,
    order_status::OrderStatusService, orders::OrderService, products::ProductService,
    settings::SettingsStore, stats::StatsService, users::UserService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub order_status: Arc<OrderStatusService>,
    pub stats: Arc<StatsService>,
    pub products: Arc<ProductService>,
    pub flavors: Arc<FlavorService>,
    pub borders: Arc<BorderService>,
    pub categories: Arc<CategoryService>,
    pub users: Arc<UserService>,
    pub settings: Arc<SettingsStore>,
    pub auth: Arc<AuthService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        auth: Arc<AuthService>,
    ) -> Self {
        Self {
            orders: Arc::new(OrderService::new(db.clone(), event_sender.clone())),
            order_status: Arc::new(OrderStatusService::new(db.clone(), event_sender)),
            stats: Arc::new(StatsService::new(db.clone())),
            products: Arc::new(ProductService::new(db.clone())),
            flavors: Arc::new(FlavorService::new(db.clone())),
            borders: Arc::new(BorderService::new(db.clone())),
            categories: Arc::new(CategoryService::new(db.clone())),
            users: Arc::new(UserService::new(db)),
            settings: Arc::new(SettingsStore::new()),
            auth,
        }
    }
}
