use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI document for the order workflow and auth surface.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::order_stats,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::auth::login,
        crate::handlers::health::health,
    ),
    components(schemas(
        crate::services::orders::CreateOrderRequest,
        crate::services::orders::CreateOrderItem,
        crate::services::orders::BorderSelection,
        crate::handlers::orders::UpdateOrderStatusRequest,
        crate::handlers::auth::LoginRequest,
        crate::handlers::auth::LoginResponse,
        crate::services::users::UserResponse,
        crate::errors::ErrorResponse,
        crate::models::DeliveryMethod,
        crate::models::PaymentMethod,
        crate::models::OrderStatus,
    )),
    tags(
        (name = "orders", description = "Order placement and back-office management"),
        (name = "auth", description = "Authentication and staff accounts"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at /docs.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
