mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn product_crud_and_category_filter() {
    let app = TestApp::new().await;

    let (status, category) = app
        .admin(
            Method::POST,
            "/api/categories",
            Some(json!({ "name": "Pizzas", "slug": "pizzas" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let category_id = category["id"].as_i64().expect("category id");

    let (status, product) = app
        .admin(
            Method::POST,
            "/api/products",
            Some(json!({
                "name": "Pizza Média",
                "description": "Até dois sabores",
                "price": "29.50",
                "category_id": category_id,
                "max_flavors": 2
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "body: {product}");
    let product_id = product["id"].as_i64().expect("product id");

    // Public list carries the joined category name.
    let (status, listed) = app.public(Method::GET, "/api/products", None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = listed.as_array().expect("products");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["category_name"], "Pizzas");

    // Slug filter.
    let (_, filtered) = app
        .public(Method::GET, "/api/products?category=pizzas", None)
        .await;
    assert_eq!(filtered.as_array().expect("products").len(), 1);
    let (_, empty) = app
        .public(Method::GET, "/api/products?category=sobremesas", None)
        .await;
    assert_eq!(empty.as_array().expect("products").len(), 0);

    // Partial update keeps unspecified fields.
    let (status, updated) = app
        .admin(
            Method::PUT,
            &format!("/api/products/{product_id}"),
            Some(json!({ "price": "31.00" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Pizza Média");

    // Mutations require the admin gate.
    let (status, _) = app
        .public(
            Method::POST,
            "/api/products",
            Some(json!({ "name": "X", "price": "1.00" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .admin(Method::DELETE, &format!("/api/products/{product_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .public(Method::GET, &format!("/api/products/{product_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_category_slugs_conflict() {
    let app = TestApp::new().await;

    let body = json!({ "name": "Bebidas", "slug": "bebidas" });
    let (status, _) = app
        .admin(Method::POST, "/api/categories", Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.admin(Method::POST, "/api/categories", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn categories_with_products_cannot_be_deleted() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;

    let category_id = catalog.pizza.category_id.expect("category id");
    let (status, _) = app
        .admin(Method::DELETE, &format!("/api/categories/{category_id}"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn flavor_availability_toggle_flips_the_flag() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;

    let uri = format!("/api/flavors/{}/toggle", catalog.margherita.id);

    let (status, toggled) = app.admin(Method::PATCH, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["is_available"], false);

    let (status, toggled) = app.admin(Method::PATCH, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["is_available"], true);

    let (status, _) = app.admin(Method::PATCH, "/api/flavors/999999/toggle", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn flavor_category_listing_and_creation() {
    let app = TestApp::new().await;
    app.seed_catalog().await;

    let (status, listed) = app.public(Method::GET, "/api/categories/flavors", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().expect("flavor categories").len(), 1);

    let (status, _) = app
        .admin(
            Method::POST,
            "/api/categories/flavors",
            Some(json!({ "name": "Doces", "slug": "doces" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, listed) = app.public(Method::GET, "/api/categories/flavors", None).await;
    assert_eq!(listed.as_array().expect("flavor categories").len(), 2);
}

#[tokio::test]
async fn borders_in_use_by_orders_cannot_be_deleted() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;

    let payload = json!({
        "customer_name": "Cliente",
        "customer_phone": "5511900004444",
        "delivery_method": "pickup",
        "payment_method": "pix",
        "total_price": "41.50",
        "items": [
            {
                "product_id": catalog.pizza.id,
                "quantity": 1,
                "price": "35.50",
                "border": { "id": catalog.catupiry.id, "price": "6.00" }
            }
        ]
    });
    let (status, _) = app.public(Method::POST, "/api/orders", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .admin(
            Method::DELETE,
            &format!("/api/borders/{}", catalog.catupiry.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "body: {body}");

    // An unused border deletes fine.
    let (_, created) = app
        .admin(
            Method::POST,
            "/api/borders",
            Some(json!({ "name": "Cheddar", "price": "7.00" })),
        )
        .await;
    let unused_id = created["id"].as_i64().expect("border id");
    let (status, _) = app
        .admin(Method::DELETE, &format!("/api/borders/{unused_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn settings_are_public_to_read_and_admin_to_change() {
    let app = TestApp::new().await;

    let (status, settings) = app.public(Method::GET, "/api/settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(settings["payment_methods"].as_array().expect("methods").len() >= 4);

    let (status, _) = app
        .public(
            Method::PUT,
            "/api/settings",
            Some(json!({ "delivery_fee": "9.00" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, updated) = app
        .admin(
            Method::PUT,
            "/api/settings",
            Some(json!({ "delivery_fee": "9.00", "business_name": "Pizzaria Nova" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["business_name"], "Pizzaria Nova");

    let (_, settings) = app.public(Method::GET, "/api/settings", None).await;
    assert_eq!(settings["business_name"], "Pizzaria Nova");
}

#[tokio::test]
async fn neighborhoods_can_be_listed_and_extended() {
    let app = TestApp::new().await;

    let (status, before) = app
        .public(Method::GET, "/api/settings/neighborhoods", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let count_before = before.as_array().expect("neighborhoods").len();

    let (status, _) = app
        .admin(
            Method::POST,
            "/api/settings/neighborhoods",
            Some(json!({ "name": "Ouro Branco" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Duplicates conflict, missing names are invalid.
    let (status, _) = app
        .admin(
            Method::POST,
            "/api/settings/neighborhoods",
            Some(json!({ "name": "ouro branco" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .admin(Method::POST, "/api/settings/neighborhoods", Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, after) = app
        .public(Method::GET, "/api/settings/neighborhoods", None)
        .await;
    assert_eq!(after.as_array().expect("neighborhoods").len(), count_before + 1);
}
