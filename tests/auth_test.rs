mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{TestApp, ADMIN_EMAIL, ADMIN_PASSWORD, STAFF_EMAIL, STAFF_PASSWORD};

#[tokio::test]
async fn admin_routes_reject_missing_and_non_admin_credentials() {
    let app = TestApp::new().await;

    // No token at all -> 401 before any handler logic.
    let (status, _) = app.public(Method::GET, "/api/orders", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Garbage token -> 401.
    let (status, _) = app
        .request(Method::GET, "/api/orders", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Valid token, wrong role -> 403.
    let (status, _) = app.as_staff(Method::GET, "/api/orders", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin -> 200.
    let (status, _) = app.admin(Method::GET, "/api/orders", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn login_verifies_credentials_and_returns_a_usable_token() {
    let app = TestApp::new().await;

    let (status, body) = app
        .public(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["user"]["email"], ADMIN_EMAIL);
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["user"]["password_hash"].is_null());

    let token = body["token"].as_str().expect("token");
    let (status, me) = app.request(Method::GET, "/api/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], ADMIN_EMAIL);
}

#[tokio::test]
async fn login_rejects_bad_credentials_uniformly() {
    let app = TestApp::new().await;

    // Wrong password and unknown email look identical to the caller.
    let (status, _) = app
        .public(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": ADMIN_EMAIL, "password": "errada" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .public(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "ghost@example.com", "password": "qualquer" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .public(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "", "password": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn refresh_token_mints_a_new_credential_from_a_valid_one() {
    let app = TestApp::new().await;

    let (_, login) = app
        .public(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": STAFF_EMAIL, "password": STAFF_PASSWORD })),
        )
        .await;
    let token = login["token"].as_str().expect("token").to_string();

    let (status, refreshed) = app
        .public(
            Method::POST,
            "/api/auth/refresh-token",
            Some(json!({ "token": token })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let new_token = refreshed["token"].as_str().expect("new token");
    let (status, me) = app
        .request(Method::GET, "/api/auth/me", Some(new_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], STAFF_EMAIL);

    // Invalid and missing tokens are rejected.
    let (status, _) = app
        .public(
            Method::POST,
            "/api/auth/refresh-token",
            Some(json!({ "token": "rubbish" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .public(Method::POST, "/api/auth/refresh-token", Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn user_management_is_admin_only() {
    let app = TestApp::new().await;

    let payload = json!({
        "name": "Novo Atendente",
        "email": "atendente@example.com",
        "password": "senha-do-atendente",
        "role": "user"
    });

    // Non-admin staff cannot manage users.
    let (status, _) = app
        .as_staff(Method::POST, "/api/auth/users", Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = app
        .admin(Method::POST, "/api/auth/users", Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED, "body: {created}");
    assert_eq!(created["email"], "atendente@example.com");
    let new_id = created["id"].as_i64().expect("user id");

    // Duplicate email conflicts.
    let (status, _) = app
        .admin(Method::POST, "/api/auth/users", Some(payload))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The new user can log in.
    let (status, _) = app
        .public(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "atendente@example.com", "password": "senha-do-atendente" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Update re-hashes the password.
    let (status, _) = app
        .admin(
            Method::PUT,
            &format!("/api/auth/users/{new_id}"),
            Some(json!({ "password": "senha-trocada" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .public(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "atendente@example.com", "password": "senha-trocada" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Listing shows the three accounts.
    let (status, listed) = app.admin(Method::GET, "/api/auth/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().expect("users").len(), 3);

    let (status, _) = app
        .admin(Method::DELETE, &format!("/api/auth/users/{new_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .admin(Method::DELETE, "/api/auth/users/424242", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn users_cannot_delete_their_own_account() {
    let app = TestApp::new().await;

    let (_, me) = app.admin(Method::GET, "/api/auth/me", None).await;
    let my_id = me["id"].as_i64().expect("user id");

    let (status, body) = app
        .admin(Method::DELETE, &format!("/api/auth/users/{my_id}"), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .expect("message")
        .contains("own account"));
}

#[tokio::test]
async fn invalid_roles_are_rejected() {
    let app = TestApp::new().await;

    let (status, _) = app
        .admin(
            Method::POST,
            "/api/auth/users",
            Some(json!({
                "name": "Root",
                "email": "root@example.com",
                "password": "senha-forte",
                "role": "root"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
