use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::common::{created_response, success_response},
    services::users::{CreateUserRequest, UpdateUserRequest, UserResponse},
    AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub token: Option<String>,
}

/// Exchange email/password credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 400, description = "Missing credentials", body = crate::errors::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ServiceError::ValidationError(
            "Email and password are required".to_string(),
        ));
    }

    let user = state
        .services
        .users
        .authenticate(&payload.email, &payload.password)
        .await?;

    let issued = state
        .services
        .auth
        .issue_token(&user)
        .map_err(|e| ServiceError::InternalError(e.to_string()))?;

    info!(user_id = user.id, "user logged in");

    Ok(success_response(LoginResponse {
        user: user.into(),
        token: issued.token,
        token_type: issued.token_type,
        expires_in: issued.expires_in,
    }))
}

/// Mint a fresh token from a still-valid one.
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let token = payload
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ServiceError::ValidationError("Token is required".to_string()))?;

    let claims = state
        .services
        .auth
        .validate_token(token)
        .map_err(|_| ServiceError::Unauthorized("Invalid or expired token".to_string()))?;

    let user_id: i32 = claims
        .sub
        .parse()
        .map_err(|_| ServiceError::Unauthorized("Invalid or expired token".to_string()))?;

    let user = state.services.users.get(user_id).await?;

    let issued = state
        .services
        .auth
        .issue_token(&user)
        .map_err(|e| ServiceError::InternalError(e.to_string()))?;

    Ok(success_response(LoginResponse {
        user: user.into(),
        token: issued.token,
        token_type: issued.token_type,
        expires_in: issued.expires_in,
    }))
}

/// Current user, resolved from the verified token.
pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.services.users.get(auth_user.user_id).await?;
    Ok(success_response(UserResponse::from(user)))
}

/// Token invalidation happens client-side; the endpoint exists so the admin
/// UI has something to call.
pub async fn logout(Extension(auth_user): Extension<AuthUser>) -> impl IntoResponse {
    info!(user_id = auth_user.user_id, "user logged out");
    success_response(serde_json::json!({ "message": "Logout successful" }))
}

/// List staff accounts (admin).
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let users = state.services.users.list().await?;
    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(success_response(users))
}

/// Create a staff account (admin).
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.services.users.create(payload).await?;
    Ok(created_response(UserResponse::from(user)))
}

/// Update a staff account (admin).
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.services.users.update(id, payload).await?;
    Ok(success_response(UserResponse::from(user)))
}

/// Delete a staff account (admin); self-deletion is refused.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .users
        .delete(id, auth_user.user_id)
        .await?;
    Ok(success_response(serde_json::json!({
        "message": "User deleted successfully"
    })))
}
