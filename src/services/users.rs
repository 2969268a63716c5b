use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    auth::{hash_password, verify_password},
    db::DbPool,
    entities::user,
    errors::ServiceError,
};

const VALID_ROLES: &[&str] = &["admin", "user"];

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    /// Defaults to `user` when absent.
    pub role: Option<String>,
}

/// Partial update; absent fields keep their stored value. A provided password
/// is re-hashed before storage.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// User row without the password hash, as returned to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: Option<chrono::DateTime<Utc>>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Staff account management and credential verification.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DbPool>,
}

impl UserService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Verifies email/password credentials. Both unknown email and wrong
    /// password collapse to the same error so the response does not reveal
    /// which one failed.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<user::Model, ServiceError> {
        let invalid = || ServiceError::Unauthorized("Invalid credentials".to_string());

        let user_model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                warn!("login attempt for unknown email");
                invalid()
            })?;

        let valid = verify_password(&user_model.password_hash, password)
            .map_err(|e| ServiceError::HashError(e.to_string()))?;
        if !valid {
            warn!(user_id = user_model.id, "login attempt with wrong password");
            return Err(invalid());
        }

        Ok(user_model)
    }

    pub async fn get(&self, id: i32) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {id} not found")))
    }

    pub async fn list(&self) -> Result<Vec<user::Model>, ServiceError> {
        Ok(user::Entity::find()
            .order_by_asc(user::Column::Id)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create(&self, request: CreateUserRequest) -> Result<user::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let role = request.role.unwrap_or_else(|| "user".to_string());
        validate_role(&role)?;

        let password_hash =
            hash_password(&request.password).map_err(|e| ServiceError::HashError(e.to_string()))?;

        let model = user::ActiveModel {
            name: Set(request.name),
            email: Set(request.email),
            password_hash: Set(password_hash),
            role: Set(role),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(unique_email_conflict)?;

        info!(user_id = model.id, "user created");
        Ok(model)
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: i32,
        request: UpdateUserRequest,
    ) -> Result<user::Model, ServiceError> {
        let existing = self.get(id).await?;

        if let Some(role) = &request.role {
            validate_role(role)?;
        }

        let mut active: user::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(email) = request.email {
            active.email = Set(email);
        }
        if let Some(password) = request.password {
            if password.len() < 6 {
                return Err(ServiceError::ValidationError(
                    "Password must be at least 6 characters".to_string(),
                ));
            }
            let password_hash =
                hash_password(&password).map_err(|e| ServiceError::HashError(e.to_string()))?;
            active.password_hash = Set(password_hash);
        }
        if let Some(role) = request.role {
            active.role = Set(role);
        }
        active.updated_at = Set(Some(Utc::now()));

        Ok(active.update(&*self.db).await.map_err(unique_email_conflict)?)
    }

    /// Deletes a user; a user can never delete their own account.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32, acting_user_id: i32) -> Result<(), ServiceError> {
        if id == acting_user_id {
            return Err(ServiceError::ValidationError(
                "You cannot delete your own account".to_string(),
            ));
        }

        let existing = self.get(id).await?;
        existing.delete(&*self.db).await?;

        info!(user_id = id, "user deleted");
        Ok(())
    }
}

fn validate_role(role: &str) -> Result<(), ServiceError> {
    if VALID_ROLES.contains(&role) {
        Ok(())
    } else {
        Err(ServiceError::ValidationError(format!(
            "Invalid role '{role}'; valid roles are: {VALID_ROLES:?}"
        )))
    }
}

fn unique_email_conflict(e: sea_orm::DbErr) -> ServiceError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            ServiceError::Conflict("Email is already in use".to_string())
        }
        _ => ServiceError::DatabaseError(e),
    }
}
