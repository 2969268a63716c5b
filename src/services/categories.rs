use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{category, flavor_category, product},
    errors::ServiceError,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, message = "Category name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Category slug is required"))]
    pub slug: String,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
}

/// Product and flavor category management.
#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DbPool>,
}

impl CategoryService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<category::Model>, ServiceError> {
        Ok(category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?)
    }

    pub async fn get(&self, id: i32) -> Result<category::Model, ServiceError> {
        category::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {id} not found")))
    }

    #[instrument(skip(self, request), fields(slug = %request.slug))]
    pub async fn create(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<category::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let model = category::ActiveModel {
            name: Set(request.name),
            slug: Set(request.slug),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(unique_slug_conflict)?;

        info!(category_id = model.id, "category created");
        Ok(model)
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: i32,
        request: UpdateCategoryRequest,
    ) -> Result<category::Model, ServiceError> {
        if request.name.is_none() && request.slug.is_none() {
            return Err(ServiceError::ValidationError(
                "At least one field must be provided".to_string(),
            ));
        }

        let existing = self.get(id).await?;

        let mut active: category::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(slug) = request.slug {
            active.slug = Set(slug);
        }
        active.updated_at = Set(Some(Utc::now()));

        Ok(active.update(&*self.db).await.map_err(unique_slug_conflict)?)
    }

    /// Deletes a category unless products still reference it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<category::Model, ServiceError> {
        let existing = self.get(id).await?;

        let in_use = product::Entity::find()
            .filter(product::Column::CategoryId.eq(id))
            .count(&*self.db)
            .await?;
        if in_use > 0 {
            return Err(ServiceError::Conflict(
                "Category has associated products and cannot be deleted".to_string(),
            ));
        }

        let deleted = existing.clone();
        existing.delete(&*self.db).await?;

        info!(category_id = id, "category deleted");
        Ok(deleted)
    }

    pub async fn list_flavor_categories(&self) -> Result<Vec<flavor_category::Model>, ServiceError> {
        Ok(flavor_category::Entity::find()
            .order_by_asc(flavor_category::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, request), fields(slug = %request.slug))]
    pub async fn create_flavor_category(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<flavor_category::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let model = flavor_category::ActiveModel {
            name: Set(request.name),
            slug: Set(request.slug),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(unique_slug_conflict)?;

        info!(flavor_category_id = model.id, "flavor category created");
        Ok(model)
    }
}

fn unique_slug_conflict(e: sea_orm::DbErr) -> ServiceError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            ServiceError::Conflict("A category with this slug already exists".to_string())
        }
        _ => ServiceError::DatabaseError(e),
    }
}
