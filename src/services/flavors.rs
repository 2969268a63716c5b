use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{flavor, flavor_category},
    errors::ServiceError,
};

/// Flavor row joined with its category name.
#[derive(Debug, Serialize, FromQueryResult)]
pub struct FlavorWithCategory {
    pub id: i32,
    pub name: String,
    pub ingredients: Option<String>,
    pub category_id: Option<i32>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub category_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFlavorRequest {
    #[validate(length(min = 1, message = "Flavor name is required"))]
    pub name: String,
    pub ingredients: Option<String>,
    pub category_id: Option<i32>,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateFlavorRequest {
    pub name: Option<String>,
    pub ingredients: Option<String>,
    pub category_id: Option<i32>,
    pub is_available: Option<bool>,
}

/// Pizza flavor management.
#[derive(Clone)]
pub struct FlavorService {
    db: Arc<DbPool>,
}

impl FlavorService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        category_slug: Option<&str>,
    ) -> Result<Vec<FlavorWithCategory>, ServiceError> {
        let mut query = joined_query().order_by_asc(flavor::Column::Name);
        if let Some(slug) = category_slug {
            query = query.filter(flavor_category::Column::Slug.eq(slug));
        }
        Ok(query
            .into_model::<FlavorWithCategory>()
            .all(&*self.db)
            .await?)
    }

    pub async fn get(&self, id: i32) -> Result<FlavorWithCategory, ServiceError> {
        joined_query()
            .filter(flavor::Column::Id.eq(id))
            .into_model::<FlavorWithCategory>()
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Flavor {id} not found")))
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(&self, request: CreateFlavorRequest) -> Result<flavor::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let model = flavor::ActiveModel {
            name: Set(request.name),
            ingredients: Set(request.ingredients),
            category_id: Set(request.category_id),
            is_available: Set(request.is_available),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                ServiceError::ValidationError("Referenced flavor category does not exist".to_string())
            }
            _ => ServiceError::DatabaseError(e),
        })?;

        info!(flavor_id = model.id, "flavor created");
        Ok(model)
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: i32,
        request: UpdateFlavorRequest,
    ) -> Result<flavor::Model, ServiceError> {
        let existing = flavor::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Flavor {id} not found")))?;

        let mut active: flavor::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(ingredients) = request.ingredients {
            active.ingredients = Set(Some(ingredients));
        }
        if let Some(category_id) = request.category_id {
            active.category_id = Set(Some(category_id));
        }
        if let Some(is_available) = request.is_available {
            active.is_available = Set(is_available);
        }
        active.updated_at = Set(Some(Utc::now()));

        Ok(active.update(&*self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                ServiceError::ValidationError("Referenced flavor category does not exist".to_string())
            }
            _ => ServiceError::DatabaseError(e),
        })?)
    }

    /// Flips the availability flag; unavailable flavors stay in the catalog
    /// but are hidden from the storefront.
    #[instrument(skip(self))]
    pub async fn toggle_availability(&self, id: i32) -> Result<flavor::Model, ServiceError> {
        let existing = flavor::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Flavor {id} not found")))?;

        let next = !existing.is_available;
        let mut active: flavor::ActiveModel = existing.into();
        active.is_available = Set(next);
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&*self.db).await?;
        info!(flavor_id = id, is_available = updated.is_available, "flavor availability toggled");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<flavor::Model, ServiceError> {
        let existing = flavor::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Flavor {id} not found")))?;

        let deleted = existing.clone();
        existing
            .delete(&*self.db)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::ForeignKeyConstraintViolation(_)) => ServiceError::Conflict(
                    "Flavor is referenced by existing orders and cannot be deleted".to_string(),
                ),
                _ => ServiceError::DatabaseError(e),
            })?;

        info!(flavor_id = id, "flavor deleted");
        Ok(deleted)
    }
}

fn joined_query() -> sea_orm::Select<flavor::Entity> {
    flavor::Entity::find()
        .select_only()
        .columns([
            flavor::Column::Id,
            flavor::Column::Name,
            flavor::Column::Ingredients,
            flavor::Column::CategoryId,
            flavor::Column::IsAvailable,
            flavor::Column::CreatedAt,
            flavor::Column::UpdatedAt,
        ])
        .column_as(flavor_category::Column::Name, "category_name")
        .join(JoinType::LeftJoin, flavor::Relation::FlavorCategory.def())
}
