use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
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
    entities::{category, product},
    errors::ServiceError,
};

/// Product row joined with its category name, as the storefront consumes it.
#[derive(Debug, Serialize, FromQueryResult)]
pub struct ProductWithCategory {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image: Option<String>,
    pub category_id: Option<i32>,
    pub max_flavors: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub category_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image: Option<String>,
    pub category_id: Option<i32>,
    pub max_flavors: Option<i32>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
    pub category_id: Option<i32>,
    pub max_flavors: Option<i32>,
}

/// Catalog product management.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DbPool>,
}

impl ProductService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        category_slug: Option<&str>,
    ) -> Result<Vec<ProductWithCategory>, ServiceError> {
        let mut query = joined_query().order_by_asc(product::Column::Name);
        if let Some(slug) = category_slug {
            query = query.filter(category::Column::Slug.eq(slug));
        }
        Ok(query
            .into_model::<ProductWithCategory>()
            .all(&*self.db)
            .await?)
    }

    pub async fn get(&self, id: i32) -> Result<ProductWithCategory, ServiceError> {
        joined_query()
            .filter(product::Column::Id.eq(id))
            .into_model::<ProductWithCategory>()
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {id} not found")))
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(
        &self,
        request: CreateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        if request.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price cannot be negative".to_string(),
            ));
        }

        let model = product::ActiveModel {
            name: Set(request.name),
            description: Set(request.description),
            price: Set(request.price),
            image: Set(request.image),
            category_id: Set(request.category_id),
            max_flavors: Set(request.max_flavors),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                ServiceError::ValidationError("Referenced category does not exist".to_string())
            }
            _ => ServiceError::DatabaseError(e),
        })?;

        info!(product_id = model.id, "product created");
        Ok(model)
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: i32,
        request: UpdateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        let existing = product::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {id} not found")))?;

        if let Some(price) = request.price {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Price cannot be negative".to_string(),
                ));
            }
        }

        let mut active: product::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(price) = request.price {
            active.price = Set(price);
        }
        if let Some(image) = request.image {
            active.image = Set(Some(image));
        }
        if let Some(category_id) = request.category_id {
            active.category_id = Set(Some(category_id));
        }
        if let Some(max_flavors) = request.max_flavors {
            active.max_flavors = Set(Some(max_flavors));
        }
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&*self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                ServiceError::ValidationError("Referenced category does not exist".to_string())
            }
            _ => ServiceError::DatabaseError(e),
        })?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<product::Model, ServiceError> {
        let existing = product::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {id} not found")))?;

        let deleted = existing.clone();
        existing
            .delete(&*self.db)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::ForeignKeyConstraintViolation(_)) => ServiceError::Conflict(
                    "Product is referenced by existing orders and cannot be deleted".to_string(),
                ),
                _ => ServiceError::DatabaseError(e),
            })?;

        info!(product_id = id, "product deleted");
        Ok(deleted)
    }
}

fn joined_query() -> sea_orm::Select<product::Entity> {
    product::Entity::find()
        .select_only()
        .columns([
            product::Column::Id,
            product::Column::Name,
            product::Column::Description,
            product::Column::Price,
            product::Column::Image,
            product::Column::CategoryId,
            product::Column::MaxFlavors,
            product::Column::CreatedAt,
            product::Column::UpdatedAt,
        ])
        .column_as(category::Column::Name, "category_name")
        .join(JoinType::LeftJoin, product::Relation::Category.def())
}
