use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{border, order_item},
    errors::ServiceError,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBorderRequest {
    #[validate(length(min = 1, message = "Border name is required"))]
    pub name: String,
    pub price: Decimal,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateBorderRequest {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub is_available: Option<bool>,
}

/// Stuffed-crust option management.
#[derive(Clone)]
pub struct BorderService {
    db: Arc<DbPool>,
}

impl BorderService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<border::Model>, ServiceError> {
        Ok(border::Entity::find()
            .order_by_asc(border::Column::Name)
            .all(&*self.db)
            .await?)
    }

    pub async fn get(&self, id: i32) -> Result<border::Model, ServiceError> {
        border::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Border {id} not found")))
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(&self, request: CreateBorderRequest) -> Result<border::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        if request.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price cannot be negative".to_string(),
            ));
        }

        let model = border::ActiveModel {
            name: Set(request.name),
            price: Set(request.price),
            is_available: Set(request.is_available),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(border_id = model.id, "border created");
        Ok(model)
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: i32,
        request: UpdateBorderRequest,
    ) -> Result<border::Model, ServiceError> {
        let existing = self.get(id).await?;

        if let Some(price) = request.price {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Price cannot be negative".to_string(),
                ));
            }
        }

        let mut active: border::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(price) = request.price {
            active.price = Set(price);
        }
        if let Some(is_available) = request.is_available {
            active.is_available = Set(is_available);
        }
        active.updated_at = Set(Some(Utc::now()));

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn toggle_availability(&self, id: i32) -> Result<border::Model, ServiceError> {
        let existing = self.get(id).await?;
        let next = !existing.is_available;

        let mut active: border::ActiveModel = existing.into();
        active.is_available = Set(next);
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&*self.db).await?;
        info!(border_id = id, is_available = updated.is_available, "border availability toggled");
        Ok(updated)
    }

    /// Deletes a border unless order items still reference it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<border::Model, ServiceError> {
        let existing = self.get(id).await?;

        let in_use = order_item::Entity::find()
            .filter(order_item::Column::BorderId.eq(id))
            .count(&*self.db)
            .await?;
        if in_use > 0 {
            return Err(ServiceError::Conflict(
                "Border is referenced by existing orders and cannot be deleted".to_string(),
            ));
        }

        let deleted = existing.clone();
        existing.delete(&*self.db).await?;

        info!(border_id = id, "border deleted");
        Ok(deleted)
    }
}
