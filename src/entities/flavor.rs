use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

/// Pizza flavor; attached to order items by exact-name resolution at order
/// creation time.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "flavors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub ingredients: Option<String>,
    pub category_id: Option<i32>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::flavor_category::Entity",
        from = "Column::CategoryId",
        to = "super::flavor_category::Column::Id"
    )]
    FlavorCategory,
    #[sea_orm(has_many = "super::order_item_flavor::Entity")]
    OrderItemFlavor,
}

impl Related<super::flavor_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FlavorCategory.def()
    }
}

impl Related<super::order_item_flavor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItemFlavor.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(now);
            }
        }

        if let ActiveValue::NotSet = active_model.updated_at {
            active_model.updated_at = Set(Some(now));
        }

        Ok(active_model)
    }
}
