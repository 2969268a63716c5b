use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Join table between an order item and a selected flavor.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_item_flavors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub order_item_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub flavor_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order_item::Entity",
        from = "Column::OrderItemId",
        to = "super::order_item::Column::Id"
    )]
    OrderItem,
    #[sea_orm(
        belongs_to = "super::flavor::Entity",
        from = "Column::FlavorId",
        to = "super::flavor::Column::Id"
    )]
    Flavor,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl Related<super::flavor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Flavor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
