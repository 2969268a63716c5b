use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One purchased product instance within an order. Unit and border prices are
/// captured at order time and stay fixed when the catalog changes later.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub price: Decimal,
    pub total_price: Decimal,
    pub border_id: Option<i32>,
    pub border_price: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::border::Entity",
        from = "Column::BorderId",
        to = "super::border::Column::Id"
    )]
    Border,
    #[sea_orm(has_many = "super::order_item_flavor::Entity")]
    OrderItemFlavor,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::border::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Border.def()
    }
}

impl Related<super::order_item_flavor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItemFlavor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Line total as captured at order time.
    pub fn computed_total(&self) -> Decimal {
        let qty = Decimal::from(self.quantity);
        self.price * qty + self.border_price.unwrap_or_default() * qty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(price: Decimal, quantity: i32, border_price: Option<Decimal>) -> Model {
        Model {
            id: 1,
            order_id: 1,
            product_id: 1,
            quantity,
            price,
            total_price: Decimal::ZERO,
            border_id: border_price.map(|_| 1),
            border_price,
        }
    }

    #[test]
    fn computed_total_includes_border_per_unit() {
        let model = item(dec!(35.50), 2, Some(dec!(6.00)));
        assert_eq!(model.computed_total(), dec!(83.00));
    }

    #[test]
    fn computed_total_without_border() {
        let model = item(dec!(12.00), 3, None);
        assert_eq!(model.computed_total(), dec!(36.00));
    }
}
