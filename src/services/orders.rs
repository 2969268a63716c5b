use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{border, flavor, order, order_item, order_item_flavor, product},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{DeliveryMethod, OrderStatus, PaymentMethod},
};

/// Attempts at inserting a generated order reference before giving up.
/// References are timestamp+random, so one regeneration is nearly always
/// enough; the bound keeps a broken clock from looping forever.
const MAX_ORDER_REF_ATTEMPTS: u32 = 3;

/// Payload accepted by the public order endpoint.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    /// Caller-supplied order reference; generated when absent.
    pub order_id: Option<String>,

    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,

    #[validate(length(min = 1, message = "Customer phone is required"))]
    pub customer_phone: String,

    pub delivery_method: DeliveryMethod,
    pub payment_method: PaymentMethod,

    pub address: Option<String>,
    pub address_number: Option<String>,
    pub neighborhood: Option<String>,
    pub complement: Option<String>,
    pub reference: Option<String>,
    pub table_number: Option<String>,
    pub change_for: Option<Decimal>,
    pub observations: Option<String>,

    pub total_price: Decimal,
    #[serde(default)]
    pub delivery_fee: Decimal,

    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<CreateOrderItem>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateOrderItem {
    #[serde(alias = "id")]
    pub product_id: i32,
    pub quantity: i32,
    /// Unit price as shown to the customer, captured verbatim on the item.
    pub price: Decimal,
    pub border: Option<BorderSelection>,
    #[serde(default, alias = "selectedFlavors")]
    pub flavors: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct BorderSelection {
    pub id: i32,
    pub price: Decimal,
}

/// Filters for the admin order listing.
#[derive(Debug, Default)]
pub struct OrderListFilter {
    pub status: Option<OrderStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Order row plus its item count, as returned by the admin listing.
#[derive(Debug, Serialize, FromQueryResult)]
pub struct OrderSummary {
    pub id: i32,
    pub order_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub delivery_method: String,
    pub payment_method: String,
    pub address: Option<String>,
    pub address_number: Option<String>,
    pub neighborhood: Option<String>,
    pub complement: Option<String>,
    pub reference: Option<String>,
    pub table_number: Option<String>,
    pub change_for: Option<Decimal>,
    pub observations: Option<String>,
    pub status: String,
    pub total_price: Decimal,
    pub delivery_fee: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub item_count: i64,
}

/// Full order with nested items and flavors.
#[derive(Debug, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<OrderItemDetails>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemDetails {
    #[serde(flatten)]
    pub item: order_item::Model,
    pub product_name: Option<String>,
    pub product_description: Option<String>,
    pub product_image: Option<String>,
    pub border_name: Option<String>,
    pub flavors: Vec<FlavorRef>,
}

#[derive(Debug, Serialize)]
pub struct FlavorRef {
    pub name: String,
    pub ingredients: Option<String>,
}

/// Service for placing and reading orders.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    /// Atomically persists an order together with its items and each item's
    /// resolvable flavor associations. Either the full order graph exists
    /// afterwards or none of it does.
    #[instrument(skip(self, request), fields(customer = %request.customer_name, items = request.items.len()))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<order::Model, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        validate_order_rules(&request)?;

        let supplied_ref = request.order_id.clone();
        let mut attempts = if supplied_ref.is_some() {
            1
        } else {
            MAX_ORDER_REF_ATTEMPTS
        };

        loop {
            let order_ref = supplied_ref.clone().unwrap_or_else(generate_order_ref);

            let txn = self.db.begin().await.map_err(|e| {
                error!(error = %e, "failed to start order creation transaction");
                ServiceError::DatabaseError(e)
            })?;

            match insert_order_graph(&txn, &request, &order_ref).await {
                Ok(order_model) => {
                    txn.commit().await.map_err(|e| {
                        error!(error = %e, order_ref = %order_ref, "failed to commit order creation");
                        ServiceError::DatabaseError(e)
                    })?;

                    info!(
                        order_id = order_model.id,
                        order_ref = %order_model.order_id,
                        total = %order_model.total_price,
                        "order created"
                    );

                    if let Some(sender) = &self.event_sender {
                        let event = Event::OrderCreated {
                            order_id: order_model.id,
                            order_ref: order_model.order_id.clone(),
                        };
                        if let Err(e) = sender.send(event).await {
                            warn!(error = %e, "failed to publish order created event");
                        }
                    }

                    return Ok(order_model);
                }
                Err(e) => {
                    // The transaction rolls back in full; no partial order
                    // graph is ever visible.
                    txn.rollback().await.ok();

                    let unique_violation =
                        matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)));

                    if unique_violation {
                        if supplied_ref.is_some() {
                            return Err(ServiceError::Conflict(format!(
                                "Order reference {order_ref} already exists"
                            )));
                        }
                        attempts -= 1;
                        if attempts > 0 {
                            warn!(order_ref = %order_ref, "order reference collision, regenerating");
                            continue;
                        }
                    }

                    error!(error = %e, "failed to create order");
                    return Err(ServiceError::DatabaseError(e));
                }
            }
        }
    }

    /// Retrieves an order with its items, each carrying product and border
    /// details plus the selected flavors.
    #[instrument(skip(self))]
    pub async fn get_order(&self, id: i32) -> Result<Option<OrderDetails>, ServiceError> {
        let db = &*self.db;

        let Some(order_model) = order::Entity::find_by_id(id).one(db).await? else {
            return Ok(None);
        };

        let item_rows = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_model.id))
            .find_also_related(product::Entity)
            .all(db)
            .await?;

        let mut items = Vec::with_capacity(item_rows.len());
        for (item, product_model) in item_rows {
            let border_name = match item.border_id {
                Some(border_id) => border::Entity::find_by_id(border_id)
                    .one(db)
                    .await?
                    .map(|b| b.name),
                None => None,
            };

            let flavors = order_item_flavor::Entity::find()
                .filter(order_item_flavor::Column::OrderItemId.eq(item.id))
                .find_also_related(flavor::Entity)
                .all(db)
                .await?
                .into_iter()
                .filter_map(|(_, flavor_model)| flavor_model)
                .map(|f| FlavorRef {
                    name: f.name,
                    ingredients: f.ingredients,
                })
                .collect();

            items.push(OrderItemDetails {
                product_name: product_model.as_ref().map(|p| p.name.clone()),
                product_description: product_model.as_ref().and_then(|p| p.description.clone()),
                product_image: product_model.as_ref().and_then(|p| p.image.clone()),
                border_name,
                flavors,
                item,
            });
        }

        Ok(Some(OrderDetails {
            order: order_model,
            items,
        }))
    }

    /// Lists orders newest-first with their item counts, optionally filtered
    /// by status and an inclusive creation-date range.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        filter: OrderListFilter,
    ) -> Result<Vec<OrderSummary>, ServiceError> {
        let mut query = order::Entity::find()
            .select_only()
            .columns([
                order::Column::Id,
                order::Column::OrderId,
                order::Column::CustomerName,
                order::Column::CustomerPhone,
                order::Column::DeliveryMethod,
                order::Column::PaymentMethod,
                order::Column::Address,
                order::Column::AddressNumber,
                order::Column::Neighborhood,
                order::Column::Complement,
                order::Column::Reference,
                order::Column::TableNumber,
                order::Column::ChangeFor,
                order::Column::Observations,
                order::Column::Status,
                order::Column::TotalPrice,
                order::Column::DeliveryFee,
                order::Column::CreatedAt,
                order::Column::UpdatedAt,
            ])
            .column_as(order_item::Column::Id.count(), "item_count")
            .join(JoinType::LeftJoin, order::Relation::OrderItem.def())
            .group_by(order::Column::Id)
            .order_by_desc(order::Column::CreatedAt);

        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status.to_string()));
        }
        if let Some(start) = filter.start_date {
            query = query.filter(order::Column::CreatedAt.gte(day_start(start)));
        }
        if let Some(end) = filter.end_date {
            query = query.filter(order::Column::CreatedAt.lt(day_end_exclusive(end)));
        }

        Ok(query.into_model::<OrderSummary>().all(&*self.db).await?)
    }
}

/// Inserts the order row, its items and each resolvable flavor association
/// on the given transaction. Any error aborts the whole graph.
async fn insert_order_graph(
    txn: &DatabaseTransaction,
    request: &CreateOrderRequest,
    order_ref: &str,
) -> Result<order::Model, sea_orm::DbErr> {
    let order_model = order::ActiveModel {
        order_id: Set(order_ref.to_string()),
        customer_name: Set(request.customer_name.clone()),
        customer_phone: Set(request.customer_phone.clone()),
        delivery_method: Set(request.delivery_method.to_string()),
        payment_method: Set(request.payment_method.to_string()),
        address: Set(request.address.clone()),
        address_number: Set(request.address_number.clone()),
        neighborhood: Set(request.neighborhood.clone()),
        complement: Set(request.complement.clone()),
        reference: Set(request.reference.clone()),
        table_number: Set(request.table_number.clone()),
        change_for: Set(request.change_for),
        observations: Set(request.observations.clone()),
        status: Set(OrderStatus::Pending.to_string()),
        total_price: Set(request.total_price),
        delivery_fee: Set(request.delivery_fee),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    for item in &request.items {
        let item_model = order_item::ActiveModel {
            order_id: Set(order_model.id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
            price: Set(item.price),
            total_price: Set(item_total(item)),
            border_id: Set(item.border.as_ref().map(|b| b.id)),
            border_price: Set(item.border.as_ref().map(|b| b.price)),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        let mut seen_flavors = Vec::new();
        for flavor_name in &item.flavors {
            let resolved = flavor::Entity::find()
                .filter(flavor::Column::Name.eq(flavor_name.as_str()))
                .one(txn)
                .await?;

            match resolved {
                Some(flavor_model) => {
                    // A repeated name on the same item would trip the join
                    // table's composite key.
                    if seen_flavors.contains(&flavor_model.id) {
                        continue;
                    }
                    seen_flavors.push(flavor_model.id);

                    let association = order_item_flavor::ActiveModel {
                        order_item_id: Set(item_model.id),
                        flavor_id: Set(flavor_model.id),
                    };
                    order_item_flavor::Entity::insert(association)
                        .exec_without_returning(txn)
                        .await?;
                }
                // Unresolvable flavor names are skipped, not fatal; the
                // storefront sends free-text labels.
                None => {
                    warn!(flavor = %flavor_name, "skipping unknown flavor on order item");
                }
            }
        }
    }

    Ok(order_model)
}

/// Cross-field rules that the derive-level validation cannot express.
fn validate_order_rules(request: &CreateOrderRequest) -> Result<(), ServiceError> {
    if request.delivery_method.requires_address() {
        let has_address = request
            .address
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        let has_neighborhood = request
            .neighborhood
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        if !has_address || !has_neighborhood {
            return Err(ServiceError::ValidationError(
                "Address and neighborhood are required for delivery orders".to_string(),
            ));
        }
    }

    if request.delivery_method.requires_table()
        && !request
            .table_number
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    {
        return Err(ServiceError::ValidationError(
            "Table number is required for dine-in orders".to_string(),
        ));
    }

    if request.delivery_fee < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Delivery fee cannot be negative".to_string(),
        ));
    }
    if !request.delivery_method.requires_address() && !request.delivery_fee.is_zero() {
        return Err(ServiceError::ValidationError(
            "Delivery fee only applies to delivery orders".to_string(),
        ));
    }

    if request.change_for.is_some() && request.payment_method != PaymentMethod::Cash {
        return Err(ServiceError::ValidationError(
            "Change amount only applies to cash payments".to_string(),
        ));
    }

    for item in &request.items {
        if item.quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Item quantity must be a positive integer".to_string(),
            ));
        }
        if item.price < Decimal::ZERO
            || item.border.as_ref().is_some_and(|b| b.price < Decimal::ZERO)
        {
            return Err(ServiceError::ValidationError(
                "Item prices cannot be negative".to_string(),
            ));
        }
    }

    // The submitted total is never trusted: it must match the recomputed
    // item totals plus the delivery fee.
    let computed: Decimal =
        request.items.iter().map(item_total).sum::<Decimal>() + request.delivery_fee;
    if computed != request.total_price {
        return Err(ServiceError::ValidationError(format!(
            "total_price mismatch: submitted {}, computed {}",
            request.total_price, computed
        )));
    }

    Ok(())
}

/// Line total: `(unit_price + border_price) * quantity`.
fn item_total(item: &CreateOrderItem) -> Decimal {
    let quantity = Decimal::from(item.quantity);
    let border = item
        .border
        .as_ref()
        .map(|b| b.price * quantity)
        .unwrap_or_default();
    item.price * quantity + border
}

/// Human-facing order reference: current time plus a random component.
/// Display-grade uniqueness only; the unique index plus bounded retry in
/// `create_order` handles the rare collision.
fn generate_order_ref() -> String {
    use rand::Rng;
    let millis = Utc::now().timestamp_millis();
    let salt: u16 = rand::thread_rng().gen_range(0..1000);
    format!("PO-{millis}-{salt:03}")
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn day_end_exclusive(date: NaiveDate) -> DateTime<Utc> {
    day_start(date + chrono::Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pickup_request(items: Vec<CreateOrderItem>, total: Decimal) -> CreateOrderRequest {
        CreateOrderRequest {
            order_id: None,
            customer_name: "João".to_string(),
            customer_phone: "5511999990000".to_string(),
            delivery_method: DeliveryMethod::Pickup,
            payment_method: PaymentMethod::Pix,
            address: None,
            address_number: None,
            neighborhood: None,
            complement: None,
            reference: None,
            table_number: None,
            change_for: None,
            observations: None,
            total_price: total,
            delivery_fee: Decimal::ZERO,
            items,
        }
    }

    fn pizza_item() -> CreateOrderItem {
        CreateOrderItem {
            product_id: 1,
            quantity: 2,
            price: dec!(35.50),
            border: Some(BorderSelection {
                id: 1,
                price: dec!(6.00),
            }),
            flavors: vec!["Margherita".to_string()],
        }
    }

    #[test]
    fn item_total_multiplies_border_by_quantity() {
        assert_eq!(item_total(&pizza_item()), dec!(83.00));
    }

    #[test]
    fn matching_total_passes_validation() {
        let request = pickup_request(vec![pizza_item()], dec!(83.00));
        assert!(validate_order_rules(&request).is_ok());
    }

    #[test]
    fn mismatched_total_is_rejected() {
        let request = pickup_request(vec![pizza_item()], dec!(1.00));
        let err = validate_order_rules(&request).unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
        assert!(err.to_string().contains("total_price mismatch"));
    }

    #[test]
    fn delivery_orders_require_address_fields() {
        let mut request = pickup_request(vec![pizza_item()], dec!(88.00));
        request.delivery_method = DeliveryMethod::Delivery;
        request.delivery_fee = dec!(5.00);
        assert!(validate_order_rules(&request).is_err());

        request.address = Some("Rua das Flores".to_string());
        request.neighborhood = Some("Centro".to_string());
        assert!(validate_order_rules(&request).is_ok());
    }

    #[test]
    fn dine_in_orders_require_table_number() {
        let mut request = pickup_request(vec![pizza_item()], dec!(83.00));
        request.delivery_method = DeliveryMethod::DineIn;
        assert!(validate_order_rules(&request).is_err());

        request.table_number = Some("12".to_string());
        assert!(validate_order_rules(&request).is_ok());
    }

    #[test]
    fn delivery_fee_is_rejected_outside_delivery() {
        let mut request = pickup_request(vec![pizza_item()], dec!(88.00));
        request.delivery_fee = dec!(5.00);
        let err = validate_order_rules(&request).unwrap_err();
        assert!(err.to_string().contains("Delivery fee"));
    }

    #[test]
    fn change_for_is_rejected_for_non_cash_payments() {
        let mut request = pickup_request(vec![pizza_item()], dec!(83.00));
        request.change_for = Some(dec!(100.00));
        let err = validate_order_rules(&request).unwrap_err();
        assert!(err.to_string().contains("cash"));
    }

    #[test]
    fn zero_quantity_items_are_rejected() {
        let mut item = pizza_item();
        item.quantity = 0;
        let request = pickup_request(vec![item], dec!(0.00));
        assert!(validate_order_rules(&request).is_err());
    }

    #[test]
    fn generated_references_have_the_expected_shape() {
        let reference = generate_order_ref();
        let parts: Vec<&str> = reference.splitn(3, '-').collect();
        assert_eq!(parts[0], "PO");
        assert_eq!(parts.len(), 3);
        assert!(parts[1].parse::<i64>().is_ok());
        let salt: u16 = parts[2].parse().expect("numeric salt");
        assert!(salt < 1000);
    }

    #[test]
    fn date_range_bounds_are_inclusive() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).expect("valid date");
        assert_eq!(day_start(date).to_rfc3339(), "2024-03-10T00:00:00+00:00");
        assert_eq!(
            day_end_exclusive(date).to_rfc3339(),
            "2024-03-11T00:00:00+00:00"
        );
    }
}
