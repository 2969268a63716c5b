use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter, QuerySelect, RelationTrait,
    Select,
};
use serde::Serialize;
use tracing::instrument;

use crate::{
    db::DbPool,
    entities::{order, order_item, product},
    errors::ServiceError,
    models::OrderStatus,
};

/// Optional inclusive creation-date bounds for the aggregation.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatsRange {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Aggregated order statistics for the admin dashboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub summary: StatsSummary,
    pub daily_sales: Vec<DailySales>,
    pub top_products: Vec<TopProduct>,
    pub delivery_methods: Vec<DeliveryMethodCount>,
    pub payment_methods: Vec<PaymentMethodCount>,
    pub order_status: Vec<StatusCount>,
}

#[derive(Debug, Serialize)]
pub struct StatsSummary {
    pub order_count: i64,
    /// Total revenue; zero (never null) when the range holds no orders.
    pub revenue: Decimal,
}

#[derive(Debug, Serialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub order_count: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TopProduct {
    pub id: i32,
    pub name: String,
    pub quantity_sold: i64,
    pub order_count: i64,
}

#[derive(Debug, Serialize, FromQueryResult)]
pub struct DeliveryMethodCount {
    pub delivery_method: String,
    pub count: i64,
}

#[derive(Debug, Serialize, FromQueryResult)]
pub struct PaymentMethodCount {
    pub payment_method: String,
    pub count: i64,
}

#[derive(Debug, Serialize, FromQueryResult)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(FromQueryResult)]
struct SummaryRow {
    order_count: i64,
    revenue: Option<Decimal>,
}

#[derive(FromQueryResult)]
struct ItemRow {
    product_id: i32,
    quantity: i32,
    order_id: i32,
}

/// Read-side aggregation over orders; no side effects.
#[derive(Clone)]
pub struct StatsService {
    db: Arc<DbPool>,
}

impl StatsService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Computes dashboard statistics. Cancelled orders are excluded from
    /// every figure except the per-status breakdown; the daily series always
    /// covers the trailing 7 days regardless of the requested range.
    #[instrument(skip(self))]
    pub async fn order_stats(&self, range: StatsRange) -> Result<OrderStats, ServiceError> {
        let summary = self.summary(range).await?;
        let daily_sales = self.daily_sales().await?;
        let top_products = self.top_products(range).await?;
        let delivery_methods = self
            .grouped_counts::<DeliveryMethodCount>(order::Column::DeliveryMethod, range, true)
            .await?;
        let payment_methods = self
            .grouped_counts::<PaymentMethodCount>(order::Column::PaymentMethod, range, true)
            .await?;
        let order_status = self
            .grouped_counts::<StatusCount>(order::Column::Status, range, false)
            .await?;

        Ok(OrderStats {
            summary,
            daily_sales,
            top_products,
            delivery_methods,
            payment_methods,
            order_status,
        })
    }

    async fn summary(&self, range: StatsRange) -> Result<StatsSummary, ServiceError> {
        let query = apply_range(
            order::Entity::find()
                .select_only()
                .column_as(order::Column::Id.count(), "order_count")
                .column_as(order::Column::TotalPrice.sum(), "revenue")
                .filter(order::Column::Status.ne(OrderStatus::Cancelled.to_string())),
            range,
        );

        let row = query
            .into_model::<SummaryRow>()
            .one(&*self.db)
            .await?
            .unwrap_or(SummaryRow {
                order_count: 0,
                revenue: None,
            });

        Ok(StatsSummary {
            order_count: row.order_count,
            revenue: row.revenue.unwrap_or(Decimal::ZERO),
        })
    }

    /// Per-day order count and revenue for the trailing 7 days. Aggregated
    /// in-process so the date bucketing stays identical across backends.
    async fn daily_sales(&self) -> Result<Vec<DailySales>, ServiceError> {
        let window_start = Utc::now() - Duration::days(7);

        let rows: Vec<(DateTime<Utc>, Decimal)> = order::Entity::find()
            .select_only()
            .column(order::Column::CreatedAt)
            .column(order::Column::TotalPrice)
            .filter(order::Column::Status.ne(OrderStatus::Cancelled.to_string()))
            .filter(order::Column::CreatedAt.gte(window_start))
            .into_tuple()
            .all(&*self.db)
            .await?;

        let mut buckets: BTreeMap<NaiveDate, (i64, Decimal)> = BTreeMap::new();
        for (created_at, total) in rows {
            let bucket = buckets
                .entry(created_at.date_naive())
                .or_insert((0, Decimal::ZERO));
            bucket.0 += 1;
            bucket.1 += total;
        }

        Ok(buckets
            .into_iter()
            .map(|(date, (order_count, revenue))| DailySales {
                date,
                order_count,
                revenue,
            })
            .collect())
    }

    /// Top 5 products by quantity sold; ties break on product id.
    async fn top_products(&self, range: StatsRange) -> Result<Vec<TopProduct>, ServiceError> {
        let mut query = order_item::Entity::find()
            .select_only()
            .columns([
                order_item::Column::ProductId,
                order_item::Column::Quantity,
                order_item::Column::OrderId,
            ])
            .join(JoinType::InnerJoin, order_item::Relation::Order.def())
            .filter(order::Column::Status.ne(OrderStatus::Cancelled.to_string()));

        if let Some(start) = range.start_date {
            query = query.filter(order::Column::CreatedAt.gte(day_start(start)));
        }
        if let Some(end) = range.end_date {
            query = query.filter(order::Column::CreatedAt.lt(day_end_exclusive(end)));
        }

        let rows = query.into_model::<ItemRow>().all(&*self.db).await?;

        let mut totals: HashMap<i32, (i64, HashSet<i32>)> = HashMap::new();
        for row in rows {
            let entry = totals.entry(row.product_id).or_default();
            entry.0 += i64::from(row.quantity);
            entry.1.insert(row.order_id);
        }

        let mut ranked: Vec<(i32, i64, i64)> = totals
            .into_iter()
            .map(|(product_id, (quantity, orders))| (product_id, quantity, orders.len() as i64))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(5);

        let ids: Vec<i32> = ranked.iter().map(|(id, _, _)| *id).collect();
        let names: HashMap<i32, String> = product::Entity::find()
            .filter(product::Column::Id.is_in(ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();

        Ok(ranked
            .into_iter()
            .map(|(id, quantity_sold, order_count)| TopProduct {
                name: names
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| format!("Product {id}")),
                id,
                quantity_sold,
                order_count,
            })
            .collect())
    }

    async fn grouped_counts<R>(
        &self,
        column: order::Column,
        range: StatsRange,
        exclude_cancelled: bool,
    ) -> Result<Vec<R>, ServiceError>
    where
        R: FromQueryResult,
    {
        let mut query = order::Entity::find()
            .select_only()
            .column(column)
            .column_as(order::Column::Id.count(), "count")
            .group_by(column);

        if exclude_cancelled {
            query = query.filter(order::Column::Status.ne(OrderStatus::Cancelled.to_string()));
        }
        query = apply_range(query, range);

        Ok(query.into_model::<R>().all(&*self.db).await?)
    }
}

fn apply_range(mut query: Select<order::Entity>, range: StatsRange) -> Select<order::Entity> {
    if let Some(start) = range.start_date {
        query = query.filter(order::Column::CreatedAt.gte(day_start(start)));
    }
    if let Some(end) = range.end_date {
        query = query.filter(order::Column::CreatedAt.lt(day_end_exclusive(end)));
    }
    query
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn day_end_exclusive(date: NaiveDate) -> DateTime<Utc> {
    day_start(date + Duration::days(1))
}
