use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set, TransactionTrait};
use tracing::{error, info, instrument, warn};

use crate::{
    db::DbPool,
    entities::order,
    errors::ServiceError,
    events::{Event, EventSender},
    models::OrderStatus,
};

/// Advances orders through their lifecycle with transition validation.
#[derive(Clone)]
pub struct OrderStatusService {
    db: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderStatusService {
    pub fn new(db: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    /// Updates the status of an order.
    ///
    /// Only transitions permitted by [`OrderStatus::can_transition_to`] are
    /// accepted; re-applying the current status is an idempotent no-op update
    /// that still bumps the updated timestamp.
    #[instrument(skip(self), fields(order_id = order_id, new_status = %new_status))]
    pub async fn update_status(
        &self,
        order_id: i32,
        new_status: OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "failed to start status update transaction");
            ServiceError::DatabaseError(e)
        })?;

        let order_model = order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                warn!("order not found for status update");
                ServiceError::NotFound(format!("Order {order_id} not found"))
            })?;

        let old_status = OrderStatus::from_str(&order_model.status).map_err(|_| {
            ServiceError::InternalError(format!(
                "order {order_id} carries unknown status '{}'",
                order_model.status
            ))
        })?;

        if !old_status.can_transition_to(new_status) {
            return Err(ServiceError::ValidationError(format!(
                "Cannot transition order from '{old_status}' to '{new_status}'"
            )));
        }

        let mut active: order::ActiveModel = order_model.into();
        active.status = Set(new_status.to_string());
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(old_status = %old_status, "order status updated");

        if old_status != new_status {
            if let Some(sender) = &self.event_sender {
                let event = Event::OrderStatusChanged {
                    order_id,
                    old_status,
                    new_status,
                };
                if let Err(e) = sender.send(event).await {
                    warn!(error = %e, "failed to publish status change event");
                }
            }
        }

        Ok(updated)
    }
}
