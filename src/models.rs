//! Typed vocabulary for the ordering domain.
//!
//! Orders carry three closed string sets in storage (delivery method, payment
//! method, status); these enums are the single source of truth for parsing,
//! serialization and the status state machine.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// How the customer receives the order.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum DeliveryMethod {
    Delivery,
    Pickup,
    DineIn,
}

impl DeliveryMethod {
    /// Address fields are only mandatory for courier delivery.
    pub fn requires_address(self) -> bool {
        matches!(self, DeliveryMethod::Delivery)
    }

    pub fn requires_table(self) -> bool {
        matches!(self, DeliveryMethod::DineIn)
    }
}

/// How the customer pays.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentMethod {
    Pix,
    Credit,
    Debit,
    Cash,
}

/// Order lifecycle.
///
/// The forward flow is `pending -> preparing -> delivering -> completed`;
/// `cancelled` is reachable from any non-terminal state. Terminal states admit
/// no transition other than the idempotent self-transition.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Delivering,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// The status an operator would normally advance to next.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Delivering),
            OrderStatus::Delivering => Some(OrderStatus::Completed),
            OrderStatus::Completed | OrderStatus::Cancelled => None,
        }
    }

    /// Whether moving from `self` to `target` is allowed.
    ///
    /// Re-applying the current status is a permitted no-op so that a retried
    /// update does not fail against an already-advanced order.
    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        if self == target {
            return true;
        }
        match (self, target) {
            (OrderStatus::Pending, OrderStatus::Preparing)
            | (OrderStatus::Preparing, OrderStatus::Delivering)
            | (OrderStatus::Delivering, OrderStatus::Completed) => true,
            (from, OrderStatus::Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use test_case::test_case;

    #[test]
    fn delivery_method_round_trips_through_storage_strings() {
        for method in [
            DeliveryMethod::Delivery,
            DeliveryMethod::Pickup,
            DeliveryMethod::DineIn,
        ] {
            let stored = method.to_string();
            assert_eq!(DeliveryMethod::from_str(&stored).unwrap(), method);
        }
        assert_eq!(DeliveryMethod::DineIn.to_string(), "dineIn");
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(OrderStatus::Preparing.to_string(), "preparing");
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
    }

    #[test_case(OrderStatus::Pending, OrderStatus::Preparing, true; "pending advances to preparing")]
    #[test_case(OrderStatus::Preparing, OrderStatus::Delivering, true; "preparing advances to delivering")]
    #[test_case(OrderStatus::Delivering, OrderStatus::Completed, true; "delivering advances to completed")]
    #[test_case(OrderStatus::Pending, OrderStatus::Delivering, false; "skipping a step is rejected")]
    #[test_case(OrderStatus::Pending, OrderStatus::Cancelled, true; "pending can cancel")]
    #[test_case(OrderStatus::Preparing, OrderStatus::Cancelled, true; "preparing can cancel")]
    #[test_case(OrderStatus::Delivering, OrderStatus::Cancelled, true; "delivering can cancel")]
    #[test_case(OrderStatus::Completed, OrderStatus::Cancelled, false; "completed cannot cancel")]
    #[test_case(OrderStatus::Cancelled, OrderStatus::Pending, false; "cancelled cannot reopen")]
    #[test_case(OrderStatus::Completed, OrderStatus::Completed, true; "terminal self-transition is a no-op")]
    fn transition_table(from: OrderStatus, to: OrderStatus, allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn next_status_follows_the_forward_map() {
        assert_eq!(OrderStatus::Pending.next(), Some(OrderStatus::Preparing));
        assert_eq!(OrderStatus::Delivering.next(), Some(OrderStatus::Completed));
        assert_eq!(OrderStatus::Completed.next(), None);
        assert_eq!(OrderStatus::Cancelled.next(), None);
    }
}
