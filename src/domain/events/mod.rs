//! Domain events
use serde::Serialize;
use uuid::Uuid;

use crate::domain::value_objects::Money;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    OrderPlaced { order_id: Uuid, custom_order_id: String, user_id: String, amount: Money },
    CartCleared { user_id: String },
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::OrderPlaced { .. } => "storefront.order_placed",
            Self::CartCleared { .. } => "storefront.cart_cleared",
        }
    }
}
