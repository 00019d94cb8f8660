//! The order entity and its JSON wire encoding.

use crate::error::OrderQueueError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An order as it travels through the queues.
///
/// Encoded as a JSON object with the fields `OrderId`, `ProductName`,
/// `Quantity` and `Price`. All four are required when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Order {
    order_id: Uuid,
    product_name: String,
    quantity: i32,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    price: Decimal,
}

impl Order {
    /// Creates an order with a freshly generated identifier.
    pub fn new(product_name: impl Into<String>, quantity: i32, price: Decimal) -> Self {
        Self {
            order_id: Uuid::new_v4(),
            product_name: product_name.into(),
            quantity,
            price,
        }
    }

    pub fn order_id(&self) -> Uuid {
        self.order_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Serializes the order into the UTF-8 JSON message body.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, OrderQueueError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parses a message body back into an order.
    pub fn from_json_slice(payload: &[u8]) -> Result<Self, OrderQueueError> {
        Ok(serde_json::from_slice(payload)?)
    }
}
