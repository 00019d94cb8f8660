//! Defines the core trait for order processing logic.

use crate::error::OrderQueueError;
use crate::order::Order;
use async_trait::async_trait;

/// Processes orders delivered from a queue.
///
/// Returning `Ok(())` acknowledges the delivery. Returning an error, or
/// panicking, rejects it without requeue so the broker dead-letters it.
#[async_trait]
pub trait OrderHandler: Send + Sync {
    async fn handle_order(&self, order: Order) -> Result<(), OrderQueueError>;

    /// A name for the handler, used for logging.
    fn handler_name(&self) -> &str;
}
