//! Handlers used by the consumer process.

use crate::error::OrderQueueError;
use crate::handler::OrderHandler;
use crate::order::Order;
use async_trait::async_trait;

/// Main-queue handler that fails every order with an even quantity,
/// so the dead-letter path can be observed.
pub struct SimulatedFailureHandler;

#[async_trait]
impl OrderHandler for SimulatedFailureHandler {
    async fn handle_order(&self, order: Order) -> Result<(), OrderQueueError> {
        log::info!(
            "Processing order {}: {} x {} = {}",
            order.order_id(),
            order.product_name(),
            order.quantity(),
            order.price()
        );

        if order.quantity() % 2 == 0 {
            log::warn!("Simulating a processing failure for order {}", order.order_id());
            return Err(OrderQueueError::from("Simulated processing error"));
        }

        Ok(())
    }

    fn handler_name(&self) -> &str {
        "SimulatedFailureHandler"
    }
}

/// Dead-letter queue handler that logs each failed order and accepts it.
pub struct DeadLetterInspector;

#[async_trait]
impl OrderHandler for DeadLetterInspector {
    async fn handle_order(&self, order: Order) -> Result<(), OrderQueueError> {
        log::warn!(
            "[DLQ] Order {} failed previously: {}",
            order.order_id(),
            order.product_name()
        );
        Ok(())
    }

    fn handler_name(&self) -> &str {
        "DeadLetterInspector"
    }
}
