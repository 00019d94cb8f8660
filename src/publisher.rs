//! Publishing orders to a queue.

use crate::error::OrderQueueError;
use crate::order::Order;
use chrono::Utc;
use lapin::{options::BasicPublishOptions, BasicProperties, Channel};

const DEFAULT_EXCHANGE: &str = "";

/// Sends orders to a queue through the default exchange.
#[derive(Clone)]
pub struct OrderPublisher {
    channel: Channel,
}

impl OrderPublisher {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }

    /// Serializes `order` and publishes it to `queue_name`.
    ///
    /// Returns once the broker has been handed the message. Publisher
    /// confirms are not awaited.
    pub async fn publish(&self, queue_name: &str, order: &Order) -> Result<(), OrderQueueError> {
        let body = order.to_json_bytes()?;

        self.channel
            .basic_publish(
                DEFAULT_EXCHANGE,
                queue_name,
                BasicPublishOptions::default(),
                &body,
                order_properties(order),
            )
            .await?;

        log::info!("Published order {} to queue '{}'", order.order_id(), queue_name);
        Ok(())
    }
}

fn order_properties(order: &Order) -> BasicProperties {
    BasicProperties::default()
        .with_content_type("application/json".into())
        .with_message_id(order.order_id().to_string().into())
        .with_timestamp(Utc::now().timestamp().max(0) as u64)
}
