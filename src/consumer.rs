//! Consuming orders with manual acknowledgement.

use crate::dead_letter::DeadLetterInfo;
use crate::error::OrderQueueError;
use crate::handler::OrderHandler;
use crate::order::Order;
use futures_util::{FutureExt, TryStreamExt};
use lapin::{
    message::Delivery,
    options::{BasicAckOptions, BasicConsumeOptions, BasicQosOptions, BasicRejectOptions},
    types::FieldTable,
    Channel,
};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use uuid::Uuid;

/// How a delivery was settled with the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// The order was processed and the delivery acknowledged.
    Acknowledged,
    /// The delivery was rejected without requeue and will be dead-lettered.
    Rejected { reason: String },
}

/// Subscribes order handlers to queues on a shared channel.
#[derive(Clone)]
pub struct OrderConsumer {
    channel: Channel,
    prefetch_count: Option<u16>,
}

impl OrderConsumer {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            prefetch_count: None,
        }
    }

    /// Limits unacknowledged deliveries per subscription. `None` keeps the broker default.
    pub fn with_prefetch_count(mut self, prefetch_count: Option<u16>) -> Self {
        self.prefetch_count = prefetch_count;
        self
    }

    /// Subscribes `handler` to `queue_name` and processes deliveries one at a time.
    ///
    /// Each delivery is acknowledged when the handler succeeds and rejected
    /// without requeue otherwise. Per-message failures are logged and never end
    /// the subscription. Only returns when the delivery stream ends or fails,
    /// e.g. because the channel or connection was closed.
    pub async fn consume<H>(&self, queue_name: &str, handler: Arc<H>) -> Result<(), OrderQueueError>
    where
        H: OrderHandler + ?Sized,
    {
        if let Some(count) = self.prefetch_count {
            self.channel.basic_qos(count, BasicQosOptions::default()).await?;
            log::info!("QoS prefetch count set to {}", count);
        }

        let tag = consumer_tag(queue_name);
        let consumer = self
            .channel
            .basic_consume(
                queue_name,
                &tag,
                BasicConsumeOptions {
                    no_ack: false,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        log::info!(
            "Started consuming queue '{}' with handler '{}' (tag '{}')",
            queue_name,
            handler.handler_name(),
            consumer.tag().as_str()
        );

        consumer
            .try_for_each(|delivery| {
                let handler = handler.clone();
                async move {
                    process_delivery(queue_name, delivery, handler.as_ref()).await;
                    Ok(())
                }
            })
            .await?;

        log::warn!("Delivery stream for queue '{}' ended", queue_name);
        Ok(())
    }
}

/// The frame that settles a delivery with the broker.
#[derive(Debug)]
enum Settlement {
    Ack(BasicAckOptions),
    Reject(BasicRejectOptions),
}

/// Acks cover only the one delivery; rejects never requeue, so the broker
/// dead-letters the message.
fn settlement_for(outcome: &MessageOutcome) -> Settlement {
    match outcome {
        MessageOutcome::Acknowledged => Settlement::Ack(BasicAckOptions { multiple: false }),
        MessageOutcome::Rejected { .. } => Settlement::Reject(BasicRejectOptions { requeue: false }),
    }
}

/// A tag unique per subscription, so one queue can be consumed twice on a channel.
fn consumer_tag(queue_name: &str) -> String {
    format!("{}_consumer_{}", queue_name, Uuid::new_v4().simple())
}

/// Settles a single delivery exactly once, based on the handler's verdict.
async fn process_delivery<H>(queue_name: &str, delivery: Delivery, handler: &H) -> MessageOutcome
where
    H: OrderHandler + ?Sized,
{
    let delivery_tag = delivery.delivery_tag;

    if let Some(info) = DeadLetterInfo::from_properties(&delivery.properties) {
        log::info!(
            "Delivery {} on '{}' was dead-lettered from '{}' (reason: {}, count: {})",
            delivery_tag, queue_name, info.source_queue, info.reason, info.count
        );
    }

    let outcome = evaluate_payload(handler, &delivery.data).await;

    let settled = match settlement_for(&outcome) {
        Settlement::Ack(options) => delivery.ack(options).await.map(|_| ()),
        Settlement::Reject(options) => {
            if let MessageOutcome::Rejected { reason } = &outcome {
                log::error!(
                    "Error processing delivery {} from '{}': {}, sending to DLQ",
                    delivery_tag, queue_name, reason
                );
            }
            delivery.reject(options).await.map(|_| ())
        }
    };

    match settled {
        Ok(()) => log::debug!("Delivery {} settled: {:?}", delivery_tag, outcome),
        Err(e) => log::error!("Failed to settle delivery {} from '{}': {}", delivery_tag, queue_name, e),
    }

    outcome
}

/// Decodes `payload` and runs the handler on it.
///
/// Decoding errors, handler errors and handler panics all yield `Rejected`.
pub async fn evaluate_payload<H>(handler: &H, payload: &[u8]) -> MessageOutcome
where
    H: OrderHandler + ?Sized,
{
    let order = match Order::from_json_slice(payload) {
        Ok(order) => order,
        Err(e) => return MessageOutcome::Rejected { reason: e.to_string() },
    };
    let order_id = order.order_id();

    match AssertUnwindSafe(handler.handle_order(order)).catch_unwind().await {
        Ok(Ok(())) => {
            log::info!("Order {} processed by '{}'", order_id, handler.handler_name());
            MessageOutcome::Acknowledged
        }
        Ok(Err(e)) => MessageOutcome::Rejected { reason: e.to_string() },
        Err(_) => MessageOutcome::Rejected {
            reason: OrderQueueError::from(format!("handler '{}' panicked", handler.handler_name())).to_string(),
        },
    }
}
