//! Declaration of the main queue and its dead-letter queue.

use crate::error::OrderQueueError;
use lapin::{
    options::QueueDeclareOptions,
    protocol::{AMQPErrorKind, AMQPSoftError},
    types::{AMQPValue, FieldTable},
    Channel,
};

/// Dead-lettered messages are re-published through the default exchange,
/// which routes by queue name.
const DEFAULT_EXCHANGE: &str = "";

/// Declares the queues orders flow through.
pub struct QueueTopology {
    channel: Channel,
}

impl QueueTopology {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }

    /// Declares `dead_letter_queue`, then `main_queue` configured to dead-letter
    /// every rejected message into it.
    ///
    /// Safe to call repeatedly with the same names. Fails with
    /// `TopologyConflict` if either queue already exists with other arguments.
    pub async fn declare(&self, main_queue: &str, dead_letter_queue: &str) -> Result<(), OrderQueueError> {
        self.declare_queue(dead_letter_queue, dead_letter_queue_arguments()).await?;
        self.declare_queue(main_queue, main_queue_arguments(dead_letter_queue)).await?;

        log::info!(
            "Queue '{}' declared with dead-letter queue '{}'",
            main_queue, dead_letter_queue
        );
        Ok(())
    }

    async fn declare_queue(&self, queue: &str, arguments: FieldTable) -> Result<(), OrderQueueError> {
        self.channel
            .queue_declare(queue, durable_queue_options(), arguments)
            .await
            .map_err(|e| classify_declare_error(queue, e))?;
        log::debug!("Declared queue '{}'", queue);
        Ok(())
    }
}

fn durable_queue_options() -> QueueDeclareOptions {
    QueueDeclareOptions {
        durable: true,
        exclusive: false,
        auto_delete: false,
        ..Default::default()
    }
}

/// Arguments for the dead-letter queue: a plain quorum queue.
pub fn dead_letter_queue_arguments() -> FieldTable {
    let mut args = FieldTable::default();
    args.insert("x-queue-type".into(), AMQPValue::LongString("quorum".into()));
    args
}

/// Arguments for the main queue: a quorum queue dead-lettering into `dead_letter_queue`.
pub fn main_queue_arguments(dead_letter_queue: &str) -> FieldTable {
    let mut args = dead_letter_queue_arguments();
    args.insert(
        "x-dead-letter-exchange".into(),
        AMQPValue::LongString(DEFAULT_EXCHANGE.into()),
    );
    args.insert(
        "x-dead-letter-routing-key".into(),
        AMQPValue::LongString(dead_letter_queue.into()),
    );
    args
}

fn classify_declare_error(queue: &str, error: lapin::Error) -> OrderQueueError {
    let conflict = matches!(
        &error,
        lapin::Error::ProtocolError(amqp_error)
            if matches!(amqp_error.kind(), AMQPErrorKind::Soft(AMQPSoftError::PRECONDITIONFAILED))
    );

    if conflict {
        log::error!(
            "Queue '{}' exists with different arguments. Delete it or use another name. Error: {}",
            queue, error
        );
        OrderQueueError::TopologyConflict {
            queue: queue.to_string(),
            source: error,
        }
    } else {
        OrderQueueError::Lapin(error)
    }
}
