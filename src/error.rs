use thiserror::Error;

/// Error type for publishing and consuming orders.
#[derive(Debug, Error)]
pub enum OrderQueueError {
    /// The broker could not be reached when opening the connection.
    #[error("Failed to connect to RabbitMQ at {url}: {source}")]
    ConnectionFailure {
        url: String,
        #[source]
        source: lapin::Error,
    },

    /// A queue already exists with arguments that differ from the requested declaration.
    #[error("Queue '{queue}' already exists with conflicting arguments: {source}")]
    TopologyConflict {
        queue: String,
        #[source]
        source: lapin::Error,
    },

    /// The message payload is not a valid order.
    #[error("Failed to deserialize order: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The order handler rejected a structurally valid order.
    #[error("Order handler failed: {0}")]
    HandlerFailure(String),

    /// Any other error originating from `lapin`.
    #[error("RabbitMQ communication error: {0}")]
    Lapin(#[from] lapin::Error),
}

impl From<&str> for OrderQueueError {
    fn from(s: &str) -> Self {
        OrderQueueError::HandlerFailure(s.to_string())
    }
}

impl From<String> for OrderQueueError {
    fn from(s: String) -> Self {
        OrderQueueError::HandlerFailure(s)
    }
}
