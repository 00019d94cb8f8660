//! # Order Queue
//! Publishes and consumes orders over RabbitMQ. Orders that fail processing
//! are rejected and dead-lettered by the broker into a separate queue.

pub mod config;
pub mod connection;
pub mod consumer;
pub mod dead_letter;
pub mod error;
pub mod handler;
pub mod handlers;
pub mod order;
pub mod publisher;
pub mod topology;

// Re-export key components for easy access
pub use config::BrokerConfig;
pub use connection::BrokerConnection;
pub use consumer::{MessageOutcome, OrderConsumer};
pub use dead_letter::DeadLetterInfo;
pub use error::OrderQueueError;
pub use handler::OrderHandler;
pub use order::Order;
pub use publisher::OrderPublisher;
pub use topology::QueueTopology;
