//! The owned broker connection and channel.

use crate::config::BrokerConfig;
use crate::error::OrderQueueError;
use lapin::{Channel, Connection, ConnectionProperties};
use std::future::Future;

const REPLY_SUCCESS: u16 = 200;

/// One AMQP connection and the single channel opened on it.
///
/// Prefer `BrokerConnection::run_scoped`, which closes both on every exit path.
/// When using `open` directly, call `close` once done.
pub struct BrokerConnection {
    connection: Connection,
    channel: Channel,
}

impl BrokerConnection {
    /// Connects to the broker and opens a channel.
    pub async fn open(config: &BrokerConfig) -> Result<Self, OrderQueueError> {
        log::info!("Connecting to RabbitMQ at {}...", config.redacted_url());

        let connection = Connection::connect(&config.rabbitmq_url, ConnectionProperties::default())
            .await
            .map_err(|source| OrderQueueError::ConnectionFailure {
                url: config.redacted_url(),
                source,
            })?;
        let channel = match connection.create_channel().await {
            Ok(channel) => channel,
            Err(e) => {
                if let Err(close_err) = close_connection(&connection).await {
                    log::warn!("Failed to close RabbitMQ connection after channel error: {}", close_err);
                }
                return Err(e.into());
            }
        };

        log::info!("Connected, channel {} open", channel.id());
        Ok(Self { connection, channel })
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Closes the channel, then the connection.
    ///
    /// The connection is closed even when closing the channel fails. The first
    /// error encountered is returned.
    pub async fn close(self) -> Result<(), OrderQueueError> {
        let channel_closed = if self.channel.status().connected() {
            self.channel.close(REPLY_SUCCESS, "Normal shutdown").await
        } else {
            Ok(())
        };
        let connection_closed = close_connection(&self.connection).await;

        first_close_error(channel_closed, connection_closed)?;
        log::info!("RabbitMQ connection closed");
        Ok(())
    }

    /// Opens a connection, runs `body` with its channel and closes the connection
    /// afterwards, whether or not `body` succeeded.
    ///
    /// An error from `body` takes precedence over an error while closing.
    pub async fn run_scoped<F, Fut, T>(config: &BrokerConfig, body: F) -> Result<T, OrderQueueError>
    where
        F: FnOnce(Channel) -> Fut,
        Fut: Future<Output = Result<T, OrderQueueError>>,
    {
        let broker = Self::open(config).await?;
        let result = body(broker.channel.clone()).await;

        match broker.close().await {
            Ok(()) => result,
            Err(close_err) => {
                log::warn!("Failed to close RabbitMQ connection cleanly: {}", close_err);
                result
            }
        }
    }
}

async fn close_connection(connection: &Connection) -> Result<(), lapin::Error> {
    if connection.status().connected() {
        connection.close(REPLY_SUCCESS, "Normal shutdown").await
    } else {
        Ok(())
    }
}

fn first_close_error(
    channel_closed: Result<(), lapin::Error>,
    connection_closed: Result<(), lapin::Error>,
) -> Result<(), OrderQueueError> {
    match (channel_closed, connection_closed) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(channel_err), Err(connection_err)) => {
            log::warn!("Closing the connection also failed: {}", connection_err);
            Err(channel_err.into())
        }
        (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e.into()),
    }
}
