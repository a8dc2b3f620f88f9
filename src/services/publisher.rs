// src/services/publisher.rs

//! AMQP queue publisher.
//!
//! Each call walks one connection through
//! `Disconnected → Connected → ChannelOpen → QueueDeclared → Published → Disconnected`
//! and closes it on every exit path. Nothing is retried here.

use std::fmt;

use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, QueueDeclareOptions};
use lapin::protocol::{AMQPErrorKind, AMQPSoftError};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Connection, ConnectionProperties};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{BrokerConfig, OutboundMessage};

/// AMQP delivery mode that makes the broker persist a message.
pub const PERSISTENT_DELIVERY: u8 = 2;

/// Progress of a single publish call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
    Disconnected,
    Connected,
    ChannelOpen,
    QueueDeclared,
    Published,
}

impl fmt::Display for PublishState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "Disconnected",
            Self::Connected => "Connected",
            Self::ChannelOpen => "ChannelOpen",
            Self::QueueDeclared => "QueueDeclared",
            Self::Published => "Published",
        };
        f.write_str(name)
    }
}

/// Delivers one message at a time to a durable queue.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish a single message to the queue it names.
    async fn publish(&self, message: &OutboundMessage) -> Result<()>;
}

/// Publisher that opens a fresh broker connection for every message.
pub struct AmqpPublisher {
    config: BrokerConfig,
    uri: String,
}

impl AmqpPublisher {
    /// Create a publisher for the configured broker. Does not connect.
    pub fn new(config: &BrokerConfig) -> Result<Self> {
        Ok(Self {
            uri: amqp_uri(config)?,
            config: config.clone(),
        })
    }

    async fn connect(&self) -> Result<Connection> {
        let address = self.config.address();
        let timeout = self.config.connect_timeout();

        match tokio::time::timeout(
            timeout,
            Connection::connect(&self.uri, ConnectionProperties::default()),
        )
        .await
        {
            Ok(Ok(connection)) => Ok(connection),
            Ok(Err(e)) => Err(AppError::connection(address, e)),
            Err(_) => Err(AppError::connection(
                address,
                format!("timed out after {}s", timeout.as_secs()),
            )),
        }
    }

    /// Channel, declare and publish on an open connection.
    async fn deliver(&self, connection: &Connection, message: &OutboundMessage) -> Result<()> {
        let queue = message.queue();

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| AppError::publish(PublishState::Connected, e))?;
        log::debug!("Publisher state: {}", PublishState::ChannelOpen);

        channel
            .queue_declare(queue, declare_options(), FieldTable::default())
            .await
            .map_err(|e| declare_error(queue, e))?;
        log::debug!("Publisher state: {}", PublishState::QueueDeclared);

        channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                message.body().as_bytes(),
                message_properties(),
            )
            .await
            .map_err(|e| AppError::publish(PublishState::QueueDeclared, e))?;
        log::debug!("Publisher state: {}", PublishState::Published);

        Ok(())
    }
}

#[async_trait]
impl MessagePublisher for AmqpPublisher {
    async fn publish(&self, message: &OutboundMessage) -> Result<()> {
        log::debug!("Publisher state: {}", PublishState::Disconnected);
        let connection = self.connect().await?;
        log::debug!("Publisher state: {}", PublishState::Connected);

        let delivered = self.deliver(&connection, message).await;
        let closed = connection.close(200, "OK").await;
        log::debug!("Publisher state: {}", PublishState::Disconnected);

        match (delivered, closed) {
            (Ok(()), Ok(())) => Ok(()),
            (Ok(()), Err(e)) => Err(AppError::publish(PublishState::Published, e)),
            (Err(e), close_result) => {
                if let Err(close_err) = close_result {
                    log::debug!("Connection close after failure also failed: {}", close_err);
                }
                Err(e)
            }
        }
    }
}

/// Options for `queue.declare`: durable, so the queue survives a broker restart.
fn declare_options() -> QueueDeclareOptions {
    QueueDeclareOptions {
        durable: true,
        ..QueueDeclareOptions::default()
    }
}

fn message_properties() -> BasicProperties {
    BasicProperties::default().with_delivery_mode(PERSISTENT_DELIVERY)
}

/// Map a `queue.declare` failure; a 406 from the broker means the queue exists
/// with different properties.
fn declare_error(queue: &str, error: lapin::Error) -> AppError {
    match &error {
        lapin::Error::ProtocolError(amqp)
            if matches!(
                amqp.kind(),
                AMQPErrorKind::Soft(AMQPSoftError::PRECONDITIONFAILED)
            ) =>
        {
            AppError::queue_mismatch(queue, amqp)
        }
        _ => AppError::publish(PublishState::ChannelOpen, error),
    }
}

/// Build the connection URI; credentials are passed through as configured.
fn amqp_uri(config: &BrokerConfig) -> Result<String> {
    let mut uri = Url::parse(&format!("amqp://{}:{}", config.host, config.port))
        .map_err(|e| AppError::config(format!("broker address {} is invalid: {e}", config.address())))?;

    uri.set_username(&config.username)
        .map_err(|_| AppError::config("broker.username cannot be used in a URI"))?;
    uri.set_password(Some(&config.password))
        .map_err(|_| AppError::config("broker.password cannot be used in a URI"))?;

    let vhost: String = url::form_urlencoded::byte_serialize(config.vhost.as_bytes()).collect();
    uri.set_path(&vhost);

    Ok(uri.into())
}
