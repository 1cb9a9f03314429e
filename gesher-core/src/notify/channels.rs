//! Channel abstractions for notification delivery.
//!
//! Each channel is an independent best-effort delivery mechanism. The
//! dispatcher treats them uniformly: attempt, collect a receipt or an
//! error, never let one channel's failure reach the other.

use thiserror::Error;

use crate::notify::request::NotificationRequest;

/// Receipt from an email relay attempt.
///
/// The form relay can accept a request without confirming delivery
/// (`accepted: false` with an explanatory message while the destination
/// address is pending verification). That is not a delivery error, just
/// not-yet-success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailReceipt {
    /// Relay confirmed the message was sent
    pub accepted: bool,
    /// Relay-provided status message, if any
    pub detail: Option<String>,
}

/// Receipt from a chat relay attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReceipt {
    /// Relay-assigned message identifier
    pub id: String,
    /// Relay-reported delivery status
    pub status: String,
}

/// Errors from a single channel delivery attempt.
///
/// These never propagate out of the dispatcher; they are converted into
/// `channel_errors` entries on the aggregated outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("relay request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("relay rejected the message: {reason}")]
    Rejected { reason: String },
}

/// Delivers a contact submission over a transactional email relay.
#[async_trait::async_trait]
pub trait EmailRelay: Send + Sync {
    /// Submits the request fields as a templated email.
    ///
    /// # Errors
    ///
    /// - `ChannelError::RequestFailed` - Relay unreachable or errored
    /// - `ChannelError::Rejected` - Relay refused the message outright
    async fn send(&self, request: &NotificationRequest) -> Result<EmailReceipt, ChannelError>;
}

/// Delivers a preformatted message body over a chat relay.
#[async_trait::async_trait]
pub trait ChatRelay: Send + Sync {
    /// Sends `body` to the configured destination.
    ///
    /// # Errors
    ///
    /// - `ChannelError::RequestFailed` - Relay unreachable or errored
    /// - `ChannelError::Rejected` - Relay refused the message outright
    async fn send(&self, body: &str) -> Result<ChatReceipt, ChannelError>;
}
