//! Contact submission validation and notification fan-out.
//!
//! A submission is validated once, server-side, then delivered best-effort
//! across two independent channels (transactional email relay and chat
//! relay). Per-channel failures are collected, never propagated; only
//! "both channels failed" is a hard error.

pub mod channels;
pub mod dispatcher;
pub mod relays;
pub mod request;
pub mod validate;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use channels::{ChannelError, ChatReceipt, ChatRelay, EmailReceipt, EmailRelay};
pub use dispatcher::NotificationDispatcher;
pub use relays::{FormRelayEmail, LoggingEmailRelay, TwilioWhatsApp};
pub use request::{ContactSubmission, NotificationOutcome, NotificationRequest};
pub use validate::{FieldErrors, validate};

/// Errors surfaced to callers of the notification subsystem.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NotifyError {
    /// The submission failed validation; no channel was attempted.
    #[error("form validation failed on {} field(s)", fields.len())]
    Invalid { fields: FieldErrors },

    /// Every attempted channel failed to deliver.
    #[error("delivery failed on all channels")]
    AllChannelsFailed { errors: Vec<String> },
}
