//! Best-effort fan-out of a contact submission across both channels.
//!
//! Each channel attempt is an independent operation producing a tagged
//! result; aggregation is a pure fold over the two results, so completion
//! order cannot affect the outcome and one channel's failure never blocks
//! the other.

use std::sync::Arc;

use futures::future;

use crate::notify::channels::{ChatRelay, EmailRelay};
use crate::notify::request::{NotificationOutcome, NotificationRequest};

/// Result of one channel attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChannelAttempt {
    /// Relay confirmed delivery
    Succeeded,
    /// Relay accepted the request without confirming delivery (email relay
    /// pending verification). Not a success, but deliberately not recorded
    /// in `channel_errors` either.
    Unverified(Option<String>),
    /// Relay failed; the message is recorded on the outcome
    Failed(String),
    /// Channel was skipped at the caller's request
    Skipped,
}

impl ChannelAttempt {
    fn succeeded(&self) -> bool {
        matches!(self, ChannelAttempt::Succeeded)
    }

    fn error(&self) -> Option<&str> {
        match self {
            ChannelAttempt::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Fans a validated submission out to the email and chat channels.
pub struct NotificationDispatcher {
    email: Arc<dyn EmailRelay>,
    chat: Arc<dyn ChatRelay>,
}

impl NotificationDispatcher {
    /// Creates a dispatcher over the two channel relays.
    pub fn new(email: Arc<dyn EmailRelay>, chat: Arc<dyn ChatRelay>) -> Self {
        Self { email, chat }
    }

    /// Attempts delivery on both channels and aggregates the outcome.
    ///
    /// Both attempts are issued before either is awaited, and relay errors
    /// are converted into `channel_errors` entries; nothing propagates as a
    /// fault. The caller decides what total failure means via
    /// [`NotificationOutcome::require_delivery`].
    pub async fn dispatch(&self, request: &NotificationRequest) -> NotificationOutcome {
        let (email, chat) =
            future::join(self.attempt_email(request), self.attempt_chat(request)).await;

        tracing::info!(
            "contact dispatch for {}: email={:?} chat={:?}",
            request.full_name(),
            email,
            chat
        );

        aggregate(email, chat)
    }

    async fn attempt_email(&self, request: &NotificationRequest) -> ChannelAttempt {
        if request.skip_email {
            return ChannelAttempt::Skipped;
        }

        match self.email.send(request).await {
            Ok(receipt) if receipt.accepted => ChannelAttempt::Succeeded,
            Ok(receipt) => {
                tracing::warn!(
                    "email relay did not confirm delivery: {}",
                    receipt.detail.as_deref().unwrap_or("no detail")
                );
                ChannelAttempt::Unverified(receipt.detail)
            }
            Err(e) => ChannelAttempt::Failed(format!("Email delivery failed: {e}")),
        }
    }

    async fn attempt_chat(&self, request: &NotificationRequest) -> ChannelAttempt {
        let body = chat_message_body(request);
        match self.chat.send(&body).await {
            Ok(receipt) => {
                tracing::debug!("chat relay accepted message {} ({})", receipt.id, receipt.status);
                ChannelAttempt::Succeeded
            }
            Err(e) => ChannelAttempt::Failed(format!("WhatsApp delivery failed: {e}")),
        }
    }
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher").finish_non_exhaustive()
    }
}

/// Pure reducer from the two channel attempts to the aggregated outcome.
///
/// Error order equals attempt order: email before chat.
fn aggregate(email: ChannelAttempt, chat: ChannelAttempt) -> NotificationOutcome {
    let channel_errors = [&email, &chat]
        .into_iter()
        .filter_map(|attempt| attempt.error().map(str::to_string))
        .collect();

    NotificationOutcome {
        email_succeeded: email.succeeded(),
        chat_succeeded: chat.succeeded(),
        channel_errors,
    }
}

/// Structured label/value message body for the chat channel.
fn chat_message_body(request: &NotificationRequest) -> String {
    format!(
        "New inquiry from the website:\n\
         Subject: {}\n\
         Name: {}\n\
         Phone: {}\n\
         Email: {}\n\
         Message: {}",
        request.subject,
        request.full_name(),
        request.phone,
        request.email,
        request.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::test_support::{MockChatRelay, MockEmailRelay};

    fn request() -> NotificationRequest {
        NotificationRequest {
            subject: "donation".to_string(),
            first_name: "Dana".to_string(),
            last_name: "Cohen".to_string(),
            phone: "0501234567".to_string(),
            email: "d@x.com".to_string(),
            message: "Hello there, this is long enough.".to_string(),
            skip_email: false,
        }
    }

    #[tokio::test]
    async fn test_both_channels_succeed() {
        let email = Arc::new(MockEmailRelay::succeeds());
        let chat = Arc::new(MockChatRelay::succeeds());
        let dispatcher = NotificationDispatcher::new(email.clone(), chat.clone());

        let outcome = dispatcher.dispatch(&request()).await;

        assert!(outcome.email_succeeded);
        assert!(outcome.chat_succeeded);
        assert!(outcome.channel_errors.is_empty());
        assert!(!outcome.is_partial());
        assert_eq!(email.invocations(), 1);
        assert_eq!(chat.invocations(), 1);
    }

    #[tokio::test]
    async fn test_email_failure_does_not_block_chat() {
        let email = Arc::new(MockEmailRelay::fails_with("smtp unreachable"));
        let chat = Arc::new(MockChatRelay::succeeds());
        let dispatcher = NotificationDispatcher::new(email, chat.clone());

        let outcome = dispatcher.dispatch(&request()).await;

        assert!(!outcome.email_succeeded);
        assert!(outcome.chat_succeeded);
        assert_eq!(outcome.channel_errors.len(), 1);
        assert!(outcome.channel_errors[0].contains("smtp unreachable"));
        assert!(outcome.is_partial());
        assert!(outcome.delivered());
        assert_eq!(chat.invocations(), 1);
    }

    #[tokio::test]
    async fn test_chat_failure_does_not_block_email() {
        let email = Arc::new(MockEmailRelay::succeeds());
        let chat = Arc::new(MockChatRelay::fails_with("relay quota exceeded"));
        let dispatcher = NotificationDispatcher::new(email.clone(), chat);

        let outcome = dispatcher.dispatch(&request()).await;

        assert!(outcome.email_succeeded);
        assert!(!outcome.chat_succeeded);
        assert_eq!(outcome.channel_errors.len(), 1);
        assert!(outcome.is_partial());
        assert_eq!(email.invocations(), 1);
    }

    #[tokio::test]
    async fn test_total_failure_is_hard_failure() {
        let email = Arc::new(MockEmailRelay::fails_with("email down"));
        let chat = Arc::new(MockChatRelay::fails_with("chat down"));
        let dispatcher = NotificationDispatcher::new(email, chat);

        let outcome = dispatcher.dispatch(&request()).await;

        assert!(!outcome.delivered());
        assert_eq!(outcome.channel_errors.len(), 2);
        // Attempt order: email before chat
        assert!(outcome.channel_errors[0].contains("email down"));
        assert!(outcome.channel_errors[1].contains("chat down"));
        assert!(outcome.require_delivery().is_err());
    }

    #[tokio::test]
    async fn test_skip_email_never_invokes_relay() {
        let email = Arc::new(MockEmailRelay::succeeds());
        let chat = Arc::new(MockChatRelay::succeeds());
        let dispatcher = NotificationDispatcher::new(email.clone(), chat);

        let mut request = request();
        request.skip_email = true;
        let outcome = dispatcher.dispatch(&request).await;

        assert_eq!(email.invocations(), 0);
        assert!(!outcome.email_succeeded);
        assert!(outcome.chat_succeeded);
        assert!(outcome.channel_errors.is_empty());
    }

    #[tokio::test]
    async fn test_unverified_email_is_neither_success_nor_error() {
        let email = Arc::new(MockEmailRelay::unverified("pending verification"));
        let chat = Arc::new(MockChatRelay::succeeds());
        let dispatcher = NotificationDispatcher::new(email.clone(), chat);

        let outcome = dispatcher.dispatch(&request()).await;

        assert_eq!(email.invocations(), 1);
        assert!(!outcome.email_succeeded);
        assert!(outcome.chat_succeeded);
        assert!(outcome.channel_errors.is_empty());
    }

    #[tokio::test]
    async fn test_chat_body_is_label_value_lines() {
        let email = Arc::new(MockEmailRelay::succeeds());
        let chat = Arc::new(MockChatRelay::succeeds());
        let dispatcher = NotificationDispatcher::new(email, chat.clone());

        dispatcher.dispatch(&request()).await;

        let body = chat.last_body().unwrap();
        assert!(body.starts_with("New inquiry from the website:"));
        assert!(body.contains("Subject: donation"));
        assert!(body.contains("Name: Dana Cohen"));
        assert!(body.contains("Phone: 0501234567"));
        assert!(body.contains("Email: d@x.com"));
    }

    #[test]
    fn test_aggregate_is_order_tolerant() {
        let a = aggregate(
            ChannelAttempt::Failed("email down".to_string()),
            ChannelAttempt::Succeeded,
        );
        let b = aggregate(
            ChannelAttempt::Succeeded,
            ChannelAttempt::Failed("chat down".to_string()),
        );

        assert!(!a.email_succeeded && a.chat_succeeded);
        assert!(b.email_succeeded && !b.chat_succeeded);
        assert_eq!(a.channel_errors, vec!["email down".to_string()]);
        assert_eq!(b.channel_errors, vec!["chat down".to_string()]);
    }
}
