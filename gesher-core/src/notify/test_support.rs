//! Mock relays for testing the notification dispatcher.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::notify::channels::{ChannelError, ChatReceipt, ChatRelay, EmailReceipt, EmailRelay};
use crate::notify::request::NotificationRequest;

enum EmailBehavior {
    Succeed,
    Unverified(String),
    Fail(String),
}

/// Mock email relay with scriptable behavior and an invocation counter.
pub struct MockEmailRelay {
    behavior: EmailBehavior,
    invocations: AtomicUsize,
    last_request: Mutex<Option<NotificationRequest>>,
}

impl MockEmailRelay {
    /// Relay that confirms every delivery.
    pub fn succeeds() -> Self {
        Self::with_behavior(EmailBehavior::Succeed)
    }

    /// Relay that accepts without confirming delivery.
    pub fn unverified(detail: &str) -> Self {
        Self::with_behavior(EmailBehavior::Unverified(detail.to_string()))
    }

    /// Relay that fails every delivery with `reason`.
    pub fn fails_with(reason: &str) -> Self {
        Self::with_behavior(EmailBehavior::Fail(reason.to_string()))
    }

    fn with_behavior(behavior: EmailBehavior) -> Self {
        Self {
            behavior,
            invocations: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Number of times `send` was invoked.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// The most recent request passed to `send`.
    pub fn last_request(&self) -> Option<NotificationRequest> {
        self.last_request.lock().clone()
    }
}

#[async_trait]
impl EmailRelay for MockEmailRelay {
    async fn send(&self, request: &NotificationRequest) -> Result<EmailReceipt, ChannelError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some(request.clone());

        match &self.behavior {
            EmailBehavior::Succeed => Ok(EmailReceipt {
                accepted: true,
                detail: None,
            }),
            EmailBehavior::Unverified(detail) => Ok(EmailReceipt {
                accepted: false,
                detail: Some(detail.clone()),
            }),
            EmailBehavior::Fail(reason) => Err(ChannelError::RequestFailed {
                reason: reason.clone(),
            }),
        }
    }
}

/// Mock chat relay recording delivered bodies.
pub struct MockChatRelay {
    failure: Option<String>,
    invocations: AtomicUsize,
    bodies: Arc<Mutex<Vec<String>>>,
}

impl MockChatRelay {
    /// Relay that accepts every message.
    pub fn succeeds() -> Self {
        Self {
            failure: None,
            invocations: AtomicUsize::new(0),
            bodies: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Relay that fails every message with `reason`.
    pub fn fails_with(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::succeeds()
        }
    }

    /// Number of times `send` was invoked.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// The most recently delivered message body.
    pub fn last_body(&self) -> Option<String> {
        self.bodies.lock().last().cloned()
    }
}

#[async_trait]
impl ChatRelay for MockChatRelay {
    async fn send(&self, body: &str) -> Result<ChatReceipt, ChannelError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.bodies.lock().push(body.to_string());

        match &self.failure {
            Some(reason) => Err(ChannelError::RequestFailed {
                reason: reason.clone(),
            }),
            None => Ok(ChatReceipt {
                id: format!("mock_{}", self.invocations()),
                status: "sent".to_string(),
            }),
        }
    }
}
