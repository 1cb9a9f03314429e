//! Contact submission and outcome types.

use serde::{Deserialize, Serialize};

/// Raw contact form submission as received on the wire.
///
/// Every field is defaulted so a sparse JSON body deserializes cleanly and
/// validation can report all missing fields together instead of failing on
/// deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactSubmission {
    pub subject: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub message: String,
    /// Caller already delivered the email channel itself (the form relay
    /// only accepts browser-originated requests); skip it server-side.
    pub skip_email: bool,
}

/// Validated, trimmed contact submission ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub subject: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub message: String,
    pub skip_email: bool,
}

impl NotificationRequest {
    /// Full name as shown in channel message bodies.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Aggregated result of one fan-out across both channels.
///
/// `channel_errors` is append-only in attempt order (email before chat);
/// a non-empty list alongside a successful channel means partial success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOutcome {
    pub email_succeeded: bool,
    pub chat_succeeded: bool,
    pub channel_errors: Vec<String>,
}

impl NotificationOutcome {
    /// True when at least one channel delivered the submission.
    pub fn delivered(&self) -> bool {
        self.email_succeeded || self.chat_succeeded
    }

    /// True when delivery succeeded but some channel recorded a failure.
    pub fn is_partial(&self) -> bool {
        self.delivered() && !self.channel_errors.is_empty()
    }

    /// Converts total delivery failure into an error.
    ///
    /// # Errors
    ///
    /// - `NotifyError::AllChannelsFailed` - No channel delivered
    pub fn require_delivery(self) -> Result<Self, super::NotifyError> {
        if self.delivered() {
            Ok(self)
        } else {
            Err(super::NotifyError::AllChannelsFailed {
                errors: self.channel_errors,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_submission_deserializes_with_defaults() {
        let submission: ContactSubmission =
            serde_json::from_str(r#"{"subject":"donation"}"#).unwrap();
        assert_eq!(submission.subject, "donation");
        assert_eq!(submission.first_name, "");
        assert!(!submission.skip_email);
    }

    #[test]
    fn test_outcome_predicates() {
        let total_failure = NotificationOutcome {
            email_succeeded: false,
            chat_succeeded: false,
            channel_errors: vec!["email down".to_string(), "chat down".to_string()],
        };
        assert!(!total_failure.delivered());
        assert!(!total_failure.is_partial());
        assert!(total_failure.require_delivery().is_err());

        let partial = NotificationOutcome {
            email_succeeded: false,
            chat_succeeded: true,
            channel_errors: vec!["email down".to_string()],
        };
        assert!(partial.delivered());
        assert!(partial.is_partial());

        let full = NotificationOutcome {
            email_succeeded: true,
            chat_succeeded: true,
            channel_errors: vec![],
        };
        assert!(full.delivered());
        assert!(!full.is_partial());
    }
}
