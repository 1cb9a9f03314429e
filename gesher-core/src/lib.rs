//! Gesher Core - Media readiness and contact fan-out functionality
//!
//! This crate provides the backend building blocks for the Gesher donation
//! site: preloading and readiness tracking for storage-hosted media assets,
//! validated contact submissions fanned out across notification channels,
//! and configuration management.

pub mod config;
pub mod media;
pub mod mode;
pub mod notify;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::GesherConfig;
pub use media::{MediaError, MediaReadinessStore};
pub use mode::RuntimeMode;
pub use notify::{NotificationDispatcher, NotifyError};

/// Core errors that can bubble up from any Gesher subsystem.
#[derive(Debug, thiserror::Error)]
pub enum GesherError {
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GesherError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            GesherError::Media(e) => match e {
                MediaError::InvalidKey { .. } => "Unknown media asset".to_string(),
                MediaError::ResolutionFailed { .. } => {
                    "Could not locate the requested media".to_string()
                }
                MediaError::LoadFailed { .. } => "Media failed to load".to_string(),
            },
            GesherError::Notify(NotifyError::AllChannelsFailed { .. }) => {
                "Sending failed on every channel".to_string()
            }
            GesherError::Notify(NotifyError::Invalid { .. }) => {
                "The submitted form contains errors".to_string()
            }
            GesherError::Io(_) => "File system error occurred".to_string(),
        }
    }

    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        matches!(self, GesherError::Notify(NotifyError::Invalid { .. }))
    }
}

pub type Result<T> = std::result::Result<T, GesherError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::FieldErrors;

    #[test]
    fn test_user_message_per_variant() {
        let invalid = GesherError::from(NotifyError::Invalid {
            fields: FieldErrors::new(),
        });
        assert_eq!(invalid.user_message(), "The submitted form contains errors");

        let failed = GesherError::from(NotifyError::AllChannelsFailed { errors: Vec::new() });
        assert_eq!(failed.user_message(), "Sending failed on every channel");

        let media = GesherError::from(MediaError::LoadFailed {
            reason: "stream aborted".to_string(),
        });
        assert_eq!(media.user_message(), "Media failed to load");
    }

    #[test]
    fn test_only_validation_failures_are_user_errors() {
        let invalid = GesherError::from(NotifyError::Invalid {
            fields: FieldErrors::new(),
        });
        assert!(invalid.is_user_error());

        let failed = GesherError::from(NotifyError::AllChannelsFailed { errors: Vec::new() });
        assert!(!failed.is_user_error());

        let media = GesherError::from(MediaError::ResolutionFailed {
            reason: "bucket unavailable".to_string(),
        });
        assert!(!media.is_user_error());
    }
}
