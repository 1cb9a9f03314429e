//! Centralized configuration for Gesher.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::time::Duration;

/// Central configuration for all Gesher components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct GesherConfig {
    pub media: MediaConfig,
    pub notify: NotifyConfig,
    pub server: ServerConfig,
}

/// Media preloading and readiness configuration.
///
/// Controls how asset download URLs are resolved against the storage
/// backend and how long the buffering wait may run before readiness is
/// declared anyway.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Storage bucket that hosts media assets
    pub storage_bucket: String,
    /// Base URL of the storage object API
    pub storage_api_base: String,
    /// HTTP timeout for a single URL resolution request
    pub resolve_timeout: Duration,
    /// Upper bound on the buffering wait; when it elapses the asset is
    /// declared ready anyway to keep the UI live on slow networks
    pub buffer_timeout: Duration,
    /// Bytes to prefetch before an asset counts as fully buffered
    pub prefetch_target: u64,
    /// Base URL assets resolve against in development mode
    pub dev_asset_base: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            storage_bucket: "gesher-media.appspot.com".to_string(),
            storage_api_base: "https://firebasestorage.googleapis.com/v0".to_string(),
            resolve_timeout: Duration::from_secs(10),
            buffer_timeout: Duration::from_secs(30),
            prefetch_target: 8 * 1024 * 1024, // 8 MiB
            dev_asset_base: "http://localhost:8080/media".to_string(),
        }
    }
}

/// Notification fan-out configuration.
///
/// Holds relay endpoints and credentials for the email and chat channels.
/// Missing chat credentials switch the chat relay into simulated mode.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Address the email relay delivers to
    pub email_to: String,
    /// Form relay ajax endpoint for email delivery
    pub email_endpoint: String,
    /// Destination phone number for chat messages, country-prefixed
    pub chat_to_number: String,
    /// Chat relay sender number
    pub chat_from_number: String,
    /// Chat relay account identifier (None = simulated mode)
    pub chat_account_sid: Option<String>,
    /// Chat relay auth token (None = simulated mode)
    pub chat_auth_token: Option<String>,
    /// HTTP timeout for a single channel delivery attempt
    pub delivery_timeout: Duration,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            email_to: "contact@gesher.example".to_string(),
            email_endpoint: "https://formsubmit.co/ajax".to_string(),
            chat_to_number: "972532217895".to_string(),
            chat_from_number: "whatsapp:+14155238886".to_string(),
            chat_account_sid: None,
            chat_auth_token: None,
            delivery_timeout: Duration::from_secs(15),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the web server binds to
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
        }
    }
}

impl GesherConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(bucket) = std::env::var("GESHER_STORAGE_BUCKET") {
            config.media.storage_bucket = bucket;
        }

        if let Ok(timeout) = std::env::var("GESHER_BUFFER_TIMEOUT") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.media.buffer_timeout = Duration::from_secs(seconds);
            }
        }

        if let Ok(target) = std::env::var("GESHER_PREFETCH_TARGET") {
            if let Ok(bytes) = target.parse::<u64>() {
                config.media.prefetch_target = bytes;
            }
        }

        if let Ok(to) = std::env::var("GESHER_EMAIL_TO") {
            config.notify.email_to = to;
        }

        if let Ok(number) = std::env::var("GESHER_WHATSAPP_TO_NUMBER") {
            config.notify.chat_to_number = number;
        }

        if let Ok(sid) = std::env::var("TWILIO_ACCOUNT_SID") {
            config.notify.chat_account_sid = Some(sid);
        }

        if let Ok(token) = std::env::var("TWILIO_AUTH_TOKEN") {
            config.notify.chat_auth_token = Some(token);
        }

        if let Ok(number) = std::env::var("TWILIO_WHATSAPP_NUMBER") {
            config.notify.chat_from_number = number;
        }

        if let Ok(addr) = std::env::var("GESHER_BIND_ADDRESS") {
            config.server.bind_address = addr;
        }

        config
    }

    /// Creates a configuration optimized for testing.
    ///
    /// Short timeouts so liveness tests complete quickly, and no chat
    /// credentials so the chat relay stays in simulated mode.
    pub fn for_testing() -> Self {
        let mut config = Self::default();
        config.media.buffer_timeout = Duration::from_millis(200);
        config.media.resolve_timeout = Duration::from_millis(200);
        config.notify.delivery_timeout = Duration::from_millis(200);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = GesherConfig::default();

        assert_eq!(config.media.buffer_timeout, Duration::from_secs(30));
        assert_eq!(config.media.prefetch_target, 8 * 1024 * 1024);
        assert_eq!(config.server.bind_address, "127.0.0.1:3000");
        assert!(config.notify.chat_account_sid.is_none());
        assert!(config.notify.chat_auth_token.is_none());
    }

    #[test]
    fn test_testing_preset_shrinks_timeouts() {
        let config = GesherConfig::for_testing();

        assert!(config.media.buffer_timeout < Duration::from_secs(1));
        assert!(config.notify.delivery_timeout < Duration::from_secs(1));
    }

    #[test]
    fn test_env_override() {
        unsafe {
            std::env::set_var("GESHER_BUFFER_TIMEOUT", "45");
            std::env::set_var("GESHER_STORAGE_BUCKET", "other-bucket");
            std::env::set_var("GESHER_WHATSAPP_TO_NUMBER", "972500000000");
        }

        let config = GesherConfig::from_env();

        assert_eq!(config.media.buffer_timeout, Duration::from_secs(45));
        assert_eq!(config.media.storage_bucket, "other-bucket");
        assert_eq!(config.notify.chat_to_number, "972500000000");

        // Cleanup
        unsafe {
            std::env::remove_var("GESHER_BUFFER_TIMEOUT");
            std::env::remove_var("GESHER_STORAGE_BUCKET");
            std::env::remove_var("GESHER_WHATSAPP_TO_NUMBER");
        }
    }
}
