//! Production relay implementations for the notification channels.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use serde_json::json;

use crate::config::NotifyConfig;
use crate::notify::channels::{ChannelError, ChatReceipt, ChatRelay, EmailReceipt, EmailRelay};
use crate::notify::request::NotificationRequest;

/// Response body of the form relay ajax endpoint.
///
/// `success` arrives as the string `"true"`/`"false"` or as a boolean
/// depending on the relay version, so both are accepted.
#[derive(Debug, Deserialize)]
struct FormRelayResponse {
    #[serde(default)]
    success: serde_json::Value,
    #[serde(default)]
    message: Option<String>,
}

impl FormRelayResponse {
    fn accepted(&self) -> bool {
        match &self.success {
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::String(s) => s == "true",
            _ => false,
        }
    }
}

/// Email relay backed by a FormSubmit-style ajax endpoint.
///
/// Posts the submission fields as JSON to `{endpoint}/{destination}`. The
/// relay replies `success: false` while the destination address is pending
/// verification; that surfaces as `accepted: false`, not as an error.
pub struct FormRelayEmail {
    client: reqwest::Client,
    endpoint: String,
    to: String,
}

impl FormRelayEmail {
    /// Creates a relay for the configured destination address.
    pub fn new(config: &NotifyConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.delivery_timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: config.email_endpoint.clone(),
            to: config.email_to.clone(),
        }
    }
}

#[async_trait::async_trait]
impl EmailRelay for FormRelayEmail {
    async fn send(&self, request: &NotificationRequest) -> Result<EmailReceipt, ChannelError> {
        let url = format!("{}/{}", self.endpoint, self.to);
        let body = json!({
            "_subject": format!("New inquiry from the website: {}", request.subject),
            "subject": request.subject,
            "name": request.full_name(),
            "phone": request.phone,
            "email": request.email,
            "message": request.message,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::RequestFailed {
                reason: format!("email relay request failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(ChannelError::Rejected {
                reason: format!("email relay returned {}", response.status()),
            });
        }

        let parsed: FormRelayResponse =
            response
                .json()
                .await
                .map_err(|e| ChannelError::RequestFailed {
                    reason: format!("invalid email relay response: {e}"),
                })?;

        Ok(EmailReceipt {
            accepted: parsed.accepted(),
            detail: parsed.message,
        })
    }
}

/// Email relay that only logs, for development mode.
pub struct LoggingEmailRelay;

#[async_trait::async_trait]
impl EmailRelay for LoggingEmailRelay {
    async fn send(&self, request: &NotificationRequest) -> Result<EmailReceipt, ChannelError> {
        tracing::info!(
            "email (simulated): to inquiry inbox, from {} <{}>, subject {}",
            request.full_name(),
            request.email,
            request.subject
        );
        Ok(EmailReceipt {
            accepted: true,
            detail: Some("simulated".to_string()),
        })
    }
}

/// Response body of the Twilio messages API.
#[derive(Debug, Deserialize)]
struct TwilioMessageResponse {
    sid: String,
    status: String,
}

/// WhatsApp relay via the Twilio messages API.
///
/// When account credentials are absent the relay runs in simulated mode:
/// the message is logged and a fabricated receipt returned. This is the
/// documented sandbox behavior, not a production fallback.
pub struct TwilioWhatsApp {
    client: reqwest::Client,
    config: NotifyConfig,
}

impl TwilioWhatsApp {
    /// Creates a relay for the configured destination number.
    pub fn new(config: NotifyConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.delivery_timeout)
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    fn destination(&self) -> String {
        self.config.chat_to_number.trim_start_matches('+').to_string()
    }
}

#[async_trait::async_trait]
impl ChatRelay for TwilioWhatsApp {
    async fn send(&self, body: &str) -> Result<ChatReceipt, ChannelError> {
        let to = self.destination();

        let (Some(sid), Some(token)) = (
            self.config.chat_account_sid.as_ref(),
            self.config.chat_auth_token.as_ref(),
        ) else {
            tracing::info!("WhatsApp message (simulated) to {}: {}", to, body);
            let stamp = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis();
            return Ok(ChatReceipt {
                id: format!("simulated_{stamp}"),
                status: "sent".to_string(),
            });
        };

        let url = format!("https://api.twilio.com/2010-04-01/Accounts/{sid}/Messages.json");
        let params = [
            ("From", self.config.chat_from_number.clone()),
            ("To", format!("whatsapp:+{to}")),
            ("Body", body.to_string()),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(sid, Some(token))
            .form(&params)
            .send()
            .await
            .map_err(|e| ChannelError::RequestFailed {
                reason: format!("chat relay request failed: {e}"),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(ChannelError::Rejected {
                reason: format!("chat relay returned {status}: {detail}"),
            });
        }

        let parsed: TwilioMessageResponse =
            response
                .json()
                .await
                .map_err(|e| ChannelError::RequestFailed {
                    reason: format!("invalid chat relay response: {e}"),
                })?;

        Ok(ChatReceipt {
            id: parsed.sid,
            status: parsed.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::request::NotificationRequest;

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

    #[test]
    fn test_form_relay_success_field_accepts_both_encodings() {
        let as_string: FormRelayResponse =
            serde_json::from_str(r#"{"success":"true","message":"sent"}"#).unwrap();
        assert!(as_string.accepted());

        let as_bool: FormRelayResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(as_bool.accepted());

        let pending: FormRelayResponse =
            serde_json::from_str(r#"{"success":"false","message":"verify your email"}"#).unwrap();
        assert!(!pending.accepted());
        assert_eq!(pending.message.as_deref(), Some("verify your email"));
    }

    #[tokio::test]
    async fn test_twilio_without_credentials_simulates_success() {
        let relay = TwilioWhatsApp::new(NotifyConfig::default());
        let receipt = relay.send("hello").await.unwrap();
        assert!(receipt.id.starts_with("simulated_"));
        assert_eq!(receipt.status, "sent");
    }

    #[tokio::test]
    async fn test_logging_email_relay_accepts() {
        let receipt = LoggingEmailRelay.send(&request()).await.unwrap();
        assert!(receipt.accepted);
    }

    #[test]
    fn test_destination_strips_plus_prefix() {
        let config = NotifyConfig {
            chat_to_number: "+972532217895".to_string(),
            ..NotifyConfig::default()
        };
        let relay = TwilioWhatsApp::new(config);
        assert_eq!(relay.destination(), "972532217895");
    }
}
