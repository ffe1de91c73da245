use reqwest::Client;
use std::time::Duration;

use crate::config::MailConfig;
use crate::errors::MailError;
use crate::notification::Notification;

/// Hard timeout for one send.
pub const MAIL_TIMEOUT: Duration = Duration::from_secs(30);

/// Mailgun HTTP API client.
#[derive(Clone)]
pub struct MailgunService {
    client: Client,
    messages_url: String,
    api_key: String,
    sender: String,
}

impl MailgunService {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let client = Client::builder()
            .timeout(MAIL_TIMEOUT)
            .build()
            .map_err(MailError::Transport)?;

        Ok(Self {
            client,
            messages_url: format!(
                "{}/v3/{}/messages",
                config.api_base.trim_end_matches('/'),
                config.domain
            ),
            api_key: config.api_key.clone(),
            sender: format!("{} <noreply@{}>", config.from_name, config.domain),
        })
    }

    /// `From:` header value derived from the sending domain.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Sends a plain-text notification to `recipient`, replying to `reply_to`.
    pub async fn send_notification(
        &self,
        recipient: &str,
        reply_to: &str,
        notification: &Notification,
    ) -> Result<(), MailError> {
        tracing::info!("Sending notification to {}: {}", recipient, notification.subject);

        let form = [
            ("from", self.sender.as_str()),
            ("to", recipient),
            ("subject", notification.subject.as_str()),
            ("text", notification.body.as_str()),
            ("h:Reply-To", reply_to),
        ];

        let response = self
            .client
            .post(&self.messages_url)
            .basic_auth("api", Some(&self.api_key))
            .form(&form)
            .send()
            .await
            .map_err(MailError::Transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MailError::Status { status, body });
        }

        tracing::info!("✓ Notification sent to {}", recipient);
        Ok(())
    }
}
