use anyhow::Context;
use axum::async_trait;
use serde_json::json;
use tracing::debug;

use crate::config::NotifyConfig;

/// Outbound notification seam. Every call site runs inside a detached task:
/// the HTTP response never waits on these, and errors are logged and dropped.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_chat_message(&self, text: &str) -> anyhow::Result<()>;
    async fn send_email(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()>;
}

/// Notifier backed by the Telegram bot API and the Resend email API.
#[derive(Clone)]
pub struct HttpNotifier {
    http: reqwest::Client,
    config: NotifyConfig,
}

impl HttpNotifier {
    pub fn new(config: NotifyConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send_chat_message(&self, text: &str) -> anyhow::Result<()> {
        if self.config.telegram_bot_token.is_empty() || self.config.telegram_chat_id.is_empty() {
            debug!("telegram credentials not configured, skipping chat message");
            return Ok(());
        }

        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.config.telegram_bot_token
        );
        let resp = self
            .http
            .post(&url)
            .json(&json!({
                "chat_id": self.config.telegram_chat_id,
                "text": text,
            }))
            .send()
            .await
            .context("telegram sendMessage request")?;

        resp.error_for_status().context("telegram sendMessage status")?;
        Ok(())
    }

    async fn send_email(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        if self.config.resend_api_key.is_empty() {
            debug!("resend credentials not configured, skipping email");
            return Ok(());
        }

        let resp = self
            .http
            .post("https://api.resend.com/emails")
            .bearer_auth(&self.config.resend_api_key)
            .json(&json!({
                "from": self.config.email_from,
                "to": [to],
                "subject": subject,
                "html": html,
            }))
            .send()
            .await
            .context("resend send request")?;

        resp.error_for_status().context("resend send status")?;
        Ok(())
    }
}
