//! Outbound notification channel.
//!
//! The pipeline and the threshold alerter only see the [`Notifier`] trait;
//! the concrete channel is constructed once at startup and injected through
//! router state. Delivery is single-attempt: a failed send is final for that
//! notification.

use anyhow::{anyhow, Result};
use serde_json::json;

// ---

/// A mail-sending capability: `send(to, subject, body) -> success|failure`.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// [`Notifier`] that posts messages to an HTTP mail relay
/// (SendGrid/Mailgun-style JSON endpoint).
pub struct MailRelayNotifier {
    // ---
    client: reqwest::Client,
    relay_url: String,
    relay_key: Option<String>,
    from: String,
}

impl MailRelayNotifier {
    pub fn new(relay_url: String, relay_key: Option<String>, from: String) -> Self {
        // ---
        MailRelayNotifier {
            client: reqwest::Client::new(),
            relay_url,
            relay_key,
            from,
        }
    }
}

#[async_trait::async_trait]
impl Notifier for MailRelayNotifier {
    // ---
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        // ---
        let message = json!({
            "from": self.from,
            "to": to,
            "subject": subject,
            "text": body,
        });

        let mut request = self.client.post(&self.relay_url).json(&message);
        if let Some(key) = &self.relay_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "mail relay rejected message with status {}",
                response.status()
            ));
        }

        tracing::info!("Notification sent to {}: {}", to, subject);
        Ok(())
    }
}

/// Stand-in for deployments without a configured mail relay. Logs the
/// would-be message and reports failure, so alert dispatch follows the same
/// code path either way.
pub struct DisabledNotifier;

#[async_trait::async_trait]
impl Notifier for DisabledNotifier {
    // ---
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        // ---
        tracing::warn!(
            "Mail relay not configured; dropping notification to {} ({}): {}",
            to,
            subject,
            body
        );
        Err(anyhow!("mail relay not configured"))
    }
}
