//! Outbound mail through an HTTP mail-provider API.
//!
//! One-time codes have no delivery path besides mail, so unlike the cache
//! these errors are surfaced to the caller rather than absorbed.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::MailSettings;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport is not configured")]
    NotConfigured,
    #[error("mail request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("mail delivery rejected: {0}")]
    Delivery(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

/// Client for a JSON mail API (Resend/Postmark style): bearer token, one
/// POST per message.
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    from: String,
}

impl HttpMailer {
    pub fn new(endpoint: String, token: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            token,
            from,
        }
    }

    /// Build a mailer from settings; `None` when no endpoint is configured,
    /// in which case callers should fall back to [`DisabledMailer`].
    pub fn from_settings(settings: &MailSettings) -> Option<Self> {
        let endpoint = settings.endpoint.clone()?;
        Some(Self::new(
            endpoint,
            settings.token.clone().unwrap_or_default(),
            settings.from.clone(),
        ))
    }
}

#[derive(Serialize)]
struct OutboundMail<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        let payload = OutboundMail {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.body,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(MailError::Delivery(format!("{status}: {detail}")));
        }

        Ok(())
    }
}

/// Placeholder mailer for deployments without a configured transport;
/// every send fails loudly.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, _message: MailMessage) -> Result<(), MailError> {
        Err(MailError::NotConfigured)
    }
}
