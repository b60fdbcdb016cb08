use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::EmailConfig;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("email transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("email provider returned {status}: {body}")]
    Api { status: u16, body: String },
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &[String], subject: &str, text: &str) -> Result<(), MailError>;
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: String,
}

/// Resend transactional email client.
pub struct ResendMailer {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(config: &EmailConfig) -> Result<Self, MailError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    #[instrument(skip(self, text), fields(recipients = to.len()))]
    async fn send(&self, to: &[String], subject: &str, text: &str) -> Result<(), MailError> {
        let res = self
            .http
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&SendEmailRequest {
                from: &self.from,
                to,
                subject,
                text,
            })
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Email send failed");
            return Err(MailError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let sent: SendEmailResponse = res.json().await?;
        info!(email_id = %sent.id, "Email sent");
        Ok(())
    }
}
