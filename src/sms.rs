//! SMS delivery abstraction.
//!
//! The OTP engine dispatches through [`SmsSender`] and treats delivery as
//! best-effort: a failed send is logged, never surfaced to the caller. The
//! default sender for local dev is [`LogSmsSender`], which logs and returns
//! `Ok(())`. [`Msg91Sender`] delivers through the MSG91 flow API.

use anyhow::{ensure, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::info;

const MSG91_FLOW_URL: &str = "https://control.msg91.com/api/v5/flow";

#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Deliver a message or return an error so the caller can log it.
    async fn send(&self, phone: &str, message: &str) -> Result<()>;
}

/// Local dev sender that logs the payload instead of sending a real SMS.
#[derive(Clone, Debug)]
pub struct LogSmsSender;

#[async_trait]
impl SmsSender for LogSmsSender {
    async fn send(&self, phone: &str, message: &str) -> Result<()> {
        info!(phone = %phone, message = %message, "sms send stub");
        Ok(())
    }
}

/// MSG91 flow-API sender.
pub struct Msg91Sender {
    client: reqwest::Client,
    api_key: SecretString,
    template_id: String,
}

impl Msg91Sender {
    #[must_use]
    pub fn new(api_key: SecretString, template_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            template_id,
        }
    }
}

#[async_trait]
impl SmsSender for Msg91Sender {
    async fn send(&self, phone: &str, message: &str) -> Result<()> {
        // MSG91 expects the number without the leading plus.
        let body = json!({
            "template_id": self.template_id,
            "short_url": "0",
            "recipients": [{
                "mobiles": phone.trim_start_matches('+'),
                "message": message,
            }],
        });

        let response = self
            .client
            .post(MSG91_FLOW_URL)
            .header("authkey", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .context("Failed to reach SMS provider")?;

        let status = response.status();
        ensure!(
            status.is_success(),
            "SMS provider returned {status}: {}",
            response.text().await.unwrap_or_default()
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_sender_always_succeeds() {
        let sender = LogSmsSender;
        let result = sender.send("+911234567890", "Your code is 123456").await;
        assert!(result.is_ok());
    }
}
