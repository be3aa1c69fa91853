//! Passcode delivery backends selected by `[mail]`.

use async_trait::async_trait;
use engine::{Notifier, NotifyError, OtpMessage};

/// Posts each [`OtpMessage`] as JSON to a mail relay.
#[derive(Debug)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_otp(&self, message: &OtpMessage) -> Result<(), NotifyError> {
        self.client
            .post(&self.url)
            .json(message)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| NotifyError::Delivery(err.to_string()))?;
        tracing::debug!(account_id = %message.account_id, "otp handed to relay");
        Ok(())
    }
}
