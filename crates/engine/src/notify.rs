//! Out-of-band delivery of one-time passcodes.
//!
//! The engine only hands an [`OtpMessage`] to a [`Notifier`] after the
//! challenge has been committed. Delivery is best effort: a failure is logged
//! and never undoes the persisted state.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Transfer,
    PinSetup,
    Login,
}

impl OtpPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::PinSetup => "pin_setup",
            Self::Login => "login",
        }
    }

    /// How long a code stays valid after it is issued.
    pub fn lifetime(self) -> Duration {
        match self {
            Self::Transfer | Self::PinSetup => Duration::minutes(5),
            Self::Login => Duration::minutes(10),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpMessage {
    pub account_id: Uuid,
    pub email: String,
    pub purpose: OtpPurpose,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Port used to reach the account holder.
#[async_trait]
pub trait Notifier: fmt::Debug + Send + Sync {
    async fn send_otp(&self, message: &OtpMessage) -> Result<(), NotifyError>;
}

/// Writes the challenge to the log. The code itself is only emitted at
/// `debug` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_otp(&self, message: &OtpMessage) -> Result<(), NotifyError> {
        tracing::info!(
            account_id = %message.account_id,
            email = %message.email,
            purpose = message.purpose.as_str(),
            expires_at = %message.expires_at,
            "one-time passcode issued"
        );
        tracing::debug!(account_id = %message.account_id, code = %message.code, "otp code");
        Ok(())
    }
}
