//! The module contains the errors the ledger engine can throw.
//!
//! Every variant except [`Database`] is a recoverable, typed failure that the
//! caller can map to a client response. [`Database`] is only returned after
//! the surrounding database transaction has been rolled back, so no partial
//! balance mutation is ever visible.
//!
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid credentials")]
    Unauthorized,
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Incorrect PIN")]
    InvalidPin,
    #[error("Transaction PIN not set")]
    PinNotSet,
    #[error("Invalid or expired OTP")]
    InvalidOrExpiredOtp,
    #[error("Already processed: {0}")]
    AlreadyProcessed(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("Loan approval failed: {0}")]
    LoanApprovalFailed(String),
    #[error("Secret hashing failed: {0}")]
    Secret(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::Unauthorized, Self::Unauthorized) => true,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::InvalidPin, Self::InvalidPin) => true,
            (Self::PinNotSet, Self::PinNotSet) => true,
            (Self::InvalidOrExpiredOtp, Self::InvalidOrExpiredOtp) => true,
            (Self::AlreadyProcessed(a), Self::AlreadyProcessed(b)) => a == b,
            (Self::InvalidTransition(a), Self::InvalidTransition(b)) => a == b,
            (Self::LoanApprovalFailed(a), Self::LoanApprovalFailed(b)) => a == b,
            (Self::Secret(a), Self::Secret(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
