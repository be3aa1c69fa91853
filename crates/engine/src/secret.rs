//! Secrets: password/PIN hashing, one-time passcodes and account numbers.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;

use crate::{EngineError, ResultEngine};

/// Hash a password or PIN with argon2 and a random salt (PHC string).
pub(crate) fn hash_secret(secret: &str) -> ResultEngine<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| EngineError::Secret(err.to_string()))
}

/// Compare a submitted secret against a stored PHC hash.
pub(crate) fn verify_secret(secret: &str, stored_hash: &str) -> ResultEngine<bool> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|err| EngineError::Secret(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok())
}

/// Six-digit one-time passcode.
pub(crate) fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Ten-digit account number with a non-zero leading digit.
pub(crate) fn generate_account_number() -> String {
    rand::thread_rng()
        .gen_range(1_000_000_000u64..=9_999_999_999)
        .to_string()
}

/// A transaction PIN is exactly four ASCII digits.
pub(crate) fn validate_pin(pin: &str) -> ResultEngine<()> {
    if pin.len() != 4 || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(EngineError::Validation("PIN must be 4 digits".to_string()));
    }
    Ok(())
}
