//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use uuid::Uuid;

use crate::{EngineError, ResultEngine, TransferDestination};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::Validation(format!("invalid {label} id")))
}

/// Amounts entering the ledger are positive magnitudes.
pub(crate) fn ensure_positive_amount(amount_minor: i64) -> ResultEngine<()> {
    if amount_minor <= 0 {
        return Err(EngineError::Validation(
            "amount_minor must be > 0".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

pub(crate) fn normalize_email(value: &str) -> ResultEngine<String> {
    let email = normalize_required_text(value, "email")?.to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(EngineError::Validation(format!("invalid email: {email}"))),
    }
}

/// Trim every field and require bank name, account number and account name.
pub(crate) fn normalize_destination(
    destination: &TransferDestination,
) -> ResultEngine<TransferDestination> {
    Ok(TransferDestination {
        bank_name: normalize_required_text(&destination.bank_name, "bank name")?,
        account_number: normalize_required_text(&destination.account_number, "account number")?,
        account_name: normalize_required_text(&destination.account_name, "account name")?,
        routing_number: normalize_optional_text(destination.routing_number.as_deref()),
        swift_code: normalize_optional_text(destination.swift_code.as_deref()),
        bank_address: normalize_optional_text(destination.bank_address.as_deref()),
        house_address: normalize_optional_text(destination.house_address.as_deref()),
        zip_code: normalize_optional_text(destination.zip_code.as_deref()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_lowercased_and_checked() {
        assert_eq!(
            normalize_email("  Alice@Example.COM ").unwrap(),
            "alice@example.com"
        );
        assert!(normalize_email("alice").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("alice@localhost").is_err());
    }

    #[test]
    fn destination_requires_core_fields() {
        let dest = TransferDestination {
            bank_name: " First Bank ".to_string(),
            account_number: "0123".to_string(),
            account_name: "Jane".to_string(),
            routing_number: Some("   ".to_string()),
            ..Default::default()
        };
        let normalized = normalize_destination(&dest).unwrap();
        assert_eq!(normalized.bank_name, "First Bank");
        assert_eq!(normalized.routing_number, None);

        let missing = TransferDestination {
            account_name: String::new(),
            ..dest
        };
        assert!(matches!(
            normalize_destination(&missing),
            Err(EngineError::Validation(_))
        ));
    }
}
