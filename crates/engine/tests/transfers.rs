mod common;

use chrono::Duration;
use sea_orm::EntityTrait;

use common::{Harness, PIN, destination, t0};
use engine::{
    EngineError, Money, OtpPurpose, TransactionKind, TransactionMetadata, TransactionStatus,
    TransferDestination, TransferStatus, accounts, transfers,
};

#[tokio::test]
async fn verified_transfer_debits_once() {
    let mut h = Harness::new().await;
    let account = h.funded_customer("alice@example.com", 1_000).await;

    let initiated = h
        .engine
        .initiate_transfer(account.id, 300, destination(), PIN, t0())
        .await
        .unwrap();
    assert_eq!(initiated.otp_expires_at, t0() + Duration::minutes(5));
    let otp = h.next_otp(OtpPurpose::Transfer).await;
    assert_eq!(otp.account_id, account.id);
    assert_eq!(otp.email, "alice@example.com");
    assert_eq!(otp.code.len(), 6);

    let pending = h.engine.list_transfers(account.id).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].status, TransferStatus::Pending);
    assert_eq!(h.engine.get_balance(account.id).await.unwrap(), Money::new(1_000));

    let tx = h
        .engine
        .verify_transfer(
            account.id,
            initiated.transfer_id,
            &otp.code,
            t0() + Duration::minutes(2),
        )
        .await
        .unwrap();
    assert_eq!(tx.kind, TransactionKind::Transfer);
    assert_eq!(tx.status, TransactionStatus::Success);
    assert_eq!(tx.amount_minor, 300);
    assert_eq!(
        tx.metadata,
        Some(TransactionMetadata::Transfer(destination()))
    );
    assert_eq!(h.engine.get_balance(account.id).await.unwrap(), Money::new(700));

    let transfer = h.engine.list_transfers(account.id).await.unwrap().remove(0);
    assert_eq!(transfer.status, TransferStatus::Completed);
    assert_eq!(transfer.transaction_id, Some(tx.id));
    assert_eq!(transfer.otp_expires_at, None);

    let stored = transfers::Entity::find_by_id(initiated.transfer_id.to_string())
        .one(&h.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.otp, None);

    let transfer_entries = h
        .engine
        .list_transactions(account.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|t| t.kind == TransactionKind::Transfer)
        .count();
    assert_eq!(transfer_entries, 1);
    h.assert_balanced(account.id).await;
}

#[tokio::test]
async fn otp_is_single_use() {
    let mut h = Harness::new().await;
    let account = h.funded_customer("bob@example.com", 1_000).await;

    let initiated = h
        .engine
        .initiate_transfer(account.id, 100, destination(), PIN, t0())
        .await
        .unwrap();
    let otp = h.next_otp(OtpPurpose::Transfer).await;

    h.engine
        .verify_transfer(account.id, initiated.transfer_id, &otp.code, t0())
        .await
        .unwrap();
    let err = h
        .engine
        .verify_transfer(account.id, initiated.transfer_id, &otp.code, t0())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AlreadyProcessed(_)));
    assert_eq!(h.engine.get_balance(account.id).await.unwrap(), Money::new(900));
    h.assert_balanced(account.id).await;
}

#[tokio::test]
async fn expired_otp_is_rejected() {
    let mut h = Harness::new().await;
    let account = h.funded_customer("carol@example.com", 1_000).await;

    let initiated = h
        .engine
        .initiate_transfer(account.id, 100, destination(), PIN, t0())
        .await
        .unwrap();
    let otp = h.next_otp(OtpPurpose::Transfer).await;

    let err = h
        .engine
        .verify_transfer(
            account.id,
            initiated.transfer_id,
            &otp.code,
            t0() + Duration::minutes(6),
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidOrExpiredOtp);

    let transfer = h.engine.list_transfers(account.id).await.unwrap().remove(0);
    assert_eq!(transfer.status, TransferStatus::Pending);
    assert_eq!(h.engine.get_balance(account.id).await.unwrap(), Money::new(1_000));
}

#[tokio::test]
async fn wrong_otp_keeps_transfer_pending() {
    let mut h = Harness::new().await;
    let account = h.funded_customer("dave@example.com", 1_000).await;

    let initiated = h
        .engine
        .initiate_transfer(account.id, 100, destination(), PIN, t0())
        .await
        .unwrap();
    let otp = h.next_otp(OtpPurpose::Transfer).await;
    let wrong = if otp.code == "123456" { "654321" } else { "123456" };

    let err = h
        .engine
        .verify_transfer(account.id, initiated.transfer_id, wrong, t0())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidOrExpiredOtp);

    // The right code still works afterwards.
    h.engine
        .verify_transfer(account.id, initiated.transfer_id, &otp.code, t0())
        .await
        .unwrap();
    assert_eq!(h.engine.get_balance(account.id).await.unwrap(), Money::new(900));
}

#[tokio::test]
async fn initiation_checks_pin_and_funds() {
    let mut h = Harness::new().await;
    let no_pin = h.customer("erin@example.com").await;
    h.fund(no_pin.id, 1_000).await;
    let err = h
        .engine
        .initiate_transfer(no_pin.id, 100, destination(), PIN, t0())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::PinNotSet);

    let account = h.funded_customer("frank@example.com", 500).await;
    let err = h
        .engine
        .initiate_transfer(account.id, 100, destination(), "0000", t0())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidPin);

    let err = h
        .engine
        .initiate_transfer(account.id, 501, destination(), PIN, t0())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    let err = h
        .engine
        .initiate_transfer(
            account.id,
            100,
            TransferDestination {
                bank_name: String::new(),
                ..destination()
            },
            PIN,
            t0(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    assert!(h.engine.list_transfers(account.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn funds_are_rechecked_at_verification() {
    let mut h = Harness::new().await;
    let account = h.funded_customer("gina@example.com", 500).await;

    let initiated = h
        .engine
        .initiate_transfer(account.id, 400, destination(), PIN, t0())
        .await
        .unwrap();
    let otp = h.next_otp(OtpPurpose::Transfer).await;

    // The balance drops below the amount between initiation and verification.
    let withdrawal = h
        .engine
        .request_withdrawal(
            account.id,
            300,
            engine::WithdrawalRecipient {
                recipient_name: "Gina".to_string(),
                account_number: "42".to_string(),
                bank: "Other Bank".to_string(),
            },
            t0(),
        )
        .await
        .unwrap();
    h.engine
        .confirm_transaction(withdrawal.id, TransactionStatus::Success, t0())
        .await
        .unwrap();

    let err = h
        .engine
        .verify_transfer(account.id, initiated.transfer_id, &otp.code, t0())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    let transfer = h.engine.list_transfers(account.id).await.unwrap().remove(0);
    assert_eq!(transfer.status, TransferStatus::Pending);
    assert_eq!(transfer.transaction_id, None);
    assert_eq!(h.engine.get_balance(account.id).await.unwrap(), Money::new(200));
    h.assert_balanced(account.id).await;
}

#[tokio::test]
async fn only_the_owner_can_verify() {
    let mut h = Harness::new().await;
    let owner = h.funded_customer("hugo@example.com", 500).await;
    let intruder = h.customer("iris@example.com").await;

    let initiated = h
        .engine
        .initiate_transfer(owner.id, 100, destination(), PIN, t0())
        .await
        .unwrap();
    let otp = h.next_otp(OtpPurpose::Transfer).await;

    let err = h
        .engine
        .verify_transfer(intruder.id, initiated.transfer_id, &otp.code, t0())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = h
        .engine
        .verify_transfer(owner.id, uuid::Uuid::new_v4(), &otp.code, t0())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn pin_is_active_only_after_otp_confirmation() {
    let mut h = Harness::new().await;
    let account = h.customer("jane@example.com").await;
    h.fund(account.id, 500).await;

    let err = h
        .engine
        .initiate_pin_setup(account.id, "12a4", t0())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let expires_at = h
        .engine
        .initiate_pin_setup(account.id, "1357", t0())
        .await
        .unwrap();
    assert_eq!(expires_at, t0() + Duration::minutes(5));
    let otp = h.next_otp(OtpPurpose::PinSetup).await;
    assert!(!h.engine.account(account.id).await.unwrap().pin_set);

    let err = h
        .engine
        .initiate_transfer(account.id, 100, destination(), "1357", t0())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::PinNotSet);

    let err = h
        .engine
        .confirm_pin_setup(account.id, &otp.code, t0() + Duration::minutes(10))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidOrExpiredOtp);

    let confirmed = h
        .engine
        .confirm_pin_setup(account.id, &otp.code, t0() + Duration::minutes(1))
        .await
        .unwrap();
    assert!(confirmed.pin_set);

    let err = h
        .engine
        .confirm_pin_setup(account.id, &otp.code, t0() + Duration::minutes(1))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidOrExpiredOtp);

    h.engine
        .initiate_transfer(account.id, 100, destination(), "1357", t0())
        .await
        .unwrap();
}

#[tokio::test]
async fn failed_delivery_keeps_the_challenge() {
    let mut h = Harness::new().await;
    let account = h.funded_customer("alice@example.com", 1_000).await;
    let (engine, mut attempts) = h.failing_engine().await;

    let initiated = engine
        .initiate_transfer(account.id, 400, destination(), PIN, t0())
        .await
        .unwrap();
    let attempt = attempts.recv().await.unwrap();
    assert_eq!(attempt.purpose, OtpPurpose::Transfer);

    let pending = engine.list_transfers(account.id).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].status, TransferStatus::Pending);

    let stored = transfers::Entity::find_by_id(initiated.transfer_id.to_string())
        .one(&h.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.otp.as_deref(), Some(attempt.code.as_str()));

    engine
        .verify_transfer(account.id, initiated.transfer_id, &attempt.code, t0())
        .await
        .unwrap();
    assert_eq!(engine.get_balance(account.id).await.unwrap(), Money::new(600));

    engine
        .initiate_pin_setup(account.id, "1357", t0())
        .await
        .unwrap();
    let attempt = attempts.recv().await.unwrap();
    assert_eq!(attempt.purpose, OtpPurpose::PinSetup);
    let stored = accounts::Entity::find_by_id(account.id.to_string())
        .one(&h.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.pin_otp.as_deref(), Some(attempt.code.as_str()));
    assert!(stored.pending_pin_hash.is_some());

    engine
        .confirm_pin_setup(account.id, &attempt.code, t0())
        .await
        .unwrap();
    engine
        .initiate_transfer(account.id, 100, destination(), "1357", t0())
        .await
        .unwrap();
    h.assert_balanced(account.id).await;
}
