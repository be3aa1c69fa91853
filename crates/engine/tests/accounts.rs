mod common;

use chrono::Duration;
use common::{Harness, destination, t0};
use engine::{
    AccountStatus, AccountType, AccountUpdate, EngineError, LoanApplication, LoanDecision, Money,
    OtpPurpose, Role, TransactionKind, TransactionMetadata, TransactionStatus, TransferStatus,
};

#[tokio::test]
async fn open_account_defaults() {
    let h = Harness::new().await;
    let account = h
        .engine
        .open_account("  Alice Doe ", "Alice@Example.com", "s3cret!", Role::Customer, t0())
        .await
        .unwrap();

    assert_eq!(account.name, "Alice Doe");
    assert_eq!(account.email, "alice@example.com");
    assert_eq!(account.role, Role::Customer);
    assert_eq!(account.status, AccountStatus::Active);
    assert_eq!(account.account_type, AccountType::Savings);
    assert_eq!(account.balance, 0);
    assert!(!account.pin_set);
    assert_eq!(account.account_number.len(), 10);
    assert!(account.account_number.chars().all(|c| c.is_ascii_digit()));

    let err = h
        .engine
        .open_account("Other", "alice@example.com", "pw", Role::Customer, t0())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("alice@example.com".to_string()));

    let err = h
        .engine
        .open_account("Other", "other@example.com", "", Role::Customer, t0())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn authenticate_checks_password() {
    let h = Harness::new().await;
    let account = h.customer("bob@example.com").await;

    let signed_in = h
        .engine
        .authenticate("BOB@example.com", "correct horse")
        .await
        .unwrap();
    assert_eq!(signed_in.id, account.id);

    let err = h
        .engine
        .authenticate("bob@example.com", "wrong")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::Unauthorized);
    let err = h
        .engine
        .authenticate("nobody@example.com", "correct horse")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::Unauthorized);
}

#[tokio::test]
async fn profile_and_admin_updates() {
    let h = Harness::new().await;
    let account = h.customer("carol@example.com").await;
    h.customer("taken@example.com").await;

    let renamed = h
        .engine
        .update_profile(account.id, "Carol King")
        .await
        .unwrap();
    assert_eq!(renamed.name, "Carol King");

    let updated = h
        .engine
        .update_account(
            account.id,
            AccountUpdate {
                account_type: Some(AccountType::Business),
                email: Some("carol@corp.example.com".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.account_type, AccountType::Business);
    assert_eq!(updated.email, "carol@corp.example.com");
    assert_eq!(updated.name, "Carol King");

    let err = h
        .engine
        .update_account(
            account.id,
            AccountUpdate {
                email: Some("taken@example.com".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
}

#[tokio::test]
async fn list_accounts_filters_by_role() {
    let h = Harness::new().await;
    h.customer("dave@example.com").await;
    h.customer("erin@example.com").await;
    h.engine
        .open_account("Ops", "ops@bank.example.com", "admin-pw", Role::Admin, t0())
        .await
        .unwrap();

    assert_eq!(h.engine.list_accounts(None).await.unwrap().len(), 3);
    let customers = h
        .engine
        .list_accounts(Some(Role::Customer))
        .await
        .unwrap();
    assert_eq!(customers.len(), 2);
    assert!(customers.iter().all(|a| a.role == Role::Customer));
}

#[tokio::test]
async fn adjust_balance_is_ledgered() {
    let h = Harness::new().await;
    let account = h.customer("frank@example.com").await;
    h.fund(account.id, 1_000).await;

    let raised = h
        .engine
        .adjust_balance(account.id, 2_500, Some("goodwill credit"), t0())
        .await
        .unwrap();
    assert_eq!(raised.balance, 2_500);

    let lowered = h
        .engine
        .adjust_balance(account.id, 500, None, t0())
        .await
        .unwrap();
    assert_eq!(lowered.balance, 500);

    let unchanged = h
        .engine
        .adjust_balance(account.id, 500, None, t0())
        .await
        .unwrap();
    assert_eq!(unchanged.balance, 500);

    let entries = h.engine.list_transactions(account.id).await.unwrap();
    assert_eq!(entries.len(), 3);
    let adjustments: Vec<_> = entries
        .iter()
        .filter(|t| matches!(t.metadata, Some(TransactionMetadata::Adjustment { .. })))
        .collect();
    assert_eq!(adjustments.len(), 2);
    assert!(adjustments.iter().any(|t| {
        t.kind == TransactionKind::Deposit
            && t.amount_minor == 1_500
            && t.metadata
                == Some(TransactionMetadata::Adjustment {
                    note: Some("goodwill credit".to_string()),
                })
    }));
    assert!(
        adjustments
            .iter()
            .any(|t| t.kind == TransactionKind::Withdrawal && t.amount_minor == 2_000)
    );

    let err = h
        .engine
        .adjust_balance(account.id, -1, None, t0())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    h.assert_balanced(account.id).await;
}

#[tokio::test]
async fn admin_transfer_debits_immediately() {
    let h = Harness::new().await;
    let account = h.customer("gina@example.com").await;
    h.fund(account.id, 1_000).await;

    let transfer = h
        .engine
        .admin_transfer(account.id, 250, destination(), Some(t0()), t0())
        .await
        .unwrap();
    assert_eq!(transfer.status, TransferStatus::Completed);
    assert_eq!(transfer.scheduled_at, Some(t0()));
    assert_eq!(transfer.otp_expires_at, None);
    assert!(transfer.transaction_id.is_some());
    assert_eq!(h.engine.get_balance(account.id).await.unwrap(), Money::new(750));

    let err = h
        .engine
        .admin_transfer(account.id, 10_000, destination(), None, t0())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert_eq!(h.engine.list_all_transfers().await.unwrap().len(), 1);
    h.assert_balanced(account.id).await;
}

#[tokio::test]
async fn delete_account_cascades() {
    let h = Harness::new().await;
    let account = h.customer("hugo@example.com").await;
    let other = h.customer("iris@example.com").await;
    h.fund(account.id, 1_000).await;
    h.fund(other.id, 300).await;
    h.engine
        .submit_loan(
            account.id,
            LoanApplication {
                amount_minor: 500,
                purpose: "Car".to_string(),
                duration_months: 12,
                employment_status: "employed".to_string(),
                monthly_income_minor: 100_000,
            },
            t0(),
        )
        .await
        .unwrap();
    h.engine
        .admin_transfer(account.id, 100, destination(), None, t0())
        .await
        .unwrap();

    h.engine.delete_account(account.id).await.unwrap();

    let err = h.engine.account(account.id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
    assert!(h.engine.list_all_loans().await.unwrap().is_empty());
    assert!(h.engine.list_all_transfers().await.unwrap().is_empty());
    let remaining = h.engine.list_all_transactions().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].account_id, other.id);

    let err = h.engine.delete_account(account.id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn stats_summarize_settled_activity() {
    let h = Harness::new().await;
    let alice = h.customer("jane@example.com").await;
    let bob = h.customer("kurt@example.com").await;
    h.engine
        .open_account("Ops", "ops@bank.example.com", "admin-pw", Role::Admin, t0())
        .await
        .unwrap();

    h.fund(alice.id, 1_000).await;
    h.fund(bob.id, 400).await;
    let pending = h
        .engine
        .request_deposit(bob.id, 999, t0())
        .await
        .unwrap();
    assert_eq!(pending.status, TransactionStatus::Pending);

    let loan = h
        .engine
        .submit_loan(
            alice.id,
            LoanApplication {
                amount_minor: 2_000,
                purpose: "Tuition".to_string(),
                duration_months: 6,
                employment_status: "student".to_string(),
                monthly_income_minor: 50_000,
            },
            t0(),
        )
        .await
        .unwrap();
    h.engine
        .decide_loan(loan.id, LoanDecision::Approved, t0())
        .await
        .unwrap();

    let stats = h.engine.stats().await.unwrap();
    assert_eq!(stats.total_customers, 2);
    assert_eq!(stats.approved_loans, 1);
    assert_eq!(stats.successful_transactions, 3);
    assert_eq!(stats.successful_volume_minor, 3_400);
}

#[tokio::test]
async fn sign_in_code_is_single_use() {
    let mut h = Harness::new().await;
    let account = h.customer("carol@example.com").await;

    let expires_at = h
        .engine
        .initiate_login("carol@example.com", "correct horse", t0())
        .await
        .unwrap();
    assert_eq!(expires_at, t0() + Duration::minutes(10));
    let otp = h.next_otp(OtpPurpose::Login).await;
    assert_eq!(otp.account_id, account.id);
    assert_eq!(otp.code.len(), 6);

    let wrong = if otp.code == "123456" { "654321" } else { "123456" };
    let err = h
        .engine
        .confirm_login("carol@example.com", wrong, t0())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidOrExpiredOtp);

    let signed_in = h
        .engine
        .confirm_login("Carol@Example.com", &otp.code, t0() + Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(signed_in.id, account.id);

    let err = h
        .engine
        .confirm_login("carol@example.com", &otp.code, t0() + Duration::minutes(2))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidOrExpiredOtp);
}

#[tokio::test]
async fn sign_in_code_expires_after_ten_minutes() {
    let mut h = Harness::new().await;
    h.customer("dave@example.com").await;

    h.engine
        .initiate_login("dave@example.com", "correct horse", t0())
        .await
        .unwrap();
    let otp = h.next_otp(OtpPurpose::Login).await;

    let err = h
        .engine
        .confirm_login("dave@example.com", &otp.code, t0() + Duration::minutes(10))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidOrExpiredOtp);

    // A fresh request replaces the stale code.
    let later = t0() + Duration::minutes(11);
    h.engine
        .initiate_login("dave@example.com", "correct horse", later)
        .await
        .unwrap();
    let fresh = h.next_otp(OtpPurpose::Login).await;
    h.engine
        .confirm_login("dave@example.com", &fresh.code, later)
        .await
        .unwrap();
}

#[tokio::test]
async fn wrong_password_issues_no_code() {
    let h = Harness::new().await;
    h.customer("erin@example.com").await;

    let err = h
        .engine
        .initiate_login("erin@example.com", "wrong", t0())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::Unauthorized);

    let err = h
        .engine
        .confirm_login("erin@example.com", "123456", t0())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidOrExpiredOtp);
}
