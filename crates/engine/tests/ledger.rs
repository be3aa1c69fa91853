mod common;

use chrono::Duration;

use common::{Harness, t0};
use engine::{
    AccountStatus, AccountUpdate, EngineError, Money, TransactionKind, TransactionStatus,
    WithdrawalRecipient,
};

fn recipient() -> WithdrawalRecipient {
    WithdrawalRecipient {
        recipient_name: "Alice Doe".to_string(),
        account_number: "1234567890".to_string(),
        bank: "Second Bank".to_string(),
    }
}

#[tokio::test]
async fn confirmed_deposit_credits_balance() {
    let h = Harness::new().await;
    let account = h.customer("alice@example.com").await;
    assert_eq!(account.balance, 0);

    let tx = h
        .engine
        .request_deposit(account.id, 500, t0())
        .await
        .unwrap();
    assert_eq!(tx.kind, TransactionKind::Deposit);
    assert_eq!(tx.status, TransactionStatus::Pending);
    assert_eq!(tx.amount_minor, 500);
    assert_eq!(h.engine.get_balance(account.id).await.unwrap(), Money::ZERO);

    let confirmed = h
        .engine
        .confirm_transaction(tx.id, TransactionStatus::Success, t0() + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(confirmed.status, TransactionStatus::Success);
    assert_eq!(confirmed.resolved_at, Some(t0() + Duration::hours(1)));
    assert_eq!(h.engine.get_balance(account.id).await.unwrap(), Money::new(500));

    let listed = h.engine.list_transactions(account.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, TransactionStatus::Success);
    h.assert_balanced(account.id).await;
}

#[tokio::test]
async fn uncovered_withdrawal_stays_pending() {
    let h = Harness::new().await;
    let account = h.customer("bob@example.com").await;
    h.fund(account.id, 100).await;

    let tx = h
        .engine
        .request_withdrawal(account.id, 250, recipient(), t0())
        .await
        .unwrap();
    assert_eq!(tx.status, TransactionStatus::Pending);

    let err = h
        .engine
        .confirm_transaction(tx.id, TransactionStatus::Success, t0())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert_eq!(h.engine.get_balance(account.id).await.unwrap(), Money::new(100));

    let listed = h.engine.list_transactions(account.id).await.unwrap();
    let stored = listed.iter().find(|t| t.id == tx.id).unwrap();
    assert_eq!(stored.status, TransactionStatus::Pending);
    assert_eq!(stored.resolved_at, None);
    h.assert_balanced(account.id).await;
}

#[tokio::test]
async fn covered_withdrawal_debits_balance() {
    let h = Harness::new().await;
    let account = h.customer("carol@example.com").await;
    h.fund(account.id, 1_000).await;

    let tx = h
        .engine
        .request_withdrawal(account.id, 400, recipient(), t0())
        .await
        .unwrap();
    h.engine
        .confirm_transaction(tx.id, TransactionStatus::Success, t0())
        .await
        .unwrap();
    assert_eq!(h.engine.get_balance(account.id).await.unwrap(), Money::new(600));
    h.assert_balanced(account.id).await;
}

#[tokio::test]
async fn concurrent_withdrawals_never_overdraw() {
    let h = Harness::new().await;
    let account = h.customer("dave@example.com").await;
    h.fund(account.id, 100).await;

    let first = h
        .engine
        .request_withdrawal(account.id, 60, recipient(), t0())
        .await
        .unwrap();
    let second = h
        .engine
        .request_withdrawal(account.id, 60, recipient(), t0())
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        h.engine
            .confirm_transaction(first.id, TransactionStatus::Success, t0()),
        h.engine
            .confirm_transaction(second.id, TransactionStatus::Success, t0()),
    );
    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(EngineError::InsufficientFunds(_))))
            .count(),
        1
    );
    assert_eq!(h.engine.get_balance(account.id).await.unwrap(), Money::new(40));
    h.assert_balanced(account.id).await;
}

#[tokio::test]
async fn terminal_entries_are_immutable() {
    let h = Harness::new().await;
    let account = h.customer("erin@example.com").await;

    let tx = h
        .engine
        .request_deposit(account.id, 300, t0())
        .await
        .unwrap();
    let failed = h
        .engine
        .confirm_transaction(tx.id, TransactionStatus::Failed, t0())
        .await
        .unwrap();
    assert_eq!(failed.status, TransactionStatus::Failed);
    assert_eq!(h.engine.get_balance(account.id).await.unwrap(), Money::ZERO);

    for next in [TransactionStatus::Success, TransactionStatus::Failed] {
        let err = h
            .engine
            .confirm_transaction(tx.id, next, t0())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition(_)));
    }

    let other = h
        .engine
        .request_deposit(account.id, 300, t0())
        .await
        .unwrap();
    let err = h
        .engine
        .confirm_transaction(other.id, TransactionStatus::Pending, t0())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));
    h.assert_balanced(account.id).await;
}

#[tokio::test]
async fn requests_validate_amount_and_account() {
    let h = Harness::new().await;
    let account = h.customer("frank@example.com").await;

    for amount in [0, -5] {
        let err = h
            .engine
            .request_deposit(account.id, amount, t0())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    let err = h
        .engine
        .request_deposit(uuid::Uuid::new_v4(), 100, t0())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    let err = h
        .engine
        .confirm_transaction(uuid::Uuid::new_v4(), TransactionStatus::Success, t0())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    let err = h
        .engine
        .request_withdrawal(
            account.id,
            100,
            WithdrawalRecipient {
                bank: "  ".to_string(),
                ..recipient()
            },
            t0(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn suspended_account_cannot_request() {
    let h = Harness::new().await;
    let account = h.customer("gina@example.com").await;
    let pending = h
        .engine
        .request_deposit(account.id, 200, t0())
        .await
        .unwrap();

    h.engine
        .update_account(
            account.id,
            AccountUpdate {
                status: Some(AccountStatus::Suspended),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = h
        .engine
        .request_deposit(account.id, 100, t0())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    // Back-office confirmation still goes through.
    h.engine
        .confirm_transaction(pending.id, TransactionStatus::Success, t0())
        .await
        .unwrap();
    assert_eq!(h.engine.get_balance(account.id).await.unwrap(), Money::new(200));
}

#[tokio::test]
async fn transactions_are_listed_newest_first() {
    let h = Harness::new().await;
    let account = h.customer("hugo@example.com").await;
    for (offset, amount) in [(0, 100), (1, 200), (2, 300)] {
        h.engine
            .request_deposit(account.id, amount, t0() + Duration::minutes(offset))
            .await
            .unwrap();
    }

    let amounts: Vec<i64> = h
        .engine
        .list_transactions(account.id)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.amount_minor)
        .collect();
    assert_eq!(amounts, vec![300, 200, 100]);
}

#[tokio::test]
async fn recompute_restores_drifted_balance() {
    use sea_orm::{ConnectionTrait, Statement};

    let h = Harness::new().await;
    let account = h.customer("iris@example.com").await;
    h.fund(account.id, 1_000).await;
    let settled = h
        .engine
        .request_withdrawal(account.id, 250, recipient(), t0())
        .await
        .unwrap();
    h.engine
        .confirm_transaction(settled.id, TransactionStatus::Success, t0())
        .await
        .unwrap();
    // Pending and failed entries never count towards the balance.
    h.engine
        .request_withdrawal(account.id, 100, recipient(), t0())
        .await
        .unwrap();
    let failed = h.engine.request_deposit(account.id, 500, t0()).await.unwrap();
    h.engine
        .confirm_transaction(failed.id, TransactionStatus::Failed, t0())
        .await
        .unwrap();
    assert_eq!(h.engine.ledger_balance(account.id).await.unwrap(), Money::new(750));

    let backend = h.db.get_database_backend();
    h.db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE accounts SET balance = ? WHERE id = ?",
        vec![9_999i64.into(), account.id.to_string().into()],
    ))
    .await
    .unwrap();
    assert_eq!(h.engine.get_balance(account.id).await.unwrap(), Money::new(9_999));

    let repaired = h.engine.recompute_balance(account.id).await.unwrap();
    assert_eq!(repaired, Money::new(750));
    h.assert_balanced(account.id).await;
}
