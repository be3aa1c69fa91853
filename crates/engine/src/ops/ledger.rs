use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine, Transaction, TransactionKind, TransactionMetadata,
    TransactionStatus, WithdrawalRecipient, accounts, transactions,
    util::{ensure_positive_amount, normalize_required_text},
};

use super::{Engine, with_tx};

impl Engine {
    /// Append an entry to the ledger. Does not touch any balance.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn record(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        kind: TransactionKind,
        status: TransactionStatus,
        amount_minor: i64,
        description: String,
        metadata: Option<TransactionMetadata>,
        now: DateTime<Utc>,
    ) -> ResultEngine<Transaction> {
        let tx = Transaction::new(
            account_id,
            kind,
            status,
            amount_minor,
            description,
            metadata,
            now,
        )?;
        let model = transactions::ActiveModel::try_from(&tx)?;
        model.insert(db).await?;
        Ok(tx)
    }

    /// Move a pending entry to a terminal status.
    ///
    /// The write is conditional on the stored status still being `pending`,
    /// so two concurrent confirmations cannot both succeed.
    pub(crate) async fn update_status(
        &self,
        db: &DatabaseTransaction,
        transaction_id: Uuid,
        new_status: TransactionStatus,
        now: DateTime<Utc>,
    ) -> ResultEngine<Transaction> {
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("transaction {transaction_id}")))?;
        let mut tx = Transaction::try_from(model)?;
        if !tx.status.can_transition_to(new_status) {
            return Err(EngineError::InvalidTransition(format!(
                "transaction {} -> {}",
                tx.status.as_str(),
                new_status.as_str()
            )));
        }

        let result = transactions::Entity::update_many()
            .col_expr(
                transactions::Column::Status,
                Expr::value(new_status.as_str()),
            )
            .col_expr(transactions::Column::ResolvedAt, Expr::value(now))
            .filter(transactions::Column::Id.eq(transaction_id.to_string()))
            .filter(transactions::Column::Status.eq(TransactionStatus::Pending.as_str()))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::InvalidTransition(format!(
                "transaction {transaction_id} is no longer pending"
            )));
        }

        tx.status = new_status;
        tx.resolved_at = Some(now);
        Ok(tx)
    }

    /// Register a deposit awaiting back-office confirmation.
    pub async fn request_deposit(
        &self,
        account_id: Uuid,
        amount_minor: i64,
        now: DateTime<Utc>,
    ) -> ResultEngine<Transaction> {
        ensure_positive_amount(amount_minor)?;
        with_tx!(self, |db_tx| {
            self.require_active_account(&db_tx, account_id).await?;
            let tx = self
                .record(
                    &db_tx,
                    account_id,
                    TransactionKind::Deposit,
                    TransactionStatus::Pending,
                    amount_minor,
                    format!("Deposit of {}", Money::new(amount_minor)),
                    None,
                    now,
                )
                .await?;
            tracing::info!(transaction_id = %tx.id, %account_id, "deposit requested");
            Ok(tx)
        })
    }

    /// Register a withdrawal awaiting back-office confirmation.
    ///
    /// Funds are checked when the withdrawal is confirmed, not here.
    pub async fn request_withdrawal(
        &self,
        account_id: Uuid,
        amount_minor: i64,
        recipient: WithdrawalRecipient,
        now: DateTime<Utc>,
    ) -> ResultEngine<Transaction> {
        ensure_positive_amount(amount_minor)?;
        let recipient = WithdrawalRecipient {
            recipient_name: normalize_required_text(&recipient.recipient_name, "recipient name")?,
            account_number: normalize_required_text(&recipient.account_number, "account number")?,
            bank: normalize_required_text(&recipient.bank, "bank")?,
        };
        with_tx!(self, |db_tx| {
            self.require_active_account(&db_tx, account_id).await?;
            let description = format!(
                "Withdrawal of {} to {}",
                Money::new(amount_minor),
                recipient.recipient_name
            );
            let tx = self
                .record(
                    &db_tx,
                    account_id,
                    TransactionKind::Withdrawal,
                    TransactionStatus::Pending,
                    amount_minor,
                    description,
                    Some(TransactionMetadata::Withdrawal(recipient)),
                    now,
                )
                .await?;
            tracing::info!(transaction_id = %tx.id, %account_id, "withdrawal requested");
            Ok(tx)
        })
    }

    /// Resolve a pending deposit or withdrawal.
    ///
    /// `Success` applies the balance change in the same unit as the status
    /// transition; a withdrawal the balance cannot cover fails with
    /// [`EngineError::InsufficientFunds`] and the entry stays pending.
    /// `Failed` only changes the status.
    pub async fn confirm_transaction(
        &self,
        transaction_id: Uuid,
        new_status: TransactionStatus,
        now: DateTime<Utc>,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let tx = self
                .update_status(&db_tx, transaction_id, new_status, now)
                .await?;
            if tx.status == TransactionStatus::Success {
                match tx.kind {
                    TransactionKind::Deposit => {
                        self.increment(&db_tx, tx.account_id, tx.amount_minor)
                            .await?
                    }
                    TransactionKind::Withdrawal | TransactionKind::Transfer => {
                        self.decrement(&db_tx, tx.account_id, tx.amount_minor)
                            .await?
                    }
                }
            }
            tracing::info!(
                transaction_id = %tx.id,
                account_id = %tx.account_id,
                kind = tx.kind.as_str(),
                status = tx.status.as_str(),
                "transaction resolved"
            );
            Ok(tx)
        })
    }

    /// Ledger entries of one account, newest first.
    pub async fn list_transactions(&self, account_id: Uuid) -> ResultEngine<Vec<Transaction>> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id).await?;
            let models = transactions::Entity::find()
                .filter(transactions::Column::AccountId.eq(account_id.to_string()))
                .order_by_desc(transactions::Column::CreatedAt)
                .order_by_desc(transactions::Column::Id)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Transaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Signed sum of the account's settled entries.
    pub async fn ledger_balance(&self, account_id: Uuid) -> ResultEngine<Money> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id).await?;
            let total = self.settled_sum(&db_tx, account_id).await?;
            Ok(Money::new(total))
        })
    }

    /// Rewrite the stored balance from the ledger.
    ///
    /// Returns the balance after the repair. Logs a warning when the stored
    /// value had drifted.
    pub async fn recompute_balance(&self, account_id: Uuid) -> ResultEngine<Money> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id).await?;
            let total = self.settled_sum(&db_tx, account_id).await?;
            if total != model.balance {
                tracing::warn!(
                    %account_id,
                    stored = model.balance,
                    ledger = total,
                    "stored balance drifted from ledger"
                );
                let mut active: accounts::ActiveModel = model.into();
                active.balance = ActiveValue::Set(total);
                active.update(&db_tx).await?;
            }
            Ok(Money::new(total))
        })
    }

    async fn settled_sum(&self, db: &DatabaseTransaction, account_id: Uuid) -> ResultEngine<i64> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.to_string()))
            .filter(transactions::Column::Status.eq(TransactionStatus::Success.as_str()))
            .all(db)
            .await?;

        let mut total: i64 = 0;
        for model in models {
            let tx = Transaction::try_from(model)?;
            total = total
                .checked_add(tx.settled_effect())
                .ok_or_else(|| EngineError::Validation("ledger sum overflow".to_string()))?;
        }
        Ok(total)
    }
}
