//! Back-office operations. Callers are expected to have checked that the
//! actor holds the admin role.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Account, AccountStatus, AccountType, EngineError, Loan, LoanStatus, Money, ResultEngine, Role,
    Transaction, TransactionKind, TransactionMetadata, TransactionStatus, Transfer,
    TransferDestination, TransferStatus, accounts, loans, transactions, transfers,
    util::{
        ensure_positive_amount, normalize_destination, normalize_email,
        normalize_optional_text, normalize_required_text,
    },
};

use super::{Engine, with_tx};

/// Fields an operator may change on an account. `None` leaves the field as is.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdate {
    pub status: Option<AccountStatus>,
    pub account_type: Option<AccountType>,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankStats {
    pub total_customers: u64,
    /// Loans that were approved and paid out.
    pub approved_loans: u64,
    pub successful_transactions: u64,
    pub successful_volume_minor: i64,
}

impl Engine {
    /// All accounts, newest first, optionally restricted to one role.
    pub async fn list_accounts(&self, role: Option<Role>) -> ResultEngine<Vec<Account>> {
        let mut query = accounts::Entity::find().order_by_desc(accounts::Column::CreatedAt);
        if let Some(role) = role {
            query = query.filter(accounts::Column::Role.eq(role.as_str()));
        }
        let models = query.all(&self.database).await?;
        models
            .into_iter()
            .map(Account::try_from)
            .collect::<ResultEngine<Vec<_>>>()
    }

    pub async fn update_account(
        &self,
        account_id: Uuid,
        update: AccountUpdate,
    ) -> ResultEngine<Account> {
        let name = update
            .name
            .as_deref()
            .map(|name| normalize_required_text(name, "name"))
            .transpose()?;
        let email = update.email.as_deref().map(normalize_email).transpose()?;

        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id).await?;
            if let Some(email) = email.as_deref() {
                let taken = accounts::Entity::find()
                    .filter(accounts::Column::Email.eq(email))
                    .filter(accounts::Column::Id.ne(account_id.to_string()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if taken {
                    return Err(EngineError::ExistingKey(email.to_string()));
                }
            }

            let mut active: accounts::ActiveModel = model.into();
            if let Some(status) = update.status {
                active.status = ActiveValue::Set(status.as_str().to_string());
            }
            if let Some(account_type) = update.account_type {
                active.account_type = ActiveValue::Set(account_type.as_str().to_string());
            }
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(email) = email {
                active.email = ActiveValue::Set(email);
            }
            let model = active.update(&db_tx).await?;
            tracing::info!(%account_id, status = %model.status, "account updated");
            Account::try_from(model)
        })
    }

    /// Operator override of the balance.
    ///
    /// The difference is recorded as a settled deposit or withdrawal in the
    /// same unit, so the balance stays equal to the ledger sum. Setting the
    /// current value records nothing.
    pub async fn adjust_balance(
        &self,
        account_id: Uuid,
        new_balance_minor: i64,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> ResultEngine<Account> {
        if new_balance_minor < 0 {
            return Err(EngineError::Validation(
                "balance must not be negative".to_string(),
            ));
        }
        let note = normalize_optional_text(note);

        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id).await?;
            let delta = new_balance_minor
                .checked_sub(model.balance)
                .ok_or_else(|| EngineError::Validation("balance overflow".to_string()))?;

            if delta != 0 {
                let kind = if delta > 0 {
                    self.increment(&db_tx, account_id, delta).await?;
                    TransactionKind::Deposit
                } else {
                    self.decrement(&db_tx, account_id, -delta).await?;
                    TransactionKind::Withdrawal
                };
                self.record(
                    &db_tx,
                    account_id,
                    kind,
                    TransactionStatus::Success,
                    delta.abs(),
                    format!("Balance adjustment to {}", Money::new(new_balance_minor)),
                    Some(TransactionMetadata::Adjustment { note }),
                    now,
                )
                .await?;
                tracing::info!(%account_id, delta, "balance adjusted");
            }

            let model = self.require_account(&db_tx, account_id).await?;
            Account::try_from(model)
        })
    }

    /// Remove an account with all its transfers, loans and ledger entries.
    pub async fn delete_account(&self, account_id: Uuid) -> ResultEngine<()> {
        let id = account_id.to_string();
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id).await?;
            transfers::Entity::delete_many()
                .filter(transfers::Column::AccountId.eq(id.as_str()))
                .exec(&db_tx)
                .await?;
            loans::Entity::delete_many()
                .filter(loans::Column::AccountId.eq(id.as_str()))
                .exec(&db_tx)
                .await?;
            transactions::Entity::delete_many()
                .filter(transactions::Column::AccountId.eq(id.as_str()))
                .exec(&db_tx)
                .await?;
            accounts::Entity::delete_by_id(id.clone())
                .exec(&db_tx)
                .await?;
            tracing::info!(%account_id, "account deleted");
            Ok(())
        })
    }

    /// Privileged transfer: debits immediately, without PIN or OTP.
    ///
    /// Produces a `Completed` transfer linked to a settled transfer entry.
    /// `scheduled_at` is informational only.
    pub async fn admin_transfer(
        &self,
        account_id: Uuid,
        amount_minor: i64,
        destination: TransferDestination,
        scheduled_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> ResultEngine<Transfer> {
        ensure_positive_amount(amount_minor)?;
        let destination = normalize_destination(&destination)?;

        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id).await?;
            self.decrement(&db_tx, account_id, amount_minor).await?;
            let description = format!(
                "Transfer to {} ({})",
                destination.account_name, destination.bank_name
            );
            let tx = self
                .record(
                    &db_tx,
                    account_id,
                    TransactionKind::Transfer,
                    TransactionStatus::Success,
                    amount_minor,
                    description,
                    Some(TransactionMetadata::Transfer(destination.clone())),
                    now,
                )
                .await?;

            let mut model = transfers::new_active_model(
                Uuid::new_v4(),
                account_id,
                amount_minor,
                &destination,
                TransferStatus::Completed,
                None,
                scheduled_at,
                now,
            );
            model.transaction_id = ActiveValue::Set(Some(tx.id.to_string()));
            let model = model.insert(&db_tx).await?;
            let transfer = Transfer::try_from(model)?;
            tracing::info!(
                transfer_id = %transfer.id,
                %account_id,
                amount = %Money::new(amount_minor),
                "admin transfer completed"
            );
            Ok(transfer)
        })
    }

    /// Every ledger entry, newest first.
    pub async fn list_all_transactions(&self) -> ResultEngine<Vec<Transaction>> {
        let models = transactions::Entity::find()
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .all(&self.database)
            .await?;
        models
            .into_iter()
            .map(Transaction::try_from)
            .collect::<ResultEngine<Vec<_>>>()
    }

    pub async fn list_all_loans(&self) -> ResultEngine<Vec<Loan>> {
        let models = loans::Entity::find()
            .order_by_desc(loans::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models
            .into_iter()
            .map(Loan::try_from)
            .collect::<ResultEngine<Vec<_>>>()
    }

    pub async fn list_all_transfers(&self) -> ResultEngine<Vec<Transfer>> {
        let models = transfers::Entity::find()
            .order_by_desc(transfers::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models
            .into_iter()
            .map(Transfer::try_from)
            .collect::<ResultEngine<Vec<_>>>()
    }

    /// Dashboard figures for the back office.
    pub async fn stats(&self) -> ResultEngine<BankStats> {
        let total_customers = accounts::Entity::find()
            .filter(accounts::Column::Role.eq(Role::Customer.as_str()))
            .count(&self.database)
            .await?;
        let approved_loans = loans::Entity::find()
            .filter(
                loans::Column::Status
                    .is_in([LoanStatus::Approved.as_str(), LoanStatus::Paid.as_str()]),
            )
            .count(&self.database)
            .await?;
        let settled = transactions::Entity::find()
            .filter(transactions::Column::Status.eq(TransactionStatus::Success.as_str()))
            .all(&self.database)
            .await?;

        let mut volume: i64 = 0;
        for model in &settled {
            volume = volume
                .checked_add(model.amount_minor)
                .ok_or_else(|| EngineError::Validation("volume overflow".to_string()))?;
        }

        Ok(BankStats {
            total_customers,
            approved_loans,
            successful_transactions: settled.len() as u64,
            successful_volume_minor: volume,
        })
    }
}
