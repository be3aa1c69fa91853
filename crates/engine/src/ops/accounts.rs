use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Account, AccountStatus, AccountType, EngineError, Money, ResultEngine, Role, accounts,
    secret::{generate_account_number, hash_secret, verify_secret},
    util::{ensure_positive_amount, normalize_email, normalize_required_text},
};

use super::{Engine, with_tx};

/// Attempts at drawing an unused account number before giving up.
const ACCOUNT_NUMBER_ATTEMPTS: usize = 16;

impl Engine {
    /// Open a new account with a zero balance and a generated account number.
    ///
    /// The email is normalized to lowercase and must be unique. The password
    /// is stored as an argon2 hash.
    pub async fn open_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> ResultEngine<Account> {
        let name = normalize_required_text(name, "name")?;
        let email = normalize_email(email)?;
        if password.is_empty() {
            return Err(EngineError::Validation(
                "password must not be empty".to_string(),
            ));
        }
        let password_hash = hash_secret(password)?;

        with_tx!(self, |db_tx| {
            let taken = accounts::Entity::find()
                .filter(accounts::Column::Email.eq(email.as_str()))
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Err(EngineError::ExistingKey(email));
            }

            let account_number = self.unused_account_number(&db_tx).await?;
            let model = accounts::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                name: ActiveValue::Set(name),
                email: ActiveValue::Set(email),
                password_hash: ActiveValue::Set(password_hash),
                role: ActiveValue::Set(role.as_str().to_string()),
                account_number: ActiveValue::Set(account_number),
                account_type: ActiveValue::Set(AccountType::Savings.as_str().to_string()),
                status: ActiveValue::Set(AccountStatus::Active.as_str().to_string()),
                balance: ActiveValue::Set(0),
                pin_hash: ActiveValue::Set(None),
                pending_pin_hash: ActiveValue::Set(None),
                pin_otp: ActiveValue::Set(None),
                pin_otp_expires_at: ActiveValue::Set(None),
                login_otp: ActiveValue::Set(None),
                login_otp_expires_at: ActiveValue::Set(None),
                created_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            let account = Account::try_from(model)?;
            tracing::info!(account_id = %account.id, role = role.as_str(), "account opened");
            Ok(account)
        })
    }

    /// Check credentials. Unknown email and wrong password are
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> ResultEngine<Account> {
        let email = normalize_email(email).map_err(|_| EngineError::Unauthorized)?;
        let model = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email.as_str()))
            .one(&self.database)
            .await?
            .ok_or(EngineError::Unauthorized)?;

        if !verify_secret(password, &model.password_hash)? {
            tracing::warn!(account_id = %model.id, "rejected sign-in attempt");
            return Err(EngineError::Unauthorized);
        }
        Account::try_from(model)
    }

    /// Return an account snapshot from DB.
    pub async fn account(&self, account_id: Uuid) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id).await?;
            Account::try_from(model)
        })
    }

    pub async fn update_profile(&self, account_id: Uuid, name: &str) -> ResultEngine<Account> {
        let name = normalize_required_text(name, "name")?;
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id).await?;
            let mut active: accounts::ActiveModel = model.into();
            active.name = ActiveValue::Set(name);
            let model = active.update(&db_tx).await?;
            Account::try_from(model)
        })
    }

    /// Current stored balance of the account.
    pub async fn get_balance(&self, account_id: Uuid) -> ResultEngine<Money> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id).await?;
            Ok(Money::new(model.balance))
        })
    }

    /// Credit `amount_minor` in one statement. Closed accounts cannot receive
    /// funds.
    pub(crate) async fn increment(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        amount_minor: i64,
    ) -> ResultEngine<()> {
        ensure_positive_amount(amount_minor)?;
        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).add(amount_minor),
            )
            .filter(accounts::Column::Id.eq(account_id.to_string()))
            .filter(accounts::Column::Status.ne(AccountStatus::Closed.as_str()))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            self.require_account(db, account_id).await?;
            return Err(EngineError::Forbidden("account is closed".to_string()));
        }
        Ok(())
    }

    /// Debit `amount_minor` in one conditional statement: the row only
    /// changes when the balance covers the amount, so two concurrent debits
    /// can never both pass the check.
    pub(crate) async fn decrement(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        amount_minor: i64,
    ) -> ResultEngine<()> {
        ensure_positive_amount(amount_minor)?;
        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).sub(amount_minor),
            )
            .filter(accounts::Column::Id.eq(account_id.to_string()))
            .filter(accounts::Column::Status.ne(AccountStatus::Closed.as_str()))
            .filter(accounts::Column::Balance.gte(amount_minor))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            let model = self.require_account(db, account_id).await?;
            if model.status()? == AccountStatus::Closed {
                return Err(EngineError::Forbidden("account is closed".to_string()));
            }
            return Err(EngineError::InsufficientFunds(format!(
                "balance {} is below {}",
                Money::new(model.balance),
                Money::new(amount_minor)
            )));
        }
        Ok(())
    }

    async fn unused_account_number(&self, db: &DatabaseTransaction) -> ResultEngine<String> {
        for _ in 0..ACCOUNT_NUMBER_ATTEMPTS {
            let candidate = generate_account_number();
            let taken = accounts::Entity::find()
                .filter(accounts::Column::AccountNumber.eq(candidate.as_str()))
                .one(db)
                .await?
                .is_some();
            if !taken {
                return Ok(candidate);
            }
        }
        Err(EngineError::ExistingKey("account number".to_string()))
    }
}
