use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, DatabaseTransaction, prelude::*};
use uuid::Uuid;

use crate::{
    AccountStatus, EngineError, LogNotifier, Notifier, OtpMessage, OtpPurpose, ResultEngine,
};

mod accounts;
mod admin;
mod ledger;
mod loans;
mod login;
mod pin;
mod transfers;

pub use admin::{AccountUpdate, BankStats};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    notifier: Arc<dyn Notifier>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Hand a committed challenge to the notifier without waiting for it.
    fn dispatch_otp(&self, message: OtpMessage) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(err) = notifier.send_otp(&message).await {
                tracing::error!(
                    account_id = %message.account_id,
                    purpose = message.purpose.as_str(),
                    "failed to deliver otp: {err}"
                );
            }
        });
    }

    async fn require_account(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<crate::accounts::Model> {
        crate::accounts::Entity::find_by_id(account_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("account {account_id}")))
    }

    /// Like [`Engine::require_account`], but the account must be `Active`.
    async fn require_active_account(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<crate::accounts::Model> {
        let model = self.require_account(db, account_id).await?;
        let status = model.status()?;
        if status != AccountStatus::Active {
            return Err(EngineError::Forbidden(format!(
                "account is {}",
                status.as_str()
            )));
        }
        Ok(model)
    }
}

fn otp_expiry(now: DateTime<Utc>, purpose: OtpPurpose) -> DateTime<Utc> {
    now + purpose.lifetime()
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    notifier: Option<Arc<dyn Notifier>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Where one-time passcodes are sent. Defaults to [`LogNotifier`].
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> EngineBuilder {
        self.notifier = Some(notifier);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            notifier: self.notifier.unwrap_or_else(|| Arc::new(LogNotifier)),
        })
    }
}
