use chrono::{DateTime, Utc};
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    EngineError, Money, OtpMessage, OtpPurpose, ResultEngine, Transaction, TransactionKind,
    TransactionMetadata, TransactionStatus, Transfer, TransferDestination, TransferInitiated,
    TransferStatus,
    secret::{generate_otp, verify_secret},
    transfers,
    util::{ensure_positive_amount, normalize_destination},
};

use super::{Engine, otp_expiry, with_tx};

impl Engine {
    /// Start an outbound transfer.
    ///
    /// Checks the transaction PIN and that the balance covers the amount,
    /// then persists a `Pending` transfer with a fresh OTP and hands the OTP
    /// to the notifier. The balance is not touched and nothing is reserved:
    /// funds are checked again at verification.
    pub async fn initiate_transfer(
        &self,
        account_id: Uuid,
        amount_minor: i64,
        destination: TransferDestination,
        pin: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<TransferInitiated> {
        ensure_positive_amount(amount_minor)?;
        let destination = normalize_destination(&destination)?;

        let (initiated, message) = with_tx!(self, |db_tx| {
            let account = self.require_active_account(&db_tx, account_id).await?;
            let pin_hash = account.pin_hash.as_deref().ok_or(EngineError::PinNotSet)?;
            if !verify_secret(pin, pin_hash)? {
                tracing::warn!(%account_id, "transfer rejected: incorrect pin");
                return Err(EngineError::InvalidPin);
            }
            if account.balance < amount_minor {
                return Err(EngineError::InsufficientFunds(format!(
                    "balance {} is below {}",
                    Money::new(account.balance),
                    Money::new(amount_minor)
                )));
            }

            let transfer_id = Uuid::new_v4();
            let code = generate_otp();
            let expires_at = otp_expiry(now, OtpPurpose::Transfer);
            transfers::new_active_model(
                transfer_id,
                account_id,
                amount_minor,
                &destination,
                TransferStatus::Pending,
                Some((code.clone(), expires_at)),
                None,
                now,
            )
            .insert(&db_tx)
            .await?;

            tracing::info!(%transfer_id, %account_id, "transfer initiated");
            Ok::<_, EngineError>((
                TransferInitiated {
                    transfer_id,
                    otp_expires_at: expires_at,
                },
                OtpMessage {
                    account_id,
                    email: account.email,
                    purpose: OtpPurpose::Transfer,
                    code,
                    expires_at,
                },
            ))
        })?;

        self.dispatch_otp(message);
        Ok(initiated)
    }

    /// Complete a pending transfer with its OTP.
    ///
    /// In one unit: the transfer moves to `Completed` with the OTP cleared,
    /// the account is debited (funds re-checked) and a settled transfer entry
    /// carrying the destination is recorded. Any failure leaves the transfer
    /// `Pending` and the balance unchanged.
    pub async fn verify_transfer(
        &self,
        account_id: Uuid,
        transfer_id: Uuid,
        otp: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let model = transfers::Entity::find_by_id(transfer_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("transfer {transfer_id}")))?;
            let transfer = Transfer::try_from(model.clone())?;
            if transfer.account_id != account_id {
                return Err(EngineError::Forbidden(
                    "transfer belongs to another account".to_string(),
                ));
            }
            if transfer.status != TransferStatus::Pending {
                return Err(EngineError::AlreadyProcessed(format!(
                    "transfer {transfer_id} is {}",
                    transfer.status.as_str()
                )));
            }
            let otp_valid = match (model.otp.as_deref(), model.otp_expires_at) {
                (Some(expected), Some(expires_at)) => expected == otp.trim() && now < expires_at,
                _ => false,
            };
            if !otp_valid {
                tracing::warn!(%transfer_id, %account_id, "transfer rejected: invalid otp");
                return Err(EngineError::InvalidOrExpiredOtp);
            }

            let completed = transfers::Entity::update_many()
                .col_expr(
                    transfers::Column::Status,
                    Expr::value(TransferStatus::Completed.as_str()),
                )
                .col_expr(transfers::Column::Otp, Expr::value(Option::<String>::None))
                .col_expr(
                    transfers::Column::OtpExpiresAt,
                    Expr::value(Option::<DateTime<Utc>>::None),
                )
                .filter(transfers::Column::Id.eq(transfer_id.to_string()))
                .filter(transfers::Column::Status.eq(TransferStatus::Pending.as_str()))
                .exec(&db_tx)
                .await?;
            if completed.rows_affected == 0 {
                return Err(EngineError::AlreadyProcessed(format!(
                    "transfer {transfer_id}"
                )));
            }

            self.decrement(&db_tx, account_id, transfer.amount_minor)
                .await?;
            let description = format!(
                "Transfer to {} ({})",
                transfer.destination.account_name, transfer.destination.bank_name
            );
            let tx = self
                .record(
                    &db_tx,
                    account_id,
                    TransactionKind::Transfer,
                    TransactionStatus::Success,
                    transfer.amount_minor,
                    description,
                    Some(TransactionMetadata::Transfer(transfer.destination)),
                    now,
                )
                .await?;

            transfers::Entity::update_many()
                .col_expr(
                    transfers::Column::TransactionId,
                    Expr::value(tx.id.to_string()),
                )
                .filter(transfers::Column::Id.eq(transfer_id.to_string()))
                .exec(&db_tx)
                .await?;

            tracing::info!(
                %transfer_id,
                %account_id,
                amount = %Money::new(tx.amount_minor),
                "transfer completed"
            );
            Ok(tx)
        })
    }

    /// Transfers of one account, newest first.
    pub async fn list_transfers(&self, account_id: Uuid) -> ResultEngine<Vec<Transfer>> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id).await?;
            let models = transfers::Entity::find()
                .filter(transfers::Column::AccountId.eq(account_id.to_string()))
                .order_by_desc(transfers::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Transfer::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
