use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    Account, EngineError, OtpMessage, OtpPurpose, ResultEngine, accounts,
    secret::{generate_otp, hash_secret, validate_pin},
};

use super::{Engine, otp_expiry, with_tx};

impl Engine {
    /// Stage a new transaction PIN and send the OTP that confirms it.
    ///
    /// The staged PIN is not usable until [`Engine::confirm_pin_setup`]
    /// succeeds; a previously active PIN keeps working meanwhile. Returns
    /// the OTP expiry.
    pub async fn initiate_pin_setup(
        &self,
        account_id: Uuid,
        pin: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<DateTime<Utc>> {
        validate_pin(pin)?;
        let pending_hash = hash_secret(pin)?;

        let message = with_tx!(self, |db_tx| {
            let model = self.require_active_account(&db_tx, account_id).await?;
            let email = model.email.clone();
            let code = generate_otp();
            let expires_at = otp_expiry(now, OtpPurpose::PinSetup);

            let mut active: accounts::ActiveModel = model.into();
            active.pending_pin_hash = ActiveValue::Set(Some(pending_hash));
            active.pin_otp = ActiveValue::Set(Some(code.clone()));
            active.pin_otp_expires_at = ActiveValue::Set(Some(expires_at));
            active.update(&db_tx).await?;

            tracing::info!(%account_id, "pin setup initiated");
            Ok::<_, EngineError>(OtpMessage {
                account_id,
                email,
                purpose: OtpPurpose::PinSetup,
                code,
                expires_at,
            })
        })?;

        let expires_at = message.expires_at;
        self.dispatch_otp(message);
        Ok(expires_at)
    }

    /// Activate the staged PIN if `otp` matches and has not expired. The
    /// challenge is cleared, so the OTP cannot be reused.
    pub async fn confirm_pin_setup(
        &self,
        account_id: Uuid,
        otp: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id).await?;
            let otp = otp.trim();
            let pending_hash = match (
                model.pending_pin_hash.as_deref(),
                model.pin_otp.as_deref(),
                model.pin_otp_expires_at,
            ) {
                (Some(hash), Some(expected), Some(expires_at))
                    if expected == otp && now < expires_at =>
                {
                    hash.to_string()
                }
                _ => {
                    tracing::warn!(%account_id, "pin setup rejected: invalid otp");
                    return Err(EngineError::InvalidOrExpiredOtp);
                }
            };

            let result = accounts::Entity::update_many()
                .col_expr(accounts::Column::PinHash, Expr::value(pending_hash))
                .col_expr(
                    accounts::Column::PendingPinHash,
                    Expr::value(Option::<String>::None),
                )
                .col_expr(accounts::Column::PinOtp, Expr::value(Option::<String>::None))
                .col_expr(
                    accounts::Column::PinOtpExpiresAt,
                    Expr::value(Option::<DateTime<Utc>>::None),
                )
                .filter(accounts::Column::Id.eq(account_id.to_string()))
                .filter(accounts::Column::PinOtp.eq(otp))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::InvalidOrExpiredOtp);
            }

            let model = self.require_account(&db_tx, account_id).await?;
            tracing::info!(%account_id, "transaction pin activated");
            Account::try_from(model)
        })
    }
}
