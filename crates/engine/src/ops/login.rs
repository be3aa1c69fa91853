use chrono::{DateTime, Utc};
use sea_orm::{QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};

use crate::{
    Account, EngineError, OtpMessage, OtpPurpose, ResultEngine, accounts, secret::generate_otp,
    util::normalize_email,
};

use super::{Engine, otp_expiry, with_tx};

impl Engine {
    /// First sign-in step: check the password and mail a code.
    ///
    /// A new call replaces any outstanding code. Returns the code expiry.
    pub async fn initiate_login(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<DateTime<Utc>> {
        let account = self.authenticate(email, password).await?;
        let code = generate_otp();
        let expires_at = otp_expiry(now, OtpPurpose::Login);

        with_tx!(self, |db_tx| {
            let result = accounts::Entity::update_many()
                .col_expr(accounts::Column::LoginOtp, Expr::value(code.clone()))
                .col_expr(accounts::Column::LoginOtpExpiresAt, Expr::value(expires_at))
                .filter(accounts::Column::Id.eq(account.id.to_string()))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::Unauthorized);
            }
            Ok::<_, EngineError>(())
        })?;

        tracing::info!(account_id = %account.id, "sign-in code issued");
        self.dispatch_otp(OtpMessage {
            account_id: account.id,
            email: account.email,
            purpose: OtpPurpose::Login,
            code,
            expires_at,
        });
        Ok(expires_at)
    }

    /// Second sign-in step: consume the code and return the account.
    ///
    /// The code is cleared on success, so it signs in exactly once.
    pub async fn confirm_login(
        &self,
        email: &str,
        otp: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Account> {
        let email = normalize_email(email).map_err(|_| EngineError::InvalidOrExpiredOtp)?;
        let otp = otp.trim();

        with_tx!(self, |db_tx| {
            let model = accounts::Entity::find()
                .filter(accounts::Column::Email.eq(email.as_str()))
                .one(&db_tx)
                .await?
                .ok_or(EngineError::InvalidOrExpiredOtp)?;

            let valid = match (model.login_otp.as_deref(), model.login_otp_expires_at) {
                (Some(expected), Some(expires_at)) => expected == otp && now < expires_at,
                _ => false,
            };
            if !valid {
                tracing::warn!(account_id = %model.id, "sign-in rejected: invalid otp");
                return Err(EngineError::InvalidOrExpiredOtp);
            }

            let result = accounts::Entity::update_many()
                .col_expr(accounts::Column::LoginOtp, Expr::value(Option::<String>::None))
                .col_expr(
                    accounts::Column::LoginOtpExpiresAt,
                    Expr::value(Option::<DateTime<Utc>>::None),
                )
                .filter(accounts::Column::Id.eq(model.id.as_str()))
                .filter(accounts::Column::LoginOtp.eq(otp))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::InvalidOrExpiredOtp);
            }

            tracing::info!(account_id = %model.id, "signed in");
            Account::try_from(model)
        })
    }
}
