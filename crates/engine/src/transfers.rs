//! Outbound transfers and their one-time-passcode challenge.
//!
//! A customer transfer is persisted `Pending` together with a fresh OTP. The
//! debit happens only when the OTP is verified, at which point the transfer
//! becomes `Completed`, the OTP fields are cleared and the ledger entry id is
//! linked through `transaction_id`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, TransferDestination, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Completed,
    Failed,
}

impl TransferStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl TryFrom<&str> for TransferStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(EngineError::Validation(format!(
                "invalid transfer status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount_minor: i64,
    pub destination: TransferDestination,
    pub status: TransferStatus,
    /// Expiry of the outstanding OTP; `None` once consumed.
    pub otp_expires_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub transaction_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful transfer initiation. The OTP itself is only ever
/// sent out of band.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInitiated {
    pub transfer_id: Uuid,
    pub otp_expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub amount_minor: i64,
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
    pub routing_number: Option<String>,
    pub swift_code: Option<String>,
    pub bank_address: Option<String>,
    pub house_address: Option<String>,
    pub zip_code: Option<String>,
    pub status: String,
    pub otp: Option<String>,
    pub otp_expires_at: Option<DateTimeUtc>,
    pub scheduled_at: Option<DateTimeUtc>,
    pub transaction_id: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub(crate) fn destination(&self) -> TransferDestination {
        TransferDestination {
            bank_name: self.bank_name.clone(),
            account_number: self.account_number.clone(),
            account_name: self.account_name.clone(),
            routing_number: self.routing_number.clone(),
            swift_code: self.swift_code.clone(),
            bank_address: self.bank_address.clone(),
            house_address: self.house_address.clone(),
            zip_code: self.zip_code.clone(),
        }
    }
}

/// Builds the row for a new transfer. `otp` is `None` for privileged
/// transfers that skip the challenge.
pub(crate) fn new_active_model(
    id: Uuid,
    account_id: Uuid,
    amount_minor: i64,
    destination: &TransferDestination,
    status: TransferStatus,
    otp: Option<(String, DateTime<Utc>)>,
    scheduled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
) -> ActiveModel {
    let (otp, otp_expires_at) = match otp {
        Some((code, expires_at)) => (Some(code), Some(expires_at)),
        None => (None, None),
    };
    ActiveModel {
        id: ActiveValue::Set(id.to_string()),
        account_id: ActiveValue::Set(account_id.to_string()),
        amount_minor: ActiveValue::Set(amount_minor),
        bank_name: ActiveValue::Set(destination.bank_name.clone()),
        account_number: ActiveValue::Set(destination.account_number.clone()),
        account_name: ActiveValue::Set(destination.account_name.clone()),
        routing_number: ActiveValue::Set(destination.routing_number.clone()),
        swift_code: ActiveValue::Set(destination.swift_code.clone()),
        bank_address: ActiveValue::Set(destination.bank_address.clone()),
        house_address: ActiveValue::Set(destination.house_address.clone()),
        zip_code: ActiveValue::Set(destination.zip_code.clone()),
        status: ActiveValue::Set(status.as_str().to_string()),
        otp: ActiveValue::Set(otp),
        otp_expires_at: ActiveValue::Set(otp_expires_at),
        scheduled_at: ActiveValue::Set(scheduled_at),
        transaction_id: ActiveValue::Set(None),
        created_at: ActiveValue::Set(created_at),
    }
}

impl TryFrom<Model> for Transfer {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transfer")?,
            account_id: parse_uuid(&model.account_id, "account")?,
            amount_minor: model.amount_minor,
            destination: model.destination(),
            status: TransferStatus::try_from(model.status.as_str())?,
            otp_expires_at: model.otp_expires_at,
            scheduled_at: model.scheduled_at,
            transaction_id: model
                .transaction_id
                .as_deref()
                .map(|id| parse_uuid(id, "transaction"))
                .transpose()?,
            created_at: model.created_at,
        })
    }
}
