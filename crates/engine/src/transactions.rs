//! Ledger entries.
//!
//! A `Transaction` documents one balance-affecting event on an account. It is
//! created `Pending` (deposit/withdrawal requests) or directly `Success`
//! (loan credits, verified transfers) and is immutable once terminal.
//!
//! Amounts are positive magnitudes in minor units; the direction is given by
//! the kind: deposits credit, withdrawals and transfers debit.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Transfer => "transfer",
        }
    }

    /// Sign applied to the amount when the entry settles.
    pub fn signed(self, amount_minor: i64) -> i64 {
        match self {
            Self::Deposit => amount_minor,
            Self::Withdrawal | Self::Transfer => -amount_minor,
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "deposit" => Ok(Self::Deposit),
            "withdrawal" => Ok(Self::Withdrawal),
            "transfer" => Ok(Self::Transfer),
            other => Err(EngineError::Validation(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Only `Pending -> Success` and `Pending -> Failed` are valid.
    pub fn can_transition_to(self, next: TransactionStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Success) | (Self::Pending, Self::Failed)
        )
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(EngineError::Validation(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

/// Destination of an outbound transfer, kept as structured metadata on the
/// ledger entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferDestination {
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
    pub routing_number: Option<String>,
    pub swift_code: Option<String>,
    pub bank_address: Option<String>,
    pub house_address: Option<String>,
    pub zip_code: Option<String>,
}

/// Payee of a withdrawal request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRecipient {
    pub recipient_name: String,
    pub account_number: String,
    pub bank: String,
}

/// Structured metadata attached to a ledger entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionMetadata {
    Transfer(TransferDestination),
    Withdrawal(WithdrawalRecipient),
    Loan { loan_id: Uuid },
    Adjustment { note: Option<String> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub amount_minor: i64,
    pub description: String,
    pub metadata: Option<TransactionMetadata>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn new(
        account_id: Uuid,
        kind: TransactionKind,
        status: TransactionStatus,
        amount_minor: i64,
        description: String,
        metadata: Option<TransactionMetadata>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::Validation(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            account_id,
            kind,
            resolved_at: status.is_terminal().then_some(created_at),
            status,
            amount_minor,
            description,
            metadata,
            created_at,
        })
    }

    /// Signed effect on the balance once settled, zero otherwise.
    pub fn settled_effect(&self) -> i64 {
        match self.status {
            TransactionStatus::Success => self.kind.signed(self.amount_minor),
            TransactionStatus::Pending | TransactionStatus::Failed => 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub kind: String,
    pub status: String,
    pub amount_minor: i64,
    pub description: String,
    pub metadata: Option<String>,
    pub created_at: DateTimeUtc,
    pub resolved_at: Option<DateTimeUtc>,
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

impl TryFrom<&Transaction> for ActiveModel {
    type Error = EngineError;

    fn try_from(tx: &Transaction) -> Result<Self, Self::Error> {
        let metadata = tx
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|err| EngineError::Validation(format!("invalid metadata: {err}")))?;
        Ok(Self {
            id: ActiveValue::Set(tx.id.to_string()),
            account_id: ActiveValue::Set(tx.account_id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            description: ActiveValue::Set(tx.description.clone()),
            metadata: ActiveValue::Set(metadata),
            created_at: ActiveValue::Set(tx.created_at),
            resolved_at: ActiveValue::Set(tx.resolved_at),
        })
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let metadata = model
            .metadata
            .as_deref()
            .map(serde_json::from_str::<TransactionMetadata>)
            .transpose()
            .map_err(|err| EngineError::Validation(format!("invalid stored metadata: {err}")))?;
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            account_id: parse_uuid(&model.account_id, "account")?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            status: TransactionStatus::try_from(model.status.as_str())?,
            amount_minor: model.amount_minor,
            description: model.description,
            metadata,
            created_at: model.created_at,
            resolved_at: model.resolved_at,
        })
    }
}
