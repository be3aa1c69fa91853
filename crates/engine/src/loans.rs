//! Loan applications.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

/// `Pending -> Approved -> Paid` or `Pending -> Rejected`.
///
/// `Approved` only exists inside the approval unit: the credit is applied in
/// the same database transaction, which leaves the loan `Paid` on commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
}

impl LoanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Paid => "paid",
        }
    }

    pub fn can_transition_to(self, next: LoanStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Rejected)
                | (Self::Approved, Self::Paid)
        )
    }
}

impl TryFrom<&str> for LoanStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "paid" => Ok(Self::Paid),
            other => Err(EngineError::Validation(format!(
                "invalid loan status: {other}"
            ))),
        }
    }
}

/// Back-office decision on a pending loan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanDecision {
    Approved,
    Rejected,
}

/// Input of a loan request, validated by [`LoanApplication::validate`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub amount_minor: i64,
    pub purpose: String,
    pub duration_months: i32,
    pub employment_status: String,
    pub monthly_income_minor: i64,
}

impl LoanApplication {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.amount_minor <= 0 {
            return Err(EngineError::Validation(
                "invalid loan amount: must be > 0".to_string(),
            ));
        }
        if self.duration_months <= 0 {
            return Err(EngineError::Validation(
                "invalid loan duration: must be > 0".to_string(),
            ));
        }
        if self.purpose.trim().is_empty() {
            return Err(EngineError::Validation(
                "loan purpose must not be empty".to_string(),
            ));
        }
        if self.employment_status.trim().is_empty() {
            return Err(EngineError::Validation(
                "employment status must not be empty".to_string(),
            ));
        }
        if self.monthly_income_minor <= 0 {
            return Err(EngineError::Validation(
                "invalid monthly income: must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount_minor: i64,
    pub purpose: String,
    pub duration_months: i32,
    pub employment_status: String,
    pub monthly_income_minor: i64,
    pub status: LoanStatus,
    /// Ledger entry crediting the principal, set once the loan is paid out.
    pub credit_transaction_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "loans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub amount_minor: i64,
    pub purpose: String,
    pub duration_months: i32,
    pub employment_status: String,
    pub monthly_income_minor: i64,
    pub status: String,
    pub credit_transaction_id: Option<String>,
    pub created_at: DateTimeUtc,
    pub decided_at: Option<DateTimeUtc>,
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

impl From<&Loan> for ActiveModel {
    fn from(loan: &Loan) -> Self {
        Self {
            id: ActiveValue::Set(loan.id.to_string()),
            account_id: ActiveValue::Set(loan.account_id.to_string()),
            amount_minor: ActiveValue::Set(loan.amount_minor),
            purpose: ActiveValue::Set(loan.purpose.clone()),
            duration_months: ActiveValue::Set(loan.duration_months),
            employment_status: ActiveValue::Set(loan.employment_status.clone()),
            monthly_income_minor: ActiveValue::Set(loan.monthly_income_minor),
            status: ActiveValue::Set(loan.status.as_str().to_string()),
            credit_transaction_id: ActiveValue::Set(
                loan.credit_transaction_id.map(|id| id.to_string()),
            ),
            created_at: ActiveValue::Set(loan.created_at),
            decided_at: ActiveValue::Set(loan.decided_at),
        }
    }
}

impl TryFrom<Model> for Loan {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "loan")?,
            account_id: parse_uuid(&model.account_id, "account")?,
            amount_minor: model.amount_minor,
            purpose: model.purpose,
            duration_months: model.duration_months,
            employment_status: model.employment_status,
            monthly_income_minor: model.monthly_income_minor,
            status: LoanStatus::try_from(model.status.as_str())?,
            credit_transaction_id: model
                .credit_transaction_id
                .as_deref()
                .map(|id| parse_uuid(id, "transaction"))
                .transpose()?,
            created_at: model.created_at,
            decided_at: model.decided_at,
        })
    }
}
