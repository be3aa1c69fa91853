use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Success envelope: `{ "success": true, ...data }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Ack<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T> Ack<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Failure body: `{ "success": false, "error": "..." }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Register {
        pub name: String,
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        pub email: String,
        pub password: String,
    }

    /// Password accepted; the sign-in code is on its way.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginStarted {
        pub message: String,
        pub otp_expires_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginVerify {
        pub email: String,
        pub otp: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TokenResponse {
        /// HS256 bearer token.
        pub token: String,
        pub expires_at: DateTime<Utc>,
        pub account: super::account::AccountView,
    }
}

pub mod account {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Role {
        Customer,
        Admin,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum AccountStatus {
        Active,
        Suspended,
        Closed,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum AccountType {
        Savings,
        Checking,
        Business,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: Uuid,
        pub name: String,
        pub email: String,
        pub role: Role,
        pub account_number: String,
        pub account_type: AccountType,
        pub status: AccountStatus,
        pub balance_minor: i64,
        pub pin_set: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountResponse {
        pub account: AccountView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProfileUpdate {
        pub name: String,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Deposit,
        Withdrawal,
        Transfer,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionStatus {
        Pending,
        Success,
        Failed,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DepositNew {
        /// Must be > 0.
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WithdrawalNew {
        /// Must be > 0.
        pub amount_minor: i64,
        pub recipient_name: String,
        pub account_number: String,
        pub bank: String,
    }

    /// Back-office resolution of a pending deposit or withdrawal.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionConfirm {
        pub status: TransactionStatus,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub kind: TransactionKind,
        pub status: TransactionStatus,
        /// Positive magnitude; the kind gives the direction.
        pub amount_minor: i64,
        pub description: String,
        /// Structured details (transfer destination, withdrawal payee, ...).
        pub metadata: Option<serde_json::Value>,
        pub created_at: DateTime<Utc>,
        pub resolved_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionResponse {
        pub transaction: TransactionView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
    }
}

pub mod loan {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum LoanStatus {
        Pending,
        Approved,
        Rejected,
        Paid,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum LoanDecision {
        Approved,
        Rejected,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoanNew {
        pub amount_minor: i64,
        pub purpose: String,
        pub duration_months: i32,
        pub employment_status: String,
        pub monthly_income_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoanDecide {
        pub decision: LoanDecision,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoanView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub amount_minor: i64,
        pub purpose: String,
        pub duration_months: i32,
        pub employment_status: String,
        pub monthly_income_minor: i64,
        pub status: LoanStatus,
        pub credit_transaction_id: Option<Uuid>,
        pub created_at: DateTime<Utc>,
        pub decided_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoanResponse {
        pub loan: LoanView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoanListResponse {
        pub loans: Vec<LoanView>,
    }
}

pub mod transfer {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransferStatus {
        Pending,
        Completed,
        Failed,
    }

    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Destination {
        pub bank_name: String,
        pub account_number: String,
        pub account_name: String,
        pub routing_number: Option<String>,
        pub swift_code: Option<String>,
        pub bank_address: Option<String>,
        pub house_address: Option<String>,
        pub zip_code: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferInitiate {
        pub amount_minor: i64,
        #[serde(flatten)]
        pub destination: Destination,
        /// Four-digit transaction PIN.
        pub pin: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferInitiated {
        pub transfer_id: Uuid,
        pub otp_expires_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferVerify {
        pub transfer_id: Uuid,
        pub otp: String,
    }

    /// Privileged transfer issued from the back office.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AdminTransferNew {
        pub account_id: Uuid,
        pub amount_minor: i64,
        #[serde(flatten)]
        pub destination: Destination,
        pub scheduled_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub amount_minor: i64,
        #[serde(flatten)]
        pub destination: Destination,
        pub status: TransferStatus,
        pub otp_expires_at: Option<DateTime<Utc>>,
        pub scheduled_at: Option<DateTime<Utc>>,
        pub transaction_id: Option<Uuid>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferResponse {
        pub transfer: TransferView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferListResponse {
        pub transfers: Vec<TransferView>,
    }
}

pub mod pin {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PinSetup {
        /// Exactly four digits.
        pub pin: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PinSetupStarted {
        pub otp_expires_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PinVerify {
        pub otp: String,
    }
}

pub mod admin {
    use super::*;
    use crate::account::{AccountStatus, AccountType, AccountView, Role};

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CustomerList {
        /// Restrict to one role; all accounts when absent.
        pub role: Option<Role>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CustomerListResponse {
        pub accounts: Vec<AccountView>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CustomerUpdate {
        pub status: Option<AccountStatus>,
        pub account_type: Option<AccountType>,
        pub name: Option<String>,
        pub email: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceAdjust {
        /// Target balance; the difference is ledgered as an adjustment.
        pub balance_minor: i64,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Deleted {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Statistic {
        pub total_customers: u64,
        pub approved_loans: u64,
        pub successful_transactions: u64,
        pub successful_volume_minor: i64,
    }
}
