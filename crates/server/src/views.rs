//! Engine models to wire types.

use api_types::{
    account::{self as api_account, AccountView},
    loan::{self as api_loan, LoanView},
    transaction::{self as api_transaction, TransactionView},
    transfer::{self as api_transfer, Destination, TransferView},
};
use engine::{
    Account, AccountStatus, AccountType, Loan, LoanStatus, Role, Transaction, TransactionKind,
    TransactionStatus, Transfer, TransferDestination, TransferStatus,
};

pub fn role(role: Role) -> api_account::Role {
    match role {
        Role::Customer => api_account::Role::Customer,
        Role::Admin => api_account::Role::Admin,
    }
}

pub fn role_from_api(role: api_account::Role) -> Role {
    match role {
        api_account::Role::Customer => Role::Customer,
        api_account::Role::Admin => Role::Admin,
    }
}

pub fn status_from_api(status: api_account::AccountStatus) -> AccountStatus {
    match status {
        api_account::AccountStatus::Active => AccountStatus::Active,
        api_account::AccountStatus::Suspended => AccountStatus::Suspended,
        api_account::AccountStatus::Closed => AccountStatus::Closed,
    }
}

pub fn account_type_from_api(account_type: api_account::AccountType) -> AccountType {
    match account_type {
        api_account::AccountType::Savings => AccountType::Savings,
        api_account::AccountType::Checking => AccountType::Checking,
        api_account::AccountType::Business => AccountType::Business,
    }
}

pub fn account(account: Account) -> AccountView {
    AccountView {
        id: account.id,
        name: account.name,
        email: account.email,
        role: role(account.role),
        account_number: account.account_number,
        account_type: match account.account_type {
            AccountType::Savings => api_account::AccountType::Savings,
            AccountType::Checking => api_account::AccountType::Checking,
            AccountType::Business => api_account::AccountType::Business,
        },
        status: match account.status {
            AccountStatus::Active => api_account::AccountStatus::Active,
            AccountStatus::Suspended => api_account::AccountStatus::Suspended,
            AccountStatus::Closed => api_account::AccountStatus::Closed,
        },
        balance_minor: account.balance,
        pin_set: account.pin_set,
        created_at: account.created_at,
    }
}

pub fn transaction(tx: Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        account_id: tx.account_id,
        kind: match tx.kind {
            TransactionKind::Deposit => api_transaction::TransactionKind::Deposit,
            TransactionKind::Withdrawal => api_transaction::TransactionKind::Withdrawal,
            TransactionKind::Transfer => api_transaction::TransactionKind::Transfer,
        },
        status: transaction_status(tx.status),
        amount_minor: tx.amount_minor,
        description: tx.description,
        metadata: tx
            .metadata
            .and_then(|metadata| serde_json::to_value(metadata).ok()),
        created_at: tx.created_at,
        resolved_at: tx.resolved_at,
    }
}

fn transaction_status(status: TransactionStatus) -> api_transaction::TransactionStatus {
    match status {
        TransactionStatus::Pending => api_transaction::TransactionStatus::Pending,
        TransactionStatus::Success => api_transaction::TransactionStatus::Success,
        TransactionStatus::Failed => api_transaction::TransactionStatus::Failed,
    }
}

pub fn transaction_status_from_api(
    status: api_transaction::TransactionStatus,
) -> TransactionStatus {
    match status {
        api_transaction::TransactionStatus::Pending => TransactionStatus::Pending,
        api_transaction::TransactionStatus::Success => TransactionStatus::Success,
        api_transaction::TransactionStatus::Failed => TransactionStatus::Failed,
    }
}

pub fn loan(loan: Loan) -> LoanView {
    LoanView {
        id: loan.id,
        account_id: loan.account_id,
        amount_minor: loan.amount_minor,
        purpose: loan.purpose,
        duration_months: loan.duration_months,
        employment_status: loan.employment_status,
        monthly_income_minor: loan.monthly_income_minor,
        status: match loan.status {
            LoanStatus::Pending => api_loan::LoanStatus::Pending,
            LoanStatus::Approved => api_loan::LoanStatus::Approved,
            LoanStatus::Rejected => api_loan::LoanStatus::Rejected,
            LoanStatus::Paid => api_loan::LoanStatus::Paid,
        },
        credit_transaction_id: loan.credit_transaction_id,
        created_at: loan.created_at,
        decided_at: loan.decided_at,
    }
}

pub fn destination_from_api(destination: Destination) -> TransferDestination {
    TransferDestination {
        bank_name: destination.bank_name,
        account_number: destination.account_number,
        account_name: destination.account_name,
        routing_number: destination.routing_number,
        swift_code: destination.swift_code,
        bank_address: destination.bank_address,
        house_address: destination.house_address,
        zip_code: destination.zip_code,
    }
}

pub fn transfer(transfer: Transfer) -> TransferView {
    let destination = transfer.destination;
    TransferView {
        id: transfer.id,
        account_id: transfer.account_id,
        amount_minor: transfer.amount_minor,
        destination: Destination {
            bank_name: destination.bank_name,
            account_number: destination.account_number,
            account_name: destination.account_name,
            routing_number: destination.routing_number,
            swift_code: destination.swift_code,
            bank_address: destination.bank_address,
            house_address: destination.house_address,
            zip_code: destination.zip_code,
        },
        status: match transfer.status {
            TransferStatus::Pending => api_transfer::TransferStatus::Pending,
            TransferStatus::Completed => api_transfer::TransferStatus::Completed,
            TransferStatus::Failed => api_transfer::TransferStatus::Failed,
        },
        otp_expires_at: transfer.otp_expires_at,
        scheduled_at: transfer.scheduled_at,
        transaction_id: transfer.transaction_id,
        created_at: transfer.created_at,
    }
}
