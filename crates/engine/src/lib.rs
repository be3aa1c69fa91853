//! Ledger engine of the bank service.
//!
//! Every operation that moves money runs inside a single database transaction
//! together with the ledger entry documenting it, so a stored balance always
//! equals the signed sum of the account's settled entries.

pub use accounts::{Account, AccountStatus, AccountType, Role};
pub use error::EngineError;
pub use loans::{Loan, LoanApplication, LoanDecision, LoanStatus};
pub use money::Money;
pub use notify::{LogNotifier, Notifier, NotifyError, OtpMessage, OtpPurpose};
pub use ops::{AccountUpdate, BankStats, Engine, EngineBuilder};
pub use transactions::{
    Transaction, TransactionKind, TransactionMetadata, TransactionStatus, TransferDestination,
    WithdrawalRecipient,
};
pub use transfers::{Transfer, TransferInitiated, TransferStatus};

pub mod accounts;
mod error;
pub mod loans;
mod money;
mod notify;
mod ops;
mod secret;
pub mod transactions;
pub mod transfers;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
