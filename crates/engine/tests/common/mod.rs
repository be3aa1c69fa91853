#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};
use tokio::sync::mpsc;
use uuid::Uuid;

use engine::{
    Account, Engine, Notifier, NotifyError, OtpMessage, OtpPurpose, Role, TransactionStatus,
    TransferDestination,
};
use migration::MigratorTrait;

pub const PIN: &str = "2468";

/// Forwards every passcode to the test body.
#[derive(Debug)]
pub struct ChannelNotifier(mpsc::UnboundedSender<OtpMessage>);

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn send_otp(&self, message: &OtpMessage) -> Result<(), NotifyError> {
        self.0
            .send(message.clone())
            .map_err(|err| NotifyError::Delivery(err.to_string()))
    }
}

/// Records the attempt, then fails as an unreachable mail relay would.
#[derive(Debug)]
pub struct FailingNotifier(mpsc::UnboundedSender<OtpMessage>);

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send_otp(&self, message: &OtpMessage) -> Result<(), NotifyError> {
        let _ = self.0.send(message.clone());
        Err(NotifyError::Delivery("relay unreachable".to_string()))
    }
}

pub struct Harness {
    pub engine: Engine,
    pub db: DatabaseConnection,
    otps: mpsc::UnboundedReceiver<OtpMessage>,
}

impl Harness {
    pub async fn new() -> Self {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let (sender, otps) = mpsc::unbounded_channel();
        let engine = Engine::builder()
            .database(db.clone())
            .notifier(std::sync::Arc::new(ChannelNotifier(sender)))
            .build()
            .await
            .unwrap();
        Self { engine, db, otps }
    }

    /// Second engine on the same database whose deliveries always fail.
    /// The receiver yields every attempted message.
    pub async fn failing_engine(&self) -> (Engine, mpsc::UnboundedReceiver<OtpMessage>) {
        let (sender, attempts) = mpsc::unbounded_channel();
        let engine = Engine::builder()
            .database(self.db.clone())
            .notifier(std::sync::Arc::new(FailingNotifier(sender)))
            .build()
            .await
            .unwrap();
        (engine, attempts)
    }

    /// Next passcode delivered by the engine.
    pub async fn next_otp(&mut self, purpose: OtpPurpose) -> OtpMessage {
        let message = self.otps.recv().await.unwrap();
        assert_eq!(message.purpose, purpose);
        message
    }

    pub async fn customer(&self, email: &str) -> Account {
        self.engine
            .open_account("Test Customer", email, "correct horse", Role::Customer, t0())
            .await
            .unwrap()
    }

    /// Credit `amount_minor` through a confirmed deposit.
    pub async fn fund(&self, account_id: Uuid, amount_minor: i64) {
        let tx = self
            .engine
            .request_deposit(account_id, amount_minor, t0())
            .await
            .unwrap();
        self.engine
            .confirm_transaction(tx.id, TransactionStatus::Success, t0())
            .await
            .unwrap();
    }

    pub async fn set_pin(&mut self, account_id: Uuid, pin: &str) {
        self.engine
            .initiate_pin_setup(account_id, pin, t0())
            .await
            .unwrap();
        let otp = self.next_otp(OtpPurpose::PinSetup).await;
        self.engine
            .confirm_pin_setup(account_id, &otp.code, t0())
            .await
            .unwrap();
    }

    /// Customer with a confirmed PIN and `balance_minor` on the account.
    pub async fn funded_customer(&mut self, email: &str, balance_minor: i64) -> Account {
        let account = self.customer(email).await;
        self.set_pin(account.id, PIN).await;
        if balance_minor > 0 {
            self.fund(account.id, balance_minor).await;
        }
        account
    }

    /// Stored balance must always match the settled ledger.
    pub async fn assert_balanced(&self, account_id: Uuid) {
        let stored = self.engine.get_balance(account_id).await.unwrap();
        let ledger = self.engine.ledger_balance(account_id).await.unwrap();
        assert_eq!(stored, ledger);
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

pub fn destination() -> TransferDestination {
    TransferDestination {
        bank_name: "First Bank".to_string(),
        account_number: "0099887766".to_string(),
        account_name: "Jane Roe".to_string(),
        routing_number: Some("021000021".to_string()),
        swift_code: Some("FBNKUS33".to_string()),
        ..Default::default()
    }
}
