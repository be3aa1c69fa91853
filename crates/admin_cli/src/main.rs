use std::{error::Error, io::Write};

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, EngineError, LoanDecision, LoanStatus, Money, Role, TransactionStatus};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "bank_admin")]
#[command(about = "Back-office utilities for the bank ledger")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./bank.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Admin(Admin),
    Transaction(Transaction),
    Loan(Loan),
    Account(Account),
    /// List everything waiting for a back-office decision.
    Pending,
}

#[derive(Args, Debug)]
struct Admin {
    #[command(subcommand)]
    command: AdminCommand,
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    /// Create a back-office account. The password is prompted.
    Create(AdminCreateArgs),
}

#[derive(Args, Debug)]
struct AdminCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct Transaction {
    #[command(subcommand)]
    command: TransactionCommand,
}

#[derive(Subcommand, Debug)]
enum TransactionCommand {
    /// Settle a pending deposit or withdrawal.
    Confirm(TransactionConfirmArgs),
}

#[derive(Args, Debug)]
struct TransactionConfirmArgs {
    #[arg(long)]
    id: Uuid,
    /// `success` or `failed`.
    #[arg(long, value_parser = parse_status)]
    status: TransactionStatus,
}

#[derive(Args, Debug)]
struct Loan {
    #[command(subcommand)]
    command: LoanCommand,
}

#[derive(Subcommand, Debug)]
enum LoanCommand {
    Decide(LoanDecideArgs),
}

#[derive(Args, Debug)]
struct LoanDecideArgs {
    #[arg(long)]
    id: Uuid,
    /// `approved` or `rejected`.
    #[arg(long, value_parser = parse_decision)]
    decision: LoanDecision,
}

#[derive(Args, Debug)]
struct Account {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    /// Compare the stored balance with the settled ledger and repair drift.
    Recompute(AccountRecomputeArgs),
    /// Set the balance, recording the difference in the ledger.
    Adjust(AccountAdjustArgs),
}

#[derive(Args, Debug)]
struct AccountAdjustArgs {
    #[arg(long)]
    id: Uuid,
    /// Target balance, e.g. `1250.00`.
    #[arg(long)]
    balance: Money,
    #[arg(long)]
    note: Option<String>,
}

#[derive(Args, Debug)]
struct AccountRecomputeArgs {
    #[arg(long)]
    id: Uuid,
}

fn parse_status(raw: &str) -> Result<TransactionStatus, String> {
    match raw {
        "success" => Ok(TransactionStatus::Success),
        "failed" => Ok(TransactionStatus::Failed),
        other => Err(format!("unsupported status: {other}")),
    }
}

fn parse_decision(raw: &str) -> Result<LoanDecision, String> {
    match raw {
        "approved" | "approve" => Ok(LoanDecision::Approved),
        "rejected" | "reject" => Ok(LoanDecision::Rejected),
        other => Err(format!("unsupported decision: {other}")),
    }
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let first = prompt_password("Password: ")?;
        if first.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        if first == prompt_password("Confirm password: ")? {
            return Ok(first);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Prints the engine error and exits with a non-zero code.
fn fail(err: EngineError) -> ! {
    eprintln!("{err}");
    std::process::exit(match err {
        EngineError::Validation(_) => 2,
        _ => 1,
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Admin(Admin {
            command: AdminCommand::Create(args),
        }) => {
            let password = prompt_password_twice()?;
            let account = engine
                .open_account(&args.name, &args.email, &password, Role::Admin, Utc::now())
                .await
                .unwrap_or_else(|err| fail(err));
            println!("created admin: {} ({})", account.email, account.id);
        }
        Command::Transaction(Transaction {
            command: TransactionCommand::Confirm(args),
        }) => {
            let tx = engine
                .confirm_transaction(args.id, args.status, Utc::now())
                .await
                .unwrap_or_else(|err| fail(err));
            println!(
                "transaction {} is now {} ({})",
                tx.id,
                tx.status.as_str(),
                tx.description
            );
        }
        Command::Loan(Loan {
            command: LoanCommand::Decide(args),
        }) => {
            let loan = engine
                .decide_loan(args.id, args.decision, Utc::now())
                .await
                .unwrap_or_else(|err| fail(err));
            println!("loan {} is now {}", loan.id, loan.status.as_str());
        }
        Command::Account(Account {
            command: AccountCommand::Recompute(args),
        }) => {
            let stored = engine
                .get_balance(args.id)
                .await
                .unwrap_or_else(|err| fail(err));
            let balance = engine
                .recompute_balance(args.id)
                .await
                .unwrap_or_else(|err| fail(err));
            if stored == balance {
                println!("balance {balance} matches the ledger");
            } else {
                let drift = stored.cents().saturating_sub(balance.cents());
                println!(
                    "balance repaired: {stored} -> {balance} (drift {})",
                    Money::new(drift)
                );
            }
        }
        Command::Account(Account {
            command: AccountCommand::Adjust(args),
        }) => {
            let account = engine
                .adjust_balance(
                    args.id,
                    args.balance.cents(),
                    args.note.as_deref(),
                    Utc::now(),
                )
                .await
                .unwrap_or_else(|err| fail(err));
            println!(
                "balance of {} set to {}",
                account.account_number,
                Money::new(account.balance)
            );
        }
        Command::Pending => {
            let transactions = engine.list_all_transactions().await?;
            for tx in transactions
                .iter()
                .filter(|tx| tx.status == TransactionStatus::Pending)
            {
                println!(
                    "transaction {}  {:<10} {:>12}  {}",
                    tx.id,
                    tx.kind.as_str(),
                    Money::new(tx.amount_minor).to_string(),
                    tx.account_id
                );
            }
            let loans = engine.list_all_loans().await?;
            for loan in loans.iter().filter(|loan| loan.status == LoanStatus::Pending) {
                println!(
                    "loan        {}  {:<10} {:>12}  {}",
                    loan.id,
                    format!("{}mo", loan.duration_months),
                    Money::new(loan.amount_minor).to_string(),
                    loan.account_id
                );
            }
        }
    }

    Ok(())
}
