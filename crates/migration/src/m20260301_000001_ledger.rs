//! Initial ledger schema.
//!
//! - `accounts`: customer/admin identity plus the authoritative balance
//! - `transactions`: append-only ledger entries (deposit, withdrawal, transfer)
//! - `loans`: loan applications and their decision state
//! - `transfers`: outbound transfer intents with their OTP challenge
//!
//! Amounts are stored as signed integer minor units (`*_minor`).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    Role,
    AccountNumber,
    AccountType,
    Status,
    Balance,
    PinHash,
    CreatedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    AccountId,
    Kind,
    Status,
    AmountMinor,
    Description,
    Metadata,
    CreatedAt,
    ResolvedAt,
}

#[derive(Iden)]
enum Loans {
    Table,
    Id,
    AccountId,
    AmountMinor,
    Purpose,
    DurationMonths,
    EmploymentStatus,
    MonthlyIncomeMinor,
    Status,
    CreditTransactionId,
    CreatedAt,
    DecidedAt,
}

#[derive(Iden)]
enum Transfers {
    Table,
    Id,
    AccountId,
    AmountMinor,
    BankName,
    AccountNumber,
    AccountName,
    RoutingNumber,
    SwiftCode,
    BankAddress,
    HouseAddress,
    ZipCode,
    Status,
    Otp,
    OtpExpiresAt,
    ScheduledAt,
    TransactionId,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Accounts::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::Role)
                            .string()
                            .not_null()
                            .default("customer"),
                    )
                    .col(
                        ColumnDef::new(Accounts::AccountNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Accounts::AccountType)
                            .string()
                            .not_null()
                            .default("savings"),
                    )
                    .col(
                        ColumnDef::new(Accounts::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Accounts::Balance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Accounts::PinHash).string())
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Transactions (ledger entries)
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::AccountId).string().not_null())
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(ColumnDef::new(Transactions::Status).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Description).string().not_null())
                    .col(ColumnDef::new(Transactions::Metadata).text())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::ResolvedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-account_id")
                            .from(Transactions::Table, Transactions::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-account_id-created_at")
                    .table(Transactions::Table)
                    .col(Transactions::AccountId)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-status")
                    .table(Transactions::Table)
                    .col(Transactions::Status)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Loans
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Loans::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Loans::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Loans::AccountId).string().not_null())
                    .col(ColumnDef::new(Loans::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Loans::Purpose).string().not_null())
                    .col(ColumnDef::new(Loans::DurationMonths).integer().not_null())
                    .col(ColumnDef::new(Loans::EmploymentStatus).string().not_null())
                    .col(
                        ColumnDef::new(Loans::MonthlyIncomeMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Loans::Status).string().not_null())
                    .col(ColumnDef::new(Loans::CreditTransactionId).string())
                    .col(
                        ColumnDef::new(Loans::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Loans::DecidedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-loans-account_id")
                            .from(Loans::Table, Loans::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-loans-credit_transaction_id")
                            .from(Loans::Table, Loans::CreditTransactionId)
                            .to(Transactions::Table, Transactions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Exactly one credit entry per loan.
        manager
            .create_index(
                Index::create()
                    .name("uidx-loans-credit_transaction_id")
                    .table(Loans::Table)
                    .col(Loans::CreditTransactionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Transfers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transfers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transfers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transfers::AccountId).string().not_null())
                    .col(
                        ColumnDef::new(Transfers::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transfers::BankName).string().not_null())
                    .col(ColumnDef::new(Transfers::AccountNumber).string().not_null())
                    .col(ColumnDef::new(Transfers::AccountName).string().not_null())
                    .col(ColumnDef::new(Transfers::RoutingNumber).string())
                    .col(ColumnDef::new(Transfers::SwiftCode).string())
                    .col(ColumnDef::new(Transfers::BankAddress).string())
                    .col(ColumnDef::new(Transfers::HouseAddress).string())
                    .col(ColumnDef::new(Transfers::ZipCode).string())
                    .col(ColumnDef::new(Transfers::Status).string().not_null())
                    .col(ColumnDef::new(Transfers::Otp).string())
                    .col(ColumnDef::new(Transfers::OtpExpiresAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Transfers::ScheduledAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Transfers::TransactionId).string())
                    .col(
                        ColumnDef::new(Transfers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfers-account_id")
                            .from(Transfers::Table, Transfers::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfers-transaction_id")
                            .from(Transfers::Table, Transfers::TransactionId)
                            .to(Transactions::Table, Transactions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-transfers-transaction_id")
                    .table(Transfers::Table)
                    .col(Transfers::TransactionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transfers-account_id")
                    .table(Transfers::Table)
                    .col(Transfers::AccountId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Transfers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Loans::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
