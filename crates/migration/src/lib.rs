pub use sea_orm_migration::prelude::*;

mod m20260301_000001_ledger;
mod m20260310_000001_pin_setup;
mod m20260320_000001_login_otp;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_ledger::Migration),
            Box::new(m20260310_000001_pin_setup::Migration),
            Box::new(m20260320_000001_login_otp::Migration),
        ]
    }
}
