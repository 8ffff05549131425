pub use sea_orm_migration::prelude::*;

mod m20250325_000001_create_users_table;
mod m20250325_000002_create_user_credentials_table;
mod m20250325_000003_create_loan_history_table;
mod m20250325_000004_create_credit_cards_table;
mod m20250325_000005_create_contributor_rates_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250325_000001_create_users_table::Migration),
            Box::new(m20250325_000002_create_user_credentials_table::Migration),
            Box::new(m20250325_000003_create_loan_history_table::Migration),
            Box::new(m20250325_000004_create_credit_cards_table::Migration),
            Box::new(m20250325_000005_create_contributor_rates_table::Migration),
        ]
    }
}
