use sea_orm_migration::prelude::*;

use super::m20250325_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ContributorRates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContributorRates::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    // One rate per contributor
                    .col(
                        ColumnDef::new(ContributorRates::ContributorUsername)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ContributorRates::PreferredRate).double().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-contributor_rates-contributor_username")
                            .from(ContributorRates::Table, ContributorRates::ContributorUsername)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ContributorRates::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ContributorRates {
    Table,
    Id,
    ContributorUsername,
    PreferredRate,
}
