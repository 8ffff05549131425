use sea_orm_migration::prelude::*;

/// Declared for the Aadhaar-based login that was never wired up. Nothing reads or writes it.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserCredentials::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserCredentials::Aadhaar).string().not_null().primary_key())
                    .col(ColumnDef::new(UserCredentials::Username).string().unique_key())
                    .col(ColumnDef::new(UserCredentials::PasswordHash).string())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserCredentials::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserCredentials {
    Table,
    Aadhaar,
    Username,
    PasswordHash,
}
