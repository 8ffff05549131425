use sea_orm_migration::prelude::*;

/// Card issuance is not implemented; the table is declared so the schema matches deployed databases.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CreditCards::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CreditCards::Aadhaar).string())
                    .col(ColumnDef::new(CreditCards::CardNumber).string())
                    .col(ColumnDef::new(CreditCards::LimitAmount).double())
                    .col(ColumnDef::new(CreditCards::ActivationCode).string())
                    .col(ColumnDef::new(CreditCards::Status).string())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CreditCards::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CreditCards {
    Table,
    Aadhaar,
    CardNumber,
    LimitAmount,
    ActivationCode,
    Status,
}
