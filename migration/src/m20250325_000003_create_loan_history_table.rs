use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LoanHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LoanHistory::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    // Holds the applicant's username despite the name
                    .col(ColumnDef::new(LoanHistory::Aadhaar).string().not_null())
                    .col(ColumnDef::new(LoanHistory::Name).string().not_null()) // loan purpose
                    .col(ColumnDef::new(LoanHistory::Amount).double().not_null())
                    .col(
                        ColumnDef::new(LoanHistory::Status)
                            .string()
                            .not_null()
                            .default("Pending"),
                    )
                    .col(
                        ColumnDef::new(LoanHistory::CreatedAt)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-loan_history-status")
                    .table(LoanHistory::Table)
                    .col(LoanHistory::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LoanHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LoanHistory {
    Table,
    Id,
    Aadhaar,
    Name,
    Amount,
    Status,
    CreatedAt,
}
