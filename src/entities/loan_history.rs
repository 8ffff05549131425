use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Loan lifecycle. `Pending` is the only state a decision can leave.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum LoanStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Approved")]
    Approved,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
}

impl LoanStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, LoanStatus::Pending)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoanStatus::Pending => write!(f, "Pending"),
            LoanStatus::Approved => write!(f, "Approved"),
            LoanStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "loan_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i32,
    /// Applicant's username. The legacy column name is kept for existing databases.
    #[sea_orm(column_name = "aadhaar")]
    pub applicant: String,
    #[sea_orm(column_name = "name")]
    pub purpose: String,
    pub amount: f64,
    pub status: LoanStatus,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
