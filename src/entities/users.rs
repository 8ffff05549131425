use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Account role. Stored as its name in `users.role`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum Role {
    #[sea_orm(string_value = "Farmer")]
    Farmer,
    #[sea_orm(string_value = "Contributor")]
    Contributor,
    #[sea_orm(string_value = "Admin")]
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Farmer => write!(f, "Farmer"),
            Role::Contributor => write!(f, "Contributor"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(column_name = "password")]
    pub password_hash: String, // hex SHA-256, never plaintext
    pub full_name: String,
    pub phone: String,
    pub role: Role,
    #[sea_orm(column_type = "Text")]
    pub profile: String, // JSON of accounts::Profile
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::contributor_rates::Entity")]
    ContributorRate,
}

impl Related<super::contributor_rates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContributorRate.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
