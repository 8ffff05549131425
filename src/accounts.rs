//! Registration and login
//!
//! The three account kinds share the `users` columns and keep their own fields in
//! a role-tagged [`Profile`]. Contributors also get a `contributor_rates` row,
//! written in the same transaction as the user.

use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, NotSet,
    QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::auth::hash_password;
use crate::entities::{contributor_rates, users, Role, Users};
use crate::error::AppError;

pub const MIN_FARMER_AGE: u8 = 18;
pub const MAX_FARMER_AGE: u8 = 100;
pub const MAX_PREFERRED_RATE: f64 = 20.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FarmerProfile {
    pub age: u8,
    pub gender: Gender,
    pub address: String,
    /// Reference (file name) of the uploaded land ownership proof
    pub land_proof: String,
    pub bank_details: String,
    pub farming_type: String,
    pub credit_history: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ContributorProfile {
    pub email: String,
    /// Reference (file name) of the uploaded verification document
    pub verification_doc: String,
    pub interests: String,
    pub agreement: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AdminProfile {
    pub email: String,
    pub org_role: String,
    /// Reference (file name) of the uploaded government ID proof
    pub gov_id: String,
}

/// Role-specific account fields, as stored in `users.profile`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "role")]
pub enum Profile {
    Farmer(FarmerProfile),
    Contributor(ContributorProfile),
    Admin(AdminProfile),
}

impl Profile {
    pub fn role(&self) -> Role {
        match self {
            Profile::Farmer(_) => Role::Farmer,
            Profile::Contributor(_) => Role::Contributor,
            Profile::Admin(_) => Role::Admin,
        }
    }
}

/// Contributor registration: the stored profile plus the rate they lend at.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ContributorRegistration {
    pub email: String,
    pub verification_doc: String,
    pub interests: String,
    #[serde(default)]
    pub agreement: bool,
    /// Preferred annual interest rate in percent, 0 to 20
    pub preferred_rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "role")]
pub enum RoleDetails {
    Farmer(FarmerProfile),
    Contributor(ContributorRegistration),
    Admin(AdminProfile),
}

/// Registration form. `role` selects which detail fields are required.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Registration {
    pub full_name: String,
    pub username: String,
    pub password: String,
    /// Phone number; the contact number for admins
    pub phone: String,
    #[serde(flatten)]
    pub details: RoleDetails,
}

/// A validated registration, ready to insert.
#[derive(Debug)]
struct NewAccount {
    full_name: String,
    username: String,
    password: String,
    phone: String,
    profile: Profile,
    preferred_rate: Option<f64>,
}

fn required(value: &str) -> bool {
    !value.trim().is_empty()
}

fn missing_fields() -> AppError {
    AppError::Validation("Please fill out all the required fields.".to_string())
}

impl Registration {
    /// Check every field the chosen role requires. Nothing is written on failure.
    fn validate(self) -> Result<NewAccount, AppError> {
        let common = [&self.full_name, &self.username, &self.password, &self.phone];
        if !common.iter().all(|v| required(v)) {
            return Err(missing_fields());
        }

        let (profile, preferred_rate) = match self.details {
            RoleDetails::Farmer(farmer) => {
                let texts = [
                    &farmer.address,
                    &farmer.land_proof,
                    &farmer.bank_details,
                    &farmer.farming_type,
                    &farmer.credit_history,
                ];
                if !texts.iter().all(|v| required(v)) {
                    return Err(missing_fields());
                }
                if !(MIN_FARMER_AGE..=MAX_FARMER_AGE).contains(&farmer.age) {
                    return Err(AppError::Validation(format!(
                        "Age must be between {} and {}.",
                        MIN_FARMER_AGE, MAX_FARMER_AGE
                    )));
                }
                (Profile::Farmer(farmer), None)
            }
            RoleDetails::Contributor(contributor) => {
                let texts = [&contributor.email, &contributor.verification_doc, &contributor.interests];
                if !texts.iter().all(|v| required(v)) {
                    return Err(missing_fields());
                }
                if !contributor.agreement {
                    return Err(AppError::Validation(
                        "You must agree to the terms and compliance.".to_string(),
                    ));
                }
                let rate = contributor.preferred_rate;
                if !rate.is_finite() || !(0.0..=MAX_PREFERRED_RATE).contains(&rate) {
                    return Err(AppError::Validation(format!(
                        "Preferred rate must be between 0 and {}%.",
                        MAX_PREFERRED_RATE
                    )));
                }
                let profile = ContributorProfile {
                    email: contributor.email,
                    verification_doc: contributor.verification_doc,
                    interests: contributor.interests,
                    agreement: contributor.agreement,
                };
                (Profile::Contributor(profile), Some(rate))
            }
            RoleDetails::Admin(admin) => {
                let texts = [&admin.email, &admin.org_role, &admin.gov_id];
                if !texts.iter().all(|v| required(v)) {
                    return Err(missing_fields());
                }
                (Profile::Admin(admin), None)
            }
        };

        Ok(NewAccount {
            full_name: self.full_name,
            username: self.username,
            password: self.password,
            phone: self.phone,
            profile,
            preferred_rate,
        })
    }
}

/// A user as returned to clients. Never carries the password digest.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PublicUser {
    pub id: i32,
    pub username: String,
    pub full_name: String,
    pub phone: String,
    pub role: Role,
    pub profile: Profile,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: NaiveDateTime,
}

impl TryFrom<users::Model> for PublicUser {
    type Error = AppError;

    fn try_from(model: users::Model) -> Result<Self, Self::Error> {
        let profile: Profile = serde_json::from_str(&model.profile)?;
        Ok(Self {
            id: model.id,
            username: model.username,
            full_name: model.full_name,
            phone: model.phone,
            role: model.role,
            profile,
            created_at: model.created_at,
        })
    }
}

async fn insert_account<C: ConnectionTrait>(db: &C, account: &NewAccount) -> Result<users::Model, AppError> {
    let user = users::ActiveModel {
        id: NotSet,
        username: Set(account.username.clone()),
        password_hash: Set(hash_password(&account.password)),
        full_name: Set(account.full_name.clone()),
        phone: Set(account.phone.clone()),
        role: Set(account.profile.role()),
        profile: Set(serde_json::to_string(&account.profile)?),
        created_at: NotSet,
    }
    .insert(db)
    .await?;

    if let Some(rate) = account.preferred_rate {
        contributor_rates::ActiveModel {
            id: NotSet,
            contributor_username: Set(account.username.clone()),
            preferred_rate: Set(rate),
        }
        .insert(db)
        .await?;
    }

    Ok(user)
}

/// Register a new account.
///
/// The user row and, for contributors, the rate row commit together or not at all.
/// A taken username surfaces as [`AppError::Conflict`] with the store's message.
#[tracing::instrument(skip(db, registration), fields(username = %registration.username))]
pub async fn register(db: &DatabaseConnection, registration: Registration) -> Result<PublicUser, AppError> {
    let account = registration.validate()?;

    let txn = db.begin().await?;
    let user = match insert_account(&txn, &account).await {
        Ok(user) => user,
        Err(e) => {
            warn!("registration failed: {}", e);
            txn.rollback().await?;
            return Err(e);
        }
    };
    txn.commit().await?;

    info!(role = %user.role, "registered user");
    PublicUser::try_from(user)
}

/// Check credentials. Unknown usernames and wrong passwords are indistinguishable.
#[tracing::instrument(skip(db, password))]
pub async fn login(db: &DatabaseConnection, username: &str, password: &str) -> Result<PublicUser, AppError> {
    let digest = hash_password(password);

    let user = Users::find()
        .filter(users::Column::Username.eq(username))
        .filter(users::Column::PasswordHash.eq(digest))
        .one(db)
        .await?;

    match user {
        Some(user) => {
            info!(role = %user.role, "login succeeded");
            PublicUser::try_from(user)
        }
        None => {
            warn!("login failed");
            Err(AppError::InvalidCredentials)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn farmer() -> Registration {
        Registration {
            full_name: "Asha Patil".to_string(),
            username: "asha".to_string(),
            password: "s3cret".to_string(),
            phone: "9876543210".to_string(),
            details: RoleDetails::Farmer(FarmerProfile {
                age: 34,
                gender: Gender::Female,
                address: "Village Road 4, Nashik".to_string(),
                land_proof: "lease.pdf".to_string(),
                bank_details: "SBI 000123".to_string(),
                farming_type: "Grapes".to_string(),
                credit_history: "No defaults".to_string(),
            }),
        }
    }

    fn contributor() -> ContributorRegistration {
        ContributorRegistration {
            email: "ravi@example.org".to_string(),
            verification_doc: "pan.png".to_string(),
            interests: "Organic farming".to_string(),
            agreement: true,
            preferred_rate: 7.5,
        }
    }

    #[test]
    fn test_valid_farmer() {
        let account = farmer().validate().unwrap();
        assert_eq!(account.profile.role(), Role::Farmer);
        assert!(account.preferred_rate.is_none());
    }

    #[test]
    fn test_blank_common_field_rejected() {
        let mut registration = farmer();
        registration.phone = "   ".to_string();
        assert!(matches!(registration.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_farmer_age_bounds() {
        for (age, ok) in [(17, false), (18, true), (100, true), (101, false)] {
            let mut registration = farmer();
            if let RoleDetails::Farmer(profile) = &mut registration.details {
                profile.age = age;
            }
            assert_eq!(registration.validate().is_ok(), ok, "age {}", age);
        }
    }

    #[test]
    fn test_contributor_must_agree() {
        let mut details = contributor();
        details.agreement = false;
        let registration = Registration {
            details: RoleDetails::Contributor(details),
            ..farmer()
        };
        match registration.validate() {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "You must agree to the terms and compliance."),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_contributor_rate_bounds() {
        for (rate, ok) in [(0.0, true), (20.0, true), (20.1, false), (-0.5, false), (f64::NAN, false)] {
            let mut details = contributor();
            details.preferred_rate = rate;
            let registration = Registration {
                details: RoleDetails::Contributor(details),
                ..farmer()
            };
            assert_eq!(registration.validate().is_ok(), ok, "rate {}", rate);
        }
    }

    #[test]
    fn test_contributor_rate_kept_out_of_profile() {
        let registration = Registration {
            details: RoleDetails::Contributor(contributor()),
            ..farmer()
        };
        let account = registration.validate().unwrap();
        assert_eq!(account.preferred_rate, Some(7.5));
        let stored = serde_json::to_value(&account.profile).unwrap();
        assert_eq!(stored["role"], "Contributor");
        assert!(stored.get("preferred_rate").is_none());
    }

    #[test]
    fn test_admin_requires_gov_id() {
        let registration = Registration {
            details: RoleDetails::Admin(AdminProfile {
                email: "officer@bank.example".to_string(),
                org_role: "Loan officer".to_string(),
                gov_id: String::new(),
            }),
            ..farmer()
        };
        assert!(matches!(registration.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_registration_json_is_tagged_by_role() {
        let json = serde_json::json!({
            "role": "Admin",
            "full_name": "Meera Rao",
            "username": "meera",
            "password": "pw",
            "phone": "022-555-0100",
            "email": "meera@bank.example",
            "org_role": "Branch manager",
            "gov_id": "aadhaar-card.jpg"
        });
        let registration: Registration = serde_json::from_value(json).unwrap();
        assert!(matches!(registration.details, RoleDetails::Admin(_)));
    }
}
