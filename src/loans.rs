//! Loan applications and their verification
//!
//! Farmers apply against a contributor's offered rate; admins decide pending
//! applications. A decision is a conditional single-row update, so an application
//! leaves `Pending` exactly once.

use chrono::NaiveDateTime;
use sea_orm::{
    sea_query::Expr, ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    NotSet, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::accounts::Profile;
use crate::auth::Session;
use crate::emi::{calculate_emi, RepaymentPeriod};
use crate::entities::{contributor_rates, loan_history, users, ContributorRates, LoanHistory, LoanStatus, Role, Users};
use crate::error::AppError;

/// A contributor as farmers see them when choosing whom to borrow from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ContributorOffer {
    pub username: String,
    pub interests: String,
    pub agreement: bool,
    /// Preferred annual interest rate in percent
    pub preferred_rate: f64,
}

impl ContributorOffer {
    fn from_rows(user: users::Model, rate: contributor_rates::Model) -> Result<Self, AppError> {
        match serde_json::from_str::<Profile>(&user.profile)? {
            Profile::Contributor(profile) => Ok(Self {
                username: user.username,
                interests: profile.interests,
                agreement: profile.agreement,
                preferred_rate: rate.preferred_rate,
            }),
            other => Err(AppError::InternalError(format!(
                "user {} has role Contributor but a {} profile",
                user.username,
                other.role()
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LoanRequest {
    pub purpose: String,
    /// Requested amount in rupees
    pub amount: f64,
    pub repayment_period: RepaymentPeriod,
    pub annual_income: f64,
    #[serde(default)]
    pub existing_loans: f64,
    #[serde(default)]
    pub collateral: Option<String>,
    /// Username of the chosen contributor
    pub contributor: String,
}

impl LoanRequest {
    fn validate(&self) -> Result<(), AppError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if self.purpose.trim().is_empty()
            || self.contributor.trim().is_empty()
            || !positive(self.amount)
            || !positive(self.annual_income)
            || !self.existing_loans.is_finite()
            || self.existing_loans < 0.0
        {
            return Err(AppError::Validation(
                "Please fill out all required fields correctly.".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LoanRecord {
    pub id: i32,
    /// Applicant's username
    pub applicant: String,
    pub purpose: String,
    pub amount: f64,
    pub status: LoanStatus,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: NaiveDateTime,
}

impl From<loan_history::Model> for LoanRecord {
    fn from(model: loan_history::Model) -> Self {
        Self {
            id: model.id,
            applicant: model.applicant,
            purpose: model.purpose,
            amount: model.amount,
            status: model.status,
            created_at: model.created_at,
        }
    }
}

/// Result of a submission. The contributor and EMI are a preview; only the record is stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LoanSubmission {
    pub application: LoanRecord,
    pub contributor: ContributorOffer,
    pub repayment_period: RepaymentPeriod,
    /// Monthly installment at the contributor's preferred rate
    pub emi_preview: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn outcome(self) -> LoanStatus {
        match self {
            Decision::Approve => LoanStatus::Approved,
            Decision::Reject => LoanStatus::Rejected,
        }
    }
}

/// Contributors that have a rate on file, by username.
#[tracing::instrument(skip_all, fields(username = %session.username))]
pub async fn contributor_directory(db: &DatabaseConnection, session: &Session) -> Result<Vec<ContributorOffer>, AppError> {
    session.require_role(Role::Farmer)?;

    let rows = Users::find()
        .filter(users::Column::Role.eq(Role::Contributor))
        .find_also_related(ContributorRates)
        .order_by_asc(users::Column::Username)
        .all(db)
        .await?;

    rows.into_iter()
        .filter_map(|(user, rate)| rate.map(|rate| ContributorOffer::from_rows(user, rate)))
        .collect()
}

async fn find_contributor(db: &DatabaseConnection, username: &str) -> Result<Option<ContributorOffer>, AppError> {
    let row = Users::find()
        .filter(users::Column::Username.eq(username))
        .filter(users::Column::Role.eq(Role::Contributor))
        .find_also_related(ContributorRates)
        .one(db)
        .await?;

    match row {
        Some((user, Some(rate))) => ContributorOffer::from_rows(user, rate).map(Some),
        _ => Ok(None),
    }
}

/// File a `Pending` application for the logged-in farmer.
#[tracing::instrument(skip_all, fields(username = %session.username))]
pub async fn submit(db: &DatabaseConnection, session: &Session, request: LoanRequest) -> Result<LoanSubmission, AppError> {
    session.require_role(Role::Farmer)?;
    request.validate()?;

    let contributor = find_contributor(db, request.contributor.trim())
        .await?
        .ok_or_else(|| {
            AppError::Validation(format!("Contributor {} is not available.", request.contributor.trim()))
        })?;
    let emi_preview = calculate_emi(request.amount, contributor.preferred_rate, request.repayment_period)?;

    let loan = loan_history::ActiveModel {
        id: NotSet,
        applicant: Set(session.username.clone()),
        purpose: Set(request.purpose.trim().to_string()),
        amount: Set(request.amount),
        status: Set(LoanStatus::Pending),
        created_at: NotSet,
    }
    .insert(db)
    .await?;

    info!(loan_id = loan.id, amount = loan.amount, contributor = %contributor.username, "loan application submitted");

    Ok(LoanSubmission {
        application: loan.into(),
        contributor,
        repayment_period: request.repayment_period,
        emi_preview,
    })
}

/// The logged-in farmer's applications, newest first.
#[tracing::instrument(skip_all, fields(username = %session.username))]
pub async fn history(db: &DatabaseConnection, session: &Session) -> Result<Vec<LoanRecord>, AppError> {
    session.require_role(Role::Farmer)?;

    let loans = LoanHistory::find()
        .filter(loan_history::Column::Applicant.eq(session.username.as_str()))
        .order_by_desc(loan_history::Column::Id)
        .all(db)
        .await?;

    Ok(loans.into_iter().map(LoanRecord::from).collect())
}

/// Every application still awaiting a decision, oldest first.
#[tracing::instrument(skip_all, fields(username = %session.username))]
pub async fn pending(db: &DatabaseConnection, session: &Session) -> Result<Vec<LoanRecord>, AppError> {
    session.require_role(Role::Admin)?;

    let loans = LoanHistory::find()
        .filter(loan_history::Column::Status.eq(LoanStatus::Pending))
        .order_by_asc(loan_history::Column::Id)
        .all(db)
        .await?;

    Ok(loans.into_iter().map(LoanRecord::from).collect())
}

/// Approve or reject a pending application.
#[tracing::instrument(skip(db, session), fields(username = %session.username))]
pub async fn decide(db: &DatabaseConnection, session: &Session, id: i32, decision: Decision) -> Result<LoanRecord, AppError> {
    session.require_role(Role::Admin)?;

    let outcome = decision.outcome();
    let result = LoanHistory::update_many()
        .col_expr(loan_history::Column::Status, Expr::value(outcome.to_value()))
        .filter(loan_history::Column::Id.eq(id))
        .filter(loan_history::Column::Status.eq(LoanStatus::Pending))
        .exec(db)
        .await?;

    let loan = LoanHistory::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("loan application {}", id)))?;

    if result.rows_affected == 0 {
        if !loan.status.is_terminal() {
            return Err(AppError::InternalError(format!("loan application {} was not updated", id)));
        }
        warn!(loan_id = id, status = %loan.status, "decision on a loan that is no longer pending");
        return Err(AppError::Conflict(format!(
            "Loan application {} has already been {}.",
            id,
            loan.status.to_string().to_lowercase()
        )));
    }

    info!(loan_id = id, status = %outcome, "loan application decided");
    Ok(loan.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> LoanRequest {
        LoanRequest {
            purpose: "seed purchase".to_string(),
            amount: 50_000.0,
            repayment_period: RepaymentPeriod::OneYear,
            annual_income: 240_000.0,
            existing_loans: 0.0,
            collateral: None,
            contributor: "ravi".to_string(),
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_invalid_requests() {
        let cases: Vec<fn(&mut LoanRequest)> = vec![
            |r| r.purpose = "  ".to_string(),
            |r| r.amount = 0.0,
            |r| r.amount = -100.0,
            |r| r.annual_income = 0.0,
            |r| r.existing_loans = -1.0,
            |r| r.contributor = String::new(),
            |r| r.amount = f64::INFINITY,
        ];
        for mutate in cases {
            let mut r = request();
            mutate(&mut r);
            assert!(matches!(r.validate(), Err(AppError::Validation(_))), "{:?}", r);
        }
    }

    #[test]
    fn test_decision_outcomes() {
        assert_eq!(Decision::Approve.outcome(), LoanStatus::Approved);
        assert_eq!(Decision::Reject.outcome(), LoanStatus::Rejected);
        assert!(Decision::Approve.outcome().is_terminal());
        assert!(!LoanStatus::Pending.is_terminal());
    }

    #[test]
    fn test_request_defaults() {
        let json = serde_json::json!({
            "purpose": "tractor repair",
            "amount": 12000.0,
            "repayment_period": "6 months",
            "annual_income": 90000.0,
            "contributor": "ravi"
        });
        let r: LoanRequest = serde_json::from_value(json).unwrap();
        assert_eq!(r.existing_loans, 0.0);
        assert!(r.collateral.is_none());
        assert_eq!(r.repayment_period, RepaymentPeriod::SixMonths);
    }
}
