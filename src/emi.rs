//! Equated monthly installment.
//!
//! `EMI = P·r·(1+r)^n / ((1+r)^n − 1)` with `r` the monthly rate. The formula
//! divides by zero when the rate is zero, so that case repays `P / n`.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::error::AppError;

/// Highest annual rate the calculator accepts, in percent.
pub const MAX_ANNUAL_RATE: f64 = 100.0;

/// Repayment periods offered on the application form.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum RepaymentPeriod {
    #[serde(rename = "6 months")]
    SixMonths,
    #[serde(rename = "1 year")]
    OneYear,
    #[serde(rename = "2 years")]
    TwoYears,
    #[serde(rename = "3 years")]
    ThreeYears,
    #[serde(rename = "5 years")]
    FiveYears,
}

impl RepaymentPeriod {
    #[cfg(test)]
    pub const ALL: [RepaymentPeriod; 5] = [
        RepaymentPeriod::SixMonths,
        RepaymentPeriod::OneYear,
        RepaymentPeriod::TwoYears,
        RepaymentPeriod::ThreeYears,
        RepaymentPeriod::FiveYears,
    ];

    pub fn months(self) -> u32 {
        match self {
            RepaymentPeriod::SixMonths => 6,
            RepaymentPeriod::OneYear => 12,
            RepaymentPeriod::TwoYears => 24,
            RepaymentPeriod::ThreeYears => 36,
            RepaymentPeriod::FiveYears => 60,
        }
    }
}

impl fmt::Display for RepaymentPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RepaymentPeriod::SixMonths => "6 months",
            RepaymentPeriod::OneYear => "1 year",
            RepaymentPeriod::TwoYears => "2 years",
            RepaymentPeriod::ThreeYears => "3 years",
            RepaymentPeriod::FiveYears => "5 years",
        };
        write!(f, "{}", label)
    }
}

/// Monthly installment for `principal` at `annual_rate` percent, rounded to 2 decimals.
pub fn calculate_emi(principal: f64, annual_rate: f64, period: RepaymentPeriod) -> Result<f64, AppError> {
    if !principal.is_finite() || principal <= 0.0 {
        return Err(AppError::Validation("Loan amount must be greater than zero.".to_string()));
    }
    if !annual_rate.is_finite() || !(0.0..=MAX_ANNUAL_RATE).contains(&annual_rate) {
        return Err(AppError::Validation(format!(
            "Interest rate must be between 0 and {}%.",
            MAX_ANNUAL_RATE
        )));
    }

    let months = period.months() as i32;
    let monthly_rate = annual_rate / 100.0 / 12.0;

    let emi = if monthly_rate == 0.0 {
        principal / months as f64
    } else {
        let growth = (1.0 + monthly_rate).powi(months);
        principal * monthly_rate * growth / (growth - 1.0)
    };

    let emi = round_to_cents(emi);
    if !emi.is_finite() {
        return Err(AppError::Validation("Loan amount is too large.".to_string()));
    }
    Ok(emi)
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_value() {
        let emi = calculate_emi(1000.0, 10.0, RepaymentPeriod::OneYear).unwrap();
        assert_eq!(emi, 87.92);
    }

    #[test]
    fn test_zero_rate_splits_principal_evenly() {
        assert_eq!(calculate_emi(1200.0, 0.0, RepaymentPeriod::OneYear).unwrap(), 100.0);
        assert_eq!(calculate_emi(6000.0, 0.0, RepaymentPeriod::FiveYears).unwrap(), 100.0);
        // 1000 / 6 rounds to cents
        assert_eq!(calculate_emi(1000.0, 0.0, RepaymentPeriod::SixMonths).unwrap(), 166.67);
    }

    #[test]
    fn test_monotonic_in_principal() {
        for period in RepaymentPeriod::ALL {
            let mut previous = 0.0;
            for principal in [1000.0, 1000.5, 2500.0, 50_000.0, 50_001.0, 1_000_000.0] {
                let emi = calculate_emi(principal, 7.5, period).unwrap();
                assert!(emi >= previous, "{} at {} dropped below {}", emi, principal, previous);
                previous = emi;
            }
        }
    }

    #[test]
    fn test_installments_cover_principal() {
        for period in RepaymentPeriod::ALL {
            let emi = calculate_emi(50_000.0, 12.0, period).unwrap();
            assert!(emi * period.months() as f64 > 50_000.0);
        }
    }

    #[test]
    fn test_overflowing_installment_is_rejected() {
        for period in RepaymentPeriod::ALL {
            let err = calculate_emi(1.7e308, 10.0, period).unwrap_err();
            assert!(matches!(err, AppError::Validation(ref msg) if msg == "Loan amount is too large."));
        }
        // Still representable once multiplied out to cents
        assert!(calculate_emi(1e300, 10.0, RepaymentPeriod::FiveYears).unwrap().is_finite());
    }

    #[test]
    fn test_period_months() {
        let months: Vec<u32> = RepaymentPeriod::ALL.iter().map(|p| p.months()).collect();
        assert_eq!(months, vec![6, 12, 24, 36, 60]);
    }

    #[test]
    fn test_period_labels_round_trip_through_serde() {
        let period: RepaymentPeriod = serde_json::from_str("\"2 years\"").unwrap();
        assert_eq!(period, RepaymentPeriod::TwoYears);
        assert_eq!(period.to_string(), "2 years");
        assert!(serde_json::from_str::<RepaymentPeriod>("\"4 years\"").is_err());
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        assert!(calculate_emi(0.0, 10.0, RepaymentPeriod::OneYear).is_err());
        assert!(calculate_emi(-5.0, 10.0, RepaymentPeriod::OneYear).is_err());
        assert!(calculate_emi(1000.0, -1.0, RepaymentPeriod::OneYear).is_err());
        assert!(calculate_emi(f64::NAN, 10.0, RepaymentPeriod::OneYear).is_err());
        assert!(calculate_emi(1000.0, 101.0, RepaymentPeriod::OneYear).is_err());
    }
}
