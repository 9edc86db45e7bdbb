//! Fund assumptions: pool, costs, losses and tranche structure
//!
//! One immutable record per run. Structural inconsistencies (tranche shares
//! summing above 100%, negative shares) are reported as warnings rather than
//! rejected; only values that make the run meaningless are errors.

pub mod loader;

pub use loader::{LoadedScenario, ScenarioFile, CurveSpec};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FidcError, Result};
use crate::waterfall::Tranche;

/// How the receivables pool yields
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssetRate {
    /// Flat annual rate
    Annual { rate_aa: f64 },
    /// Monthly cession (discount) rate, compounded per 21 business days
    MonthlyCession { rate_am: f64 },
    /// Funding curve compounded with an annual spread (CDI + spread)
    CurveSpread { spread_aa: f64 },
}

impl AssetRate {
    /// The single numeric driver of the variant
    pub fn value(&self) -> f64 {
        match self {
            AssetRate::Annual { rate_aa } => *rate_aa,
            AssetRate::MonthlyCession { rate_am } => *rate_am,
            AssetRate::CurveSpread { spread_aa } => *spread_aa,
        }
    }

    /// Same variant with a different driver value
    pub fn with_value(&self, value: f64) -> Self {
        match self {
            AssetRate::Annual { .. } => AssetRate::Annual { rate_aa: value },
            AssetRate::MonthlyCession { .. } => AssetRate::MonthlyCession { rate_am: value },
            AssetRate::CurveSpread { .. } => AssetRate::CurveSpread { spread_aa: value },
        }
    }

    pub fn needs_curve(&self) -> bool {
        matches!(self, AssetRate::CurveSpread { .. })
    }
}

/// Inputs of one waterfall run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assumptions {
    /// Receivables volume at funding
    pub volume: f64,

    /// Gross asset yield
    pub asset_rate: AssetRate,

    /// Administration/management fee, annual rate on the reference amount
    pub admin_rate_aa: f64,

    /// Minimum administration cost charged per period
    pub admin_min_period: f64,

    /// Expected loss rate (annual)
    pub loss_rate_aa: f64,

    /// Senior share of the volume
    pub senior_share: f64,

    /// Mezzanine share of the volume
    pub mezz_share: f64,

    /// Junior share of the volume; when absent the junior takes what the
    /// senior and mezzanine leave (possibly negative)
    #[serde(default)]
    pub junior_share: Option<f64>,

    /// Senior coupon (annual). Under floating coupons this is the spread over the curve.
    pub senior_rate_aa: f64,

    /// Mezzanine coupon (annual). Under floating coupons this is the spread over the curve.
    pub mezz_rate_aa: f64,

    /// Junior coupon (annual), always fixed
    #[serde(default)]
    pub junior_rate_aa: f64,

    /// Funding date
    pub start_date: NaiveDate,

    /// Number of payment periods after funding
    pub periods: u32,

    /// Months between payment dates
    pub frequency_months: u32,
}

impl Assumptions {
    /// Monthly 24-period base case
    pub fn default_base() -> Self {
        Self {
            volume: 100_000_000.0,
            asset_rate: AssetRate::Annual { rate_aa: 0.24 },
            admin_rate_aa: 0.0035,
            admin_min_period: 20_000.0,
            loss_rate_aa: 0.03,
            senior_share: 0.75,
            mezz_share: 0.15,
            junior_share: Some(0.10),
            senior_rate_aa: 0.13,
            mezz_rate_aa: 0.16,
            junior_rate_aa: 0.0,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap_or_default(),
            periods: 24,
            frequency_months: 1,
        }
    }

    /// Payment periods per year: `round(12 / frequency_months)`, at least 1
    pub fn periods_per_year(&self) -> u32 {
        if self.frequency_months == 0 {
            return 12;
        }
        ((12.0 / self.frequency_months as f64).round() as u32).max(1)
    }

    pub fn share(&self, tranche: Tranche) -> f64 {
        match tranche {
            Tranche::Senior => self.senior_share,
            Tranche::Mezzanine => self.mezz_share,
            Tranche::Junior => self
                .junior_share
                .unwrap_or(1.0 - self.senior_share - self.mezz_share),
        }
    }

    /// Amount funded by a tranche at period 0
    pub fn funded_amount(&self, tranche: Tranche) -> f64 {
        self.volume * self.share(tranche)
    }

    pub fn coupon_rate(&self, tranche: Tranche) -> f64 {
        match tranche {
            Tranche::Senior => self.senior_rate_aa,
            Tranche::Mezzanine => self.mezz_rate_aa,
            Tranche::Junior => self.junior_rate_aa,
        }
    }

    /// Straight-line amortization of the pool over `payments` payment dates
    pub fn scheduled_amortization(&self, payments: usize) -> f64 {
        if payments == 0 {
            return 0.0;
        }
        self.volume / payments as f64
    }

    /// Reject inputs a run cannot be built from
    pub fn validate(&self) -> Result<()> {
        if self.frequency_months == 0 {
            return Err(FidcError::invalid_assumption(
                "frequency_months",
                "must be at least one month",
            ));
        }
        let numeric = [
            ("volume", self.volume),
            ("asset_rate", self.asset_rate.value()),
            ("admin_rate_aa", self.admin_rate_aa),
            ("admin_min_period", self.admin_min_period),
            ("loss_rate_aa", self.loss_rate_aa),
            ("senior_share", self.senior_share),
            ("mezz_share", self.mezz_share),
            ("junior_share", self.share(Tranche::Junior)),
            ("senior_rate_aa", self.senior_rate_aa),
            ("mezz_rate_aa", self.mezz_rate_aa),
            ("junior_rate_aa", self.junior_rate_aa),
        ];
        if let Some((field, _)) = numeric.iter().find(|(_, v)| !v.is_finite()) {
            return Err(FidcError::invalid_assumption(field, "must be a finite number"));
        }
        Ok(())
    }

    /// Modeling warnings that do not stop a run
    pub fn warnings(&self) -> Vec<AssumptionWarning> {
        let mut warnings = Vec::new();

        let total: f64 = Tranche::ALL.iter().map(|t| self.share(*t)).sum();
        if total > 1.0 + 1e-9 {
            warnings.push(AssumptionWarning::SharesExceedVolume { total });
        }
        for tranche in Tranche::ALL {
            let share = self.share(tranche);
            if share < 0.0 {
                warnings.push(AssumptionWarning::NegativeShare { tranche, share });
            }
        }
        if self.volume <= 0.0 {
            warnings.push(AssumptionWarning::NonPositiveVolume { volume: self.volume });
        }
        if self.periods == 0 {
            warnings.push(AssumptionWarning::NoPeriods);
        }

        warnings
    }
}

impl Default for Assumptions {
    fn default() -> Self {
        Self::default_base()
    }
}

/// Non-fatal issue with a set of assumptions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AssumptionWarning {
    SharesExceedVolume { total: f64 },
    NegativeShare { tranche: Tranche, share: f64 },
    NonPositiveVolume { volume: f64 },
    NoPeriods,
}

impl fmt::Display for AssumptionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssumptionWarning::SharesExceedVolume { total } => write!(
                f,
                "tranche shares sum to {:.2}%, above 100% of the volume",
                total * 100.0
            ),
            AssumptionWarning::NegativeShare { tranche, share } => {
                write!(f, "{} share is negative ({:.4})", tranche.label(), share)
            }
            AssumptionWarning::NonPositiveVolume { volume } => {
                write!(f, "volume is not positive ({:.2})", volume)
            }
            AssumptionWarning::NoPeriods => write!(f, "period count is zero, timeline will be empty"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periods_per_year() {
        let mut a = Assumptions::default_base();
        assert_eq!(a.periods_per_year(), 12);
        a.frequency_months = 3;
        assert_eq!(a.periods_per_year(), 4);
        a.frequency_months = 24;
        assert_eq!(a.periods_per_year(), 1);
    }

    #[test]
    fn test_junior_defaults_to_remainder() {
        let mut a = Assumptions::default_base();
        a.junior_share = None;
        a.senior_share = 0.8;
        a.mezz_share = 0.3;
        assert!((a.share(Tranche::Junior) + 0.1).abs() < 1e-12);
        assert!((a.funded_amount(Tranche::Junior) + 10_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_warnings() {
        let base = Assumptions::default_base();
        assert!(base.warnings().is_empty());

        let mut over = base.clone();
        over.senior_share = 0.95;
        let warnings = over.warnings();
        assert!(matches!(warnings[0], AssumptionWarning::SharesExceedVolume { .. }));
        assert!(warnings[0].to_string().contains("120.00%"));

        let mut remainder = base.clone();
        remainder.junior_share = None;
        remainder.senior_share = 0.9;
        remainder.mezz_share = 0.2;
        assert!(remainder
            .warnings()
            .iter()
            .any(|w| matches!(w, AssumptionWarning::NegativeShare { tranche: Tranche::Junior, .. })));
    }

    #[test]
    fn test_validate() {
        let mut a = Assumptions::default_base();
        assert!(a.validate().is_ok());

        a.frequency_months = 0;
        assert!(a.validate().is_err());

        let mut b = Assumptions::default_base();
        b.loss_rate_aa = f64::NAN;
        assert!(b.validate().is_err());
    }

    #[test]
    fn test_asset_rate_with_value_keeps_variant() {
        let rate = AssetRate::MonthlyCession { rate_am: 0.02 };
        assert_eq!(rate.with_value(0.03), AssetRate::MonthlyCession { rate_am: 0.03 });
        assert!(AssetRate::CurveSpread { spread_aa: 0.0 }.needs_curve());
    }

    #[test]
    fn test_serde_shape() {
        let json = r#"{
            "volume": 1000000.0,
            "asset_rate": {"kind": "monthly_cession", "rate_am": 0.02},
            "admin_rate_aa": 0.0035,
            "admin_min_period": 20000.0,
            "loss_rate_aa": 0.02,
            "senior_share": 0.9,
            "mezz_share": 0.05,
            "senior_rate_aa": 0.02,
            "mezz_rate_aa": 0.05,
            "start_date": "2024-01-02",
            "periods": 12,
            "frequency_months": 1
        }"#;
        let a: Assumptions = serde_json::from_str(json).unwrap();
        assert_eq!(a.asset_rate, AssetRate::MonthlyCession { rate_am: 0.02 });
        assert_eq!(a.junior_share, None);
        assert_eq!(a.junior_rate_aa, 0.0);
        assert!((a.share(Tranche::Junior) - 0.05).abs() < 1e-12);
    }
}
