//! Waterfall output structures

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Interest paid below this fraction of interest due counts as a shortfall
const SHORTFALL_EPSILON: f64 = 1e-9;

/// Tranche seniority, in payment order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tranche {
    Senior,
    Mezzanine,
    Junior,
}

impl Tranche {
    /// All tranches, most senior first
    pub const ALL: [Tranche; 3] = [Tranche::Senior, Tranche::Mezzanine, Tranche::Junior];

    /// Suffix used in KPI keys (`irr_senior`, `irr_mezz`, `irr_junior`)
    pub fn key(&self) -> &'static str {
        match self {
            Tranche::Senior => "senior",
            Tranche::Mezzanine => "mezz",
            Tranche::Junior => "junior",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tranche::Senior => "Senior",
            Tranche::Mezzanine => "Mezzanine",
            Tranche::Junior => "Junior",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Tranche::Senior => 0,
            Tranche::Mezzanine => 1,
            Tranche::Junior => 2,
        }
    }
}

/// One tranche's figures for one period
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrancheLeg {
    /// Annual coupon in force for the period (forward rate under floating coupons)
    pub rate_aa: f64,
    /// Coupon converted to the period
    pub period_rate: f64,
    pub balance_start: f64,
    pub interest_due: f64,
    pub interest_paid: f64,
    pub principal_paid: f64,
    pub balance_end: f64,
}

impl TrancheLeg {
    /// Cash received by the tranche
    pub fn payment(&self) -> f64 {
        self.interest_paid + self.principal_paid
    }

    /// Interest due but not paid; foregone, never capitalized
    pub fn interest_shortfall(&self) -> f64 {
        (self.interest_due - self.interest_paid).max(0.0)
    }
}

/// One row of the waterfall timeline. Period 0 is the funding date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    // Timing
    pub period: u32,
    pub date: NaiveDate,
    pub calendar_days: i64,
    pub business_days: u32,
    pub elapsed_business_days: u32,
    pub year_fraction: f64,

    // Rates
    pub curve_rate: f64,
    pub asset_rate: f64,
    pub admin_rate: f64,
    pub loss_rate: f64,

    // Pool
    pub pool_start: f64,
    pub asset_interest: f64,
    pub amortization: f64,
    pub gross_cash: f64,
    pub admin_cost: f64,
    pub expected_loss: f64,
    pub net_cash: f64,
    pub pool_end: f64,

    // Senior
    pub senior_rate_aa: f64,
    pub senior_period_rate: f64,
    pub senior_balance_start: f64,
    pub senior_interest_due: f64,
    pub senior_interest_paid: f64,
    pub senior_principal: f64,
    pub senior_payment: f64,
    pub senior_balance_end: f64,

    // Mezzanine
    pub mezz_rate_aa: f64,
    pub mezz_period_rate: f64,
    pub mezz_balance_start: f64,
    pub mezz_interest_due: f64,
    pub mezz_interest_paid: f64,
    pub mezz_principal: f64,
    pub mezz_payment: f64,
    pub mezz_balance_end: f64,

    // Junior
    pub junior_rate_aa: f64,
    pub junior_period_rate: f64,
    pub junior_balance_start: f64,
    pub junior_interest_due: f64,
    pub junior_interest_paid: f64,
    pub junior_principal: f64,
    pub junior_payment: f64,
    pub junior_balance_end: f64,

    /// Cash left after the waterfall; negative when costs and losses
    /// exceeded the cash generated
    pub residual: f64,
}

impl PeriodRecord {
    /// Create a new row with zeroed values
    pub fn new(period: u32, date: NaiveDate) -> Self {
        Self {
            period,
            date,
            calendar_days: 0,
            business_days: 0,
            elapsed_business_days: 0,
            year_fraction: 0.0,
            curve_rate: 0.0,
            asset_rate: 0.0,
            admin_rate: 0.0,
            loss_rate: 0.0,
            pool_start: 0.0,
            asset_interest: 0.0,
            amortization: 0.0,
            gross_cash: 0.0,
            admin_cost: 0.0,
            expected_loss: 0.0,
            net_cash: 0.0,
            pool_end: 0.0,
            senior_rate_aa: 0.0,
            senior_period_rate: 0.0,
            senior_balance_start: 0.0,
            senior_interest_due: 0.0,
            senior_interest_paid: 0.0,
            senior_principal: 0.0,
            senior_payment: 0.0,
            senior_balance_end: 0.0,
            mezz_rate_aa: 0.0,
            mezz_period_rate: 0.0,
            mezz_balance_start: 0.0,
            mezz_interest_due: 0.0,
            mezz_interest_paid: 0.0,
            mezz_principal: 0.0,
            mezz_payment: 0.0,
            mezz_balance_end: 0.0,
            junior_rate_aa: 0.0,
            junior_period_rate: 0.0,
            junior_balance_start: 0.0,
            junior_interest_due: 0.0,
            junior_interest_paid: 0.0,
            junior_principal: 0.0,
            junior_payment: 0.0,
            junior_balance_end: 0.0,
            residual: 0.0,
        }
    }

    /// Figures for one tranche
    pub fn leg(&self, tranche: Tranche) -> TrancheLeg {
        match tranche {
            Tranche::Senior => TrancheLeg {
                rate_aa: self.senior_rate_aa,
                period_rate: self.senior_period_rate,
                balance_start: self.senior_balance_start,
                interest_due: self.senior_interest_due,
                interest_paid: self.senior_interest_paid,
                principal_paid: self.senior_principal,
                balance_end: self.senior_balance_end,
            },
            Tranche::Mezzanine => TrancheLeg {
                rate_aa: self.mezz_rate_aa,
                period_rate: self.mezz_period_rate,
                balance_start: self.mezz_balance_start,
                interest_due: self.mezz_interest_due,
                interest_paid: self.mezz_interest_paid,
                principal_paid: self.mezz_principal,
                balance_end: self.mezz_balance_end,
            },
            Tranche::Junior => TrancheLeg {
                rate_aa: self.junior_rate_aa,
                period_rate: self.junior_period_rate,
                balance_start: self.junior_balance_start,
                interest_due: self.junior_interest_due,
                interest_paid: self.junior_interest_paid,
                principal_paid: self.junior_principal,
                balance_end: self.junior_balance_end,
            },
        }
    }

    /// Write one tranche's figures into the row
    pub fn set_leg(&mut self, tranche: Tranche, leg: TrancheLeg) {
        let payment = leg.payment();
        match tranche {
            Tranche::Senior => {
                self.senior_rate_aa = leg.rate_aa;
                self.senior_period_rate = leg.period_rate;
                self.senior_balance_start = leg.balance_start;
                self.senior_interest_due = leg.interest_due;
                self.senior_interest_paid = leg.interest_paid;
                self.senior_principal = leg.principal_paid;
                self.senior_payment = payment;
                self.senior_balance_end = leg.balance_end;
            }
            Tranche::Mezzanine => {
                self.mezz_rate_aa = leg.rate_aa;
                self.mezz_period_rate = leg.period_rate;
                self.mezz_balance_start = leg.balance_start;
                self.mezz_interest_due = leg.interest_due;
                self.mezz_interest_paid = leg.interest_paid;
                self.mezz_principal = leg.principal_paid;
                self.mezz_payment = payment;
                self.mezz_balance_end = leg.balance_end;
            }
            Tranche::Junior => {
                self.junior_rate_aa = leg.rate_aa;
                self.junior_period_rate = leg.period_rate;
                self.junior_balance_start = leg.balance_start;
                self.junior_interest_due = leg.interest_due;
                self.junior_interest_paid = leg.interest_paid;
                self.junior_principal = leg.principal_paid;
                self.junior_payment = payment;
                self.junior_balance_end = leg.balance_end;
            }
        }
    }

    /// Cash a tranche holder receives this period. The junior also collects
    /// any positive residual.
    pub fn distribution(&self, tranche: Tranche) -> f64 {
        match tranche {
            Tranche::Senior => self.senior_payment,
            Tranche::Mezzanine => self.mezz_payment,
            Tranche::Junior => self.junior_payment + self.residual.max(0.0),
        }
    }

    /// Whether any tranche was paid less interest than it accrued
    pub fn has_interest_shortfall(&self) -> bool {
        Tranche::ALL
            .iter()
            .any(|t| self.leg(*t).interest_shortfall() > SHORTFALL_EPSILON)
    }

    /// Numeric field by name, for validation against reference samples
    pub fn value_of(&self, field: &str) -> Option<f64> {
        let value = match field {
            "calendar_days" => self.calendar_days as f64,
            "business_days" => self.business_days as f64,
            "elapsed_business_days" => self.elapsed_business_days as f64,
            "year_fraction" => self.year_fraction,
            "curve_rate" => self.curve_rate,
            "asset_rate" => self.asset_rate,
            "admin_rate" => self.admin_rate,
            "loss_rate" => self.loss_rate,
            "pool_start" => self.pool_start,
            "asset_interest" => self.asset_interest,
            "amortization" => self.amortization,
            "gross_cash" => self.gross_cash,
            "admin_cost" => self.admin_cost,
            "expected_loss" => self.expected_loss,
            "net_cash" => self.net_cash,
            "pool_end" => self.pool_end,
            "senior_rate_aa" => self.senior_rate_aa,
            "senior_period_rate" => self.senior_period_rate,
            "senior_balance_start" => self.senior_balance_start,
            "senior_interest_due" => self.senior_interest_due,
            "senior_interest_paid" => self.senior_interest_paid,
            "senior_principal" => self.senior_principal,
            "senior_payment" => self.senior_payment,
            "senior_balance_end" => self.senior_balance_end,
            "mezz_rate_aa" => self.mezz_rate_aa,
            "mezz_period_rate" => self.mezz_period_rate,
            "mezz_balance_start" => self.mezz_balance_start,
            "mezz_interest_due" => self.mezz_interest_due,
            "mezz_interest_paid" => self.mezz_interest_paid,
            "mezz_principal" => self.mezz_principal,
            "mezz_payment" => self.mezz_payment,
            "mezz_balance_end" => self.mezz_balance_end,
            "junior_rate_aa" => self.junior_rate_aa,
            "junior_period_rate" => self.junior_period_rate,
            "junior_balance_start" => self.junior_balance_start,
            "junior_interest_due" => self.junior_interest_due,
            "junior_interest_paid" => self.junior_interest_paid,
            "junior_principal" => self.junior_principal,
            "junior_payment" => self.junior_payment,
            "junior_balance_end" => self.junior_balance_end,
            "residual" => self.residual,
            _ => return None,
        };
        Some(value)
    }
}

/// Complete waterfall result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterfallResult {
    /// Payment periods per year, for annualizing KPIs
    pub periods_per_year: u32,

    /// Rows 0..=N; empty when the run has no periods
    pub timeline: Vec<PeriodRecord>,
}

impl WaterfallResult {
    pub fn new(periods_per_year: u32) -> Self {
        Self {
            periods_per_year,
            timeline: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    /// Signed cash flows of a tranche holder: the funded amount as an outflow
    /// at period 0, then each period's distribution
    pub fn tranche_cashflows(&self, tranche: Tranche) -> Vec<f64> {
        self.timeline
            .iter()
            .map(|row| {
                if row.period == 0 {
                    -row.leg(tranche).balance_end
                } else {
                    row.distribution(tranche)
                }
            })
            .collect()
    }

    /// Tranche cash flows paired with their payment dates
    pub fn dated_cashflows(&self, tranche: Tranche) -> Vec<(NaiveDate, f64)> {
        self.timeline
            .iter()
            .map(|row| row.date)
            .zip(self.tranche_cashflows(tranche))
            .collect()
    }

    /// Get summary statistics
    pub fn summary(&self) -> WaterfallSummary {
        let payments = |t: Tranche| -> f64 {
            self.timeline.iter().skip(1).map(|r| r.distribution(t)).sum()
        };
        let last = self.timeline.last();

        WaterfallSummary {
            total_periods: self.timeline.len().saturating_sub(1) as u32,
            total_gross_cash: self.timeline.iter().map(|r| r.gross_cash).sum(),
            total_admin_cost: self.timeline.iter().map(|r| r.admin_cost).sum(),
            total_expected_loss: self.timeline.iter().map(|r| r.expected_loss).sum(),
            total_residual: self.timeline.iter().map(|r| r.residual).sum(),
            total_senior_paid: payments(Tranche::Senior),
            total_mezz_paid: payments(Tranche::Mezzanine),
            total_junior_paid: payments(Tranche::Junior),
            final_pool: last.map(|r| r.pool_end).unwrap_or(0.0),
            final_senior: last.map(|r| r.senior_balance_end).unwrap_or(0.0),
            final_mezz: last.map(|r| r.mezz_balance_end).unwrap_or(0.0),
            final_junior: last.map(|r| r.junior_balance_end).unwrap_or(0.0),
            shortfall_periods: self
                .timeline
                .iter()
                .filter(|r| r.has_interest_shortfall())
                .count() as u32,
        }
    }
}

/// Summary statistics for a waterfall run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterfallSummary {
    pub total_periods: u32,
    pub total_gross_cash: f64,
    pub total_admin_cost: f64,
    pub total_expected_loss: f64,
    pub total_residual: f64,
    pub total_senior_paid: f64,
    pub total_mezz_paid: f64,
    pub total_junior_paid: f64,
    pub final_pool: f64,
    pub final_senior: f64,
    pub final_mezz: f64,
    pub final_junior: f64,
    pub shortfall_periods: u32,
}
