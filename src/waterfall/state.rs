//! Closing state carried from one period to the next

use chrono::NaiveDate;

use super::cashflows::Tranche;
use crate::assumptions::Assumptions;

/// Balances and curve position at the close of a period.
///
/// The waterfall is a fold over this value: each period consumes the prior
/// state and produces a new one, so no period can see anything but its
/// predecessor's closing figures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterfallState {
    /// Period just closed (0 = funding)
    pub period: u32,

    /// Date of the period just closed
    pub date: NaiveDate,

    /// Business days from funding to `date`
    pub elapsed_business_days: u32,

    /// Receivables outstanding
    pub pool_balance: f64,

    /// Outstanding balance per tranche, senior first
    pub balances: [f64; 3],

    /// Annual spot coupon per tranche at `date`, the base for the next
    /// forward-rate bootstrap under floating coupons
    pub spot_rates: [f64; 3],
}

impl WaterfallState {
    /// State at the funding date: pool and tranches at their funded amounts
    pub fn funded(assumptions: &Assumptions, start_date: NaiveDate, spot_rates: [f64; 3]) -> Self {
        Self {
            period: 0,
            date: start_date,
            elapsed_business_days: 0,
            pool_balance: assumptions.volume,
            balances: Tranche::ALL.map(|t| assumptions.funded_amount(t)),
            spot_rates,
        }
    }

    pub fn balance(&self, tranche: Tranche) -> f64 {
        self.balances[tranche.index()]
    }

    pub fn spot_rate(&self, tranche: Tranche) -> f64 {
        self.spot_rates[tranche.index()]
    }
}
