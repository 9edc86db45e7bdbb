//! Tranche performance indicators
//!
//! Per-period IRR, XIRR over the payment dates, Macaulay duration and the
//! junior equity multiple. A KPI that cannot be solved is reported as `0.0`
//! and logged; it never fails the run.

pub mod irr;
pub mod metrics;
pub mod xirr;

pub use irr::{annualize, npv, periodic_irr};
pub use metrics::{equity_multiple, macaulay_duration};
pub use xirr::{xirr, xnpv};

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::waterfall::{Tranche, WaterfallResult};

/// KPIs of one waterfall run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSet {
    pub periods_per_year: u32,

    /// Per-period IRR
    pub irr_senior: f64,
    pub irr_mezz: f64,
    pub irr_junior: f64,

    /// Annual XIRR over the payment dates
    pub xirr_senior: f64,
    pub xirr_mezz: f64,
    pub xirr_junior: f64,

    /// Macaulay duration in years
    pub duration_senior: f64,
    pub duration_mezz: f64,
    pub duration_junior: f64,

    /// Junior cash returned over junior capital
    pub equity_multiple: f64,

    /// Tranches whose periodic IRR did not resolve
    #[serde(default)]
    pub unresolved: Vec<Tranche>,
}

impl KpiSet {
    /// Compute every KPI from a waterfall timeline
    pub fn from_result(result: &WaterfallResult) -> Self {
        let mut kpis = KpiSet {
            periods_per_year: result.periods_per_year,
            ..Default::default()
        };
        if result.is_empty() {
            return kpis;
        }

        for tranche in Tranche::ALL {
            let flows = result.tranche_cashflows(tranche);
            let irr = periodic_irr(&flows);
            if irr.is_none() {
                warn!("{} IRR did not resolve, reporting 0", tranche.label());
                kpis.unresolved.push(tranche);
            }

            let dated = result.dated_cashflows(tranche);
            let duration = macaulay_duration(&flows, irr, result.periods_per_year);
            kpis.set(tranche, irr.unwrap_or(0.0), xirr(&dated), duration);
        }

        kpis.equity_multiple = equity_multiple(&result.tranche_cashflows(Tranche::Junior));
        kpis
    }

    pub fn irr(&self, tranche: Tranche) -> f64 {
        match tranche {
            Tranche::Senior => self.irr_senior,
            Tranche::Mezzanine => self.irr_mezz,
            Tranche::Junior => self.irr_junior,
        }
    }

    pub fn xirr(&self, tranche: Tranche) -> f64 {
        match tranche {
            Tranche::Senior => self.xirr_senior,
            Tranche::Mezzanine => self.xirr_mezz,
            Tranche::Junior => self.xirr_junior,
        }
    }

    pub fn duration(&self, tranche: Tranche) -> f64 {
        match tranche {
            Tranche::Senior => self.duration_senior,
            Tranche::Mezzanine => self.duration_mezz,
            Tranche::Junior => self.duration_junior,
        }
    }

    /// Periodic IRR compounded to an annual rate
    pub fn annual_irr(&self, tranche: Tranche) -> f64 {
        annualize(self.irr(tranche), self.periods_per_year)
    }

    /// KPI name to value. Carries `irr_*`, `xirr_*`, `duration_*`,
    /// `equity_multiple` and the annualized `irr_*_aa`.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        for tranche in Tranche::ALL {
            let key = tranche.key();
            map.insert(format!("irr_{key}"), self.irr(tranche));
            map.insert(format!("irr_{key}_aa"), self.annual_irr(tranche));
            map.insert(format!("xirr_{key}"), self.xirr(tranche));
            map.insert(format!("duration_{key}"), self.duration(tranche));
        }
        map.insert("equity_multiple".to_string(), self.equity_multiple);
        map
    }

    fn set(&mut self, tranche: Tranche, irr: f64, xirr: f64, duration: f64) {
        match tranche {
            Tranche::Senior => {
                self.irr_senior = irr;
                self.xirr_senior = xirr;
                self.duration_senior = duration;
            }
            Tranche::Mezzanine => {
                self.irr_mezz = irr;
                self.xirr_mezz = xirr;
                self.duration_mezz = duration;
            }
            Tranche::Junior => {
                self.irr_junior = irr;
                self.xirr_junior = xirr;
                self.duration_junior = duration;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::Assumptions;
    use crate::curve::period_rate;
    use crate::waterfall::{DayCount, WaterfallConfig, WaterfallEngine};
    use approx::assert_abs_diff_eq;

    fn run(assumptions: Assumptions) -> WaterfallResult {
        WaterfallEngine::new(assumptions, WaterfallConfig::default())
            .unwrap()
            .run()
    }

    #[test]
    fn test_senior_earns_its_coupon() {
        let result = run(Assumptions::default_base());
        let kpis = KpiSet::from_result(&result);

        assert_eq!(result.summary().final_senior, 0.0);
        assert_abs_diff_eq!(kpis.irr_senior, period_rate(0.13, 12), epsilon = 1e-8);
        // Mezzanine interest is foregone while the senior amortizes
        assert!(kpis.irr_mezz > 0.0);
        assert!(kpis.irr_mezz < period_rate(0.16, 12));
        assert_abs_diff_eq!(kpis.annual_irr(Tranche::Senior), 0.13, epsilon = 1e-6);
        assert!(kpis.unresolved.is_empty());

        // Senior is repaid first, so it is the shortest
        assert!(kpis.duration_senior > 0.0);
        assert!(kpis.duration_senior < kpis.duration_mezz);
        assert!(kpis.duration_mezz < kpis.duration_junior);
        assert!(kpis.equity_multiple > 1.0);
        assert!(kpis.xirr_junior > kpis.xirr_senior);
    }

    #[test]
    fn test_zero_periods_give_zero_kpis() {
        let mut a = Assumptions::default_base();
        a.periods = 0;
        let kpis = KpiSet::from_result(&run(a));

        let map = kpis.to_map();
        for key in [
            "irr_senior",
            "irr_mezz",
            "irr_junior",
            "duration_senior",
            "duration_mezz",
            "duration_junior",
            "equity_multiple",
        ] {
            assert_eq!(map[key], 0.0, "{key}");
        }
    }

    #[test]
    fn test_negative_junior_capital_is_reported_not_fatal() {
        let mut a = Assumptions::default_base();
        a.junior_share = None;
        a.senior_share = 0.95;
        a.mezz_share = 0.15;

        let kpis = KpiSet::from_result(&run(a));
        assert_eq!(kpis.equity_multiple, 0.0);
        assert!(kpis.irr_senior.is_finite());
        assert!(kpis.to_map().values().all(|v| v.is_finite()));
    }

    #[test]
    fn test_irregular_schedule_separates_xirr_from_periodic_irr() {
        let a = Assumptions::default_base();
        let dates: Vec<_> = [0, 6, 12, 18, 24, 25, 26]
            .into_iter()
            .map(|m| crate::calendar::add_months(a.start_date, m).unwrap())
            .collect();
        let config = WaterfallConfig {
            day_count: DayCount::Business252,
            ..Default::default()
        }
        .with_schedule(dates);
        let result = WaterfallEngine::new(a, config).unwrap().run();
        let kpis = KpiSet::from_result(&result);

        // Dated flows see the 13% coupon, period counting sees half-year gaps as months
        assert_abs_diff_eq!(kpis.xirr_senior, 0.13, epsilon = 0.02);
        let periodic = kpis.annual_irr(Tranche::Senior);
        assert!(periodic - kpis.xirr_senior > 0.2, "{periodic} vs {}", kpis.xirr_senior);
    }

    #[test]
    fn test_heavy_losses_keep_kpis_finite() {
        for loss in [0.11, 0.12, 0.5] {
            let mut a = Assumptions::default_base();
            a.loss_rate_aa = loss;
            let kpis = KpiSet::from_result(&run(a));

            for (key, value) in kpis.to_map() {
                assert!(value.is_finite(), "{key} = {value} at loss {loss}");
            }
            for t in Tranche::ALL {
                let xirr = kpis.xirr(t);
                assert!(xirr > -1.0 || xirr == 0.0, "{t:?} xirr {xirr} at loss {loss}");
            }
        }
    }

    #[test]
    fn test_map_keys() {
        let kpis = KpiSet::from_result(&run(Assumptions::default_base()));
        let map = kpis.to_map();
        assert_eq!(map.len(), 13);
        assert!(map.contains_key("xirr_junior"));
        assert!(map.contains_key("irr_mezz_aa"));
    }
}
