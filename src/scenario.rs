//! Scenario runner for batches of waterfall runs
//!
//! Holds a base set of assumptions and an engine configuration, then runs
//! variations of them. Each run works on its own copy of the inputs, so
//! independent scenarios are spread across threads with rayon.

use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::assumptions::{Assumptions, AssumptionWarning, LoadedScenario};
use crate::error::{FidcError, Result};
use crate::kpi::KpiSet;
use crate::waterfall::{WaterfallConfig, WaterfallEngine, WaterfallResult, WaterfallSummary};

/// Timeline and KPIs of one fund run
#[derive(Debug, Clone, Serialize)]
pub struct FundRun {
    pub assumptions: Assumptions,
    pub result: WaterfallResult,
    pub kpis: KpiSet,
    pub warnings: Vec<AssumptionWarning>,
}

/// Run the waterfall and its KPIs for one set of assumptions.
///
/// Assumption warnings are logged and returned with the run; they never stop it.
pub fn run_fund(assumptions: Assumptions, config: WaterfallConfig) -> Result<FundRun> {
    let warnings = assumptions.warnings();
    for warning in &warnings {
        warn!("{}", warning);
    }

    let engine = WaterfallEngine::new(assumptions.clone(), config)?;
    let result = engine.run();
    let kpis = KpiSet::from_result(&result);

    Ok(FundRun {
        assumptions,
        result,
        kpis,
        warnings,
    })
}

/// Single assumption varied by a sensitivity sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
    SeniorRate,
    MezzRate,
    LossRate,
    /// Driver of whichever asset-rate form the base uses
    AssetRate,
    /// Senior share, with the junior absorbing the difference
    SeniorShare,
    AdminRate,
}

impl Sensitivity {
    pub const ALL: [Sensitivity; 6] = [
        Sensitivity::SeniorRate,
        Sensitivity::MezzRate,
        Sensitivity::LossRate,
        Sensitivity::AssetRate,
        Sensitivity::SeniorShare,
        Sensitivity::AdminRate,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Sensitivity::SeniorRate => "senior_rate",
            Sensitivity::MezzRate => "mezz_rate",
            Sensitivity::LossRate => "loss_rate",
            Sensitivity::AssetRate => "asset_rate",
            Sensitivity::SeniorShare => "senior_share",
            Sensitivity::AdminRate => "admin_rate",
        }
    }

    /// Value of the parameter in `assumptions`
    pub fn current(&self, assumptions: &Assumptions) -> f64 {
        match self {
            Sensitivity::SeniorRate => assumptions.senior_rate_aa,
            Sensitivity::MezzRate => assumptions.mezz_rate_aa,
            Sensitivity::LossRate => assumptions.loss_rate_aa,
            Sensitivity::AssetRate => assumptions.asset_rate.value(),
            Sensitivity::SeniorShare => assumptions.senior_share,
            Sensitivity::AdminRate => assumptions.admin_rate_aa,
        }
    }

    /// Copy of `base` with the parameter set to `value`
    pub fn apply(&self, base: &Assumptions, value: f64) -> Assumptions {
        let mut a = base.clone();
        match self {
            Sensitivity::SeniorRate => a.senior_rate_aa = value,
            Sensitivity::MezzRate => a.mezz_rate_aa = value,
            Sensitivity::LossRate => a.loss_rate_aa = value,
            Sensitivity::AssetRate => a.asset_rate = a.asset_rate.with_value(value),
            Sensitivity::SeniorShare => {
                a.senior_share = value;
                a.junior_share = None;
            }
            Sensitivity::AdminRate => a.admin_rate_aa = value,
        }
        a
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Sensitivity {
    type Err = FidcError;

    fn from_str(s: &str) -> Result<Self> {
        Sensitivity::ALL
            .into_iter()
            .find(|p| p.label() == s.trim())
            .ok_or_else(|| {
                FidcError::invalid_assumption("sensitivity", format!("unknown parameter '{}'", s))
            })
    }
}

/// One point of a sensitivity sweep
#[derive(Debug, Clone, Serialize)]
pub struct SweepPoint {
    pub parameter: Sensitivity,
    pub value: f64,
    pub kpis: KpiSet,
    pub summary: WaterfallSummary,
}

/// Base inputs shared by a batch of runs
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::new();
/// let points = runner.sweep(Sensitivity::LossRate, &[0.01, 0.03, 0.05])?;
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    base_assumptions: Assumptions,
    config: WaterfallConfig,
}

impl ScenarioRunner {
    /// Runner over the base case with the default configuration
    pub fn new() -> Self {
        Self::with_config(Assumptions::default_base(), WaterfallConfig::default())
    }

    pub fn with_assumptions(assumptions: Assumptions) -> Self {
        Self::with_config(assumptions, WaterfallConfig::default())
    }

    pub fn with_config(assumptions: Assumptions, config: WaterfallConfig) -> Self {
        Self {
            base_assumptions: assumptions,
            config,
        }
    }

    /// Runner over a loaded scenario. The scenario's holidays replace those in
    /// `config`, and its curve, when present, replaces the configured one.
    pub fn from_scenario(scenario: LoadedScenario, config: WaterfallConfig) -> Self {
        let mut config = config.with_holidays(scenario.holidays);
        if let Some(curve) = scenario.curve {
            config = config.with_curve(curve);
        }
        if let Some(schedule) = scenario.schedule {
            config = config.with_schedule(schedule);
        }
        Self::with_config(scenario.assumptions, config)
    }

    /// Run the base case
    pub fn run(&self) -> Result<FundRun> {
        self.run_with(self.base_assumptions.clone())
    }

    /// Run other assumptions under the runner's configuration
    pub fn run_with(&self, assumptions: Assumptions) -> Result<FundRun> {
        run_fund(assumptions, self.config.clone())
    }

    /// Run independent scenarios in parallel, results in input order
    pub fn run_scenarios(&self, scenarios: &[Assumptions]) -> Vec<Result<FundRun>> {
        debug!("Running {} scenarios", scenarios.len());
        scenarios
            .par_iter()
            .map(|assumptions| self.run_with(assumptions.clone()))
            .collect()
    }

    /// Vary one parameter of the base case across `values`
    pub fn sweep(&self, parameter: Sensitivity, values: &[f64]) -> Result<Vec<SweepPoint>> {
        debug!("Sweeping {} over {} values", parameter, values.len());
        values
            .par_iter()
            .map(|&value| -> Result<SweepPoint> {
                let run = self.run_with(parameter.apply(&self.base_assumptions, value))?;
                Ok(SweepPoint {
                    parameter,
                    value,
                    summary: run.result.summary(),
                    kpis: run.kpis,
                })
            })
            .collect()
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.base_assumptions
    }

    pub fn config(&self) -> &WaterfallConfig {
        &self.config
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waterfall::{CouponBasis, Tranche};

    #[test]
    fn test_run_fund_reports_warnings() {
        let mut a = Assumptions::default_base();
        a.senior_share = 0.95;
        let run = run_fund(a, WaterfallConfig::default()).unwrap();
        assert_eq!(run.result.len(), 25);
        assert!(matches!(
            run.warnings[0],
            AssumptionWarning::SharesExceedVolume { .. }
        ));
    }

    #[test]
    fn test_run_fund_propagates_construction_errors() {
        let config = WaterfallConfig {
            coupon_basis: CouponBasis::Floating,
            ..Default::default()
        };
        assert!(matches!(
            run_fund(Assumptions::default_base(), config),
            Err(FidcError::MissingCurve)
        ));
    }

    #[test]
    fn test_senior_rate_sweep() {
        let runner = ScenarioRunner::new();
        let points = runner
            .sweep(Sensitivity::SeniorRate, &[0.10, 0.13, 0.16])
            .unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].value, 0.10);
        assert_eq!(points[2].value, 0.16);

        // A dearer senior leaves less for the junior
        assert!(points[2].kpis.irr(Tranche::Senior) > points[0].kpis.irr(Tranche::Senior));
        assert!(points[2].kpis.equity_multiple < points[0].kpis.equity_multiple);
    }

    #[test]
    fn test_loss_sweep_hurts_junior() {
        let runner = ScenarioRunner::new();
        let points = runner.sweep(Sensitivity::LossRate, &[0.0, 0.05]).unwrap();
        assert!(points[1].summary.total_expected_loss > points[0].summary.total_expected_loss);
        assert!(points[1].kpis.equity_multiple < points[0].kpis.equity_multiple);
    }

    #[test]
    fn test_run_scenarios_keeps_order() {
        let runner = ScenarioRunner::new();
        let scenarios: Vec<_> = [12, 24, 36]
            .iter()
            .map(|&periods| Assumptions {
                periods,
                ..Assumptions::default_base()
            })
            .collect();

        let runs = runner.run_scenarios(&scenarios);
        let lengths: Vec<usize> = runs.iter().map(|r| r.as_ref().unwrap().result.len()).collect();
        assert_eq!(lengths, vec![13, 25, 37]);
    }

    #[test]
    fn test_sensitivity_apply_and_parse() {
        let base = Assumptions::default_base();
        let shifted = Sensitivity::SeniorShare.apply(&base, 0.8);
        assert_eq!(shifted.senior_share, 0.8);
        assert!((shifted.share(Tranche::Junior) - 0.05).abs() < 1e-12);

        let asset = Sensitivity::AssetRate.apply(&base, 0.30);
        assert_eq!(Sensitivity::AssetRate.current(&asset), 0.30);

        assert_eq!("loss_rate".parse::<Sensitivity>().unwrap(), Sensitivity::LossRate);
        assert!("bogus".parse::<Sensitivity>().is_err());
    }
}
