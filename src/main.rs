//! FIDC waterfall CLI
//!
//! Runs one scenario file, prints the first periods and the KPIs, and writes
//! the full timeline as CSV and the KPIs as JSON.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;

use fidc_waterfall::assumptions::loader::{
    load_date_curve_csv, load_holidays_csv, load_scenario, load_spline_curve_csv,
    DEFAULT_SCENARIO_PATH,
};
use fidc_waterfall::validation::{validate_timeline, DEFAULT_TOLERANCE};
use fidc_waterfall::waterfall::{AdminBase, CouponBasis, DayCount};
use fidc_waterfall::{ScenarioRunner, Tranche, WaterfallConfig, WaterfallSummary};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DayCountArg {
    /// 1 / periods per year
    Periodic,
    /// Business days / 252
    Business,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AdminBaseArg {
    Initial,
    Pool,
}

#[derive(Parser)]
#[command(name = "fidc", about = "Run a FIDC cash-flow waterfall and its tranche KPIs.")]
struct Args {
    /// Scenario file (JSON).
    #[arg(default_value = DEFAULT_SCENARIO_PATH)]
    scenario: PathBuf,

    /// Day-count convention for accruals.
    #[arg(long, value_enum, default_value_t = DayCountArg::Periodic)]
    day_count: DayCountArg,

    /// Treat senior and mezzanine rates as spreads over the curve.
    #[arg(long)]
    floating: bool,

    /// Amount the administration rate applies to.
    #[arg(long, value_enum, default_value_t = AdminBaseArg::Initial)]
    admin_base: AdminBaseArg,

    /// Holiday table (CSV with a `date` column), replacing the scenario's list.
    #[arg(long, value_name = "PATH")]
    holidays: Option<PathBuf>,

    /// Spline curve table (CSV with `business_days,rate`), replacing the scenario's curve.
    #[arg(long, value_name = "PATH")]
    curve: Option<PathBuf>,

    /// Dated curve table (CSV with `date,rate`), replacing the scenario's curve.
    #[arg(long, value_name = "PATH", conflicts_with = "curve")]
    date_curve: Option<PathBuf>,

    /// Timeline output.
    #[arg(long, default_value = "waterfall_timeline.csv")]
    output: PathBuf,

    /// KPI output.
    #[arg(long, default_value = "waterfall_kpis.json")]
    kpis: PathBuf,

    /// Compare the timeline against the scenario's expected samples.
    #[arg(long)]
    validate: bool,

    /// Absolute tolerance for `--validate`.
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: f64,

    /// Periods to print.
    #[arg(long, default_value_t = 12)]
    show: usize,
}

#[derive(Serialize)]
struct KpiReport {
    kpis: BTreeMap<String, f64>,
    summary: WaterfallSummary,
    warnings: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut scenario = load_scenario(&args.scenario)
        .with_context(|| format!("loading scenario {}", args.scenario.display()))?;
    if let Some(path) = &args.holidays {
        scenario.holidays = load_holidays_csv(path)
            .with_context(|| format!("loading holidays {}", path.display()))?;
    }
    if let Some(path) = &args.curve {
        let curve = load_spline_curve_csv(path)
            .with_context(|| format!("loading curve {}", path.display()))?;
        scenario.curve = Some(curve.into());
    }
    if let Some(path) = &args.date_curve {
        let curve = load_date_curve_csv(path)
            .with_context(|| format!("loading date curve {}", path.display()))?;
        scenario.curve = Some(curve.into());
    }
    let expected = scenario.expected.clone();

    let config = WaterfallConfig {
        day_count: match args.day_count {
            DayCountArg::Periodic => DayCount::Periodic,
            DayCountArg::Business => DayCount::Business252,
        },
        coupon_basis: if args.floating {
            CouponBasis::Floating
        } else {
            CouponBasis::Fixed
        },
        admin_base: match args.admin_base {
            AdminBaseArg::Initial => AdminBase::InitialVolume,
            AdminBaseArg::Pool => AdminBase::PoolBalance,
        },
        ..Default::default()
    };

    let runner = ScenarioRunner::from_scenario(scenario, config);
    let run = runner.run().context("running waterfall")?;
    let result = &run.result;

    println!("FIDC Waterfall v{}", env!("CARGO_PKG_VERSION"));
    println!("====================\n");
    for warning in &run.warnings {
        println!("Warning: {}", warning);
    }

    println!(
        "{:>4} {:>10} {:>4} {:>16} {:>14} {:>14} {:>14} {:>14} {:>14}",
        "Per", "Date", "DU", "Pool", "Net Cash", "Senior Pmt", "Mezz Pmt", "Junior Pmt", "Residual"
    );
    println!("{}", "-".repeat(116));
    for row in result.timeline.iter().take(args.show + 1) {
        println!(
            "{:>4} {:>10} {:>4} {:>16.2} {:>14.2} {:>14.2} {:>14.2} {:>14.2} {:>14.2}",
            row.period,
            row.date,
            row.business_days,
            row.pool_end,
            row.net_cash,
            row.senior_payment,
            row.mezz_payment,
            row.junior_payment,
            row.residual,
        );
    }
    if result.len() > args.show + 1 {
        println!("... ({} more periods)", result.len() - args.show - 1);
    }

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    for row in &result.timeline {
        writer.serialize(row)?;
    }
    writer.flush()?;
    println!("\nTimeline written to: {}", args.output.display());

    let summary = result.summary();
    let report = KpiReport {
        kpis: run.kpis.to_map(),
        summary: summary.clone(),
        warnings: run.warnings.iter().map(|w| w.to_string()).collect(),
    };
    let file = File::create(&args.kpis)
        .with_context(|| format!("creating {}", args.kpis.display()))?;
    serde_json::to_writer_pretty(file, &report)?;
    println!("KPIs written to: {}", args.kpis.display());

    println!("\nSummary:");
    println!("  Periods: {}", summary.total_periods);
    println!("  Gross Cash: {:.2}", summary.total_gross_cash);
    println!("  Admin Cost: {:.2}", summary.total_admin_cost);
    println!("  Expected Loss: {:.2}", summary.total_expected_loss);
    println!("  Final Pool: {:.2}", summary.final_pool);
    println!("  Periods with Interest Shortfall: {}", summary.shortfall_periods);

    println!("\nKPIs:");
    for tranche in Tranche::ALL {
        println!(
            "  {:<10} IRR {:>8.4}% p.p. ({:>8.4}% a.a.)  XIRR {:>8.4}%  Duration {:>6.3}y",
            tranche.label(),
            run.kpis.irr(tranche) * 100.0,
            run.kpis.annual_irr(tranche) * 100.0,
            run.kpis.xirr(tranche) * 100.0,
            run.kpis.duration(tranche),
        );
    }
    println!("  Equity Multiple: {:.4}x", run.kpis.equity_multiple);

    if args.validate {
        let divergences = validate_timeline(result, &expected, args.tolerance);
        if !divergences.is_empty() {
            for divergence in &divergences {
                println!("  {}", divergence);
            }
            bail!("{} sampled values diverge beyond {}", divergences.len(), args.tolerance);
        }
        println!("\nValidation: {} samples within {}", expected.len(), args.tolerance);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_flags_are_exclusive() {
        let args = Args::try_parse_from(["fidc", "--date-curve", "data/curve.csv"]).unwrap();
        assert_eq!(args.date_curve, Some(PathBuf::from("data/curve.csv")));
        assert!(args.curve.is_none());

        assert!(Args::try_parse_from(["fidc", "--curve", "a.csv", "--date-curve", "b.csv"]).is_err());
    }
}
