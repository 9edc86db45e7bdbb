//! FIDC Waterfall - cash-flow waterfall engine for structured receivables funds
//!
//! This library provides:
//! - Business-day calendar arithmetic with holiday tables
//! - Funding curves (natural cubic spline by business day, linear by date)
//! - Sequential-pay waterfall across senior, mezzanine and junior tranches
//! - Tranche KPIs: periodic IRR, XIRR, Macaulay duration, equity multiple
//! - Parallel scenario and sensitivity runs

pub mod assumptions;
pub mod calendar;
pub mod curve;
pub mod error;
pub mod kpi;
pub mod scenario;
pub mod validation;
pub mod waterfall;

// Re-export commonly used types
pub use assumptions::{AssetRate, Assumptions, AssumptionWarning};
pub use calendar::HolidayCalendar;
pub use curve::{CubicSplineCurve, LinearDateCurve, RateCurve, YieldCurve};
pub use error::{FidcError, Result};
pub use kpi::KpiSet;
pub use scenario::{run_fund, FundRun, ScenarioRunner, Sensitivity};
pub use waterfall::{
    PeriodRecord, Tranche, WaterfallConfig, WaterfallEngine, WaterfallResult, WaterfallSummary,
};
