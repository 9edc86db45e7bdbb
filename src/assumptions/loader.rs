//! Scenario loader
//!
//! A scenario is a JSON file holding the assumptions, the holiday list, an
//! optional funding curve, an optional explicit payment schedule and
//! optional reference samples. Holidays and
//! curves can also be read from CSV tables.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::Assumptions;
use crate::calendar::{self, HolidayCalendar};
use crate::curve::{CubicSplineCurve, LinearDateCurve, YieldCurve};
use crate::error::{FidcError, Result};
use crate::validation::ExpectedSample;

/// Default path to the base scenario
pub const DEFAULT_SCENARIO_PATH: &str = "data/base_scenario.json";

/// Curve as written in a scenario file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CurveSpec {
    /// Rates by business-day offset, fitted with a natural cubic spline
    Spline { business_days: Vec<f64>, rates: Vec<f64> },
    /// Rates by date, linearly interpolated
    Dates { points: Vec<DatedRate> },
    /// Single rate
    Flat { rate: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedRate {
    pub date: String,
    pub rate: f64,
}

impl CurveSpec {
    pub fn build(&self) -> Result<YieldCurve> {
        match self {
            CurveSpec::Spline { business_days, rates } => Ok(YieldCurve::Spline(
                CubicSplineCurve::new(business_days.clone(), rates.clone())?,
            )),
            CurveSpec::Dates { points } => {
                let parsed = points
                    .iter()
                    .map(|p| Ok((parse_date(&p.date)?, p.rate)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(YieldCurve::Linear(LinearDateCurve::new(parsed)))
            }
            CurveSpec::Flat { rate } => Ok(YieldCurve::Flat(*rate)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpectedBlock {
    #[serde(default)]
    pub timeline_samples: Vec<ExpectedSample>,
}

/// Raw scenario file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioFile {
    pub assumptions: Assumptions,
    #[serde(default)]
    pub holidays: Vec<String>,
    #[serde(default)]
    pub curve: Option<CurveSpec>,
    /// Funding date then payment dates; empty means a regular schedule
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub expected: Option<ExpectedBlock>,
}

/// Scenario with dates parsed and the curve fitted
#[derive(Debug, Clone)]
pub struct LoadedScenario {
    pub assumptions: Assumptions,
    pub holidays: HolidayCalendar,
    pub curve: Option<YieldCurve>,
    pub schedule: Option<Vec<NaiveDate>>,
    pub expected: Vec<ExpectedSample>,
}

impl ScenarioFile {
    pub fn into_loaded(self) -> Result<LoadedScenario> {
        let holidays = self
            .holidays
            .iter()
            .map(|s| parse_date(s))
            .collect::<Result<HolidayCalendar>>()?;
        let curve = self.curve.as_ref().map(CurveSpec::build).transpose()?;
        let schedule = if self.dates.is_empty() {
            None
        } else {
            let dates = self
                .dates
                .iter()
                .map(|s| parse_date(s))
                .collect::<Result<Vec<_>>>()?;
            calendar::validate_schedule(&dates)?;
            Some(dates)
        };
        let expected = self.expected.map(|e| e.timeline_samples).unwrap_or_default();

        Ok(LoadedScenario {
            assumptions: self.assumptions,
            holidays,
            curve,
            schedule,
            expected,
        })
    }
}

/// Parse an ISO date, accepting a trailing time of day which is discarded
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").or_else(|date_err| {
        NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S"))
            .map(|dt| dt.date())
            .map_err(|_| FidcError::DateParse {
                value: value.to_string(),
                source: date_err,
            })
    })
}

/// Load a scenario from a JSON file
pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<LoadedScenario> {
    let file = File::open(path)?;
    load_scenario_from_reader(file)
}

/// Load a scenario from any reader (e.g., string buffer, network stream)
pub fn load_scenario_from_reader<R: Read>(reader: R) -> Result<LoadedScenario> {
    let raw: ScenarioFile = serde_json::from_reader(reader)?;
    raw.into_loaded()
}

/// Load the base scenario from the default location
pub fn load_default_scenario() -> Result<LoadedScenario> {
    load_scenario(DEFAULT_SCENARIO_PATH)
}

#[derive(Debug, Deserialize)]
struct HolidayRow {
    date: String,
}

#[derive(Debug, Deserialize)]
struct OffsetRateRow {
    business_days: f64,
    rate: f64,
}

#[derive(Debug, Deserialize)]
struct DateRateRow {
    date: String,
    rate: f64,
}

/// Load holidays from a CSV with a `date` column
pub fn load_holidays_csv<P: AsRef<Path>>(path: P) -> Result<HolidayCalendar> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut calendar = HolidayCalendar::new();

    for result in reader.deserialize() {
        let row: HolidayRow = result?;
        calendar.add_holiday(parse_date(&row.date)?);
    }

    Ok(calendar)
}

/// Load a spline curve from a CSV with `business_days,rate` columns
pub fn load_spline_curve_csv<P: AsRef<Path>>(path: P) -> Result<CubicSplineCurve> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut xs = Vec::new();
    let mut ys = Vec::new();

    for result in reader.deserialize() {
        let row: OffsetRateRow = result?;
        xs.push(row.business_days);
        ys.push(row.rate);
    }

    CubicSplineCurve::new(xs, ys)
}

/// Load a dated curve from a CSV with `date,rate` columns
pub fn load_date_curve_csv<P: AsRef<Path>>(path: P) -> Result<LinearDateCurve> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut points = Vec::new();

    for result in reader.deserialize() {
        let row: DateRateRow = result?;
        points.push((parse_date(&row.date)?, row.rate));
    }

    Ok(LinearDateCurve::new(points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{CurvePoint, RateCurve};

    #[test]
    fn test_parse_date_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 2, 12).unwrap();
        assert_eq!(parse_date("2024-02-12").unwrap(), expected);
        assert_eq!(parse_date("2024-02-12T00:00:00").unwrap(), expected);
        assert_eq!(parse_date(" 2024-02-12 15:30:00 ").unwrap(), expected);
        assert!(matches!(parse_date("12/02/2024"), Err(FidcError::DateParse { .. })));
    }

    #[test]
    fn test_load_from_reader() {
        let json = r#"{
            "assumptions": {
                "volume": 1000000.0,
                "asset_rate": {"kind": "annual", "rate_aa": 0.2},
                "admin_rate_aa": 0.0035,
                "admin_min_period": 1000.0,
                "loss_rate_aa": 0.02,
                "senior_share": 0.8,
                "mezz_share": 0.1,
                "junior_share": 0.1,
                "senior_rate_aa": 0.12,
                "mezz_rate_aa": 0.15,
                "start_date": "2024-01-02",
                "periods": 6,
                "frequency_months": 1
            },
            "holidays": ["2024-02-12T00:00:00", "2024-02-13"],
            "curve": {"kind": "dates", "points": [
                {"date": "2024-01-02", "rate": 0.10},
                {"date": "2025-01-02", "rate": 0.12}
            ]},
            "expected": {"timeline_samples": [{"period": 0, "pool_end": 1000000.0}]}
        }"#;

        let scenario = load_scenario_from_reader(json.as_bytes()).unwrap();
        assert_eq!(scenario.assumptions.periods, 6);
        assert_eq!(scenario.holidays.len(), 2);
        assert!(scenario
            .holidays
            .is_holiday(NaiveDate::from_ymd_opt(2024, 2, 12).unwrap()));
        assert_eq!(scenario.expected.len(), 1);

        let curve = scenario.curve.unwrap();
        let point = CurvePoint::new(0, NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
        assert_eq!(curve.rate_at(&point), 0.12);
    }

    #[test]
    fn test_bad_spline_spec_is_rejected() {
        let spec = CurveSpec::Spline {
            business_days: vec![21.0, 21.0],
            rates: vec![0.1, 0.1],
        };
        assert!(matches!(spec.build(), Err(FidcError::InvalidCurve(_))));
    }

    #[test]
    fn test_load_default_scenario() {
        let result = load_default_scenario();
        assert!(result.is_ok(), "Failed to load scenario: {:?}", result.err());

        let scenario = result.unwrap();
        assert!(scenario.assumptions.periods > 0);
        assert!(!scenario.holidays.is_empty());
        assert!(matches!(scenario.curve, Some(YieldCurve::Spline(_))));
        assert!(!scenario.expected.is_empty());
        assert!(scenario.schedule.is_none());
    }

    const SCHEDULE_SCENARIO: &str = r#"{
        "assumptions": {
            "volume": 1000000.0,
            "asset_rate": {"kind": "annual", "rate_aa": 0.2},
            "admin_rate_aa": 0.0035,
            "admin_min_period": 1000.0,
            "loss_rate_aa": 0.02,
            "senior_share": 0.8,
            "mezz_share": 0.1,
            "senior_rate_aa": 0.12,
            "mezz_rate_aa": 0.15,
            "start_date": "2024-01-02",
            "periods": 6,
            "frequency_months": 1
        },
        "dates": DATES
    }"#;

    #[test]
    fn test_explicit_dates_become_the_schedule() {
        let json = SCHEDULE_SCENARIO.replace(
            "DATES",
            r#"["2024-01-02", "2024-07-02T00:00:00", "2025-01-02", "2025-02-03"]"#,
        );
        let scenario = load_scenario_from_reader(json.as_bytes()).unwrap();
        let schedule = scenario.schedule.unwrap();
        assert_eq!(schedule.len(), 4);
        assert_eq!(schedule[1], NaiveDate::from_ymd_opt(2024, 7, 2).unwrap());
    }

    #[test]
    fn test_unordered_dates_are_rejected() {
        let json = SCHEDULE_SCENARIO.replace("DATES", r#"["2024-01-02", "2025-01-02", "2024-07-02"]"#);
        assert!(matches!(
            load_scenario_from_reader(json.as_bytes()),
            Err(FidcError::InvalidAssumption { .. })
        ));

        let json = SCHEDULE_SCENARIO.replace("DATES", "[]");
        assert!(load_scenario_from_reader(json.as_bytes()).unwrap().schedule.is_none());
    }

    #[test]
    fn test_load_csv_tables() {
        let dir = std::env::temp_dir().join(format!("fidc_loader_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let holidays = dir.join("holidays.csv");
        std::fs::write(&holidays, "date\n2024-01-01\n2024-02-12T00:00:00\n").unwrap();
        assert_eq!(load_holidays_csv(&holidays).unwrap().len(), 2);

        let spline = dir.join("pre_di.csv");
        std::fs::write(&spline, "business_days,rate\n1,0.105\n21,0.106\n252,0.11\n").unwrap();
        let curve = load_spline_curve_csv(&spline).unwrap();
        assert_eq!(curve.len(), 3);
        assert!((curve.interpolate(21.0) - 0.106).abs() < 1e-12);

        let dated = dir.join("curve.csv");
        std::fs::write(&dated, "date,rate\n2024-06-01,0.11\n2024-01-01,0.10\n").unwrap();
        let curve = load_date_curve_csv(&dated).unwrap();
        assert_eq!(curve.len(), 2);
        assert_eq!(curve.interpolate(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()), 0.10);

        std::fs::remove_dir_all(&dir).ok();
    }
}
