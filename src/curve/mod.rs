//! Funding-rate curves
//!
//! Two interpolation strategies share one contract, [`RateCurve::rate_at`]:
//! - [`CubicSplineCurve`]: natural cubic spline over business-day offsets
//!   (the BM&F pre-DI grid), linearly extrapolated outside the grid
//! - [`LinearDateCurve`]: linear interpolation over a dated table, clamped
//!   to the end points
//!
//! Curve rates are annualized decimal fractions. Conversions to period rates
//! and forward-rate bootstrapping live in [`rates`].

mod spline;
mod linear;
pub mod rates;

pub use spline::CubicSplineCurve;
pub use linear::LinearDateCurve;
pub use rates::{compound_spread, forward_rate, period_rate, period_rate_for_fraction};

use chrono::NaiveDate;

/// Where on the timeline a curve is queried
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    /// Business days elapsed since the funding date (252 convention)
    pub business_days: f64,
    /// Calendar date of the query
    pub date: NaiveDate,
}

impl CurvePoint {
    pub fn new(business_days: u32, date: NaiveDate) -> Self {
        Self {
            business_days: business_days as f64,
            date,
        }
    }
}

/// A source of annualized rates along the fund's timeline
pub trait RateCurve: std::fmt::Debug + Send + Sync {
    /// Annualized rate at the given point
    fn rate_at(&self, point: &CurvePoint) -> f64;
}

/// Curve strategy selected when a run is configured
#[derive(Debug, Clone)]
pub enum YieldCurve {
    /// Same rate everywhere
    Flat(f64),
    /// Spline over business-day offsets
    Spline(CubicSplineCurve),
    /// Linear over calendar dates
    Linear(LinearDateCurve),
}

impl RateCurve for YieldCurve {
    fn rate_at(&self, point: &CurvePoint) -> f64 {
        match self {
            YieldCurve::Flat(rate) => *rate,
            YieldCurve::Spline(curve) => curve.rate_at(point),
            YieldCurve::Linear(curve) => curve.rate_at(point),
        }
    }
}

impl From<CubicSplineCurve> for YieldCurve {
    fn from(curve: CubicSplineCurve) -> Self {
        YieldCurve::Spline(curve)
    }
}

impl From<LinearDateCurve> for YieldCurve {
    fn from(curve: LinearDateCurve) -> Self {
        YieldCurve::Linear(curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategies_read_their_own_axis() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let point = CurvePoint::new(126, date);

        let spline: YieldCurve = CubicSplineCurve::new(vec![0.0, 252.0], vec![0.10, 0.12])
            .unwrap()
            .into();
        assert!((spline.rate_at(&point) - 0.11).abs() < 1e-12);

        let linear: YieldCurve = LinearDateCurve::new(vec![
            (NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 0.08),
            (NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), 0.08),
        ])
        .into();
        assert_eq!(linear.rate_at(&point), 0.08);

        assert_eq!(YieldCurve::Flat(0.05).rate_at(&point), 0.05);
    }
}
