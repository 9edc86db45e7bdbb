//! Linear interpolation over a dated rate table

use chrono::{Datelike, NaiveDate};

use super::{CurvePoint, RateCurve};

/// Date-indexed rate table, linearly interpolated on the day axis.
/// Queries before the first or after the last date return the end-point rate.
#[derive(Debug, Clone, Default)]
pub struct LinearDateCurve {
    dates: Vec<NaiveDate>,
    days: Vec<f64>,
    rates: Vec<f64>,
}

impl LinearDateCurve {
    /// Build from (date, rate) pairs in any order. When a date repeats, the
    /// rate supplied last wins.
    pub fn new(mut points: Vec<(NaiveDate, f64)>) -> Self {
        points.sort_by_key(|(date, _)| *date);

        let mut curve = Self::default();
        for (date, rate) in points {
            if curve.dates.last() == Some(&date) {
                if let Some(last) = curve.rates.last_mut() {
                    *last = rate;
                }
                continue;
            }
            curve.dates.push(date);
            curve.days.push(day_axis(date));
            curve.rates.push(rate);
        }
        curve
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Rate at `date`
    pub fn interpolate(&self, date: NaiveDate) -> f64 {
        let (first, last) = match (self.rates.first(), self.rates.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return 0.0,
        };

        let x = day_axis(date);
        if x <= self.days[0] {
            return first;
        }
        if x >= self.days[self.days.len() - 1] {
            return last;
        }

        // First node strictly after x; x is interior so 1 <= hi < len
        let hi = self.days.partition_point(|d| *d <= x);
        let lo = hi - 1;
        let weight = (x - self.days[lo]) / (self.days[hi] - self.days[lo]);
        self.rates[lo] + weight * (self.rates[hi] - self.rates[lo])
    }
}

impl RateCurve for LinearDateCurve {
    fn rate_at(&self, point: &CurvePoint) -> f64 {
        self.interpolate(point.date)
    }
}

fn day_axis(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}
