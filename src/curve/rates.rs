//! Rate conversions and forward-rate bootstrapping on the 252 convention

use crate::calendar::BUSINESS_DAYS_PER_YEAR;

/// Geometric conversion of an annual rate to a period rate:
/// `(1 + rate_aa)^(1/periods_per_year) - 1`
pub fn period_rate(rate_aa: f64, periods_per_year: u32) -> f64 {
    period_rate_for_fraction(rate_aa, 1.0 / periods_per_year.max(1) as f64)
}

/// Rate earned over `year_fraction` years at annual rate `rate_aa`
pub fn period_rate_for_fraction(rate_aa: f64, year_fraction: f64) -> f64 {
    (1.0 + rate_aa).powf(year_fraction) - 1.0
}

/// Compose a base rate with a spread multiplicatively, as in CDI + spread:
/// `(1 + base)(1 + spread) - 1`
pub fn compound_spread(base: f64, spread: f64) -> f64 {
    (1.0 + base) * (1.0 + spread) - 1.0
}

/// Annual forward rate between two points of a spot curve.
///
/// `rate_t` applies from the funding date to business day `du_t`, and
/// `rate_prev` to `du_prev`. The forward is the annual rate that compounds
/// the earlier spot into the later one:
/// `(1+rate_prev)^(du_prev/252) * (1+fwd)^((du_t-du_prev)/252) = (1+rate_t)^(du_t/252)`.
///
/// When both points share the same offset the spot `rate_t` is returned.
pub fn forward_rate(rate_t: f64, rate_prev: f64, du_t: u32, du_prev: u32) -> f64 {
    if du_t == du_prev {
        return rate_t;
    }
    let growth_t = (1.0 + rate_t).powf(du_t as f64 / BUSINESS_DAYS_PER_YEAR);
    let growth_prev = (1.0 + rate_prev).powf(du_prev as f64 / BUSINESS_DAYS_PER_YEAR);
    let span = du_t as f64 - du_prev as f64;
    (growth_t / growth_prev).powf(BUSINESS_DAYS_PER_YEAR / span) - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_period_rate_round_trip() {
        let monthly = period_rate(0.12, 12);
        assert_abs_diff_eq!((1.0 + monthly).powi(12) - 1.0, 0.12, epsilon = 1e-12);

        let quarterly = period_rate(0.12, 4);
        assert_abs_diff_eq!((1.0 + quarterly).powi(4) - 1.0, 0.12, epsilon = 1e-12);
    }

    #[test]
    fn test_period_rate_zero_frequency_is_annual() {
        assert_abs_diff_eq!(period_rate(0.1, 0), 0.1, epsilon = 1e-15);
    }

    #[test]
    fn test_compound_spread() {
        assert_abs_diff_eq!(compound_spread(0.10, 0.02), 0.122, epsilon = 1e-12);
        assert_eq!(compound_spread(0.10, 0.0), 0.10);
    }

    #[test]
    fn test_forward_rate_compounding_identity() {
        let (r_prev, du_prev) = (0.105, 42);
        let (r_t, du_t) = (0.112, 105);
        let fwd = forward_rate(r_t, r_prev, du_t, du_prev);

        let lhs = (1.0 + r_prev).powf(du_prev as f64 / 252.0)
            * (1.0 + fwd).powf((du_t - du_prev) as f64 / 252.0);
        let rhs = (1.0 + r_t).powf(du_t as f64 / 252.0);
        assert_abs_diff_eq!(lhs, rhs, epsilon = 1e-12);

        // Upward sloping spot curve implies forward above the later spot
        assert!(fwd > r_t);
    }

    #[test]
    fn test_forward_rate_flat_curve_and_same_offset() {
        assert_abs_diff_eq!(forward_rate(0.1, 0.1, 126, 21), 0.1, epsilon = 1e-12);
        assert_eq!(forward_rate(0.13, 0.10, 63, 63), 0.13);
        // From the funding date the forward is the spot itself
        assert_abs_diff_eq!(forward_rate(0.11, 0.09, 40, 0), 0.11, epsilon = 1e-12);
    }
}
