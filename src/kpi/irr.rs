//! Internal rate of return over evenly spaced cash flows

/// Newton-Raphson starting points, tried in order
const SEEDS: [f64; 4] = [0.01, 0.1, -0.05, 0.5];
const TOLERANCE: f64 = 1e-10;
/// NPV accepted as zero, relative to the largest flow
const NPV_TOLERANCE: f64 = 1e-9;
const MAX_ITERATIONS: usize = 1000;

/// Periodic rates are kept inside this bracket
const RATE_FLOOR: f64 = -0.99;
const RATE_CAP: f64 = 10.0;

/// Solve `Σ CF_t / (1+r)^t = 0` for the per-period rate `r`.
///
/// Index 0 is the initial outflow. Returns `None` when the flows have no sign
/// change or no root is found in `[-99%, 1000%]` per period. All-zero flows
/// resolve to `0.0`.
pub fn periodic_irr(cashflows: &[f64]) -> Option<f64> {
    if cashflows.is_empty() {
        return None;
    }

    if cashflows.iter().all(|&cf| cf.abs() < 1e-10) {
        return Some(0.0);
    }

    // A root needs at least one sign change
    let has_positive = cashflows.iter().any(|&cf| cf > 1e-10);
    let has_negative = cashflows.iter().any(|&cf| cf < -1e-10);
    if !has_positive || !has_negative {
        return None;
    }

    SEEDS
        .iter()
        .find_map(|&seed| newton(cashflows, seed))
        .or_else(|| bisection(cashflows))
}

/// Compound a per-period rate to an annual one
pub fn annualize(periodic_rate: f64, periods_per_year: u32) -> f64 {
    (1.0 + periodic_rate).powi(periods_per_year as i32) - 1.0
}

/// Net present value at a per-period rate
pub fn npv(cashflows: &[f64], rate: f64) -> f64 {
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}

fn npv_and_derivative(cashflows: &[f64], rate: f64) -> (f64, f64) {
    let mut npv = 0.0;
    let mut dnpv = 0.0;

    for (t, &cf) in cashflows.iter().enumerate() {
        npv += cf / (1.0 + rate).powi(t as i32);
        if t > 0 {
            dnpv -= (t as f64) * cf / (1.0 + rate).powi(t as i32 + 1);
        }
    }

    (npv, dnpv)
}

fn newton(cashflows: &[f64], seed: f64) -> Option<f64> {
    let scale = cashflows.iter().fold(1.0_f64, |m, cf| m.max(cf.abs()));
    let mut rate = seed;

    for _ in 0..MAX_ITERATIONS {
        let (value, derivative) = npv_and_derivative(cashflows, rate);
        if derivative.abs() < 1e-20 || !value.is_finite() {
            return None;
        }

        let next = (rate - value / derivative).clamp(RATE_FLOOR, RATE_CAP);
        if (next - rate).abs() < TOLERANCE {
            // Stalling against a bound is not a root
            let residual = npv(cashflows, next);
            return (residual.abs() <= NPV_TOLERANCE * scale).then_some(next);
        }
        rate = next;
    }

    None
}

fn bisection(cashflows: &[f64]) -> Option<f64> {
    let mut low = RATE_FLOOR;
    let mut high = RATE_CAP;
    let mut npv_low = npv(cashflows, low);

    if npv_low * npv(cashflows, high) > 0.0 {
        return None;
    }

    for _ in 0..MAX_ITERATIONS {
        let mid = (low + high) / 2.0;
        let npv_mid = npv(cashflows, mid);

        if npv_mid.abs() < TOLERANCE || (high - low) / 2.0 < TOLERANCE {
            return Some(mid);
        }

        if npv_mid * npv_low < 0.0 {
            high = mid;
        } else {
            low = mid;
            npv_low = npv_mid;
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_two_payment_irr() {
        let flows = [-100.0, 60.0, 60.0];
        let irr = periodic_irr(&flows).unwrap();
        assert!(irr > 0.0);
        assert_abs_diff_eq!(npv(&flows, irr), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_single_period_return() {
        // 1000 in, 1100 back after twelve monthly periods
        let mut flows = vec![-1000.0];
        flows.extend(vec![0.0; 11]);
        flows.push(1100.0);

        let irr = periodic_irr(&flows).unwrap();
        assert_abs_diff_eq!(annualize(irr, 12), 0.10, epsilon = 1e-9);
    }

    #[test]
    fn test_level_loan_repayment() {
        let mut flows = vec![10_000.0];
        flows.extend(vec![-900.0; 12]);
        let irr = periodic_irr(&flows).unwrap();
        assert_abs_diff_eq!(npv(&flows, irr), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_total_loss_resolves_near_floor() {
        let irr = periodic_irr(&[-100.0, 1.0]).unwrap();
        assert_abs_diff_eq!(irr, -0.99, epsilon = 1e-9);
    }

    #[test]
    fn test_root_beyond_bracket_is_unresolved() {
        // The root is 9900% per period, outside the search bracket
        let flows = [-1.0, 100.0];
        assert!(npv(&flows, RATE_CAP) > 1.0);
        assert_eq!(periodic_irr(&flows), None);
    }

    #[test]
    fn test_ill_posed_flows() {
        assert_eq!(periodic_irr(&[]), None);
        assert_eq!(periodic_irr(&[-100.0, -10.0]), None);
        assert_eq!(periodic_irr(&[100.0, 10.0]), None);
        assert_eq!(periodic_irr(&[0.0, 0.0, 0.0]), Some(0.0));
        assert_eq!(periodic_irr(&[-100.0]), None);
    }
}
