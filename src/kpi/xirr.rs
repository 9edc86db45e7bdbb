//! Internal rate of return over dated cash flows (actual/365)

use chrono::NaiveDate;

const GUESS: f64 = 0.1;
const MAX_ITERATIONS: usize = 100;
const TOLERANCE: f64 = 1e-7;
const DAYS_PER_YEAR: f64 = 365.0;

/// Solve `Σ CF_i / (1+r)^((d_i - d_0)/365) = 0` by Newton-Raphson.
///
/// Starts at 10% and runs up to 100 steps, stopping once the NPV is below
/// `1e-7` or the derivative vanishes; a vanishing derivative returns the last
/// estimate. Steps are halved as needed to keep `1 + r` positive. Empty or
/// one-signed flows, exhausted iterations and estimates at or below -100%
/// give `0.0`.
pub fn xirr(flows: &[(NaiveDate, f64)]) -> f64 {
    let Some(&(first_date, _)) = flows.first() else {
        return 0.0;
    };

    let has_positive = flows.iter().any(|(_, cf)| *cf > 0.0);
    let has_negative = flows.iter().any(|(_, cf)| *cf < 0.0);
    if !has_positive || !has_negative {
        return 0.0;
    }

    let timed: Vec<(f64, f64)> = flows
        .iter()
        .map(|(date, cf)| ((*date - first_date).num_days() as f64 / DAYS_PER_YEAR, *cf))
        .collect();

    let mut rate = GUESS;
    let mut settled = false;
    for _ in 0..MAX_ITERATIONS {
        let (value, derivative) = xnpv_and_derivative(&timed, rate);
        if value.abs() < TOLERANCE || derivative == 0.0 {
            settled = true;
            break;
        }
        if !value.is_finite() || !derivative.is_finite() {
            break;
        }

        let mut step = value / derivative;
        if !step.is_finite() {
            break;
        }
        while rate - step <= -1.0 {
            step /= 2.0;
        }
        rate -= step;
    }

    let (residual, _) = xnpv_and_derivative(&timed, rate);
    if settled && rate > -1.0 && rate.is_finite() && residual.is_finite() {
        rate
    } else {
        0.0
    }
}

/// Net present value of dated flows at an annual rate
pub fn xnpv(flows: &[(NaiveDate, f64)], rate: f64) -> f64 {
    let Some(&(first_date, _)) = flows.first() else {
        return 0.0;
    };
    flows
        .iter()
        .map(|(date, cf)| {
            let t = (*date - first_date).num_days() as f64 / DAYS_PER_YEAR;
            cf / (1.0 + rate).powf(t)
        })
        .sum()
}

fn xnpv_and_derivative(timed: &[(f64, f64)], rate: f64) -> (f64, f64) {
    timed.iter().fold((0.0, 0.0), |(value, derivative), &(t, cf)| {
        let discount = (1.0 + rate).powf(t);
        (
            value + cf / discount,
            derivative - t * cf / (discount * (1.0 + rate)),
        )
    })
}
