//! Duration and multiple on invested capital

/// Macaulay duration in years of the flows after the initial outflow,
/// discounted at the per-period `irr`.
///
/// Returns `0.0` when the IRR did not resolve or the discounted flows sum to
/// zero.
pub fn macaulay_duration(cashflows: &[f64], irr: Option<f64>, periods_per_year: u32) -> f64 {
    let Some(rate) = irr else {
        return 0.0;
    };

    let (weighted, present_value) = cashflows
        .iter()
        .enumerate()
        .skip(1)
        .fold((0.0, 0.0), |(weighted, pv), (t, &cf)| {
            let discounted = cf / (1.0 + rate).powi(t as i32);
            (weighted + t as f64 * discounted, pv + discounted)
        });

    if present_value.abs() < 1e-12 || !present_value.is_finite() {
        return 0.0;
    }

    weighted / present_value / periods_per_year.max(1) as f64
}

/// Total cash returned over capital invested (`-CF_0`); `0.0` without a
/// positive investment
pub fn equity_multiple(cashflows: &[f64]) -> f64 {
    let Some((&first, rest)) = cashflows.split_first() else {
        return 0.0;
    };
    let invested = -first;
    if invested <= 0.0 {
        return 0.0;
    }
    rest.iter().sum::<f64>() / invested
}
