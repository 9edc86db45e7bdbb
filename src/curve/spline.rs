//! Natural cubic spline over business-day offsets

use super::{CurvePoint, RateCurve};
use crate::error::{FidcError, Result};

/// Natural cubic spline with per-segment coefficients.
///
/// On segment `i`, `y(x) = a[i] + b[i]*dx + c[i]*dx^2 + d[i]*dx^3` with
/// `dx = x - xs[i]`. Outside `[xs[0], xs[n-1]]` the curve continues along the
/// boundary tangent instead of the cubic.
///
/// With fewer than two nodes the curve is constant: the single rate, or zero
/// when empty.
#[derive(Debug, Clone)]
pub struct CubicSplineCurve {
    xs: Vec<f64>,
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
}

impl CubicSplineCurve {
    /// Fit the spline once from the full grid.
    ///
    /// # Errors
    /// `InvalidCurve` when the lengths differ or `xs` is not strictly increasing.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(FidcError::InvalidCurve(format!(
                "{} offsets but {} rates",
                xs.len(),
                ys.len()
            )));
        }
        if xs.windows(2).any(|w| w[1] <= w[0]) {
            return Err(FidcError::InvalidCurve(
                "offsets must be strictly increasing".to_string(),
            ));
        }

        if xs.len() < 2 {
            return Ok(Self {
                xs,
                a: ys,
                b: Vec::new(),
                c: Vec::new(),
                d: Vec::new(),
            });
        }

        let (b, c, d) = fit_coefficients(&xs, &ys);
        Ok(Self { xs, a: ys, b, c, d })
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Evaluate the spline at business-day offset `x`
    pub fn interpolate(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if n < 2 {
            return self.a.first().copied().unwrap_or(0.0);
        }

        let last = n - 1;
        if x <= self.xs[0] {
            return self.a[0] + self.b[0] * (x - self.xs[0]);
        }
        if x >= self.xs[last] {
            let h = self.xs[last] - self.xs[last - 1];
            let seg = last - 1;
            let slope = self.b[seg] + 2.0 * self.c[seg] * h + 3.0 * self.d[seg] * h * h;
            return self.a[last] + slope * (x - self.xs[last]);
        }

        // Grids are tens of nodes; a scan is enough
        let mut i = 0;
        while i < last && self.xs[i + 1] < x {
            i += 1;
        }
        let dx = x - self.xs[i];
        self.a[i] + self.b[i] * dx + self.c[i] * dx * dx + self.d[i] * dx * dx * dx
    }
}

impl RateCurve for CubicSplineCurve {
    fn rate_at(&self, point: &CurvePoint) -> f64 {
        self.interpolate(point.business_days)
    }
}

/// Solve the tri-diagonal system for a natural spline (c[0] = c[n-1] = 0).
/// Returns (b, c, d); `a` is the input rates.
fn fit_coefficients(xs: &[f64], ys: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let n = xs.len();
    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();

    let mut alpha = vec![0.0; n];
    for i in 1..n - 1 {
        alpha[i] = 3.0 / h[i] * (ys[i + 1] - ys[i]) - 3.0 / h[i - 1] * (ys[i] - ys[i - 1]);
    }

    let mut l = vec![1.0; n];
    let mut mu = vec![0.0; n];
    let mut z = vec![0.0; n];
    for i in 1..n - 1 {
        l[i] = 2.0 * (xs[i + 1] - xs[i - 1]) - h[i - 1] * mu[i - 1];
        mu[i] = h[i] / l[i];
        z[i] = (alpha[i] - h[i - 1] * z[i - 1]) / l[i];
    }

    let mut b = vec![0.0; n - 1];
    let mut c = vec![0.0; n];
    let mut d = vec![0.0; n - 1];
    for j in (0..n - 1).rev() {
        c[j] = z[j] - mu[j] * c[j + 1];
        b[j] = (ys[j + 1] - ys[j]) / h[j] - h[j] * (c[j + 1] + 2.0 * c[j]) / 3.0;
        d[j] = (c[j + 1] - c[j]) / (3.0 * h[j]);
    }

    (b, c, d)
}
