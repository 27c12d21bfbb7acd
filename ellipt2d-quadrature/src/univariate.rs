//! Quadrature rules for the one-dimensional domain `[-1, 1]`.

use crate::Rule1d;
use std::f64::consts::PI;

/// Newton iterations are capped; convergence from the Chebyshev-like initial guess takes a handful.
const MAX_NEWTON_ITERATIONS: usize = 100;

/// Legendre polynomial `P_n` and its predecessor evaluated through the three-term recurrence.
///
/// The derivative formula is singular at `|x| == 1`, so it is only used in the open interval.
#[derive(Debug, Default)]
struct LegendreRecurrence {
    n: usize,
    x: f64,
    // p_n(x)
    p1: f64,
    // p_{n - 1}(x)
    p2: f64,
}

impl LegendreRecurrence {
    fn evaluate(n: usize, x: f64) -> Self {
        //  m P_m(x) = (2m - 1) * x P_{m - 1}(x) - (m - 1) P_{m - 2}(x)
        let mut p1 = 1.0;
        let mut p2 = 0.0;
        for m in 1..=n {
            let m = m as f64;
            let p3 = p2;
            p2 = p1;
            p1 = ((2.0 * m - 1.0) * x * p2 - (m - 1.0) * p3) / m;
        }

        Self { n, x, p1, p2 }
    }

    fn value(&self) -> f64 {
        self.p1
    }

    fn derivative(&self) -> f64 {
        let Self { n, x, p1, p2 } = self;
        let n = *n as f64;
        // dp_n/dx (x) = n * (x * p_n(x) - p_{n - 1}(x)) / (x^2 - 1)
        n * (x * p1 - p2) / (x * x - 1.0)
    }
}

/// Gauss-Legendre quadrature for the reference interval `[-1, 1]`.
///
/// Given `n` points, the rule integrates polynomials of order up to `2 n - 1` exactly.
/// Points are returned in descending order.
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn gauss(num_points: usize) -> Rule1d {
    let n = num_points;
    assert!(n > 0, "number of points must be positive");

    // Only the first half of the roots is computed, the rest follows by symmetry
    let m = (n + 1) / 2;

    let mut points = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);

    for i in 0..m {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut recurrence = LegendreRecurrence::evaluate(n, x);

        for _ in 0..MAX_NEWTON_ITERATIONS {
            let dx = -recurrence.value() / recurrence.derivative();
            x += dx;
            recurrence = LegendreRecurrence::evaluate(n, x);
            if dx.abs() <= 1e-15 {
                break;
            }
        }

        let dp = recurrence.derivative();
        let w = 2.0 / ((1.0 - x * x) * dp * dp);

        points.push([x]);
        weights.push(w);
    }

    for i in m..n {
        let mirror_idx = n - i - 1;
        points.push([-points[mirror_idx][0]]);
        weights.push(weights[mirror_idx]);
    }

    // The middle root of an odd rule is exactly zero
    if n % 2 == 1 {
        points[m - 1] = [0.0];
    }

    debug_assert_eq!(points.len(), n);
    (weights, points)
}

/// Gauss-Legendre rule mapped to the interval `[a, b]`.
pub fn gauss_on_interval(a: f64, b: f64, num_points: usize) -> Rule1d {
    let (weights, points) = gauss(num_points);
    let half_length = 0.5 * (b - a);
    let midpoint = 0.5 * (a + b);
    let weights = weights.into_iter().map(|w| w * half_length).collect();
    let points = points
        .into_iter()
        .map(|[t]| [midpoint + half_length * t])
        .collect();
    (weights, points)
}
