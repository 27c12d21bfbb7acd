//! Building blocks for integrands.
//!
//! Each function approximates an integral over an element or edge as the weighted sum over the
//! quadrature points, given weights that include the Jacobian factor.
use crate::weak_form::{FunctionValues, Geometry};

pub fn int_v(weights: &[f64], v: &FunctionValues) -> f64 {
    weights.iter().zip(v.values).map(|(w, v)| w * v).sum()
}

pub fn int_u_v(weights: &[f64], u: &FunctionValues, v: &FunctionValues) -> f64 {
    (0..weights.len())
        .map(|i| weights[i] * u.values[i] * v.values[i])
        .sum()
}

pub fn int_grad_u_grad_v(weights: &[f64], u: &FunctionValues, v: &FunctionValues) -> f64 {
    (0..weights.len())
        .map(|i| weights[i] * (u.dx[i] * v.dx[i] + u.dy[i] * v.dy[i]))
        .sum()
}

/// Integral of `f(x, y) v`.
pub fn int_f_v(weights: &[f64], f: impl Fn(f64, f64) -> f64, v: &FunctionValues, geometry: &Geometry) -> f64 {
    (0..weights.len())
        .map(|i| weights[i] * f(geometry.x[i], geometry.y[i]) * v.values[i])
        .sum()
}
