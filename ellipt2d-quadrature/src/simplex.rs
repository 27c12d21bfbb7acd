//! Quadrature rules on the reference triangle.
//!
//! The reference triangle has corners `(-1, -1)`, `(1, -1)` and `(-1, 1)`. Rules are obtained by
//! collapsing the reference square onto the triangle (the Duffy transformation)
//!
//! ```text
//! xi  = (1 + a)(1 - b) / 2 - 1
//! eta = b
//! ```
//!
//! whose Jacobian determinant `(1 - b) / 2` raises the polynomial order in `b` by one.

use crate::tensor::quadrilateral_gauss_anisotropic;
use crate::{gauss_points_for_order, Rule2d};

/// A collapsed Gauss rule on the reference triangle that integrates polynomials of total degree
/// `order` exactly.
pub fn triangle_collapsed_gauss(order: usize) -> Rule2d {
    let na = gauss_points_for_order(order);
    let nb = gauss_points_for_order(order + 1);
    let (square_weights, square_points) = quadrilateral_gauss_anisotropic(na, nb);

    let mut weights = Vec::with_capacity(square_weights.len());
    let mut points = Vec::with_capacity(square_points.len());
    for (w, [a, b]) in square_weights.into_iter().zip(square_points) {
        let jacobian = 0.5 * (1.0 - b);
        weights.push(w * jacobian);
        points.push([0.5 * (1.0 + a) * (1.0 - b) - 1.0, b]);
    }

    (weights, points)
}
