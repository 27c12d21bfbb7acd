//! Quadrature rules on the reference square formed as tensor products of Gauss rules.

use crate::univariate::gauss;
use crate::Rule2d;

/// A Gauss rule for the reference square `[-1, 1]^2` with `nx` points in the first coordinate
/// direction and `ny` points in the second.
pub fn quadrilateral_gauss_anisotropic(nx: usize, ny: usize) -> Rule2d {
    let (weights_x, points_x) = gauss(nx);
    let (weights_y, points_y) = gauss(ny);
    let mut weights = Vec::with_capacity(nx * ny);
    let mut points = Vec::with_capacity(nx * ny);

    for (&wy, &[y]) in weights_y.iter().zip(&points_y) {
        for (&wx, &[x]) in weights_x.iter().zip(&points_x) {
            weights.push(wx * wy);
            points.push([x, y]);
        }
    }

    (weights, points)
}

/// A Gauss rule for the reference square `[-1, 1]^2` with the same number of points per
/// coordinate direction.
pub fn quadrilateral_gauss(num_points_per_dim: usize) -> Rule2d {
    quadrilateral_gauss_anisotropic(num_points_per_dim, num_points_per_dim)
}
