use crate::element::FiniteElement;
use crate::nalgebra::{distance, Matrix1x4, Matrix2, Matrix2x4, Point2, Vector2};
use itertools::Itertools;

const MAX_INVERSE_MAP_ITERATIONS: usize = 30;

/// A finite element representing bilinear basis functions on a quadrilateral, in two dimensions.
///
/// The reference element is the square `[-1, 1]^2`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quad4d2Element {
    vertices: [Point2<f64>; 4],
}

impl Quad4d2Element {
    pub fn from_vertices(vertices: [Point2<f64>; 4]) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point2<f64>; 4] {
        &self.vertices
    }

    pub fn reference() -> Self {
        Self::from_vertices([
            Point2::new(-1.0, -1.0),
            Point2::new(1.0, -1.0),
            Point2::new(1.0, 1.0),
            Point2::new(-1.0, 1.0),
        ])
    }

    #[rustfmt::skip]
    pub fn evaluate_basis(&self, xi: &Point2<f64>) -> Matrix1x4<f64> {
        // We define the shape functions as N_{alpha, beta} evaluated at xi such that
        //  N_{alpha, beta}([alpha, beta]) = 1
        // with alpha, beta = 1 or -1
        let phi = |alpha: f64, beta: f64| (1.0 + alpha * xi[0]) * (1.0 + beta * xi[1]) / 4.0;
        Matrix1x4::from_row_slice(&[
            phi(-1.0, -1.0),
            phi( 1.0, -1.0),
            phi( 1.0,  1.0),
            phi(-1.0,  1.0),
        ])
    }

    #[rustfmt::skip]
    pub fn gradients(&self, xi: &Point2<f64>) -> Matrix2x4<f64> {
        let phi_grad = |alpha: f64, beta: f64|
            Vector2::new(
                alpha * (1.0 + beta * xi[1]) / 4.0,
                beta * (1.0 + alpha * xi[0]) / 4.0,
            );

        Matrix2x4::from_columns(&[
            phi_grad(-1.0, -1.0),
            phi_grad( 1.0, -1.0),
            phi_grad( 1.0,  1.0),
            phi_grad(-1.0,  1.0),
        ])
    }

    /// Signed area by the shoelace formula, positive for counter-clockwise vertices.
    pub fn signed_area(&self) -> f64 {
        let v = &self.vertices;
        0.5 * (0..4)
            .map(|k| v[k].coords.perp(&v[(k + 1) % 4].coords))
            .sum::<f64>()
    }

    /// Smallest signed turn `(v_{k+1} - v_k) x (v_{k+2} - v_{k+1})` over all corners.
    ///
    /// Positive if and only if the quadrilateral is strictly convex and counter-clockwise.
    pub fn min_corner_turn(&self) -> f64 {
        let v = &self.vertices;
        (0..4)
            .map(|k| {
                let e0 = v[(k + 1) % 4] - v[k];
                let e1 = v[(k + 2) % 4] - v[(k + 1) % 4];
                e0.perp(&e1)
            })
            .fold(f64::INFINITY, f64::min)
    }
}

impl FiniteElement for Quad4d2Element {
    #[allow(non_snake_case)]
    fn reference_jacobian(&self, xi: &Point2<f64>) -> Matrix2<f64> {
        let X: Matrix2x4<f64> = Matrix2x4::from_fn(|i, j| self.vertices[j][i]);
        let G = self.gradients(xi);
        X * G.transpose()
    }

    #[allow(non_snake_case)]
    fn map_reference_coords(&self, xi: &Point2<f64>) -> Point2<f64> {
        let X: Matrix2x4<f64> = Matrix2x4::from_fn(|i, j| self.vertices[j][i]);
        let N = self.evaluate_basis(xi);
        Point2::from(X * N.transpose())
    }

    fn map_physical_coords(&self, x: &Point2<f64>) -> Option<Point2<f64>> {
        // Newton iterations on the bilinear map, starting from the element center
        let tol = 1e-13 * self.diameter();
        let mut xi = Point2::origin();
        for _ in 0..MAX_INVERSE_MAP_ITERATIONS {
            let residual = self.map_reference_coords(&xi) - x;
            if residual.norm() <= tol {
                return Some(xi);
            }
            let j_inv = self.reference_jacobian(&xi).try_inverse()?;
            xi -= j_inv * residual;
        }
        let residual = self.map_reference_coords(&xi) - x;
        (residual.norm() <= 1e3 * tol).then(|| xi)
    }

    fn diameter(&self) -> f64 {
        self.vertices
            .iter()
            .tuple_combinations()
            .map(|(x, y)| distance(x, y))
            .fold(0.0, f64::max)
    }
}
