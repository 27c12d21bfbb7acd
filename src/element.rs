//! Reference elements, element geometry and Lagrange bases.
use crate::connectivity::ElementConnectivity;
use crate::nalgebra::{Matrix2, Point2, Vector2};

mod lagrange;
mod quadrilateral;
mod triangle;

pub use lagrange::*;
pub use quadrilateral::*;
pub use triangle::*;

/// Highest supported polynomial degree of the Lagrange bases.
pub const MAX_DEGREE: usize = 8;

/// Relative tolerance used to decide whether an element is degenerate.
const DEGENERACY_TOLERANCE: f64 = 1e-12;

/// The shape of an element.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    Triangle,
    Quadrilateral,
}

const TRIANGLE_REFERENCE_VERTICES: [[f64; 2]; 3] = [[-1.0, -1.0], [1.0, -1.0], [-1.0, 1.0]];
const QUADRILATERAL_REFERENCE_VERTICES: [[f64; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];

impl ElementKind {
    pub fn num_vertices(&self) -> usize {
        self.reference_vertices().len()
    }

    pub fn reference_vertices(&self) -> &'static [[f64; 2]] {
        match self {
            Self::Triangle => &TRIANGLE_REFERENCE_VERTICES,
            Self::Quadrilateral => &QUADRILATERAL_REFERENCE_VERTICES,
        }
    }

    /// Additional polynomial order of integrands caused by the reference-to-physical map.
    ///
    /// Triangles are mapped affinely. Bilinear quadrilaterals have non-constant Jacobians, and
    /// rational physical gradients in general, which are accounted for with two extra orders.
    pub fn geometry_order(&self) -> usize {
        match self {
            Self::Triangle => 0,
            Self::Quadrilateral => 2,
        }
    }

    /// Point on local edge `edge` of the reference element, parametrized by `t` in `[-1, 1]`.
    pub fn reference_edge_point(&self, edge: usize, t: f64) -> Point2<f64> {
        let vertices = self.reference_vertices();
        let n = vertices.len();
        let [a0, a1] = vertices[edge % n];
        let [b0, b1] = vertices[(edge + 1) % n];
        let s = 0.5 * (1.0 + t);
        Point2::new((1.0 - s) * a0 + s * b0, (1.0 - s) * a1 + s * b1)
    }

    pub fn contains_reference_point(&self, xi: &Point2<f64>, tol: f64) -> bool {
        let inside_square = xi.x >= -1.0 - tol && xi.y >= -1.0 - tol;
        match self {
            Self::Triangle => inside_square && xi.x + xi.y <= tol,
            Self::Quadrilateral => inside_square && xi.x <= 1.0 + tol && xi.y <= 1.0 + tol,
        }
    }
}

pub trait FiniteElement {
    /// The Jacobian `dx/dxi` of the reference-to-physical map.
    fn reference_jacobian(&self, xi: &Point2<f64>) -> Matrix2<f64>;

    fn map_reference_coords(&self, xi: &Point2<f64>) -> Point2<f64>;

    /// Inverse of [`map_reference_coords`](Self::map_reference_coords).
    ///
    /// The returned reference point may lie outside of the reference element if `x` lies outside
    /// of the element. Returns `None` if the inverse could not be computed.
    fn map_physical_coords(&self, x: &Point2<f64>) -> Option<Point2<f64>>;

    fn diameter(&self) -> f64;
}

/// The geometry of a single mesh element.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ElementGeometry {
    Triangle(Tri3d2Element),
    Quadrilateral(Quad4d2Element),
}

impl ElementGeometry {
    pub fn from_connectivity(connectivity: &ElementConnectivity, vertices: &[Point2<f64>]) -> Option<Self> {
        let lookup_vertex = |index: usize| vertices.get(index).copied();
        match connectivity {
            ElementConnectivity::Tri(tri) => {
                let [a, b, c] = tri.0;
                Some(Self::Triangle(Tri3d2Element::from_vertices([
                    lookup_vertex(a)?,
                    lookup_vertex(b)?,
                    lookup_vertex(c)?,
                ])))
            }
            ElementConnectivity::Quad(quad) => {
                let [a, b, c, d] = quad.0;
                Some(Self::Quadrilateral(Quad4d2Element::from_vertices([
                    lookup_vertex(a)?,
                    lookup_vertex(b)?,
                    lookup_vertex(c)?,
                    lookup_vertex(d)?,
                ])))
            }
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Triangle(_) => ElementKind::Triangle,
            Self::Quadrilateral(_) => ElementKind::Quadrilateral,
        }
    }

    pub fn vertices(&self) -> &[Point2<f64>] {
        match self {
            Self::Triangle(tri) => &tri.vertices()[..],
            Self::Quadrilateral(quad) => &quad.vertices()[..],
        }
    }

    pub fn signed_area(&self) -> f64 {
        match self {
            Self::Triangle(tri) => tri.signed_area(),
            Self::Quadrilateral(quad) => quad.signed_area(),
        }
    }

    /// Checks that the element has counter-clockwise orientation, non-vanishing area and, for
    /// quadrilaterals, is strictly convex.
    pub fn check_non_degenerate(&self) -> Result<(), &'static str> {
        let diameter = self.diameter();
        let threshold = DEGENERACY_TOLERANCE * diameter * diameter;
        if !(diameter > 0.0) || !diameter.is_finite() {
            return Err("element has no extent");
        }
        if self.signed_area() <= threshold {
            return Err("area is zero or negative (vertices must be in counter-clockwise order)");
        }
        if let Self::Quadrilateral(quad) = self {
            if quad.min_corner_turn() <= threshold {
                return Err("quadrilateral is not strictly convex");
            }
        }
        Ok(())
    }

    /// End points of the local edge `edge`, in counter-clockwise order.
    pub fn edge_vertices(&self, edge: usize) -> [Point2<f64>; 2] {
        let vertices = self.vertices();
        let n = vertices.len();
        [vertices[edge % n], vertices[(edge + 1) % n]]
    }

    /// Length and outward unit normal of the local edge `edge`.
    pub fn edge_length_and_normal(&self, edge: usize) -> (f64, Vector2<f64>) {
        let [a, b] = self.edge_vertices(edge);
        let tangent = b - a;
        let length = tangent.norm();
        // Rotating the tangent clockwise points out of a counter-clockwise element
        let normal = Vector2::new(tangent.y, -tangent.x) / length;
        (length, normal)
    }
}

impl FiniteElement for ElementGeometry {
    fn reference_jacobian(&self, xi: &Point2<f64>) -> Matrix2<f64> {
        match self {
            Self::Triangle(tri) => tri.reference_jacobian(xi),
            Self::Quadrilateral(quad) => quad.reference_jacobian(xi),
        }
    }

    fn map_reference_coords(&self, xi: &Point2<f64>) -> Point2<f64> {
        match self {
            Self::Triangle(tri) => tri.map_reference_coords(xi),
            Self::Quadrilateral(quad) => quad.map_reference_coords(xi),
        }
    }

    fn map_physical_coords(&self, x: &Point2<f64>) -> Option<Point2<f64>> {
        match self {
            Self::Triangle(tri) => tri.map_physical_coords(x),
            Self::Quadrilateral(quad) => quad.map_physical_coords(x),
        }
    }

    fn diameter(&self) -> f64 {
        match self {
            Self::Triangle(tri) => tri.diameter(),
            Self::Quadrilateral(quad) => quad.diameter(),
        }
    }
}
