use crate::element::{ElementKind, MAX_DEGREE};
use crate::error::SpaceError;
use crate::nalgebra::{DMatrix, Point2, Vector2};

/// Nodal Lagrange basis of arbitrary degree on a reference element.
///
/// Nodes are numbered as follows:
///
/// - the element vertices, in counter-clockwise order,
/// - `degree - 1` nodes on each edge, ordered edge by edge from local vertex `k` towards vertex
///   `k + 1`,
/// - the remaining interior nodes of the equispaced lattice, row by row.
///
/// Triangles use the complete polynomial space of total degree `degree`, quadrilaterals the
/// tensor product space of degree `degree` in each coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct LagrangeBasis {
    kind: ElementKind,
    degree: usize,
    nodes: Vec<Point2<f64>>,
    exponents: Vec<[usize; 2]>,
    // Column k holds the monomial coefficients of basis function k
    coefficients: DMatrix<f64>,
}

impl LagrangeBasis {
    pub fn new(kind: ElementKind, degree: usize) -> Result<Self, SpaceError> {
        if degree < 1 || degree > MAX_DEGREE {
            return Err(SpaceError::InvalidDegree { degree });
        }

        let nodes = lattice_nodes(kind, degree);
        let exponents = monomial_exponents(kind, degree);
        debug_assert_eq!(nodes.len(), exponents.len());

        let n = nodes.len();
        let mut vandermonde = DMatrix::zeros(n, n);
        for (i, node) in nodes.iter().enumerate() {
            for (j, &[a, b]) in exponents.iter().enumerate() {
                vandermonde[(i, j)] = node.x.powi(a as i32) * node.y.powi(b as i32);
            }
        }

        let coefficients = vandermonde
            .try_inverse()
            .ok_or(SpaceError::InvalidDegree { degree })?;

        Ok(Self {
            kind,
            degree,
            nodes,
            exponents,
            coefficients,
        })
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Node positions on the reference element.
    pub fn nodes(&self) -> &[Point2<f64>] {
        &self.nodes
    }

    pub fn num_vertex_nodes(&self) -> usize {
        self.kind.num_vertices()
    }

    pub fn num_nodes_per_edge(&self) -> usize {
        self.degree - 1
    }

    pub fn num_interior_nodes(&self) -> usize {
        self.num_nodes() - self.num_vertex_nodes() - self.kind.num_vertices() * self.num_nodes_per_edge()
    }

    /// Local index of the `m`-th node (counting from zero) on local edge `edge`.
    pub fn edge_node_index(&self, edge: usize, m: usize) -> usize {
        debug_assert!(m < self.num_nodes_per_edge());
        self.num_vertex_nodes() + edge * self.num_nodes_per_edge() + m
    }

    /// Local index of the `i`-th interior node.
    pub fn interior_node_index(&self, i: usize) -> usize {
        debug_assert!(i < self.num_interior_nodes());
        self.num_vertex_nodes() + self.kind.num_vertices() * self.num_nodes_per_edge() + i
    }

    /// Evaluates all basis functions at the reference point `xi`.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not have one entry per node.
    pub fn populate_basis(&self, values: &mut [f64], xi: &Point2<f64>) {
        assert_eq!(values.len(), self.num_nodes());
        let (px, py) = self.powers(xi);
        values.fill(0.0);
        for (m, &[a, b]) in self.exponents.iter().enumerate() {
            let monomial = px[a] * py[b];
            for (k, value) in values.iter_mut().enumerate() {
                *value += self.coefficients[(m, k)] * monomial;
            }
        }
    }

    /// Evaluates the reference gradients of all basis functions at the reference point `xi`.
    ///
    /// # Panics
    ///
    /// Panics if `gradients` does not have one entry per node.
    pub fn populate_basis_gradients(&self, gradients: &mut [Vector2<f64>], xi: &Point2<f64>) {
        assert_eq!(gradients.len(), self.num_nodes());
        let (px, py) = self.powers(xi);
        gradients.fill(Vector2::zeros());
        for (m, &[a, b]) in self.exponents.iter().enumerate() {
            let d_dx = if a > 0 { a as f64 * px[a - 1] * py[b] } else { 0.0 };
            let d_dy = if b > 0 { b as f64 * px[a] * py[b - 1] } else { 0.0 };
            for (k, gradient) in gradients.iter_mut().enumerate() {
                let c = self.coefficients[(m, k)];
                gradient.x += c * d_dx;
                gradient.y += c * d_dy;
            }
        }
    }

    fn powers(&self, xi: &Point2<f64>) -> (Vec<f64>, Vec<f64>) {
        let powers_of = |t: f64| {
            let mut p = Vec::with_capacity(self.degree + 1);
            p.push(1.0);
            for i in 1..=self.degree {
                p.push(p[i - 1] * t);
            }
            p
        };
        (powers_of(xi.x), powers_of(xi.y))
    }
}

fn monomial_exponents(kind: ElementKind, degree: usize) -> Vec<[usize; 2]> {
    let mut exponents = Vec::new();
    for b in 0..=degree {
        for a in 0..=degree {
            let admissible = match kind {
                ElementKind::Triangle => a + b <= degree,
                ElementKind::Quadrilateral => true,
            };
            if admissible {
                exponents.push([a, b]);
            }
        }
    }
    exponents
}

fn lattice_nodes(kind: ElementKind, degree: usize) -> Vec<Point2<f64>> {
    let p = degree;
    let lattice_coord = |i: usize| -1.0 + 2.0 * (i as f64) / (p as f64);
    let vertices = kind.reference_vertices();
    let nv = vertices.len();

    let mut nodes: Vec<_> = vertices.iter().map(|&[x, y]| Point2::new(x, y)).collect();

    for k in 0..nv {
        let [a0, a1] = vertices[k];
        let [b0, b1] = vertices[(k + 1) % nv];
        for m in 1..p {
            let s = m as f64 / p as f64;
            nodes.push(Point2::new((1.0 - s) * a0 + s * b0, (1.0 - s) * a1 + s * b1));
        }
    }

    match kind {
        ElementKind::Triangle => {
            for j in 1..p {
                for i in 1..p {
                    if i + j < p {
                        nodes.push(Point2::new(lattice_coord(i), lattice_coord(j)));
                    }
                }
            }
        }
        ElementKind::Quadrilateral => {
            for j in 1..p {
                for i in 1..p {
                    nodes.push(Point2::new(lattice_coord(i), lattice_coord(j)));
                }
            }
        }
    }

    nodes
}
