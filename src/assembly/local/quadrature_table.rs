use crate::element::{ElementKind, LagrangeBasis};
use crate::error::QuadratureError;
use crate::nalgebra::{Point2, Vector2};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Identifies a quadrature rule on a reference element: the whole element, or one of its edges.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TableKey {
    pub kind: ElementKind,
    pub edge: Option<usize>,
    pub order: usize,
}

/// A quadrature rule on the reference element along with the basis functions tabulated at the
/// quadrature points.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    /// Weights of the reference rule. For edges, these are the weights on `[-1, 1]`.
    pub weights: Vec<f64>,
    /// Quadrature points on the reference element
    pub points: Vec<Point2<f64>>,
    /// Basis values, `values[k * num_points + q]` for basis function `k` at point `q`
    pub values: Vec<f64>,
    /// Reference gradients, `gradients[q * num_nodes + k]` for basis function `k` at point `q`
    pub gradients: Vec<Vector2<f64>>,
}

impl ReferenceTable {
    pub fn num_points(&self) -> usize {
        self.weights.len()
    }

    fn tabulate(basis: &LagrangeBasis, weights: Vec<f64>, points: Vec<Point2<f64>>) -> Self {
        let n = basis.num_nodes();
        let nq = points.len();
        let mut values = vec![0.0; n * nq];
        let mut gradients = vec![Vector2::zeros(); n * nq];
        let mut point_values = vec![0.0; n];
        for (q, xi) in points.iter().enumerate() {
            basis.populate_basis(&mut point_values, xi);
            for (k, value) in point_values.iter().enumerate() {
                values[k * nq + q] = *value;
            }
            basis.populate_basis_gradients(&mut gradients[q * n..(q + 1) * n], xi);
        }
        Self {
            weights,
            points,
            values,
            gradients,
        }
    }
}

/// Lazily populated cache of reference tables for a fixed polynomial degree.
#[derive(Debug, Default)]
pub struct QuadratureTableCache {
    degree: usize,
    tables: FxHashMap<TableKey, Arc<ReferenceTable>>,
}

impl QuadratureTableCache {
    pub fn get_or_tabulate(&mut self, basis: &LagrangeBasis, key: TableKey) -> Result<Arc<ReferenceTable>, QuadratureError> {
        debug_assert_eq!(basis.kind(), key.kind);
        if basis.degree() != self.degree {
            self.tables.clear();
            self.degree = basis.degree();
        }

        if let Some(table) = self.tables.get(&key) {
            return Ok(table.clone());
        }

        let table = match key.edge {
            None => {
                let (weights, points) = match key.kind {
                    ElementKind::Triangle => ellipt2d_quadrature::triangle_for_order(key.order)?,
                    ElementKind::Quadrilateral => ellipt2d_quadrature::quadrilateral_for_order(key.order)?,
                };
                let points = points.into_iter().map(|[x, y]| Point2::new(x, y)).collect();
                ReferenceTable::tabulate(basis, weights, points)
            }
            Some(edge) => {
                let (weights, points) = ellipt2d_quadrature::interval_for_order(key.order)?;
                let points = points
                    .into_iter()
                    .map(|[t]| key.kind.reference_edge_point(edge, t))
                    .collect();
                ReferenceTable::tabulate(basis, weights, points)
            }
        };

        let table = Arc::new(table);
        self.tables.insert(key, table.clone());
        Ok(table)
    }
}
