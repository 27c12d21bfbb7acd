//! Element-local evaluation of weak forms.
use crate::assembly::ScatterBuffer;
use crate::element::{ElementGeometry, FiniteElement, LagrangeBasis};
use crate::error::{Error, GeometryError, SpaceError};
use crate::mesh::Marker;
use crate::nalgebra::{DMatrix, DVector, Point2, Vector2};
use crate::space::{BcType, FunctionSpace};
use crate::weak_form::{BilinearForm, FormContribution, FormOrders, FunctionValues, Geometry, LinearForm, Symmetry, WeakForm};
use log::trace;
use std::sync::Arc;

mod quadrature_table;

pub use quadrature_table::*;

/// Reusable buffers for the evaluation of weak forms on a single element.
///
/// Basis functions are tabulated on the reference element once per rule and cached. Per element,
/// the physical quantities (weights including the Jacobian factor, coordinates and gradients) are
/// computed for the rule currently in use.
#[derive(Debug)]
pub struct ElementWorkspace {
    cache: QuadratureTableCache,
    current: Option<TableKey>,
    table: Option<Arc<ReferenceTable>>,
    weights: Vec<f64>,
    x: Vec<f64>,
    y: Vec<f64>,
    nx: Vec<f64>,
    ny: Vec<f64>,
    dx: Vec<f64>,
    dy: Vec<f64>,
    element_matrix: DMatrix<f64>,
    element_vector: DVector<f64>,
    has_matrix_contributions: bool,
}

impl Default for ElementWorkspace {
    fn default() -> Self {
        Self {
            cache: QuadratureTableCache::default(),
            current: None,
            table: None,
            weights: Vec::new(),
            x: Vec::new(),
            y: Vec::new(),
            nx: Vec::new(),
            ny: Vec::new(),
            dx: Vec::new(),
            dy: Vec::new(),
            element_matrix: DMatrix::zeros(0, 0),
            element_vector: DVector::zeros(0),
            has_matrix_contributions: false,
        }
    }
}

/// Element data that stays fixed while evaluating the contributions of one element.
struct ElementContext<'a> {
    element_idx: usize,
    geometry: ElementGeometry,
    basis: &'a LagrangeBasis,
    marker: Marker,
    diameter: f64,
}

impl ElementWorkspace {
    /// Evaluates all matching contributions on the given element and scatters the result into
    /// the buffer.
    pub fn assemble_element(
        &mut self,
        space: &FunctionSpace,
        weak_form: &WeakForm,
        element_idx: usize,
        output: &mut ScatterBuffer,
    ) -> Result<(), Error> {
        let mesh = space.mesh();
        let geometry = mesh
            .element_geometry(element_idx)
            .ok_or(SpaceError::InvalidElement { element: element_idx })?;
        let kind = geometry.kind();
        let basis = space.basis(kind);
        let n = basis.num_nodes();
        let p = space.degree();
        let context = ElementContext {
            element_idx,
            geometry,
            basis,
            marker: mesh.elements()[element_idx].marker,
            diameter: geometry.diameter(),
        };

        self.current = None;
        self.has_matrix_contributions = false;
        self.element_matrix.resize_mut(n, n, 0.0);
        self.element_matrix.fill(0.0);
        self.element_vector.resize_vertically_mut(n, 0.0);
        self.element_vector.fill(0.0);

        let bilinear_orders = FormOrders { trial: p, test: p };
        let linear_orders = FormOrders { trial: 0, test: p };

        for contribution in weak_form.contributions() {
            match contribution {
                FormContribution::VolumeBilinear(form) if form.area.matches(context.marker) => {
                    let order = (form.order)(bilinear_orders) + kind.geometry_order();
                    self.prepare(&context, None, order)?;
                    self.integrate_bilinear(form, &context, None);
                }
                FormContribution::VolumeLinear(form) if form.area.matches(context.marker) => {
                    let order = (form.order)(linear_orders) + kind.geometry_order();
                    self.prepare(&context, None, order)?;
                    self.integrate_linear(form, &context, None);
                }
                _ => {}
            }
        }

        for (local_edge, &edge_idx) in mesh.element_edges(element_idx).iter().enumerate() {
            let edge_marker = match mesh.edge_marker(edge_idx) {
                Some(marker) if space.bc_type(marker) == Some(BcType::Natural) => marker,
                _ => continue,
            };
            for contribution in weak_form.contributions() {
                match contribution {
                    FormContribution::BoundaryBilinear(form) if form.area.matches(edge_marker) => {
                        let order = (form.order)(bilinear_orders) + kind.geometry_order();
                        self.prepare(&context, Some(local_edge), order)?;
                        self.integrate_bilinear(form, &context, Some(edge_marker));
                    }
                    FormContribution::BoundaryLinear(form) if form.area.matches(edge_marker) => {
                        let order = (form.order)(linear_orders) + kind.geometry_order();
                        self.prepare(&context, Some(local_edge), order)?;
                        self.integrate_linear(form, &context, Some(edge_marker));
                    }
                    _ => {}
                }
            }
        }

        self.scatter(space, space.element_dofs(element_idx), output);
        Ok(())
    }

    /// Computes the physical quadrature data for the rule of the given order on the element or
    /// one of its edges, unless it is already available.
    fn prepare(&mut self, context: &ElementContext, edge: Option<usize>, order: usize) -> Result<(), Error> {
        let key = TableKey {
            kind: context.geometry.kind(),
            edge,
            order,
        };
        if self.current == Some(key) {
            return Ok(());
        }
        trace!(
            "Element {}: using quadrature of order {} (edge {:?})",
            context.element_idx,
            order,
            edge
        );

        let table = self.cache.get_or_tabulate(context.basis, key)?;
        let n = context.basis.num_nodes();
        let nq = table.num_points();

        let (edge_scale, normal) = match edge {
            Some(local_edge) => {
                let (length, normal) = context.geometry.edge_length_and_normal(local_edge);
                (Some(length / 2.0), normal)
            }
            None => (None, Vector2::zeros()),
        };

        self.weights.clear();
        self.x.clear();
        self.y.clear();
        self.nx.clear();
        self.ny.clear();
        self.dx.resize(n * nq, 0.0);
        self.dy.resize(n * nq, 0.0);

        for (q, xi) in table.points.iter().enumerate() {
            let jacobian = context.geometry.reference_jacobian(xi);
            let det = jacobian.determinant();
            let inverse_transpose = jacobian
                .try_inverse()
                .filter(|_| det > 0.0)
                .ok_or(GeometryError::DegenerateElement {
                    element: context.element_idx,
                    reason: "reference Jacobian is singular or orientation-reversing",
                })?
                .transpose();

            let weight = match edge_scale {
                Some(scale) => table.weights[q] * scale,
                None => table.weights[q] * det,
            };
            let x: Point2<f64> = context.geometry.map_reference_coords(xi);
            self.weights.push(weight);
            self.x.push(x.x);
            self.y.push(x.y);
            self.nx.push(normal.x);
            self.ny.push(normal.y);

            for k in 0..n {
                let gradient = inverse_transpose * table.gradients[q * n + k];
                self.dx[k * nq + q] = gradient.x;
                self.dy[k * nq + q] = gradient.y;
            }
        }

        self.table = Some(table);
        self.current = Some(key);
        Ok(())
    }

    fn function_values<'a>(table: &'a ReferenceTable, dx: &'a [f64], dy: &'a [f64], k: usize) -> FunctionValues<'a> {
        let nq = table.num_points();
        let range = k * nq..(k + 1) * nq;
        FunctionValues {
            values: &table.values[range.clone()],
            dx: &dx[range.clone()],
            dy: &dy[range],
        }
    }

    fn geometry<'a>(&'a self, context: &ElementContext, edge_marker: Option<Marker>) -> Geometry<'a> {
        Geometry {
            x: &self.x,
            y: &self.y,
            nx: &self.nx,
            ny: &self.ny,
            element_marker: context.marker,
            edge_marker,
            diameter: context.diameter,
        }
    }

    fn integrate_bilinear(&mut self, form: &BilinearForm, context: &ElementContext, edge_marker: Option<Marker>) {
        let table = match &self.table {
            Some(table) => table.clone(),
            None => return,
        };
        let n = context.basis.num_nodes();
        let geometry = self.geometry(context, edge_marker);

        let mut contributions = Vec::with_capacity(n * n);
        for i in 0..n {
            let v = Self::function_values(&table, &self.dx, &self.dy, i);
            let first_trial = match form.symmetry {
                Symmetry::Symmetric => i,
                Symmetry::NonSymmetric => 0,
            };
            for j in first_trial..n {
                let u = Self::function_values(&table, &self.dx, &self.dy, j);
                contributions.push((i, j, (form.integrand)(&self.weights, &u, &v, &geometry)));
            }
        }

        for (i, j, value) in contributions {
            self.element_matrix[(i, j)] += value;
            if form.symmetry == Symmetry::Symmetric && i != j {
                self.element_matrix[(j, i)] += value;
            }
        }
        self.has_matrix_contributions = true;
    }

    fn integrate_linear(&mut self, form: &LinearForm, context: &ElementContext, edge_marker: Option<Marker>) {
        let table = match &self.table {
            Some(table) => table.clone(),
            None => return,
        };
        let n = context.basis.num_nodes();
        let geometry = self.geometry(context, edge_marker);

        let contributions: Vec<f64> = (0..n)
            .map(|i| {
                let v = Self::function_values(&table, &self.dx, &self.dy, i);
                (form.integrand)(&self.weights, &v, &geometry)
            })
            .collect();

        for (i, value) in contributions.into_iter().enumerate() {
            self.element_vector[i] += value;
        }
    }

    /// Moves the element matrix and vector into the global buffer.
    ///
    /// Rows of essential degrees of freedom are dropped. Matrix entries in the columns of
    /// essential degrees of freedom are moved to the right-hand side, multiplied by the prescribed
    /// values.
    fn scatter(&self, space: &FunctionSpace, dofs: &[usize], output: &mut ScatterBuffer) {
        let num_free = space.num_free_dofs();
        for (i, &row) in dofs.iter().enumerate() {
            if row >= num_free {
                continue;
            }
            let mut rhs = self.element_vector[i];
            if self.has_matrix_contributions {
                for (j, &col) in dofs.iter().enumerate() {
                    let entry = self.element_matrix[(i, j)];
                    match space.essential_value(col) {
                        Some(value) => rhs -= entry * value,
                        None => output.push_matrix_entry(row, col, entry),
                    }
                }
            }
            output.push_rhs_entry(row, rhs);
        }
    }
}
