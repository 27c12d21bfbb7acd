use crate::mesh::Marker;
use crate::weak_form::{FormOrders, FunctionValues, Geometry, Symmetry, WeakForm};
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// A scalar coefficient function `(x, y) -> value`.
pub type Coefficient = Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>;

/// Coefficients of the general second-order elliptic equation
///
/// ```text
/// -div(A grad u) + b . grad u + a_0 u = f,    A = [[a_11, a_12], [a_21, a_22]],  b = (a_1, a_2),
/// ```
///
/// with natural boundary conditions `(A grad u) . n = g` on selected boundary markers.
///
/// Absent terms are zero. The coefficient order is added to the polynomial degrees of trial and
/// test functions when estimating quadrature orders, and should be the polynomial degree of the
/// coefficients (or an adequate approximation for non-polynomial coefficients).
#[derive(Clone, Default)]
pub struct EllipticCoefficients {
    a11: Option<Coefficient>,
    a12: Option<Coefficient>,
    a21: Option<Coefficient>,
    a22: Option<Coefficient>,
    a1: Option<Coefficient>,
    a2: Option<Coefficient>,
    a0: Option<Coefficient>,
    rhs: Option<Coefficient>,
    neumann: Vec<(Marker, Coefficient)>,
    coefficient_order: usize,
}

impl Debug for EllipticCoefficients {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let present = |c: &Option<Coefficient>| c.is_some();
        f.debug_struct("EllipticCoefficients")
            .field("a11", &present(&self.a11))
            .field("a12", &present(&self.a12))
            .field("a21", &present(&self.a21))
            .field("a22", &present(&self.a22))
            .field("a1", &present(&self.a1))
            .field("a2", &present(&self.a2))
            .field("a0", &present(&self.a0))
            .field("rhs", &present(&self.rhs))
            .field(
                "neumann_markers",
                &self.neumann.iter().map(|(m, _)| *m).collect::<Vec<_>>(),
            )
            .field("coefficient_order", &self.coefficient_order)
            .finish()
    }
}

fn coefficient(f: impl 'static + Fn(f64, f64) -> f64 + Send + Sync) -> Option<Coefficient> {
    Some(Arc::new(f))
}

impl EllipticCoefficients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coefficients of the Laplace operator, `A = I`.
    pub fn laplace() -> Self {
        Self::new()
            .with_a11(|_, _| 1.0)
            .with_a22(|_, _| 1.0)
    }

    pub fn with_a11(mut self, f: impl 'static + Fn(f64, f64) -> f64 + Send + Sync) -> Self {
        self.a11 = coefficient(f);
        self
    }

    pub fn with_a22(mut self, f: impl 'static + Fn(f64, f64) -> f64 + Send + Sync) -> Self {
        self.a22 = coefficient(f);
        self
    }

    /// Sets `a_12 = a_21 = f`, keeping the operator symmetric.
    pub fn with_off_diagonal(mut self, f: impl 'static + Fn(f64, f64) -> f64 + Send + Sync) -> Self {
        let f = coefficient(f);
        self.a12 = f.clone();
        self.a21 = f;
        self
    }

    pub fn with_a12(mut self, f: impl 'static + Fn(f64, f64) -> f64 + Send + Sync) -> Self {
        self.a12 = coefficient(f);
        self
    }

    pub fn with_a21(mut self, f: impl 'static + Fn(f64, f64) -> f64 + Send + Sync) -> Self {
        self.a21 = coefficient(f);
        self
    }

    /// Sets the convection field `b = (a_1, a_2)`.
    pub fn with_convection(
        mut self,
        a1: impl 'static + Fn(f64, f64) -> f64 + Send + Sync,
        a2: impl 'static + Fn(f64, f64) -> f64 + Send + Sync,
    ) -> Self {
        self.a1 = coefficient(a1);
        self.a2 = coefficient(a2);
        self
    }

    pub fn with_a0(mut self, f: impl 'static + Fn(f64, f64) -> f64 + Send + Sync) -> Self {
        self.a0 = coefficient(f);
        self
    }

    pub fn with_rhs(mut self, f: impl 'static + Fn(f64, f64) -> f64 + Send + Sync) -> Self {
        self.rhs = coefficient(f);
        self
    }

    /// Adds the natural boundary condition `(A grad u) . n = g` on edges with the given marker.
    pub fn with_neumann(mut self, marker: Marker, g: impl 'static + Fn(f64, f64) -> f64 + Send + Sync) -> Self {
        let g: Coefficient = Arc::new(g);
        self.neumann.push((marker, g));
        self
    }

    pub fn with_coefficient_order(mut self, order: usize) -> Self {
        self.coefficient_order = order;
        self
    }

    /// Whether the resulting bilinear form is symmetric.
    ///
    /// This is the case if there is no convection term and the off-diagonal coefficients are
    /// either both absent or the same function, as set by
    /// [`with_off_diagonal`](Self::with_off_diagonal).
    pub fn is_symmetric(&self) -> bool {
        let off_diagonal_symmetric = match (&self.a12, &self.a21) {
            (None, None) => true,
            (Some(a12), Some(a21)) => Arc::ptr_eq(a12, a21),
            _ => false,
        };
        off_diagonal_symmetric && self.a1.is_none() && self.a2.is_none()
    }
}

/// Accumulates `sum_i w_i c(x_i, y_i) a_i b_i` for an optional coefficient.
fn weighted_term(c: &Option<Coefficient>, w: &[f64], geometry: &Geometry, a: &[f64], b: &[f64]) -> f64 {
    match c {
        Some(c) => (0..w.len())
            .map(|i| w[i] * c(geometry.x[i], geometry.y[i]) * a[i] * b[i])
            .sum(),
        None => 0.0,
    }
}

fn elliptic_bilinear(
    coefficients: &EllipticCoefficients,
    w: &[f64],
    u: &FunctionValues,
    v: &FunctionValues,
    geometry: &Geometry,
) -> f64 {
    let c = coefficients;
    weighted_term(&c.a11, w, geometry, u.dx, v.dx)
        + weighted_term(&c.a12, w, geometry, u.dy, v.dx)
        + weighted_term(&c.a21, w, geometry, u.dx, v.dy)
        + weighted_term(&c.a22, w, geometry, u.dy, v.dy)
        + weighted_term(&c.a1, w, geometry, u.dx, v.values)
        + weighted_term(&c.a2, w, geometry, u.dy, v.values)
        + weighted_term(&c.a0, w, geometry, u.values, v.values)
}

fn weighted_source(f: &Coefficient, w: &[f64], v: &FunctionValues, geometry: &Geometry) -> f64 {
    (0..w.len())
        .map(|i| w[i] * f(geometry.x[i], geometry.y[i]) * v.values[i])
        .sum()
}

impl WeakForm {
    /// The weak form of the general second-order elliptic equation described by the
    /// coefficients:
    ///
    /// ```text
    /// a(u, v) = int (A grad u) . grad v + (b . grad u) v + a_0 u v,
    /// l(v) = int f v + sum_markers int_edges g v.
    /// ```
    pub fn general_elliptic(coefficients: EllipticCoefficients) -> Self {
        let mut weak_form = WeakForm::new();
        let symmetry = if coefficients.is_symmetric() {
            Symmetry::Symmetric
        } else {
            Symmetry::NonSymmetric
        };
        let q = coefficients.coefficient_order;
        let coefficients = Arc::new(coefficients);

        let bilinear_coefficients = coefficients.clone();
        weak_form.add_matrix_form(
            move |w, u, v, geometry| elliptic_bilinear(&bilinear_coefficients, w, u, v, geometry),
            move |orders: FormOrders| orders.trial + orders.test + q,
            symmetry,
        );

        if let Some(rhs) = coefficients.rhs.clone() {
            weak_form.add_vector_form(
                move |w, v, geometry| weighted_source(&rhs, w, v, geometry),
                move |orders: FormOrders| orders.test + q,
            );
        }

        for (marker, g) in coefficients.neumann.iter().cloned() {
            weak_form.add_vector_form_surf(
                move |w, v, geometry| weighted_source(&g, w, v, geometry),
                move |orders: FormOrders| orders.test + q,
                marker,
            );
        }

        weak_form
    }
}
