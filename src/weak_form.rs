//! Registry of weak-form contributions.
//!
//! A [`WeakForm`] is an ordered list of integrands, each paired with an estimate of the
//! polynomial order of the integrand and a selector of the part of the domain it applies to. It
//! holds no mesh or solver state; the contributions are evaluated by the
//! [`Assembler`](crate::assembly::Assembler).
//!
//! Integrands receive quadrature weights that already include the Jacobian factor of the map from
//! the reference element (or edge), so that an integral is approximated by a weighted sum over
//! the quadrature points:
//!
//! ```
//! use ellipt2d::weak_form::{FormOrders, Symmetry, WeakForm};
//!
//! let mut weak_form = WeakForm::new();
//! weak_form
//!     .add_matrix_form(
//!         |w, u, v, _| (0..w.len()).map(|i| w[i] * (u.dx[i] * v.dx[i] + u.dy[i] * v.dy[i])).sum(),
//!         |orders: FormOrders| orders.trial + orders.test,
//!         Symmetry::Symmetric,
//!     )
//!     .add_vector_form(|w, v, _| w.iter().zip(v.values).map(|(w, v)| w * v).sum(), |orders| orders.test);
//! assert_eq!(weak_form.contributions().len(), 2);
//! ```
use crate::mesh::Marker;
use std::fmt;
use std::fmt::{Debug, Formatter};

mod elliptic;
pub mod integrals;

pub use elliptic::*;

/// Values and physical derivatives of a single basis function at all quadrature points.
#[derive(Debug, Copy, Clone)]
pub struct FunctionValues<'a> {
    pub values: &'a [f64],
    pub dx: &'a [f64],
    pub dy: &'a [f64],
}

/// Geometric data at the quadrature points of an element or edge.
#[derive(Debug, Copy, Clone)]
pub struct Geometry<'a> {
    /// Physical x-coordinates of the quadrature points
    pub x: &'a [f64],
    /// Physical y-coordinates of the quadrature points
    pub y: &'a [f64],
    /// x-component of the outward unit normal, zero for volume integrals
    pub nx: &'a [f64],
    /// y-component of the outward unit normal, zero for volume integrals
    pub ny: &'a [f64],
    pub element_marker: Marker,
    /// The boundary marker of the edge, for boundary integrals
    pub edge_marker: Option<Marker>,
    pub diameter: f64,
}

/// Polynomial degrees of the trial and test functions passed to order estimators.
///
/// For quadrilaterals the degrees are understood per coordinate direction. For linear forms,
/// `trial` is zero.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FormOrders {
    pub trial: usize,
    pub test: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Symmetry {
    /// The integrand is unchanged when trial and test functions are swapped. Only the upper
    /// triangle of each element matrix is computed.
    Symmetric,
    NonSymmetric,
}

/// The part of the domain a contribution is integrated over.
///
/// For volume forms the marker refers to element markers, for boundary forms to boundary markers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FormArea {
    Any,
    Marker(Marker),
}

impl FormArea {
    pub fn matches(&self, marker: Marker) -> bool {
        match self {
            Self::Any => true,
            Self::Marker(m) => *m == marker,
        }
    }
}

impl From<Marker> for FormArea {
    fn from(marker: Marker) -> Self {
        Self::Marker(marker)
    }
}

pub type BilinearIntegrand =
    Box<dyn Fn(&[f64], &FunctionValues, &FunctionValues, &Geometry) -> f64 + Send + Sync>;
pub type LinearIntegrand = Box<dyn Fn(&[f64], &FunctionValues, &Geometry) -> f64 + Send + Sync>;
pub type OrderEstimator = Box<dyn Fn(FormOrders) -> usize + Send + Sync>;

/// A bilinear form `a(u, v)` with trial function `u` and test function `v`.
pub struct BilinearForm {
    pub integrand: BilinearIntegrand,
    pub order: OrderEstimator,
    pub symmetry: Symmetry,
    pub area: FormArea,
}

/// A linear form `l(v)` with test function `v`.
pub struct LinearForm {
    pub integrand: LinearIntegrand,
    pub order: OrderEstimator,
    pub area: FormArea,
}

pub enum FormContribution {
    VolumeBilinear(BilinearForm),
    VolumeLinear(LinearForm),
    /// Bilinear form on natural boundary edges
    BoundaryBilinear(BilinearForm),
    /// Linear form on natural boundary edges
    BoundaryLinear(LinearForm),
}

impl FormContribution {
    fn name(&self) -> &'static str {
        match self {
            Self::VolumeBilinear(_) => "VolumeBilinear",
            Self::VolumeLinear(_) => "VolumeLinear",
            Self::BoundaryBilinear(_) => "BoundaryBilinear",
            Self::BoundaryLinear(_) => "BoundaryLinear",
        }
    }

    pub fn area(&self) -> FormArea {
        match self {
            Self::VolumeBilinear(form) | Self::BoundaryBilinear(form) => form.area,
            Self::VolumeLinear(form) | Self::BoundaryLinear(form) => form.area,
        }
    }
}

impl Debug for FormContribution {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.name());
        s.field("area", &self.area());
        if let Self::VolumeBilinear(form) | Self::BoundaryBilinear(form) = self {
            s.field("symmetry", &form.symmetry);
        }
        s.finish()
    }
}

/// Ordered collection of weak-form contributions.
///
/// Contributions are additive: registering the same integrand twice doubles its contribution.
/// The order estimators are not validated. An estimate below the true polynomial degree of the
/// integrand leads to inexact quadrature without any error being reported.
#[derive(Default)]
pub struct WeakForm {
    contributions: Vec<FormContribution>,
}

impl Debug for WeakForm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.contributions).finish()
    }
}

impl WeakForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contributions(&self) -> &[FormContribution] {
        &self.contributions
    }

    /// Whether all bilinear contributions are symmetric.
    pub fn is_symmetric(&self) -> bool {
        self.bilinear_forms().all(|form| form.symmetry == Symmetry::Symmetric)
    }

    pub fn add_matrix_form<F, O>(&mut self, integrand: F, order: O, symmetry: Symmetry) -> &mut Self
    where
        F: 'static + Fn(&[f64], &FunctionValues, &FunctionValues, &Geometry) -> f64 + Send + Sync,
        O: 'static + Fn(FormOrders) -> usize + Send + Sync,
    {
        self.add_matrix_form_on(FormArea::Any, integrand, order, symmetry)
    }

    /// Adds a volume bilinear form integrated over the elements matching `area`.
    pub fn add_matrix_form_on<F, O>(
        &mut self,
        area: impl Into<FormArea>,
        integrand: F,
        order: O,
        symmetry: Symmetry,
    ) -> &mut Self
    where
        F: 'static + Fn(&[f64], &FunctionValues, &FunctionValues, &Geometry) -> f64 + Send + Sync,
        O: 'static + Fn(FormOrders) -> usize + Send + Sync,
    {
        self.contributions
            .push(FormContribution::VolumeBilinear(BilinearForm {
                integrand: Box::new(integrand),
                order: Box::new(order),
                symmetry,
                area: area.into(),
            }));
        self
    }

    pub fn add_vector_form<F, O>(&mut self, integrand: F, order: O) -> &mut Self
    where
        F: 'static + Fn(&[f64], &FunctionValues, &Geometry) -> f64 + Send + Sync,
        O: 'static + Fn(FormOrders) -> usize + Send + Sync,
    {
        self.add_vector_form_on(FormArea::Any, integrand, order)
    }

    /// Adds a volume linear form integrated over the elements matching `area`.
    pub fn add_vector_form_on<F, O>(&mut self, area: impl Into<FormArea>, integrand: F, order: O) -> &mut Self
    where
        F: 'static + Fn(&[f64], &FunctionValues, &Geometry) -> f64 + Send + Sync,
        O: 'static + Fn(FormOrders) -> usize + Send + Sync,
    {
        self.contributions
            .push(FormContribution::VolumeLinear(LinearForm {
                integrand: Box::new(integrand),
                order: Box::new(order),
                area: area.into(),
            }));
        self
    }

    /// Adds a bilinear form integrated over the natural boundary edges matching `area`.
    pub fn add_matrix_form_surf<F, O>(
        &mut self,
        integrand: F,
        order: O,
        symmetry: Symmetry,
        area: impl Into<FormArea>,
    ) -> &mut Self
    where
        F: 'static + Fn(&[f64], &FunctionValues, &FunctionValues, &Geometry) -> f64 + Send + Sync,
        O: 'static + Fn(FormOrders) -> usize + Send + Sync,
    {
        self.contributions
            .push(FormContribution::BoundaryBilinear(BilinearForm {
                integrand: Box::new(integrand),
                order: Box::new(order),
                symmetry,
                area: area.into(),
            }));
        self
    }

    /// Adds a linear form integrated over the natural boundary edges matching `area`.
    pub fn add_vector_form_surf<F, O>(&mut self, integrand: F, order: O, area: impl Into<FormArea>) -> &mut Self
    where
        F: 'static + Fn(&[f64], &FunctionValues, &Geometry) -> f64 + Send + Sync,
        O: 'static + Fn(FormOrders) -> usize + Send + Sync,
    {
        self.contributions
            .push(FormContribution::BoundaryLinear(LinearForm {
                integrand: Box::new(integrand),
                order: Box::new(order),
                area: area.into(),
            }));
        self
    }

    fn bilinear_forms(&self) -> impl '_ + Iterator<Item = &BilinearForm> {
        self.contributions
            .iter()
            .filter_map(|contribution| match contribution {
                FormContribution::VolumeBilinear(form) | FormContribution::BoundaryBilinear(form) => Some(form),
                _ => None,
            })
    }
}
