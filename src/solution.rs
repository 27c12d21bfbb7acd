//! Finite element fields reconstructed from coefficient vectors.
use crate::element::FiniteElement;
use crate::error::SolutionError;
use crate::nalgebra::{DVector, DVectorView, Point2, Vector2};
use crate::space::FunctionSpace;

/// A finite element function on a function space.
///
/// The coefficient vector covers all degrees of freedom, free values followed by essential
/// values. Essential values always equal the prescribed values recorded by the space.
#[derive(Debug, Clone)]
pub struct Solution<'a> {
    space: &'a FunctionSpace,
    coefficients: DVector<f64>,
}

impl<'a> Solution<'a> {
    /// Wraps a coefficient vector over all degrees of freedom.
    ///
    /// The essential entries are overwritten with the prescribed values of the space.
    pub fn new(space: &'a FunctionSpace, mut coefficients: DVector<f64>) -> Result<Self, SolutionError> {
        if coefficients.len() != space.num_dofs() {
            return Err(SolutionError::CoefficientLengthMismatch {
                expected: space.num_dofs(),
                actual: coefficients.len(),
            });
        }
        let num_free = space.num_free_dofs();
        coefficients
            .rows_mut(num_free, space.num_essential_dofs())
            .copy_from_slice(space.essential_values());
        Ok(Self { space, coefficients })
    }

    /// Constructs a solution from the values of the free degrees of freedom, as returned by a
    /// solver backend.
    pub fn from_free_coefficients<'b>(
        space: &'a FunctionSpace,
        free_coefficients: impl Into<DVectorView<'b, f64>>,
    ) -> Result<Self, SolutionError> {
        let free_coefficients = free_coefficients.into();
        if free_coefficients.len() != space.num_free_dofs() {
            return Err(SolutionError::CoefficientLengthMismatch {
                expected: space.num_free_dofs(),
                actual: free_coefficients.len(),
            });
        }
        let mut coefficients = DVector::zeros(space.num_dofs());
        coefficients
            .rows_mut(0, space.num_free_dofs())
            .copy_from(&free_coefficients);
        Self::new(space, coefficients)
    }

    pub fn space(&self) -> &'a FunctionSpace {
        self.space
    }

    pub fn coefficients(&self) -> &DVector<f64> {
        &self.coefficients
    }

    pub fn free_coefficients(&self) -> DVectorView<f64> {
        self.coefficients.rows(0, self.space.num_free_dofs())
    }

    /// Evaluates the field at the given point, or returns `None` if the point is outside the
    /// mesh.
    pub fn value(&self, point: &Point2<f64>) -> Option<f64> {
        let (element_idx, xi) = self.space.mesh().locate_point(point)?;
        let geometry = self.space.mesh().element_geometry(element_idx)?;
        let basis = self.space.basis(geometry.kind());
        let mut values = vec![0.0; basis.num_nodes()];
        basis.populate_basis(&mut values, &xi);
        let value = self
            .space
            .element_dofs(element_idx)
            .iter()
            .zip(&values)
            .map(|(&dof, phi)| self.coefficients[dof] * phi)
            .sum();
        Some(value)
    }

    /// Evaluates the gradient of the field at the given point, or returns `None` if the point is
    /// outside the mesh.
    ///
    /// On element boundaries the gradient of the element containing the point with the lowest
    /// index is returned.
    pub fn gradient(&self, point: &Point2<f64>) -> Option<Vector2<f64>> {
        let (element_idx, xi) = self.space.mesh().locate_point(point)?;
        let geometry = self.space.mesh().element_geometry(element_idx)?;
        let basis = self.space.basis(geometry.kind());
        let mut gradients = vec![Vector2::zeros(); basis.num_nodes()];
        basis.populate_basis_gradients(&mut gradients, &xi);
        let reference_gradient: Vector2<f64> = self
            .space
            .element_dofs(element_idx)
            .iter()
            .zip(&gradients)
            .map(|(&dof, grad_phi)| grad_phi * self.coefficients[dof])
            .sum();
        let inverse_transpose = geometry.reference_jacobian(&xi).try_inverse()?.transpose();
        Some(inverse_transpose * reference_gradient)
    }
}
