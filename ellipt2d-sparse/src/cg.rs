//! Preconditioned conjugate gradient for symmetric positive definite operators.
//!
//! ```
//! use ellipt2d_sparse::cg::{ConjugateGradient, RelativeResidualCriterion};
//! use nalgebra::{DMatrix, DVector};
//!
//! let a = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
//! let b = DVector::from_column_slice(&[1.0, 2.0]);
//! let mut x = DVector::zeros(2);
//! let output = ConjugateGradient::new()
//!     .with_operator(&a)
//!     .with_stopping_criterion(RelativeResidualCriterion::new(1e-12))
//!     .solve_with_guess(&b, &mut x)
//!     .unwrap();
//! assert!(output.num_iterations <= 2);
//! assert!((&a * &x - &b).norm() <= 1e-10);
//! ```
use crate::operators::{IdentityOperator, LinearOperator};
use log::debug;
use nalgebra::{DVector, DVectorView, DVectorViewMut, RealField, Scalar};
use std::error::Error;
use std::fmt;

/// Quantities available to a stopping criterion after each iteration.
#[derive(Debug, Clone, Copy)]
pub struct CgIterationState<T> {
    pub iteration: usize,
    pub rhs_norm: T,
    /// Norm of the residual as updated by the iteration, which may drift from `b - A x` for
    /// ill-conditioned operators.
    pub residual_norm: T,
}

pub trait CgStoppingCriterion<T: Scalar> {
    fn has_converged(&self, state: &CgIterationState<T>) -> bool;
}

impl<'a, T: Scalar, C: ?Sized + CgStoppingCriterion<T>> CgStoppingCriterion<T> for &'a C {
    fn has_converged(&self, state: &CgIterationState<T>) -> bool {
        (**self).has_converged(state)
    }
}

/// Stops once `|r| <= tol * |b|`.
#[derive(Debug, Clone, Copy)]
pub struct RelativeResidualCriterion<T> {
    tol: T,
}

impl<T> RelativeResidualCriterion<T> {
    pub fn new(tol: T) -> Self {
        Self { tol }
    }
}

impl Default for RelativeResidualCriterion<f64> {
    fn default() -> Self {
        Self::new(1e-8)
    }
}

impl<T: RealField + Copy> CgStoppingCriterion<T> for RelativeResidualCriterion<T> {
    fn has_converged(&self, state: &CgIterationState<T>) -> bool {
        state.residual_norm <= self.tol * state.rhs_norm
    }
}

/// Vectors reused between solves.
#[derive(Debug, Clone)]
pub struct CgWorkspace<T: Scalar> {
    residual: DVector<T>,
    preconditioned_residual: DVector<T>,
    direction: DVector<T>,
    operator_times_direction: DVector<T>,
}

impl<T: RealField + Copy> Default for CgWorkspace<T> {
    fn default() -> Self {
        Self {
            residual: DVector::zeros(0),
            preconditioned_residual: DVector::zeros(0),
            direction: DVector::zeros(0),
            operator_times_direction: DVector::zeros(0),
        }
    }
}

impl<T: RealField + Copy> CgWorkspace<T> {
    fn resize(&mut self, dim: usize) {
        for v in [
            &mut self.residual,
            &mut self.preconditioned_residual,
            &mut self.direction,
            &mut self.operator_times_direction,
        ] {
            v.resize_vertically_mut(dim, T::zero());
        }
    }
}

#[derive(Debug)]
enum WorkspaceHandle<'a, T: Scalar> {
    Owned(CgWorkspace<T>),
    Borrowed(&'a mut CgWorkspace<T>),
}

impl<'a, T: Scalar> WorkspaceHandle<'a, T> {
    fn get_mut(&mut self) -> &mut CgWorkspace<T> {
        match self {
            Self::Owned(workspace) => workspace,
            Self::Borrowed(workspace) => workspace,
        }
    }
}

/// Builder-style preconditioned conjugate gradient solver.
///
/// An operator and a stopping criterion must be given before solving. The preconditioner
/// defaults to the identity, and the number of iterations is unbounded unless
/// [`with_max_iter`](Self::with_max_iter) is used.
#[derive(Debug)]
pub struct ConjugateGradient<'a, T: Scalar, A, P, Criterion> {
    workspace: WorkspaceHandle<'a, T>,
    operator: A,
    preconditioner: P,
    stopping_criterion: Criterion,
    max_iter: Option<usize>,
}

impl<'a, T: RealField + Copy> ConjugateGradient<'a, T, (), IdentityOperator, ()> {
    pub fn new() -> Self {
        Self::with_handle(WorkspaceHandle::Owned(CgWorkspace::default()))
    }

    /// Solves with buffers borrowed from the given workspace, avoiding allocations across
    /// repeated solves of the same size.
    pub fn with_workspace(workspace: &'a mut CgWorkspace<T>) -> Self {
        Self::with_handle(WorkspaceHandle::Borrowed(workspace))
    }

    fn with_handle(workspace: WorkspaceHandle<'a, T>) -> Self {
        Self {
            workspace,
            operator: (),
            preconditioner: IdentityOperator,
            stopping_criterion: (),
            max_iter: None,
        }
    }
}

impl<'a, T: RealField + Copy> Default for ConjugateGradient<'a, T, (), IdentityOperator, ()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: Scalar, A, P, Criterion> ConjugateGradient<'a, T, A, P, Criterion> {
    pub fn with_operator<A2>(self, operator: A2) -> ConjugateGradient<'a, T, A2, P, Criterion> {
        ConjugateGradient {
            workspace: self.workspace,
            operator,
            preconditioner: self.preconditioner,
            stopping_criterion: self.stopping_criterion,
            max_iter: self.max_iter,
        }
    }

    pub fn with_preconditioner<P2>(self, preconditioner: P2) -> ConjugateGradient<'a, T, A, P2, Criterion> {
        ConjugateGradient {
            workspace: self.workspace,
            operator: self.operator,
            preconditioner,
            stopping_criterion: self.stopping_criterion,
            max_iter: self.max_iter,
        }
    }

    pub fn with_stopping_criterion<C2>(self, stopping_criterion: C2) -> ConjugateGradient<'a, T, A, P, C2> {
        ConjugateGradient {
            workspace: self.workspace,
            operator: self.operator,
            preconditioner: self.preconditioner,
            stopping_criterion,
            max_iter: self.max_iter,
        }
    }

    pub fn with_max_iter(self, max_iter: usize) -> Self {
        Self {
            max_iter: Some(max_iter),
            ..self
        }
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum SolveErrorKind {
    OperatorError(Box<dyn Error>),
    PreconditionerError(Box<dyn Error>),
    /// `p^T A p <= 0` for some search direction `p`.
    IndefiniteOperator,
    /// `z^T r <= 0` for some preconditioned residual `z`.
    IndefinitePreconditioner,
    MaxIterationsReached { max_iter: usize },
}

impl fmt::Display for SolveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperatorError(err) => write!(f, "Failed to apply operator: {}", err),
            Self::PreconditionerError(err) => write!(f, "Failed to apply preconditioner: {}", err),
            Self::IndefiniteOperator => write!(f, "Operator is not positive definite"),
            Self::IndefinitePreconditioner => write!(f, "Preconditioner is not positive definite"),
            Self::MaxIterationsReached { max_iter } => {
                write!(f, "No convergence within {} iterations", max_iter)
            }
        }
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub struct SolveError {
    pub output: CgOutput,
    pub kind: SolveErrorKind,
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CG failed after {} iterations (residual norm {:.3e}): {}",
            self.output.num_iterations, self.output.residual_norm, self.kind
        )
    }
}

impl Error for SolveError {}

#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct CgOutput {
    /// Number of updates made to the initial guess.
    pub num_iterations: usize,
    /// Norm of the iterated residual when the solver stopped.
    pub residual_norm: f64,
}

impl<'a, T, A, P, Criterion> ConjugateGradient<'a, T, A, P, Criterion>
where
    T: RealField + Copy,
    A: LinearOperator<T>,
    P: LinearOperator<T>,
    Criterion: CgStoppingCriterion<T>,
{
    /// Solves `A x = b`, starting from the current contents of `x`.
    ///
    /// A zero right-hand side yields `x = 0` without iterating.
    pub fn solve_with_guess<'b>(
        &mut self,
        b: impl Into<DVectorView<'b, T>>,
        x: impl Into<DVectorViewMut<'b, T>>,
    ) -> Result<CgOutput, SolveError> {
        let b = b.into();
        let mut x = x.into();
        assert_eq!(b.len(), x.len(), "Right-hand side and solution must have the same length");

        let workspace = self.workspace.get_mut();
        workspace.resize(x.len());
        let CgWorkspace {
            residual: r,
            preconditioned_residual: z,
            direction: p,
            operator_times_direction: ap,
        } = workspace;

        let rhs_norm = b.norm();
        let mut output = CgOutput {
            num_iterations: 0,
            residual_norm: 0.0,
        };
        let fail = |output: &CgOutput, kind| SolveError {
            output: output.clone(),
            kind,
        };

        if rhs_norm == T::zero() {
            x.fill(T::zero());
            return Ok(output);
        }

        // r = b - A x
        self.operator
            .apply((&mut *r).into(), (&x).into())
            .map_err(|err| fail(&output, SolveErrorKind::OperatorError(err)))?;
        r.zip_apply(&b, |r_i, b_i| *r_i = b_i - *r_i);
        self.preconditioner
            .apply((&mut *z).into(), (&*r).into())
            .map_err(|err| fail(&output, SolveErrorKind::PreconditionerError(err)))?;
        p.copy_from(&*z);
        let mut z_dot_r = z.dot(&*r);

        loop {
            let residual_norm = r.norm();
            output.residual_norm = to_f64(residual_norm);
            let state = CgIterationState {
                iteration: output.num_iterations,
                rhs_norm,
                residual_norm,
            };
            if self.stopping_criterion.has_converged(&state) {
                break;
            }
            if let Some(max_iter) = self.max_iter {
                if output.num_iterations >= max_iter {
                    return Err(fail(&output, SolveErrorKind::MaxIterationsReached { max_iter }));
                }
            }
            if z_dot_r <= T::zero() {
                return Err(fail(&output, SolveErrorKind::IndefinitePreconditioner));
            }

            self.operator
                .apply((&mut *ap).into(), (&*p).into())
                .map_err(|err| fail(&output, SolveErrorKind::OperatorError(err)))?;
            let p_dot_ap = p.dot(&*ap);
            if p_dot_ap <= T::zero() {
                return Err(fail(&output, SolveErrorKind::IndefiniteOperator));
            }

            let alpha = z_dot_r / p_dot_ap;
            x.axpy(alpha, &*p, T::one());
            r.axpy(-alpha, &*ap, T::one());
            output.num_iterations += 1;

            self.preconditioner
                .apply((&mut *z).into(), (&*r).into())
                .map_err(|err| fail(&output, SolveErrorKind::PreconditionerError(err)))?;
            let z_dot_r_next = z.dot(&*r);
            let beta = z_dot_r_next / z_dot_r;
            // p = z + beta p
            p.axpy(T::one(), &*z, beta);
            z_dot_r = z_dot_r_next;
        }

        debug!(
            "CG converged after {} iterations with residual norm {:.3e}",
            output.num_iterations, output.residual_norm
        );
        Ok(output)
    }
}

fn to_f64<T: RealField + Copy>(value: T) -> f64 {
    value.to_subset().unwrap_or(f64::NAN)
}
