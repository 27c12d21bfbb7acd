use crate::calculus::{DifferentiableVectorFunction, VectorFunction};
use itertools::iterate;
use log::debug;
use nalgebra::{DVectorView, DVectorViewMut};
use std::error::Error;
use std::fmt;
use std::fmt::Display;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NewtonSettings {
    /// Unbounded if `None`.
    pub max_iterations: Option<usize>,
    /// Absolute tolerance for `|F(x)|`.
    pub tolerance: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NewtonOutput {
    pub iterations: usize,
    pub residual_norm: f64,
}

#[derive(Debug)]
#[non_exhaustive]
pub enum NewtonError {
    MaxIterationsReached { max_iterations: usize, residual_norm: f64 },
    JacobianSolveFailed(Box<dyn Error>),
    LineSearchFailed(Box<dyn Error>),
}

impl Display for NewtonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxIterationsReached {
                max_iterations,
                residual_norm,
            } => write!(
                f,
                "No convergence within {} Newton iterations (residual norm {:.3e})",
                max_iterations, residual_norm
            ),
            Self::JacobianSolveFailed(err) => write!(f, "Jacobian solve failed: {}", err),
            Self::LineSearchFailed(err) => write!(f, "Line search failed: {}", err),
        }
    }
}

impl Error for NewtonError {}

/// Solves `F(x) = 0` with full Newton steps, starting from the current contents of `x`.
///
/// The buffers `f` and `dx` must have the same length as `x`. On success, `f` holds `F(x)`.
pub fn newton<'a, F>(
    function: F,
    x: impl Into<DVectorViewMut<'a, f64>>,
    f: impl Into<DVectorViewMut<'a, f64>>,
    dx: impl Into<DVectorViewMut<'a, f64>>,
    settings: NewtonSettings,
) -> Result<NewtonOutput, NewtonError>
where
    F: DifferentiableVectorFunction,
{
    newton_line_search(function, x, f, dx, settings, &mut FullStep)
}

/// Same as [`newton`], with step lengths chosen by the given line search.
pub fn newton_line_search<'a, F>(
    mut function: F,
    x: impl Into<DVectorViewMut<'a, f64>>,
    f: impl Into<DVectorViewMut<'a, f64>>,
    dx: impl Into<DVectorViewMut<'a, f64>>,
    settings: NewtonSettings,
    line_search: &mut impl LineSearch<F>,
) -> Result<NewtonOutput, NewtonError>
where
    F: DifferentiableVectorFunction,
{
    let (mut x, mut f, mut dx) = (x.into(), f.into(), dx.into());
    assert_eq!(x.len(), f.len(), "Function values must have the dimension of the input");
    assert_eq!(x.len(), dx.len(), "Step must have the dimension of the input");

    function.eval_into(DVectorViewMut::from(&mut f), DVectorView::from(&x));
    let mut iterations = 0;
    loop {
        let residual_norm = f.norm();
        if residual_norm <= settings.tolerance {
            return Ok(NewtonOutput {
                iterations,
                residual_norm,
            });
        }
        if let Some(max_iterations) = settings.max_iterations {
            if iterations >= max_iterations {
                return Err(NewtonError::MaxIterationsReached {
                    max_iterations,
                    residual_norm,
                });
            }
        }

        // J dx = -F(x)
        function
            .solve_jacobian_system(
                DVectorViewMut::from(&mut dx),
                DVectorView::from(&x),
                DVectorView::from(&f),
            )
            .map_err(NewtonError::JacobianSolveFailed)?;
        dx.neg_mut();

        let step_length = line_search
            .step(
                &mut function,
                DVectorViewMut::from(&mut f),
                DVectorViewMut::from(&mut x),
                DVectorView::from(&dx),
            )
            .map_err(NewtonError::LineSearchFailed)?;
        iterations += 1;
        debug!(
            "Newton iteration {}: step length {}, residual norm {:.3e}",
            iterations,
            step_length,
            f.norm()
        );
    }
}

/// Chooses how far to move along a Newton direction.
pub trait LineSearch<F: VectorFunction> {
    /// Updates `x` to `x + alpha * direction` and `f` to `F(x)`, returning `alpha`.
    fn step(
        &mut self,
        function: &mut F,
        f: DVectorViewMut<f64>,
        x: DVectorViewMut<f64>,
        direction: DVectorView<f64>,
    ) -> Result<f64, Box<dyn Error>>;
}

/// Always takes the full step.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullStep;

impl<F: VectorFunction> LineSearch<F> for FullStep {
    fn step(
        &mut self,
        function: &mut F,
        f: DVectorViewMut<f64>,
        mut x: DVectorViewMut<f64>,
        direction: DVectorView<f64>,
    ) -> Result<f64, Box<dyn Error>> {
        x += direction;
        function.eval_into(f, DVectorView::from(&x));
        Ok(1.0)
    }
}

/// Backtracking on the merit function `g(x) = |F(x)|^2 / 2` with the Armijo condition
/// `g(x + alpha p) <= (1 - c alpha) g(x)`, which holds for small `alpha` when `p` is a Newton
/// direction.
///
/// Step lengths start at one and are multiplied by `contraction` until the condition holds or
/// they fall below `min_step_length`.
#[derive(Debug, Clone)]
pub struct BacktrackingLineSearch {
    pub sufficient_decrease: f64,
    pub contraction: f64,
    pub min_step_length: f64,
}

impl Default for BacktrackingLineSearch {
    fn default() -> Self {
        Self {
            sufficient_decrease: 1e-4,
            contraction: 0.5,
            min_step_length: 1e-6,
        }
    }
}

impl<F: VectorFunction> LineSearch<F> for BacktrackingLineSearch {
    fn step(
        &mut self,
        function: &mut F,
        mut f: DVectorViewMut<f64>,
        mut x: DVectorViewMut<f64>,
        direction: DVectorView<f64>,
    ) -> Result<f64, Box<dyn Error>> {
        let g_initial = 0.5 * f.norm_squared();
        let contraction = self.contraction;
        let mut previous_alpha = 0.0;
        for alpha in iterate(1.0, |alpha| alpha * contraction).take_while(|&alpha| alpha >= self.min_step_length) {
            // Move from x + previous_alpha p to x + alpha p
            x.axpy(alpha - previous_alpha, &direction, 1.0);
            function.eval_into(DVectorViewMut::from(&mut f), DVectorView::from(&x));
            if 0.5 * f.norm_squared() <= (1.0 - self.sufficient_decrease * alpha) * g_initial {
                return Ok(alpha);
            }
            previous_alpha = alpha;
        }
        Err(Box::from(format!(
            "no sufficient decrease for step lengths down to {:e}",
            self.min_step_length
        )))
    }
}
