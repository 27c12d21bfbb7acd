use nalgebra::{DVectorView, DVectorViewMut};
use std::error::Error;

/// A function `F: R^n -> R^n`.
pub trait VectorFunction {
    fn dimension(&self) -> usize;

    /// Evaluates `f = F(x)`.
    fn eval_into(&mut self, f: DVectorViewMut<f64>, x: DVectorView<f64>);
}

impl<X: ?Sized + VectorFunction> VectorFunction for &mut X {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn eval_into(&mut self, f: DVectorViewMut<f64>, x: DVectorView<f64>) {
        (**self).eval_into(f, x)
    }
}

/// A vector function whose Jacobian systems `J(x) sol = rhs` can be solved, possibly only
/// approximately.
pub trait DifferentiableVectorFunction: VectorFunction {
    fn solve_jacobian_system(
        &mut self,
        sol: DVectorViewMut<f64>,
        x: DVectorView<f64>,
        rhs: DVectorView<f64>,
    ) -> Result<(), Box<dyn Error>>;
}

impl<X: ?Sized + DifferentiableVectorFunction> DifferentiableVectorFunction for &mut X {
    fn solve_jacobian_system(
        &mut self,
        sol: DVectorViewMut<f64>,
        x: DVectorView<f64>,
        rhs: DVectorView<f64>,
    ) -> Result<(), Box<dyn Error>> {
        (**self).solve_jacobian_system(sol, x, rhs)
    }
}

/// Builds a [`DifferentiableVectorFunction`] from a function closure and a Jacobian solver
/// closure.
///
/// ```
/// use ellipt2d_optimize::calculus::{DifferentiableVectorFunction, VectorFunction, VectorFunctionBuilder};
/// use nalgebra::DVector;
///
/// let mut function = VectorFunctionBuilder::with_dimension(1)
///     .with_function(|mut f, x| f[0] = x[0] * x[0] - 2.0)
///     .with_jacobian_solver(|mut sol, x, rhs| {
///         sol[0] = rhs[0] / (2.0 * x[0]);
///         Ok(())
///     });
///
/// let x = DVector::from_element(1, 3.0);
/// let mut f = DVector::zeros(1);
/// function.eval_into((&mut f).into(), (&x).into());
/// assert_eq!(f[0], 7.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct VectorFunctionBuilder {
    dimension: usize,
}

/// A vector function defined by closures, see [`VectorFunctionBuilder`].
#[derive(Debug, Clone)]
pub struct ClosureVectorFunction<F, J> {
    dimension: usize,
    function: F,
    jacobian_solver: J,
}

impl VectorFunctionBuilder {
    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn with_function<F>(self, function: F) -> ClosureVectorFunction<F, ()>
    where
        F: FnMut(DVectorViewMut<f64>, DVectorView<f64>),
    {
        ClosureVectorFunction {
            dimension: self.dimension,
            function,
            jacobian_solver: (),
        }
    }
}

impl<F> ClosureVectorFunction<F, ()> {
    pub fn with_jacobian_solver<J>(self, jacobian_solver: J) -> ClosureVectorFunction<F, J>
    where
        J: FnMut(DVectorViewMut<f64>, DVectorView<f64>, DVectorView<f64>) -> Result<(), Box<dyn Error>>,
    {
        ClosureVectorFunction {
            dimension: self.dimension,
            function: self.function,
            jacobian_solver,
        }
    }
}

impl<F, J> VectorFunction for ClosureVectorFunction<F, J>
where
    F: FnMut(DVectorViewMut<f64>, DVectorView<f64>),
{
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn eval_into(&mut self, f: DVectorViewMut<f64>, x: DVectorView<f64>) {
        (self.function)(f, x)
    }
}

impl<F, J> DifferentiableVectorFunction for ClosureVectorFunction<F, J>
where
    F: FnMut(DVectorViewMut<f64>, DVectorView<f64>),
    J: FnMut(DVectorViewMut<f64>, DVectorView<f64>, DVectorView<f64>) -> Result<(), Box<dyn Error>>,
{
    fn solve_jacobian_system(
        &mut self,
        sol: DVectorViewMut<f64>,
        x: DVectorView<f64>,
        rhs: DVectorView<f64>,
    ) -> Result<(), Box<dyn Error>> {
        (self.jacobian_solver)(sol, x, rhs)
    }
}
