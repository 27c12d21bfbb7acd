//! The complete pipeline from weak form to solution.
use crate::assembly::{Assembler, LinearSystem};
use crate::error::Error;
use crate::solution::Solution;
use crate::solver::SolverBackend;
use crate::space::FunctionSpace;
use crate::weak_form::WeakForm;
use log::info;

/// A linear problem given by a weak form on a function space.
///
/// ```
/// use ellipt2d::mesh::procedural::create_unit_square_uniform_tri_mesh_2d;
/// use ellipt2d::nalgebra::Point2;
/// use ellipt2d::problem::LinearProblem;
/// use ellipt2d::solver::{create_solver, SolverSettings};
/// use ellipt2d::space::{BoundaryClassifier, FunctionSpace};
/// use ellipt2d::weak_form::{EllipticCoefficients, WeakForm};
/// use std::sync::Arc;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mesh = Arc::new(create_unit_square_uniform_tri_mesh_2d(4)?);
/// let classifier = BoundaryClassifier::essential_markers([1, 2, 3, 4]);
/// let space = FunctionSpace::new(mesh, classifier, |_: i32, x: f64, y: f64| x + y, 1)?;
/// let weak_form = WeakForm::general_elliptic(EllipticCoefficients::laplace());
///
/// let mut solver = create_solver("cholesky", &SolverSettings::default())?;
/// let solution = LinearProblem::new(&space, &weak_form).solve(solver.as_mut())?;
/// let u = solution.value(&Point2::new(0.3, 0.6)).unwrap();
/// assert!((u - 0.9).abs() < 1e-10);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LinearProblem<'a> {
    space: &'a FunctionSpace,
    weak_form: &'a WeakForm,
    parallel: bool,
}

impl<'a> LinearProblem<'a> {
    pub fn new(space: &'a FunctionSpace, weak_form: &'a WeakForm) -> Self {
        Self {
            space,
            weak_form,
            parallel: false,
        }
    }

    /// Whether to assemble in parallel.
    pub fn parallel(self, parallel: bool) -> Self {
        Self { parallel, ..self }
    }

    pub fn assemble(&self) -> Result<LinearSystem, Error> {
        Assembler::new(self.space, self.weak_form)
            .with_parallel(self.parallel)
            .assemble()
    }

    /// Assembles the system, solves it with the given backend and wraps the result.
    pub fn solve(&self, solver: &mut dyn SolverBackend) -> Result<Solution<'a>, Error> {
        info!("ndof = {}", self.space.num_free_dofs());
        let system = self.assemble()?;
        info!("Solving with backend {}", solver.name());
        let free_coefficients = solver.solve(&system)?;
        info!("{}", solver.diagnostic());
        Ok(Solution::from_free_coefficients(self.space, &free_coefficients)?)
    }
}
