use crate::assembly::LinearSystem;
use crate::error::SolverError;
use crate::nalgebra::DVector;
use crate::solver::{check_finite, SolverBackend, SolverSettings, SolverStatus};
use ellipt2d_optimize::calculus::VectorFunctionBuilder;
use ellipt2d_optimize::newton::{newton_line_search, BacktrackingLineSearch, NewtonOutput, NewtonSettings};
use ellipt2d_sparse::cg::{CgWorkspace, ConjugateGradient, RelativeResidualCriterion};
use ellipt2d_sparse::operators::JacobiPreconditioner;
use log::info;
use std::error::Error;

const MAX_NEWTON_ITERATIONS: usize = 50;

/// Relative tolerance of the conjugate gradient solves for the Newton steps.
const JACOBIAN_TOLERANCE: f64 = 1e-6;

/// Newton iteration on the residual `r(u) = A u - b`.
///
/// The Jacobian `A` is inverted approximately by Jacobi-preconditioned conjugate gradient, so
/// each Newton step reduces the residual by roughly the inner tolerance. The iteration stops
/// once `|r(u)| <= tolerance * |b|`. Steps are damped by a backtracking line search.
#[derive(Debug, Clone)]
pub struct NewtonSolver {
    settings: SolverSettings,
    status: SolverStatus,
}

impl NewtonSolver {
    pub fn new(settings: SolverSettings) -> Self {
        Self {
            settings,
            status: SolverStatus::default(),
        }
    }

    fn run(&self, system: &LinearSystem, u: &mut DVector<f64>) -> Result<NewtonOutput, Box<dyn Error>> {
        let n = system.dimension();
        let matrix = system.matrix();
        let b = system.rhs();
        let preconditioner = JacobiPreconditioner::from_csr(matrix);
        let max_cg_iterations = self.settings.max_iterations;
        let mut cg_workspace = CgWorkspace::<f64>::default();

        let residual = VectorFunctionBuilder::with_dimension(n)
            .with_function(|mut r, u| {
                for (i, row) in matrix.row_iter().enumerate() {
                    let a_u: f64 = row
                        .col_indices()
                        .iter()
                        .zip(row.values())
                        .map(|(&j, a_ij)| a_ij * u[j])
                        .sum();
                    r[i] = a_u - b[i];
                }
            })
            .with_jacobian_solver(|mut sol, _u, rhs| {
                sol.fill(0.0);
                ConjugateGradient::with_workspace(&mut cg_workspace)
                    .with_operator(matrix)
                    .with_preconditioner(&preconditioner)
                    .with_stopping_criterion(RelativeResidualCriterion::new(JACOBIAN_TOLERANCE))
                    .with_max_iter(max_cg_iterations)
                    .solve_with_guess(rhs, sol)?;
                Ok(())
            });

        let settings = NewtonSettings {
            max_iterations: Some(MAX_NEWTON_ITERATIONS),
            tolerance: self.settings.tolerance * b.norm(),
        };
        let mut r = DVector::zeros(n);
        let mut du = DVector::zeros(n);
        let output = newton_line_search(
            residual,
            u,
            &mut r,
            &mut du,
            settings,
            &mut BacktrackingLineSearch::default(),
        )?;
        Ok(output)
    }
}

impl SolverBackend for NewtonSolver {
    fn name(&self) -> &str {
        "newton"
    }

    fn solve(&mut self, system: &LinearSystem) -> Result<DVector<f64>, SolverError> {
        let mut u = DVector::zeros(system.dimension());
        let output = match self.run(system, &mut u) {
            Ok(output) => output,
            Err(err) => return Err(self.status.fail("newton", err.to_string())),
        };
        if let Err(reason) = check_finite(&u) {
            return Err(self.status.fail("newton", reason));
        }

        self.status.succeed(format!(
            "converged in {} Newton iterations, residual norm {:.3e}",
            output.iterations,
            system.residual_norm(&u)
        ));
        info!("{}: {}", self.name(), self.status.diagnostic);
        Ok(u)
    }

    fn failed(&self) -> bool {
        self.status.failed
    }

    fn diagnostic(&self) -> &str {
        &self.status.diagnostic
    }
}
