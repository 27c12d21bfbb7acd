use crate::assembly::LinearSystem;
use crate::error::SolverError;
use crate::nalgebra::DVector;
use crate::solver::{check_finite, SolverBackend, SolverSettings, SolverStatus};
use ellipt2d_sparse::cg::{CgOutput, CgWorkspace, ConjugateGradient, RelativeResidualCriterion, SolveError};
use ellipt2d_sparse::operators::{JacobiPreconditioner, ParallelCsrOperator};
use log::info;

/// Jacobi-preconditioned conjugate gradient, for symmetric positive definite systems.
///
/// The solve starts from a zero initial guess and stops once the residual norm drops below
/// `tolerance * |b|`.
#[derive(Debug)]
pub struct CgSolver {
    settings: SolverSettings,
    parallel: bool,
    workspace: CgWorkspace<f64>,
    status: SolverStatus,
}

impl CgSolver {
    pub fn new(settings: SolverSettings) -> Self {
        Self {
            settings,
            parallel: false,
            workspace: CgWorkspace::default(),
            status: SolverStatus::default(),
        }
    }

    /// Whether matrix-vector products are computed in parallel over rows.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn run(&mut self, system: &LinearSystem, x: &mut DVector<f64>) -> Result<CgOutput, SolveError> {
        let matrix = system.matrix();
        let preconditioner = JacobiPreconditioner::from_csr(matrix);
        let criterion = RelativeResidualCriterion::new(self.settings.tolerance);
        let cg = ConjugateGradient::with_workspace(&mut self.workspace);
        if self.parallel {
            cg.with_operator(ParallelCsrOperator::new(matrix))
                .with_preconditioner(&preconditioner)
                .with_stopping_criterion(criterion)
                .with_max_iter(self.settings.max_iterations)
                .solve_with_guess(system.rhs(), x)
        } else {
            cg.with_operator(matrix)
                .with_preconditioner(&preconditioner)
                .with_stopping_criterion(criterion)
                .with_max_iter(self.settings.max_iterations)
                .solve_with_guess(system.rhs(), x)
        }
    }
}

impl SolverBackend for CgSolver {
    fn name(&self) -> &str {
        if self.parallel {
            "parallel-cg"
        } else {
            "cg"
        }
    }

    fn solve(&mut self, system: &LinearSystem) -> Result<DVector<f64>, SolverError> {
        let name = self.name().to_string();
        let mut x = DVector::zeros(system.dimension());
        let output = match self.run(system, &mut x) {
            Ok(output) => output,
            Err(err) => return Err(self.status.fail(&name, err.to_string())),
        };
        if let Err(reason) = check_finite(&x) {
            return Err(self.status.fail(&name, reason));
        }

        self.status.succeed(format!(
            "converged in {} iterations, residual norm {:.3e}",
            output.num_iterations,
            system.residual_norm(&x)
        ));
        info!("{}: {}", name, self.status.diagnostic);
        Ok(x)
    }

    fn failed(&self) -> bool {
        self.status.failed
    }

    fn diagnostic(&self) -> &str {
        &self.status.diagnostic
    }
}
