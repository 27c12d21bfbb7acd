use crate::assembly::LinearSystem;
use crate::error::SolverError;
use crate::nalgebra::{DMatrix, DVector};
use crate::solver::{check_finite, SolverBackend, SolverSettings, SolverStatus};
use ellipt2d_sparse::CscMatrix;
use log::{info, warn};
use nalgebra_sparse::factorization::CscCholesky;

/// Systems larger than this are solved with dense LU only reluctantly.
const DENSE_SIZE_WARNING_THRESHOLD: usize = 5_000;

/// Pivots smaller than `n * eps` times the largest pivot indicate a numerically singular matrix.
fn has_negligible_pivot(pivots: impl Iterator<Item = f64>, n: usize) -> bool {
    let (min, max) = pivots.fold((f64::INFINITY, 0.0f64), |(min, max), p| (min.min(p), max.max(p)));
    n > 0 && min <= (n as f64) * f64::EPSILON * max
}

/// Dense LU factorization with partial pivoting.
#[derive(Debug, Clone, Default)]
pub struct DenseLuSolver {
    status: SolverStatus,
}

impl DenseLuSolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn solve_(&self, system: &LinearSystem) -> Result<DVector<f64>, String> {
        let n = system.dimension();
        if n > DENSE_SIZE_WARNING_THRESHOLD {
            warn!(
                "Dense LU on a system with {} unknowns, consider a sparse backend",
                n
            );
        }

        let lu = DMatrix::from(system.matrix()).lu();
        if has_negligible_pivot(lu.u().diagonal().iter().map(|u_ii| u_ii.abs()), n) {
            return Err("matrix is singular to working precision".to_string());
        }
        let x = lu
            .solve(system.rhs())
            .ok_or_else(|| "matrix is singular".to_string())?;
        check_finite(&x)?;
        Ok(x)
    }
}

impl SolverBackend for DenseLuSolver {
    fn name(&self) -> &str {
        "dense-lu"
    }

    fn solve(&mut self, system: &LinearSystem) -> Result<DVector<f64>, SolverError> {
        if system.dimension() == 0 {
            self.status.succeed("empty system".to_string());
            return Ok(DVector::zeros(0));
        }
        match self.solve_(system) {
            Ok(x) => {
                let residual = system.residual_norm(&x);
                self.status
                    .succeed(format!("LU solve, residual norm {:.3e}", residual));
                info!("{}: {}", self.name(), self.status.diagnostic);
                Ok(x)
            }
            Err(reason) => Err(self.status.fail("dense-lu", reason)),
        }
    }

    fn failed(&self) -> bool {
        self.status.failed
    }

    fn diagnostic(&self) -> &str {
        &self.status.diagnostic
    }
}

/// Sparse Cholesky factorization for symmetric positive definite systems.
///
/// Systems without a symmetry hint are checked for symmetry before factorization.
#[derive(Debug, Clone)]
pub struct CholeskySolver {
    settings: SolverSettings,
    status: SolverStatus,
}

impl CholeskySolver {
    pub fn new(settings: SolverSettings) -> Self {
        Self {
            settings,
            status: SolverStatus::default(),
        }
    }

    fn check_symmetry(&self, system: &LinearSystem) -> Result<(), String> {
        if system.is_symmetric() {
            return Ok(());
        }
        let matrix = system.matrix();
        let transpose = matrix.transpose();
        let difference = matrix - &transpose;
        let max_entry = matrix.values().iter().fold(0.0f64, |m, v| m.max(v.abs()));
        let max_asymmetry = difference
            .values()
            .iter()
            .fold(0.0f64, |m, v| m.max(v.abs()));
        if max_asymmetry > self.settings.tolerance.max(1e-12) * max_entry {
            Err(format!(
                "matrix is not symmetric (max asymmetry {:.3e})",
                max_asymmetry
            ))
        } else {
            Ok(())
        }
    }

    fn solve_(&self, system: &LinearSystem) -> Result<DVector<f64>, String> {
        self.check_symmetry(system)?;
        let n = system.dimension();
        let csc = CscMatrix::from(system.matrix());
        let cholesky = CscCholesky::factor(&csc).map_err(|err| format!("factorization failed: {:?}", err))?;

        let l = cholesky.l();
        let pivots = l
            .triplet_iter()
            .filter(|&(i, j, _)| i == j)
            .map(|(_, _, l_ii)| l_ii * l_ii);
        if has_negligible_pivot(pivots, n) {
            return Err("matrix is singular to working precision".to_string());
        }

        let rhs = DMatrix::from_column_slice(n, 1, system.rhs().as_slice());
        let solution = cholesky.solve(&rhs);
        let x = DVector::from_column_slice(solution.as_slice());
        check_finite(&x)?;
        Ok(x)
    }
}

impl SolverBackend for CholeskySolver {
    fn name(&self) -> &str {
        "cholesky"
    }

    fn solve(&mut self, system: &LinearSystem) -> Result<DVector<f64>, SolverError> {
        if system.dimension() == 0 {
            self.status.succeed("empty system".to_string());
            return Ok(DVector::zeros(0));
        }
        match self.solve_(system) {
            Ok(x) => {
                let residual = system.residual_norm(&x);
                self.status
                    .succeed(format!("Cholesky solve, residual norm {:.3e}", residual));
                info!("{}: {}", self.name(), self.status.diagnostic);
                Ok(x)
            }
            Err(reason) => Err(self.status.fail("cholesky", reason)),
        }
    }

    fn failed(&self) -> bool {
        self.status.failed
    }

    fn diagnostic(&self) -> &str {
        &self.status.diagnostic
    }
}
