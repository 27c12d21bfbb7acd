//! Interchangeable backends for solving assembled linear systems.
//!
//! Backends are selected at runtime by a [`SolverKind`], usually parsed from a string selector:
//!
//! ```
//! use ellipt2d::solver::{create_solver, SolverSettings};
//!
//! let solver = create_solver("cg", &SolverSettings::default()).unwrap();
//! assert_eq!(solver.name(), "cg");
//! assert!(create_solver("superlu", &SolverSettings::default()).is_err());
//! ```
use crate::assembly::LinearSystem;
use crate::error::SolverError;
use crate::nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

mod direct;
mod iterative;
mod newton;

pub use direct::*;
pub use iterative::*;
pub use newton::*;

/// A solver for linear systems over the free degrees of freedom.
///
/// A failed solve is reported as an error and never retried. The outcome of the most recent
/// call to [`solve`](Self::solve) can be queried afterwards with [`failed`](Self::failed) and
/// [`diagnostic`](Self::diagnostic).
pub trait SolverBackend: Send {
    fn name(&self) -> &str;

    fn solve(&mut self, system: &LinearSystem) -> Result<DVector<f64>, SolverError>;

    /// Whether the most recent solve failed.
    fn failed(&self) -> bool;

    /// A human-readable description of the outcome of the most recent solve.
    fn diagnostic(&self) -> &str;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverKind {
    /// Dense LU factorization, for reference and small systems.
    DenseLu,
    /// Sparse Cholesky factorization, for symmetric positive definite systems.
    Cholesky,
    /// Jacobi-preconditioned conjugate gradient.
    Cg,
    /// Jacobi-preconditioned conjugate gradient with parallel matrix-vector products.
    ParallelCg,
    /// Newton iteration on the residual `A u - b`, with conjugate gradient for the Jacobian.
    Newton,
}

impl SolverKind {
    pub const ALL: [SolverKind; 5] = [
        Self::DenseLu,
        Self::Cholesky,
        Self::Cg,
        Self::ParallelCg,
        Self::Newton,
    ];

    pub fn selector(&self) -> &'static str {
        match self {
            Self::DenseLu => "dense-lu",
            Self::Cholesky => "cholesky",
            Self::Cg => "cg",
            Self::ParallelCg => "parallel-cg",
            Self::Newton => "newton",
        }
    }

    pub fn create_solver(&self, settings: &SolverSettings) -> Box<dyn SolverBackend> {
        match self {
            Self::DenseLu => Box::new(DenseLuSolver::new()),
            Self::Cholesky => Box::new(CholeskySolver::new(settings.clone())),
            Self::Cg => Box::new(CgSolver::new(settings.clone())),
            Self::ParallelCg => Box::new(CgSolver::new(settings.clone()).with_parallel(true)),
            Self::Newton => Box::new(NewtonSolver::new(settings.clone())),
        }
    }
}

impl Display for SolverKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.selector())
    }
}

impl FromStr for SolverKind {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.selector() == s)
            .ok_or_else(|| SolverError::UnknownBackend { selector: s.to_string() })
    }
}

/// Settings shared by all backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Relative tolerance. Iterative backends stop once the residual norm falls below
    /// `tolerance * |b|`.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-12,
            max_iterations: 10_000,
        }
    }
}

/// Creates the backend named by `selector`.
pub fn create_solver(selector: &str, settings: &SolverSettings) -> Result<Box<dyn SolverBackend>, SolverError> {
    let kind = SolverKind::from_str(selector)?;
    Ok(kind.create_solver(settings))
}

/// Outcome of the most recent solve, shared by the backend implementations.
#[derive(Debug, Clone, Default)]
struct SolverStatus {
    failed: bool,
    diagnostic: String,
}

impl SolverStatus {
    fn succeed(&mut self, diagnostic: String) {
        self.failed = false;
        self.diagnostic = diagnostic;
    }

    fn fail(&mut self, backend: &str, reason: impl Into<String>) -> SolverError {
        let reason = reason.into();
        self.failed = true;
        self.diagnostic = reason.clone();
        SolverError::SolverFailure {
            backend: backend.to_string(),
            reason,
        }
    }
}

/// Checks that all entries of the solution are finite.
fn check_finite(x: &DVector<f64>) -> Result<(), String> {
    if x.iter().all(|x_i| x_i.is_finite()) {
        Ok(())
    } else {
        Err("solution contains non-finite values".to_string())
    }
}
