//! Problem settings, typically read from JSON.
//!
//! Missing fields take their default values:
//!
//! ```
//! use ellipt2d::settings::ProblemSettings;
//! use ellipt2d::solver::SolverKind;
//!
//! let settings = ProblemSettings::from_json_str(r#"{ "matrix_solver": "parallel-cg" }"#).unwrap();
//! assert_eq!(settings.matrix_solver, SolverKind::ParallelCg);
//! assert_eq!(settings.initial_degree, 2);
//! ```
use crate::element::MAX_DEGREE;
use crate::error::SettingsError;
use crate::solver::{SolverBackend, SolverKind, SolverSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemSettings {
    /// Polynomial degree of the function space
    pub initial_degree: usize,
    /// Number of uniform refinements of the initial mesh
    pub initial_refinements: usize,
    pub matrix_solver: SolverKind,
    pub parallel_assembly: bool,
    pub solver: SolverSettings,
}

impl Default for ProblemSettings {
    fn default() -> Self {
        Self {
            initial_degree: 2,
            initial_refinements: 3,
            matrix_solver: SolverKind::Cholesky,
            parallel_assembly: true,
            solver: SolverSettings::default(),
        }
    }
}

impl ProblemSettings {
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.initial_degree < 1 || self.initial_degree > MAX_DEGREE {
            return Err(SettingsError::InvalidValue {
                field: "initial_degree",
                reason: format!("must be between 1 and {}", MAX_DEGREE),
            });
        }
        if !(self.solver.tolerance > 0.0) || !self.solver.tolerance.is_finite() {
            return Err(SettingsError::InvalidValue {
                field: "solver.tolerance",
                reason: "must be positive and finite".to_string(),
            });
        }
        if self.solver.max_iterations == 0 {
            return Err(SettingsError::InvalidValue {
                field: "solver.max_iterations",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn create_solver(&self) -> Box<dyn SolverBackend> {
        self.matrix_solver.create_solver(&self.solver)
    }
}
