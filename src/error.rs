//! Error types for each stage of the solution pipeline.
//!
//! Every stage reports its own error type. [`Error`] wraps all of them so that `?` can be used
//! across stages, for example in [`LinearProblem::solve`](crate::problem::LinearProblem::solve).
use crate::mesh::Marker;
use std::fmt;
use std::fmt::{Display, Formatter};

pub use ellipt2d_quadrature::Error as QuadratureError;

/// Malformed or degenerate mesh data.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum GeometryError {
    /// An element references a vertex that does not exist.
    InvalidVertexIndex { element: usize, vertex: usize },
    /// A boundary marker was given for an edge that is not on the boundary of the mesh.
    NotABoundaryEdge { edge: [usize; 2] },
    /// A boundary edge has no marker.
    UnmarkedBoundaryEdge { edge: [usize; 2] },
    /// An edge is shared by more than two elements.
    NonManifoldEdge { edge: [usize; 2] },
    /// An element has (nearly) zero or negative area, or is not convex.
    DegenerateElement { element: usize, reason: &'static str },
}

impl Display for GeometryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidVertexIndex { element, vertex } => {
                write!(f, "Element {} references non-existent vertex {}", element, vertex)
            }
            Self::NotABoundaryEdge { edge: [a, b] } => {
                write!(f, "Edge ({}, {}) has a boundary marker but is not a boundary edge", a, b)
            }
            Self::UnmarkedBoundaryEdge { edge: [a, b] } => {
                write!(f, "Boundary edge ({}, {}) has no boundary marker", a, b)
            }
            Self::NonManifoldEdge { edge: [a, b] } => {
                write!(f, "Edge ({}, {}) is shared by more than two elements", a, b)
            }
            Self::DegenerateElement { element, reason } => {
                write!(f, "Element {} is degenerate: {}", element, reason)
            }
        }
    }
}

impl std::error::Error for GeometryError {}

/// Invalid function space configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SpaceError {
    /// The polynomial degree is outside the supported range.
    InvalidDegree { degree: usize },
    /// A boundary marker of the mesh is unknown to the classifier, and no default is configured.
    InconsistentMarker { marker: Marker },
    /// The geometry of an element could not be constructed from the mesh.
    InvalidElement { element: usize },
}

impl Display for SpaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDegree { degree } => write!(
                f,
                "Polynomial degree {} is not supported (must be between 1 and {})",
                degree,
                crate::element::MAX_DEGREE
            ),
            Self::InconsistentMarker { marker } => write!(
                f,
                "Boundary marker {} is not classified and the classifier has no default",
                marker
            ),
            Self::InvalidElement { element } => {
                write!(f, "Element {} references vertices missing from the mesh", element)
            }
        }
    }
}

impl std::error::Error for SpaceError {}

/// Failure to construct or run a solver backend.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SolverError {
    UnknownBackend { selector: String },
    SolverFailure { backend: String, reason: String },
}

impl Display for SolverError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownBackend { selector } => {
                write!(f, "Unknown solver backend \"{}\"", selector)
            }
            Self::SolverFailure { backend, reason } => {
                write!(f, "Solver backend {} failed: {}", backend, reason)
            }
        }
    }
}

impl std::error::Error for SolverError {}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SolutionError {
    CoefficientLengthMismatch { expected: usize, actual: usize },
}

impl Display for SolutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::CoefficientLengthMismatch { expected, actual } => write!(
                f,
                "Expected {} coefficients, but got {}",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for SolutionError {}

#[derive(Debug)]
#[non_exhaustive]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    InvalidValue { field: &'static str, reason: String },
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "Failed to read settings: {}", err),
            Self::Parse(err) => write!(f, "Failed to parse settings: {}", err),
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid value for setting \"{}\": {}", field, reason)
            }
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}

/// Library-wide error type, tagged with the stage that failed.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    Geometry(GeometryError),
    Space(SpaceError),
    Quadrature(QuadratureError),
    Solver(SolverError),
    Solution(SolutionError),
    Settings(SettingsError),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Geometry(err) => write!(f, "Mesh error: {}", err),
            Self::Space(err) => write!(f, "Function space error: {}", err),
            Self::Quadrature(err) => write!(f, "Assembly error: {}", err),
            Self::Solver(err) => write!(f, "Solver error: {}", err),
            Self::Solution(err) => write!(f, "Solution error: {}", err),
            Self::Settings(err) => write!(f, "Settings error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Geometry(err) => Some(err),
            Self::Space(err) => Some(err),
            Self::Quadrature(err) => Some(err),
            Self::Solver(err) => Some(err),
            Self::Solution(err) => Some(err),
            Self::Settings(err) => Some(err),
        }
    }
}

macro_rules! impl_from_stage_error {
    ($variant:ident, $error:ty) => {
        impl From<$error> for Error {
            fn from(err: $error) -> Self {
                Self::$variant(err)
            }
        }
    };
}

impl_from_stage_error!(Geometry, GeometryError);
impl_from_stage_error!(Space, SpaceError);
impl_from_stage_error!(Quadrature, QuadratureError);
impl_from_stage_error!(Solver, SolverError);
impl_from_stage_error!(Solution, SolutionError);
impl_from_stage_error!(Settings, SettingsError);
