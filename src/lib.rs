//! Finite element discretization of scalar second-order elliptic problems in two dimensions.
//!
//! The typical pipeline is
//!
//! 1. create a [`Mesh`](mesh::Mesh), for example with the generators in [`mesh::procedural`],
//!    and refine it,
//! 2. build a [`FunctionSpace`](space::FunctionSpace) on it, classifying boundary markers as
//!    essential or natural,
//! 3. describe the problem as a [`WeakForm`](weak_form::WeakForm),
//! 4. assemble the [`LinearSystem`](assembly::LinearSystem) of the free degrees of freedom,
//! 5. solve it with one of the [`SolverBackend`](solver::SolverBackend)s and wrap the result in a
//!    [`Solution`](solution::Solution).
//!
//! Steps 4 and 5 are combined in [`LinearProblem`](problem::LinearProblem).
pub mod assembly;
pub mod connectivity;
pub mod element;
pub mod error;
pub mod mesh;
pub mod problem;
pub mod settings;
pub mod solution;
pub mod solver;
pub mod space;
pub mod weak_form;

#[cfg(feature = "proptest-support")]
pub mod proptest;

pub mod quadrature {
    pub use ellipt2d_quadrature::*;
}

pub mod sparse {
    pub use ellipt2d_sparse::*;
}

pub mod optimize {
    pub use ellipt2d_optimize::*;
}

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

pub use error::Error;
