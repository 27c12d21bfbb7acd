//! Sparse linear operators and iterative solvers.
//!
//! Matrices are represented with `nalgebra-sparse`. This crate adds what `ellipt2d` needs on top of
//! it: a [`LinearOperator`](operators::LinearOperator) abstraction, a rayon-parallel CSR operator, a Jacobi
//! preconditioner and a preconditioned conjugate gradient solver.

pub mod cg;
pub mod operators;

pub use nalgebra_sparse::{CooMatrix, CscMatrix, CsrMatrix};
