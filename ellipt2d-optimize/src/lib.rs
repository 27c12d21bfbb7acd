//! Newton's method for systems of equations `F(u) = 0` with pluggable Jacobian solves.

/// Vector function traits and numerical differentiation
pub mod calculus;
/// Newton's method with different line search strategies
pub mod newton;
