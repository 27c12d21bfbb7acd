//! Quadrature rules for finite element reference domains.
//!
//! The main purpose of this crate is to support the `ellipt2d` library, but the rules can be used
//! independently of it.
//!
//! Reference domains follow a single convention:
//!
//! - the interval `[-1, 1]`,
//! - the square `[-1, 1]^2`,
//! - the triangle with corners `(-1, -1)`, `(1, -1)` and `(-1, 1)`.
//!
//! Rules are returned as `(weights, points)` pairs. The `*_for_order` functions select the
//! smallest rule of the given family that integrates polynomials up to the requested order
//! exactly. For the square, the order is understood per coordinate direction, for the triangle it
//! is the total polynomial degree.

use std::fmt;
use std::fmt::{Display, Formatter};

pub mod simplex;
pub mod tensor;
pub mod univariate;

/// The highest polynomial order for which rules are generated.
///
/// Orders above this almost always indicate a broken order estimate rather than a genuine need.
pub const MAX_ORDER: usize = 64;

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Indicates that a rule satisfying the given requirements is not available.
    NoRuleAvailable { order: usize },
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuleAvailable { order } => {
                write!(
                    f,
                    "There is no quadrature rule of order {} available (maximum is {})",
                    order, MAX_ORDER
                )
            }
        }
    }
}

impl std::error::Error for Error {}

/// A D-dimensional point.
pub type Point<const D: usize> = [f64; D];

/// A two-dimensional point.
pub type Point2 = Point<2>;

/// A D-dimensional rule.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);

/// A one-dimensional quadrature rule.
pub type Rule1d = Rule<1>;

/// A two-dimensional quadrature rule.
pub type Rule2d = Rule<2>;

/// Approximates the integral of `f` with the given rule.
pub fn integrate<const D: usize>(rule: &Rule<D>, f: impl Fn(&Point<D>) -> f64) -> f64 {
    let (weights, points) = rule;
    weights.iter().zip(points).map(|(w, x)| w * f(x)).sum()
}

/// Number of Gauss points needed to integrate a univariate polynomial of the given order exactly.
pub fn gauss_points_for_order(order: usize) -> usize {
    // n points integrate polynomials of order 2n - 1 exactly
    (order + 2) / 2
}

fn check_order(order: usize) -> Result<(), Error> {
    if order > MAX_ORDER {
        Err(Error::NoRuleAvailable { order })
    } else {
        Ok(())
    }
}

/// Gauss rule on `[-1, 1]` exact for polynomials up to the given order.
pub fn interval_for_order(order: usize) -> Result<Rule1d, Error> {
    check_order(order)?;
    Ok(univariate::gauss(gauss_points_for_order(order)))
}

/// Tensor Gauss rule on `[-1, 1]^2` exact for polynomials of the given order in each direction.
pub fn quadrilateral_for_order(order: usize) -> Result<Rule2d, Error> {
    check_order(order)?;
    Ok(tensor::quadrilateral_gauss(gauss_points_for_order(order)))
}

/// Collapsed Gauss rule on the reference triangle exact for polynomials of the given total order.
pub fn triangle_for_order(order: usize) -> Result<Rule2d, Error> {
    check_order(order)?;
    Ok(simplex::triangle_collapsed_gauss(order))
}
