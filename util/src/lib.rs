//! Test helpers shared by the crates in the workspace.
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Poor man's approx assertion for matrices
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let diff = $x - $y;

        let max_absdiff = diff.abs().max();
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {}", $x);
            println!("right: {}", $y);
            println!("diff: {:e}", diff);
        }
        assert!(approx_eq);
    }};
}

#[macro_export]
macro_rules! assert_panics {
    ($e:expr) => {{
        use std::panic::catch_unwind;
        use std::stringify;
        let expr_string = stringify!($e);
        let result = catch_unwind(|| $e);
        if result.is_ok() {
            panic!("assert_panics!({}) failed.", expr_string);
        }
    }};
}

/// Largest entry of `|A - A^T|`.
pub fn max_asymmetry(matrix: &CsrMatrix<f64>) -> f64 {
    let dense = DMatrix::from(matrix);
    (&dense - dense.transpose()).abs().max()
}

/// The standard second-difference matrix `tridiag(-1, 2, -1)` of size `n`.
///
/// Symmetric positive definite for every `n >= 1`.
pub fn second_difference_matrix(n: usize) -> CsrMatrix<f64> {
    let mut coo = CooMatrix::new(n, n);
    for i in 0..n {
        coo.push(i, i, 2.0);
        if i > 0 {
            coo.push(i, i - 1, -1.0);
        }
        if i + 1 < n {
            coo.push(i, i + 1, -1.0);
        }
    }
    CsrMatrix::from(&coo)
}

/// A symmetric positive definite matrix with a strongly varying diagonal.
///
/// Useful for checking that diagonal preconditioning actually changes something.
pub fn badly_scaled_spd_matrix(n: usize) -> CsrMatrix<f64> {
    let mut coo = CooMatrix::new(n, n);
    for i in 0..n {
        let scale = 10f64.powi((i % 5) as i32);
        coo.push(i, i, 4.0 * scale);
        if i + 1 < n {
            let next_scale = 10f64.powi(((i + 1) % 5) as i32);
            let off_diagonal = -(scale * next_scale).sqrt();
            coo.push(i, i + 1, off_diagonal);
            coo.push(i + 1, i, off_diagonal);
        }
    }
    CsrMatrix::from(&coo)
}

/// Residual norm `||A x - b||`.
pub fn residual_norm(matrix: &CsrMatrix<f64>, x: &DVector<f64>, b: &DVector<f64>) -> f64 {
    (matrix * x - b).norm()
}
