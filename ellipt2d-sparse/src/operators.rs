//! Linear operators acting on dynamic vectors.
use nalgebra::{DMatrix, DVector, DVectorView, DVectorViewMut, RealField, Scalar};
use nalgebra_sparse::CsrMatrix;
use rayon::prelude::*;
use std::error::Error;
use std::fmt;

/// An operator computing `y = A x`.
pub trait LinearOperator<T: Scalar> {
    fn apply(&self, y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error>>;
}

impl<'a, T, A> LinearOperator<T> for &'a A
where
    T: Scalar,
    A: ?Sized + LinearOperator<T>,
{
    fn apply(&self, y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error>> {
        (**self).apply(y, x)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionMismatch {
    pub operator_shape: (usize, usize),
    pub input_len: usize,
    pub output_len: usize,
}

impl fmt::Display for DimensionMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (rows, cols) = self.operator_shape;
        write!(
            f,
            "{}x{} operator applied to input of length {} with output of length {}",
            rows, cols, self.input_len, self.output_len
        )
    }
}

impl Error for DimensionMismatch {}

fn check_shape(operator_shape: (usize, usize), output_len: usize, input_len: usize) -> Result<(), DimensionMismatch> {
    if operator_shape == (output_len, input_len) {
        Ok(())
    } else {
        Err(DimensionMismatch {
            operator_shape,
            input_len,
            output_len,
        })
    }
}

/// `y = I x`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityOperator;

impl<T: Scalar> LinearOperator<T> for IdentityOperator {
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error>> {
        check_shape((x.len(), x.len()), y.len(), x.len())?;
        y.copy_from(&x);
        Ok(())
    }
}

impl<T: RealField + Copy> LinearOperator<T> for DMatrix<T> {
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error>> {
        check_shape(self.shape(), y.len(), x.len())?;
        y.gemv(T::one(), self, &x, T::zero());
        Ok(())
    }
}

fn csr_row_dot<T: RealField + Copy>(matrix: &CsrMatrix<T>, i: usize, x: &[T]) -> T {
    let row = matrix.row(i);
    row.col_indices()
        .iter()
        .zip(row.values())
        .fold(T::zero(), |acc, (&j, &a_ij)| acc + a_ij * x[j])
}

/// Views may be strided, so products work on a contiguous copy of the input.
fn contiguous<T: Scalar + Copy>(x: &DVectorView<T>) -> Vec<T> {
    x.iter().copied().collect()
}

impl<T: RealField + Copy> LinearOperator<T> for CsrMatrix<T> {
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error>> {
        check_shape((self.nrows(), self.ncols()), y.len(), x.len())?;
        let x = contiguous(&x);
        for (i, y_i) in y.iter_mut().enumerate() {
            *y_i = csr_row_dot(self, i, &x);
        }
        Ok(())
    }
}

/// A CSR matrix whose product with a vector is computed in parallel over rows.
#[derive(Debug, Clone, Copy)]
pub struct ParallelCsrOperator<'a, T> {
    matrix: &'a CsrMatrix<T>,
}

impl<'a, T> ParallelCsrOperator<'a, T> {
    pub fn new(matrix: &'a CsrMatrix<T>) -> Self {
        Self { matrix }
    }

    pub fn matrix(&self) -> &'a CsrMatrix<T> {
        self.matrix
    }
}

impl<'a, T> LinearOperator<T> for ParallelCsrOperator<'a, T>
where
    T: RealField + Copy + Send + Sync,
{
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error>> {
        let a = self.matrix;
        check_shape((a.nrows(), a.ncols()), y.len(), x.len())?;
        let x = contiguous(&x);
        let products: Vec<T> = (0..a.nrows())
            .into_par_iter()
            .map(|i| csr_row_dot(a, i, &x))
            .collect();
        for (y_i, product) in y.iter_mut().zip(products) {
            *y_i = product;
        }
        Ok(())
    }
}

/// Diagonal (Jacobi) preconditioner `P = diag(A)^-1`.
///
/// Rows with a zero diagonal entry are left unscaled.
#[derive(Debug, Clone)]
pub struct JacobiPreconditioner<T: Scalar> {
    inverse_diagonal: DVector<T>,
}

impl<T: RealField + Copy> JacobiPreconditioner<T> {
    pub fn from_csr(matrix: &CsrMatrix<T>) -> Self {
        let mut inverse_diagonal = DVector::repeat(matrix.nrows(), T::one());
        for (i, row) in matrix.row_iter().enumerate() {
            let diagonal = row
                .col_indices()
                .iter()
                .zip(row.values())
                .filter(|&(&j, _)| j == i)
                .fold(T::zero(), |acc, (_, &a_ii)| acc + a_ii);
            if diagonal != T::zero() {
                inverse_diagonal[i] = T::one() / diagonal;
            }
        }
        Self { inverse_diagonal }
    }

    pub fn inverse_diagonal(&self) -> &DVector<T> {
        &self.inverse_diagonal
    }
}

impl<T: RealField + Copy> LinearOperator<T> for JacobiPreconditioner<T> {
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error>> {
        let n = self.inverse_diagonal.len();
        check_shape((n, n), y.len(), x.len())?;
        y.zip_zip_apply(&x, &self.inverse_diagonal, |y_i, x_i, d_i| *y_i = d_i * x_i);
        Ok(())
    }
}
