use ellipt2d_sparse::operators::{IdentityOperator, JacobiPreconditioner, LinearOperator, ParallelCsrOperator};
use ellipt2d_sparse::{CooMatrix, CsrMatrix};
use matrixcompare::assert_matrix_eq;
use nalgebra::{DMatrix, DVector};
use proptest::prelude::*;
use util::second_difference_matrix;

#[test]
fn serial_csr_operator_matches_dense_product() {
    let a = second_difference_matrix(6);
    let x = DVector::from_fn(6, |i, _| i as f64 - 2.5);
    let mut y = DVector::zeros(6);
    a.apply((&mut y).into(), (&x).into()).unwrap();
    let expected = DMatrix::from(&a) * &x;
    assert_matrix_eq!(y, expected, comp = abs, tol = 1e-14);
}

#[test]
fn identity_operator_copies_input() {
    let x = DVector::from_column_slice(&[1.0, -2.0, 3.5]);
    let mut y = DVector::zeros(3);
    IdentityOperator.apply((&mut y).into(), (&x).into()).unwrap();
    assert_eq!(y, x);

    let mut too_short = DVector::zeros(2);
    assert!(IdentityOperator.apply((&mut too_short).into(), (&x).into()).is_err());
}

#[test]
fn jacobi_preconditioner_inverts_diagonal() {
    let mut coo = CooMatrix::new(3, 3);
    coo.push(0, 0, 2.0);
    coo.push(0, 2, 1.0);
    coo.push(1, 1, -4.0);
    coo.push(2, 0, 1.0);
    let a = CsrMatrix::from(&coo);

    let preconditioner = JacobiPreconditioner::from_csr(&a);
    // Row 2 has no diagonal entry and is left unscaled
    let expected = DVector::from_column_slice(&[0.5, -0.25, 1.0]);
    assert_eq!(preconditioner.inverse_diagonal(), &expected);

    let x = DVector::from_column_slice(&[2.0, 2.0, 2.0]);
    let mut y = DVector::zeros(3);
    preconditioner.apply((&mut y).into(), (&x).into()).unwrap();
    assert_eq!(y, DVector::from_column_slice(&[1.0, -0.5, 2.0]));
}

#[test]
fn parallel_operator_rejects_mismatched_dimensions() {
    let a = second_difference_matrix(3);
    let x = DVector::zeros(2);
    let mut y = DVector::zeros(3);
    let result = ParallelCsrOperator::new(&a).apply((&mut y).into(), (&x).into());
    assert!(result.is_err());
}

proptest! {
    #[test]
    fn parallel_operator_matches_serial_operator(
        n in 1usize..60,
        values in prop::collection::vec(-10.0f64..10.0, 60)
    ) {
        let a = second_difference_matrix(n);
        let x = DVector::from_fn(n, |i, _| values[i]);

        let mut y_serial = DVector::zeros(n);
        a.apply((&mut y_serial).into(), (&x).into()).unwrap();

        let mut y_parallel = DVector::zeros(n);
        ParallelCsrOperator::new(&a).apply((&mut y_parallel).into(), (&x).into()).unwrap();

        prop_assert_eq!(y_serial, y_parallel);
    }
}
