use ellipt2d_sparse::cg::{
    CgIterationState, CgStoppingCriterion, CgWorkspace, ConjugateGradient, RelativeResidualCriterion, SolveErrorKind,
};
use ellipt2d_sparse::operators::{IdentityOperator, JacobiPreconditioner};
use std::cell::RefCell;
use nalgebra::{DMatrix, DVector};
use util::{assert_approx_matrix_eq, badly_scaled_spd_matrix, residual_norm, second_difference_matrix};

#[test]
fn solve_identity() {
    let operator = IdentityOperator;
    let mut x = DVector::zeros(4);
    let b = DVector::from_element(4, 5.0);
    ConjugateGradient::new()
        .with_operator(operator)
        .with_stopping_criterion(RelativeResidualCriterion::default())
        .solve_with_guess(&b, &mut x)
        .unwrap();
    assert_eq!(x, b);
}

#[test]
fn solve_dense_diagonally_dominant() {
    let a = DMatrix::from_fn(3, 3, |r, c| if r == c { 7.0 } else { 2.0 });

    let x0 = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
    let b = &a * &x0;
    let mut x = DVector::zeros(3);
    let output = ConjugateGradient::new()
        .with_operator(&a)
        .with_stopping_criterion(RelativeResidualCriterion::new(1e-14))
        .solve_with_guess(&b, &mut x)
        .unwrap();

    assert!(output.num_iterations > 0 && output.num_iterations <= 4);
    assert_approx_matrix_eq!(&x, &x0, abstol = 1e-12);
}

#[test]
fn solve_dense_preconditioned_from_arbitrary_guess() {
    let a = DMatrix::from_row_slice(
        3,
        3,
        &[21.0, -1.0, -5.0, -1.0, 11.0, -4.0, -5.0, -4.0, 26.0],
    );
    let p = DMatrix::from_row_slice(3, 3, &[17.0, 6.0, 3.0, 6.0, 14.0, 9.0, 3.0, 9.0, 10.0]);
    let x0 = DVector::from_column_slice(&[1.0, 3.0, 2.0]);
    let b = &a * &x0;

    let mut x = DVector::from_column_slice(&[2.0, 1.0, 0.0]);
    ConjugateGradient::new()
        .with_operator(&a)
        .with_preconditioner(&p)
        .with_stopping_criterion(RelativeResidualCriterion::new(1e-14))
        .solve_with_guess(&b, &mut x)
        .unwrap();

    assert_approx_matrix_eq!(&x, &x0, abstol = 1e-12);
}

#[test]
fn solve_sparse_with_jacobi_preconditioner() {
    let a = badly_scaled_spd_matrix(40);
    let x0 = DVector::from_fn(40, |i, _| (i as f64).sin());
    let b = &a * &x0;

    let preconditioner = JacobiPreconditioner::from_csr(&a);
    let mut x = DVector::zeros(40);
    ConjugateGradient::new()
        .with_operator(&a)
        .with_preconditioner(&preconditioner)
        .with_stopping_criterion(RelativeResidualCriterion::new(1e-13))
        .with_max_iter(1000)
        .solve_with_guess(&b, &mut x)
        .unwrap();

    assert!(residual_norm(&a, &x, &b) <= 1e-9 * b.norm());
}

#[test]
fn zero_rhs_gives_zero_solution() {
    let a = second_difference_matrix(5);
    let b = DVector::zeros(5);
    let mut x = DVector::from_element(5, 3.0);
    let output = ConjugateGradient::new()
        .with_operator(&a)
        .with_stopping_criterion(RelativeResidualCriterion::default())
        .solve_with_guess(&b, &mut x)
        .unwrap();
    assert_eq!(output.num_iterations, 0);
    assert_eq!(x, DVector::zeros(5));
}

#[test]
fn max_iterations_reached() {
    let a = second_difference_matrix(50);
    let b = DVector::from_element(50, 1.0);
    let mut x = DVector::zeros(50);
    let err = ConjugateGradient::new()
        .with_operator(&a)
        .with_stopping_criterion(RelativeResidualCriterion::new(1e-14))
        .with_max_iter(2)
        .solve_with_guess(&b, &mut x)
        .unwrap_err();
    assert!(matches!(err.kind, SolveErrorKind::MaxIterationsReached { max_iter: 2 }));
    assert_eq!(err.output.num_iterations, 2);
}

#[test]
fn indefinite_operator_is_detected() {
    let a = DMatrix::from_row_slice(2, 2, &[-1.0, 0.0, 0.0, -2.0]);
    let b = DVector::from_column_slice(&[1.0, 1.0]);
    let mut x = DVector::zeros(2);
    let err = ConjugateGradient::new()
        .with_operator(&a)
        .with_stopping_criterion(RelativeResidualCriterion::default())
        .solve_with_guess(&b, &mut x)
        .unwrap_err();
    assert!(matches!(err.kind, SolveErrorKind::IndefiniteOperator));
}

#[test]
fn dimension_mismatch_is_an_operator_error() {
    let a = second_difference_matrix(3);
    let b = DVector::from_element(4, 1.0);
    let mut x = DVector::zeros(4);
    let err = ConjugateGradient::new()
        .with_operator(&a)
        .with_stopping_criterion(RelativeResidualCriterion::default())
        .solve_with_guess(&b, &mut x)
        .unwrap_err();
    assert!(matches!(err.kind, SolveErrorKind::OperatorError(_)));
}

#[test]
fn workspace_state_does_not_affect_solutions() {
    let a = second_difference_matrix(20);
    let mut workspace = CgWorkspace::default();

    for scale in [1.0, 2.0, 3.0] {
        let x0 = DVector::from_fn(20, |i, _| scale * (1.0 + i as f64));
        let b = &a * &x0;

        let mut x_workspace = DVector::zeros(20);
        ConjugateGradient::with_workspace(&mut workspace)
            .with_operator(&a)
            .with_stopping_criterion(RelativeResidualCriterion::new(1e-12))
            .solve_with_guess(&b, &mut x_workspace)
            .unwrap();

        let mut x_fresh = DVector::zeros(20);
        ConjugateGradient::new()
            .with_operator(&a)
            .with_stopping_criterion(RelativeResidualCriterion::new(1e-12))
            .solve_with_guess(&b, &mut x_fresh)
            .unwrap();

        assert_eq!(x_workspace, x_fresh);
        assert_approx_matrix_eq!(&x_workspace, &x0, abstol = 1e-8 * scale * 20.0);
    }
}

/// Records the states passed to the criterion and stops after a fixed number of iterations.
struct RecordingCriterion {
    stop_after: usize,
    states: RefCell<Vec<CgIterationState<f64>>>,
}

impl CgStoppingCriterion<f64> for RecordingCriterion {
    fn has_converged(&self, state: &CgIterationState<f64>) -> bool {
        self.states.borrow_mut().push(*state);
        state.iteration >= self.stop_after
    }
}

#[test]
fn custom_stopping_criterion_sees_every_iteration() {
    let a = second_difference_matrix(30);
    let b = DVector::from_element(30, 1.0);
    let mut x = DVector::zeros(30);
    let criterion = RecordingCriterion {
        stop_after: 5,
        states: RefCell::new(Vec::new()),
    };
    let output = ConjugateGradient::new()
        .with_operator(&a)
        .with_stopping_criterion(&criterion)
        .solve_with_guess(&b, &mut x)
        .unwrap();

    assert_eq!(output.num_iterations, 5);
    let states = criterion.states.borrow();
    let iterations: Vec<_> = states.iter().map(|state| state.iteration).collect();
    assert_eq!(iterations, vec![0, 1, 2, 3, 4, 5]);
    assert!(states.iter().all(|state| state.rhs_norm == b.norm()));
    assert_eq!(states[0].residual_norm, b.norm());
    assert_eq!(states[5].residual_norm, output.residual_norm);
}
