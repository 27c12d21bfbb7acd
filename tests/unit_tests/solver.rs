use ellipt2d::assembly::LinearSystem;
use ellipt2d::error::SolverError;
use ellipt2d::nalgebra_sparse::{CooMatrix, CsrMatrix};
use ellipt2d::solver::{
    create_solver, CgSolver, CholeskySolver, DenseLuSolver, NewtonSolver, SolverBackend, SolverKind, SolverSettings,
};
use matrixcompare::assert_matrix_eq;
use nalgebra::{DMatrix, DVector};
use std::str::FromStr;
use util::{badly_scaled_spd_matrix, residual_norm, second_difference_matrix};

fn system_with_solution(matrix: CsrMatrix<f64>, symmetric: bool) -> (LinearSystem, DVector<f64>) {
    let n = matrix.nrows();
    let x = DVector::from_fn(n, |i, _| (i as f64 * 0.7).sin() + 0.1 * i as f64);
    let b = &matrix * &x;
    (LinearSystem::new(matrix, b).with_symmetry_hint(symmetric), x)
}

fn singular_system() -> LinearSystem {
    let mut coo = CooMatrix::new(2, 2);
    coo.push(0, 0, 1.0);
    coo.push(0, 1, 1.0);
    coo.push(1, 0, 1.0);
    coo.push(1, 1, 1.0);
    LinearSystem::new(CsrMatrix::from(&coo), DVector::from_element(2, 1.0))
}

#[test]
fn solver_kind_selectors() {
    for kind in SolverKind::ALL {
        assert_eq!(SolverKind::from_str(kind.selector()).unwrap(), kind);
        assert_eq!(kind.to_string(), kind.selector());
        let solver = kind.create_solver(&SolverSettings::default());
        assert_eq!(solver.name(), kind.selector());
        assert!(!solver.failed());
    }
    assert_eq!(
        SolverKind::from_str("umfpack").unwrap_err(),
        SolverError::UnknownBackend {
            selector: "umfpack".to_string()
        }
    );
}

#[test]
fn create_solver_rejects_unknown_selector() {
    let result = create_solver("pardiso", &SolverSettings::default());
    assert!(matches!(result, Err(SolverError::UnknownBackend { selector }) if selector == "pardiso"));
    assert!(create_solver("parallel-cg", &SolverSettings::default()).is_ok());
}

#[test]
fn solver_kinds_serialize_as_selectors() {
    let json = serde_json::to_string(&SolverKind::ParallelCg).unwrap();
    assert_eq!(json, "\"parallel-cg\"");
    let kind: SolverKind = serde_json::from_str("\"dense-lu\"").unwrap();
    assert_eq!(kind, SolverKind::DenseLu);
}

#[test]
fn all_backends_solve_spd_systems() {
    let (system, x_expected) = system_with_solution(second_difference_matrix(40), true);
    for kind in SolverKind::ALL {
        let mut solver = kind.create_solver(&SolverSettings::default());
        let x = solver.solve(&system).unwrap();
        assert!(!solver.failed(), "{} failed", kind);
        assert!(!solver.diagnostic().is_empty());
        assert_matrix_eq!(x, x_expected, comp = abs, tol = 1e-8);
        assert!(residual_norm(system.matrix(), &x, system.rhs()) <= 1e-8 * system.rhs().norm());
    }
}

#[test]
fn backends_agree_on_badly_scaled_system() {
    let (system, _) = system_with_solution(badly_scaled_spd_matrix(60), false);
    let reference = DenseLuSolver::new().solve(&system).unwrap();
    let settings = SolverSettings {
        tolerance: 1e-12,
        max_iterations: 1000,
    };
    let mut solvers: Vec<Box<dyn SolverBackend>> = vec![
        Box::new(CholeskySolver::new(settings.clone())),
        Box::new(CgSolver::new(settings.clone())),
        Box::new(CgSolver::new(settings.clone()).with_parallel(true)),
        Box::new(NewtonSolver::new(settings)),
    ];
    for solver in &mut solvers {
        let x = solver.solve(&system).unwrap();
        let relative_difference = (&x - &reference).norm() / reference.norm();
        assert!(relative_difference <= 1e-6, "{}: {:e}", solver.name(), relative_difference);
    }
}

#[test]
fn direct_solvers_report_singular_matrices() {
    for mut solver in [
        Box::new(DenseLuSolver::new()) as Box<dyn SolverBackend>,
        Box::new(CholeskySolver::new(SolverSettings::default())),
    ] {
        let result = solver.solve(&singular_system());
        assert!(matches!(result, Err(SolverError::SolverFailure { .. })));
        assert!(solver.failed());
        assert!(!solver.diagnostic().is_empty());

        // A subsequent successful solve resets the status
        let (system, _) = system_with_solution(second_difference_matrix(3), true);
        assert!(solver.solve(&system).is_ok());
        assert!(!solver.failed());
    }
}

#[test]
fn cholesky_rejects_non_symmetric_matrix() {
    let matrix = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 0.0, 2.0]);
    let system = LinearSystem::new(CsrMatrix::from(&matrix), DVector::from_element(2, 1.0));
    let mut solver = CholeskySolver::new(SolverSettings::default());
    match solver.solve(&system) {
        Err(SolverError::SolverFailure { backend, reason }) => {
            assert_eq!(backend, "cholesky");
            assert!(reason.contains("symmetric"));
        }
        other => panic!("unexpected result {:?}", other),
    }

    // Dense LU handles the same system
    let x = DenseLuSolver::new().solve(&system).unwrap();
    assert_matrix_eq!(x, DVector::from_column_slice(&[0.25, 0.5]), comp = abs, tol = 1e-14);
}

#[test]
fn cg_reports_missing_convergence() {
    let (system, _) = system_with_solution(second_difference_matrix(100), true);
    let settings = SolverSettings {
        tolerance: 1e-14,
        max_iterations: 3,
    };
    let mut solver = CgSolver::new(settings);
    let result = solver.solve(&system);
    assert!(matches!(result, Err(SolverError::SolverFailure { backend, .. }) if backend == "cg"));
    assert!(solver.failed());
}

#[test]
fn empty_systems_have_empty_solutions() {
    let system = LinearSystem::new(CsrMatrix::zeros(0, 0), DVector::zeros(0));
    for kind in [SolverKind::DenseLu, SolverKind::Cholesky] {
        let mut solver = kind.create_solver(&SolverSettings::default());
        assert_eq!(solver.solve(&system).unwrap().len(), 0);
    }
}
