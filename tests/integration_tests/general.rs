//! The general second-order problem with discontinuous diffusion coefficients, mixed boundary
//! conditions and a non-trivial right-hand side.
use ellipt2d::mesh::procedural::{create_rectangular_uniform_quad_mesh_2d, BOTTOM, RIGHT};
use ellipt2d::mesh::{Marker, Mesh};
use ellipt2d::problem::LinearProblem;
use ellipt2d::settings::ProblemSettings;
use ellipt2d::solver::SolverKind;
use ellipt2d::space::{BcType, BoundaryClassifier, FunctionSpace};
use ellipt2d::weak_form::{EllipticCoefficients, WeakForm};
use matrixcompare::assert_scalar_eq;
use nalgebra::{point, Vector2};
use std::f64::consts::PI;
use std::sync::Arc;
use util::max_asymmetry;

/// Four quads on [-1, 1]^2, conforming to the coefficient jump at y = 0.
fn coarse_mesh() -> Mesh {
    create_rectangular_uniform_quad_mesh_2d(1.0, 2, 2, 1, &Vector2::new(-1.0, -1.0)).unwrap()
}

fn dirichlet_value(_: Marker, x: f64, _: f64) -> f64 {
    -(PI * x).cos()
}

fn general_coefficients() -> EllipticCoefficients {
    EllipticCoefficients::new()
        .with_a11(|x, y| if y > 0.0 { 1.0 + x * x + y * y } else { 1.0 })
        .with_a22(|x, y| if y > 0.0 { 1.0 } else { 1.0 + x * x + y * y })
        .with_off_diagonal(|_, _| 1.0)
        .with_rhs(|x, y| 1.0 + x * x + y * y)
        .with_neumann(RIGHT, |_, _| 0.0)
        .with_coefficient_order(2)
}

fn general_space(refinements: usize, degree: usize) -> FunctionSpace {
    let mut mesh = coarse_mesh();
    mesh.refine_uniformly(refinements).unwrap();
    let classifier = BoundaryClassifier::new()
        .with_marker(BOTTOM, BcType::Essential)
        .with_default(BcType::Natural);
    FunctionSpace::new(Arc::new(mesh), classifier, dirichlet_value, degree).unwrap()
}

#[test]
fn degrees_of_freedom_grow_with_refinement() {
    for k in 0..=3 {
        let space = general_space(k, 2);
        // Each of the 2^k x 2^k cells per unit contributes two nodes per direction
        let nodes_per_side = 2 * 2usize.pow(k as u32) * 2 + 1;
        assert_eq!(space.mesh().num_elements(), 4 * 4usize.pow(k as u32));
        assert_eq!(space.num_dofs(), nodes_per_side * nodes_per_side);
        assert_eq!(space.num_essential_dofs(), nodes_per_side);
        assert_eq!(space.num_free_dofs(), nodes_per_side * (nodes_per_side - 1));
    }
}

#[test]
fn general_problem_with_default_settings() {
    let settings = ProblemSettings::default();
    assert_eq!(settings.matrix_solver, SolverKind::Cholesky);

    let space = general_space(settings.initial_refinements, settings.initial_degree);
    assert_eq!(space.num_free_dofs(), 1056);

    let weak_form = WeakForm::general_elliptic(general_coefficients());
    assert!(weak_form.is_symmetric());

    let problem = LinearProblem::new(&space, &weak_form).parallel(settings.parallel_assembly);
    let system = problem.assemble().unwrap();
    assert_eq!(system.dimension(), 1056);
    assert!(system.is_symmetric());
    assert!(max_asymmetry(system.matrix()) <= 1e-12);

    let mut solver = settings.create_solver();
    let solution = problem.solve(solver.as_mut()).unwrap();
    assert!(!solver.failed());

    // The Dirichlet data is interpolated exactly at the nodes of the bottom edge
    for dof in space.num_free_dofs()..space.num_dofs() {
        let x = space.dof_position(dof).unwrap();
        assert_scalar_eq!(x.y, -1.0, comp = abs, tol = 1e-14);
        assert_scalar_eq!(solution.coefficients()[dof], -(PI * x.x).cos(), comp = abs, tol = 1e-14);
    }
    assert!(solution.coefficients().iter().all(|c| c.is_finite()));
    assert!(solution.value(&point![0.3, 0.4]).is_some());
}

#[test]
fn general_problem_is_independent_of_backend() {
    let space = general_space(2, 2);
    let weak_form = WeakForm::general_elliptic(general_coefficients());
    let problem = LinearProblem::new(&space, &weak_form);

    let mut reference_solver = SolverKind::DenseLu.create_solver(&Default::default());
    let reference = problem.solve(reference_solver.as_mut()).unwrap();
    for kind in [SolverKind::Cholesky, SolverKind::ParallelCg] {
        let mut solver = kind.create_solver(&Default::default());
        let solution = problem.solve(solver.as_mut()).unwrap();
        let difference = (solution.coefficients() - reference.coefficients()).amax();
        assert!(difference <= 1e-7, "{}: {:e}", kind, difference);
    }
}
