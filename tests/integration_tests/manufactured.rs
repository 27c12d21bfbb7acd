//! Problems with known exact solutions contained in the discrete space, which must therefore be
//! reproduced up to round-off.
use super::max_nodal_error;
use ellipt2d::mesh::procedural::{
    create_unit_square_uniform_quad_mesh_2d, create_unit_square_uniform_tri_mesh_2d, BOTTOM, LEFT, RIGHT, TOP,
};
use ellipt2d::mesh::{Marker, Mesh};
use ellipt2d::problem::LinearProblem;
use ellipt2d::proptest::rectangular_mesh;
use ellipt2d::solver::{create_solver, SolverSettings};
use ellipt2d::space::{BoundaryClassifier, FunctionSpace};
use ellipt2d::weak_form::{EllipticCoefficients, WeakForm};
use matrixcompare::assert_scalar_eq;
use nalgebra::point;
use proptest::prelude::*;
use std::f64::consts::PI;
use std::sync::Arc;

fn meshes(cells_per_dim: usize) -> Vec<Mesh> {
    vec![
        create_unit_square_uniform_tri_mesh_2d(cells_per_dim).unwrap(),
        create_unit_square_uniform_quad_mesh_2d(cells_per_dim).unwrap(),
    ]
}

fn dirichlet_space(mesh: Mesh, exact: fn(f64, f64) -> f64, degree: usize) -> FunctionSpace {
    let classifier = BoundaryClassifier::essential_markers([BOTTOM, RIGHT, TOP, LEFT]);
    FunctionSpace::new(Arc::new(mesh), classifier, move |_: Marker, x: f64, y: f64| exact(x, y), degree).unwrap()
}

#[test]
fn quadratic_poisson_solution_is_reproduced() {
    // -Laplace u = -2
    let exact = |x: f64, y: f64| 1.0 + x + 2.0 * y + x * x + x * y;
    let weak_form = WeakForm::general_elliptic(EllipticCoefficients::laplace().with_rhs(|_, _| -2.0));

    for mesh in meshes(3) {
        let space = dirichlet_space(mesh, exact, 2);
        let mut solver = create_solver("cholesky", &SolverSettings::default()).unwrap();
        let solution = LinearProblem::new(&space, &weak_form)
            .solve(solver.as_mut())
            .unwrap();

        assert!(max_nodal_error(&solution, exact) <= 1e-10);
        for &p in &[point![0.123, 0.456], point![0.9, 0.1], point![0.5, 0.5]] {
            let value = solution.value(&p).unwrap();
            assert_scalar_eq!(value, exact(p.x, p.y), comp = abs, tol = 1e-10);
            let gradient = solution.gradient(&p).unwrap();
            assert_scalar_eq!(gradient.x, 1.0 + 2.0 * p.x + p.y, comp = abs, tol = 1e-9);
            assert_scalar_eq!(gradient.y, 2.0 + p.x, comp = abs, tol = 1e-9);
        }
    }
}

#[test]
fn natural_boundary_conditions() {
    // u = x + 2y with flux conditions on the right (du/dx = 1) and top (du/dy = 2)
    let exact = |x: f64, y: f64| x + 2.0 * y;
    let coefficients = EllipticCoefficients::laplace()
        .with_neumann(RIGHT, |_, _| 1.0)
        .with_neumann(TOP, |_, _| 2.0);
    let weak_form = WeakForm::general_elliptic(coefficients);

    for mesh in meshes(4) {
        let classifier = BoundaryClassifier::essential_markers([BOTTOM, LEFT]);
        let space = FunctionSpace::new(Arc::new(mesh), classifier, |_: Marker, x: f64, y: f64| exact(x, y), 1).unwrap();
        let mut solver = create_solver("cholesky", &SolverSettings::default()).unwrap();
        let solution = LinearProblem::new(&space, &weak_form)
            .solve(solver.as_mut())
            .unwrap();
        assert!(max_nodal_error(&solution, exact) <= 1e-10);
    }
}

#[test]
fn convection_and_reaction() {
    // -Laplace u + (1, 1) . grad u + 2 u = f for u = x + 2y
    let exact = |x: f64, y: f64| x + 2.0 * y;
    let coefficients = EllipticCoefficients::laplace()
        .with_convection(|_, _| 1.0, |_, _| 1.0)
        .with_a0(|_, _| 2.0)
        .with_rhs(|x, y| 3.0 + 2.0 * x + 4.0 * y)
        .with_coefficient_order(1);
    let weak_form = WeakForm::general_elliptic(coefficients);
    assert!(!weak_form.is_symmetric());

    for mesh in meshes(4) {
        let space = dirichlet_space(mesh, exact, 1);
        let mut solver = create_solver("dense-lu", &SolverSettings::default()).unwrap();
        let solution = LinearProblem::new(&space, &weak_form)
            .solve(solver.as_mut())
            .unwrap();
        assert!(max_nodal_error(&solution, exact) <= 1e-10);
    }
}

#[test]
fn variable_diffusion_coefficient() {
    // -div((1 + x) grad u) with a11 = 1 + x, a22 = 1, u = x^2 + xy
    let exact = |x: f64, y: f64| x * x + x * y;
    let coefficients = EllipticCoefficients::new()
        .with_a11(|x, _| 1.0 + x)
        .with_a22(|_, _| 1.0)
        .with_rhs(|x, y| -(4.0 * x + y + 2.0))
        .with_coefficient_order(1);
    let weak_form = WeakForm::general_elliptic(coefficients);

    for mesh in meshes(3) {
        let space = dirichlet_space(mesh, exact, 2);
        let mut solver = create_solver("cg", &SolverSettings::default()).unwrap();
        let solution = LinearProblem::new(&space, &weak_form)
            .parallel(true)
            .solve(solver.as_mut())
            .unwrap();
        assert!(max_nodal_error(&solution, exact) <= 1e-9);
    }
}

#[test]
fn linear_elements_converge_quadratically() {
    // -Laplace u = 2 pi^2 u for u = sin(pi x) sin(pi y), vanishing on the boundary
    let exact = |x: f64, y: f64| (PI * x).sin() * (PI * y).sin();
    let coefficients = EllipticCoefficients::laplace()
        .with_rhs(move |x, y| 2.0 * PI * PI * exact(x, y))
        .with_coefficient_order(4);
    let weak_form = WeakForm::general_elliptic(coefficients);

    let sample_points: Vec<_> = (0..10)
        .flat_map(|i| (0..10).map(move |j| point![(i as f64 + 0.37) / 10.0, (j as f64 + 0.61) / 10.0]))
        .collect();
    let errors: Vec<f64> = [4, 8, 16]
        .iter()
        .map(|&n| {
            let space = dirichlet_space(create_unit_square_uniform_tri_mesh_2d(n).unwrap(), exact, 1);
            let mut solver = create_solver("cholesky", &SolverSettings::default()).unwrap();
            let solution = LinearProblem::new(&space, &weak_form)
                .solve(solver.as_mut())
                .unwrap();
            sample_points
                .iter()
                .map(|p| (solution.value(p).unwrap() - exact(p.x, p.y)).abs())
                .fold(0.0, f64::max)
        })
        .collect();

    assert!(errors[0] / errors[1] > 2.5, "errors: {:?}", errors);
    assert!(errors[1] / errors[2] > 2.5, "errors: {:?}", errors);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]
    #[test]
    fn linear_fields_are_harmonic(mesh in rectangular_mesh(), degree in 1..=2usize) {
        let exact = |x: f64, y: f64| 1.0 + 0.5 * x - y;
        let space = dirichlet_space(mesh, exact, degree);
        let weak_form = WeakForm::general_elliptic(EllipticCoefficients::laplace());
        let mut solver = create_solver("cholesky", &SolverSettings::default()).unwrap();
        let solution = LinearProblem::new(&space, &weak_form)
            .solve(solver.as_mut())
            .unwrap();
        prop_assert!(max_nodal_error(&solution, exact) <= 1e-8);
    }
}
