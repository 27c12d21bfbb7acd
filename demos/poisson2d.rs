use ellipt2d::mesh::procedural::create_unit_square_uniform_tri_mesh_2d;
use ellipt2d::mesh::Marker;
use ellipt2d::nalgebra::Point2;
use ellipt2d::problem::LinearProblem;
use ellipt2d::solver::{create_solver, SolverSettings};
use ellipt2d::space::{BoundaryClassifier, FunctionSpace};
use ellipt2d::weak_form::{EllipticCoefficients, WeakForm};
use std::f64::consts::PI;
use std::sync::Arc;

/// Solves -Laplace u = 2 pi^2 sin(pi x) sin(pi y) with homogeneous Dirichlet conditions for
/// increasing resolutions and reports the error at the center of the square.
fn main() -> eyre::Result<()> {
    let solver_name = std::env::args().nth(1).unwrap_or_else(|| "cholesky".to_string());
    let exact = |x: f64, y: f64| (PI * x).sin() * (PI * y).sin();

    let coefficients = EllipticCoefficients::laplace()
        .with_rhs(move |x, y| 2.0 * PI * PI * exact(x, y))
        .with_coefficient_order(4);
    let weak_form = WeakForm::general_elliptic(coefficients);
    let center = Point2::new(0.5, 0.5);

    for degree in 1..=3 {
        for res in [4, 8, 16] {
            let mesh = Arc::new(create_unit_square_uniform_tri_mesh_2d(res)?);
            let classifier = BoundaryClassifier::essential_markers([1, 2, 3, 4]);
            let space = FunctionSpace::new(mesh, classifier, |_: Marker, _: f64, _: f64| 0.0, degree)?;

            let mut solver = create_solver(&solver_name, &SolverSettings::default())?;
            let solution = LinearProblem::new(&space, &weak_form)
                .parallel(true)
                .solve(solver.as_mut())?;
            let u = solution
                .value(&center)
                .ok_or_else(|| eyre::eyre!("center is outside the mesh"))?;
            println!(
                "p = {}, res = {:>2}, ndof = {:>5}: |u - u_h|(0.5, 0.5) = {:.3e}",
                degree,
                res,
                space.num_free_dofs(),
                (u - exact(center.x, center.y)).abs()
            );
        }
    }

    Ok(())
}
