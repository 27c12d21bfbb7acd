//! The general second-order elliptic problem
//!
//! ```text
//! -div(A grad u) = 1 + x^2 + y^2   in (-1, 1)^2,
//!              u = -cos(pi x)      on the bottom edge,
//!  (A grad u) . n = 0               elsewhere,
//! ```
//!
//! where `A` has unit off-diagonal entries and a diagonal that jumps across `y = 0`.
//!
//! Usage: `cargo run --release --example general [settings.json]`
use ellipt2d::mesh::procedural::{create_rectangular_uniform_quad_mesh_2d, BOTTOM};
use ellipt2d::mesh::Marker;
use ellipt2d::nalgebra::{Point2, Vector2};
use ellipt2d::problem::LinearProblem;
use ellipt2d::settings::ProblemSettings;
use ellipt2d::space::{BcType, BoundaryClassifier, FunctionSpace};
use ellipt2d::weak_form::{EllipticCoefficients, WeakForm};
use std::f64::consts::PI;
use std::sync::Arc;

fn main() -> eyre::Result<()> {
    let settings = match std::env::args().nth(1) {
        Some(path) => ProblemSettings::from_json_file(path)?,
        None => ProblemSettings::default(),
    };

    let mut mesh = create_rectangular_uniform_quad_mesh_2d(1.0, 2, 2, 1, &Vector2::new(-1.0, -1.0))?;
    mesh.refine_uniformly(settings.initial_refinements)?;

    let classifier = BoundaryClassifier::new()
        .with_marker(BOTTOM, BcType::Essential)
        .with_default(BcType::Natural);
    let dirichlet = |_: Marker, x: f64, _: f64| -(PI * x).cos();
    let space = FunctionSpace::new(Arc::new(mesh), classifier, dirichlet, settings.initial_degree)?;

    let r2 = |x: f64, y: f64| x * x + y * y;
    let coefficients = EllipticCoefficients::new()
        .with_a11(move |x, y| if y > 0.0 { 1.0 + r2(x, y) } else { 1.0 })
        .with_a22(move |x, y| if y > 0.0 { 1.0 } else { 1.0 + r2(x, y) })
        .with_off_diagonal(|_, _| 1.0)
        .with_rhs(move |x, y| 1.0 + r2(x, y))
        .with_coefficient_order(2);
    let weak_form = WeakForm::general_elliptic(coefficients);

    println!(
        "{} elements, degree {}, ndof = {}",
        space.mesh().num_elements(),
        space.degree(),
        space.num_free_dofs()
    );

    let mut solver = settings.create_solver();
    let solution = LinearProblem::new(&space, &weak_form)
        .parallel(settings.parallel_assembly)
        .solve(solver.as_mut())?;
    println!("{}: {}", solver.name(), solver.diagnostic());

    for y in [-0.5, 0.0, 0.5, 1.0] {
        let values: Vec<String> = [-1.0, -0.5, 0.0, 0.5, 1.0]
            .iter()
            .filter_map(|&x| solution.value(&Point2::new(x, y)))
            .map(|u| format!("{:>10.6}", u))
            .collect();
        println!("y = {:>5.2}: {}", y, values.join(" "));
    }

    Ok(())
}
