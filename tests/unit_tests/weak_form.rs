use ellipt2d::weak_form::integrals::{int_f_v, int_grad_u_grad_v, int_u_v, int_v};
use ellipt2d::weak_form::{
    EllipticCoefficients, FormArea, FormContribution, FormOrders, FunctionValues, Geometry, Symmetry, WeakForm,
};
use matrixcompare::assert_scalar_eq;

fn function_values<'a>(values: &'a [f64], dx: &'a [f64], dy: &'a [f64]) -> FunctionValues<'a> {
    FunctionValues { values, dx, dy }
}

fn volume_geometry<'a>(x: &'a [f64], y: &'a [f64], zeros: &'a [f64]) -> Geometry<'a> {
    Geometry {
        x,
        y,
        nx: zeros,
        ny: zeros,
        element_marker: 0,
        edge_marker: None,
        diameter: 1.0,
    }
}

fn kinds(weak_form: &WeakForm) -> Vec<&'static str> {
    weak_form
        .contributions()
        .iter()
        .map(|contribution| match contribution {
            FormContribution::VolumeBilinear(_) => "volume bilinear",
            FormContribution::VolumeLinear(_) => "volume linear",
            FormContribution::BoundaryBilinear(_) => "boundary bilinear",
            FormContribution::BoundaryLinear(_) => "boundary linear",
        })
        .collect()
}

#[test]
fn registry_keeps_contributions_in_order() {
    let mut weak_form = WeakForm::new();
    weak_form
        .add_matrix_form(
            |w, u, v, _| int_grad_u_grad_v(w, u, v),
            |o: FormOrders| o.trial + o.test,
            Symmetry::Symmetric,
        )
        .add_vector_form(|w, v, _| int_v(w, v), |o: FormOrders| o.test)
        .add_vector_form_surf(|w, v, _| int_v(w, v), |o: FormOrders| o.test, 2)
        .add_matrix_form_on(7, |w, u, v, _| int_u_v(w, u, v), |o: FormOrders| o.trial + o.test, Symmetry::Symmetric);

    assert_eq!(
        kinds(&weak_form),
        vec!["volume bilinear", "volume linear", "boundary linear", "volume bilinear"]
    );
    let areas: Vec<_> = weak_form.contributions().iter().map(|c| c.area()).collect();
    assert_eq!(
        areas,
        vec![FormArea::Any, FormArea::Any, FormArea::Marker(2), FormArea::Marker(7)]
    );
    assert!(weak_form.is_symmetric());

    weak_form.add_matrix_form_surf(
        |w, u, v, _| int_u_v(w, u, v),
        |o: FormOrders| o.trial + o.test,
        Symmetry::NonSymmetric,
        FormArea::Any,
    );
    assert!(!weak_form.is_symmetric());
}

#[test]
fn registry_evaluates_order_estimators() {
    let mut weak_form = WeakForm::new();
    weak_form.add_matrix_form(
        |w, u, v, _| int_u_v(w, u, v),
        |o: FormOrders| 2 * o.trial + o.test + 1,
        Symmetry::Symmetric,
    );
    match &weak_form.contributions()[0] {
        FormContribution::VolumeBilinear(form) => {
            assert_eq!((form.order)(FormOrders { trial: 2, test: 3 }), 8);
            assert_eq!(form.symmetry, Symmetry::Symmetric);
        }
        other => panic!("unexpected contribution {:?}", other),
    }
}

#[test]
fn form_area_matching() {
    assert!(FormArea::Any.matches(-3));
    assert!(FormArea::from(2).matches(2));
    assert!(!FormArea::Marker(2).matches(3));
}

#[test]
fn integral_building_blocks() {
    let w = [0.5, 0.25, 0.25];
    let zeros = [0.0; 3];
    let (x, y) = ([0.0, 1.0, 2.0], [1.0, 1.0, -1.0]);
    let u = function_values(&[1.0, 2.0, 3.0], &[1.0, 0.0, 2.0], &[0.0, 1.0, 1.0]);
    let v = function_values(&[2.0, 2.0, -1.0], &[1.0, 1.0, 1.0], &[3.0, 0.0, -2.0]);
    let geometry = volume_geometry(&x, &y, &zeros);

    assert_scalar_eq!(int_v(&w, &v), 1.0 + 0.5 - 0.25, comp = abs, tol = 1e-14);
    assert_scalar_eq!(int_u_v(&w, &u, &v), 1.0 + 1.0 - 0.75, comp = abs, tol = 1e-14);
    // 0.5 * (1 + 0) + 0.25 * (0 + 0) + 0.25 * (2 - 2)
    assert_scalar_eq!(int_grad_u_grad_v(&w, &u, &v), 0.5, comp = abs, tol = 1e-14);
    // f = x + y: 0.5 * 1 * 2 + 0.25 * 2 * 2 + 0.25 * 1 * (-1)
    assert_scalar_eq!(
        int_f_v(&w, |x, y| x + y, &v, &geometry),
        1.0 + 1.0 - 0.25,
        comp = abs,
        tol = 1e-14
    );
}

#[test]
fn elliptic_coefficients_symmetry() {
    assert!(EllipticCoefficients::laplace().is_symmetric());
    assert!(EllipticCoefficients::new().with_off_diagonal(|x, _| x).is_symmetric());
    assert!(!EllipticCoefficients::laplace().with_a12(|_, _| 1.0).is_symmetric());
    assert!(!EllipticCoefficients::laplace()
        .with_a12(|_, _| 1.0)
        .with_a21(|_, _| 1.0)
        .is_symmetric());
    assert!(!EllipticCoefficients::laplace()
        .with_convection(|_, _| 1.0, |_, _| 0.0)
        .is_symmetric());
    assert!(EllipticCoefficients::laplace().with_a0(|_, _| 2.0).is_symmetric());
}

#[test]
fn general_elliptic_registers_forms() {
    let weak_form = WeakForm::general_elliptic(EllipticCoefficients::laplace());
    assert_eq!(kinds(&weak_form), vec!["volume bilinear"]);
    assert!(weak_form.is_symmetric());

    let coefficients = EllipticCoefficients::laplace()
        .with_rhs(|x, y| 1.0 + x * x + y * y)
        .with_neumann(2, |_, _| 0.0)
        .with_neumann(3, |x, _| x)
        .with_convection(|_, _| 1.0, |_, _| 1.0)
        .with_coefficient_order(2);
    let weak_form = WeakForm::general_elliptic(coefficients);
    assert_eq!(
        kinds(&weak_form),
        vec!["volume bilinear", "volume linear", "boundary linear", "boundary linear"]
    );
    assert!(!weak_form.is_symmetric());

    let areas: Vec<_> = weak_form.contributions().iter().map(|c| c.area()).collect();
    assert_eq!(&areas[2..], &[FormArea::Marker(2), FormArea::Marker(3)]);

    // The coefficient order is added to the polynomial orders of the basis functions
    match &weak_form.contributions()[0] {
        FormContribution::VolumeBilinear(form) => {
            assert_eq!((form.order)(FormOrders { trial: 2, test: 2 }), 6);
        }
        other => panic!("unexpected contribution {:?}", other),
    }
    match &weak_form.contributions()[1] {
        FormContribution::VolumeLinear(form) => {
            assert_eq!((form.order)(FormOrders { trial: 0, test: 2 }), 4);
        }
        other => panic!("unexpected contribution {:?}", other),
    }
}

#[test]
fn general_elliptic_integrand_combines_all_terms() {
    let coefficients = EllipticCoefficients::new()
        .with_a11(|_, _| 2.0)
        .with_a22(|x, _| x)
        .with_off_diagonal(|_, _| 0.5)
        .with_convection(|_, _| 1.0, |_, y| y)
        .with_a0(|_, _| 3.0);
    let weak_form = WeakForm::general_elliptic(coefficients);

    let w = [1.0];
    let zeros = [0.0];
    let (x, y) = ([2.0], [-1.0]);
    let geometry = volume_geometry(&x, &y, &zeros);
    let u = function_values(&[1.0], &[1.0], &[2.0]);
    let v = function_values(&[2.0], &[3.0], &[-1.0]);

    let value = match &weak_form.contributions()[0] {
        FormContribution::VolumeBilinear(form) => (form.integrand)(&w, &u, &v, &geometry),
        other => panic!("unexpected contribution {:?}", other),
    };
    // (A grad u) . grad v with A = [[2, 0.5], [0.5, 2]] at x = 2: A grad u = (3, 4.5), dot (3, -1) = 4.5
    // (b . grad u) v with b = (1, -1): (1 - 2) * 2 = -2
    // a0 u v = 3 * 1 * 2 = 6
    assert_scalar_eq!(value, 4.5 - 2.0 + 6.0, comp = abs, tol = 1e-14);
}
