use ellipt2d_optimize::calculus::{DifferentiableVectorFunction, VectorFunction, VectorFunctionBuilder};
use nalgebra::{DVector, DVectorView, DVectorViewMut};

fn evaluate(function: &mut impl VectorFunction, x: &DVector<f64>) -> DVector<f64> {
    let mut f = DVector::zeros(function.dimension());
    function.eval_into(DVectorViewMut::from(&mut f), DVectorView::from(x));
    f
}

#[test]
fn closure_vector_function() {
    let mut function = VectorFunctionBuilder::with_dimension(2)
        .with_function(|mut f, x| {
            f[0] = x[0] * x[1] + 3.0;
            f[1] = x[0] * x[0] + x[1];
        })
        .with_jacobian_solver(|mut sol, _, rhs| {
            sol.copy_from(&(2.0 * rhs));
            Ok(())
        });

    assert_eq!(function.dimension(), 2);
    let x = DVector::from_column_slice(&[3.0, 4.0]);
    assert_eq!(evaluate(&mut function, &x), DVector::from_column_slice(&[15.0, 13.0]));

    let rhs = DVector::from_column_slice(&[1.0, -1.0]);
    let mut sol = DVector::zeros(2);
    function
        .solve_jacobian_system(DVectorViewMut::from(&mut sol), DVectorView::from(&x), DVectorView::from(&rhs))
        .unwrap();
    assert_eq!(sol, DVector::from_column_slice(&[2.0, -2.0]));
}

#[test]
fn mutable_references_are_vector_functions() {
    let mut calls = 0;
    let mut function = VectorFunctionBuilder::with_dimension(1).with_function(|mut f, x| {
        calls += 1;
        f[0] = 2.0 * x[0];
    });
    let x = DVector::from_element(1, 1.5);
    {
        let mut by_reference = &mut function;
        assert_eq!(evaluate(&mut by_reference, &x)[0], 3.0);
    }
    assert_eq!(evaluate(&mut function, &x)[0], 3.0);
    drop(function);
    assert_eq!(calls, 2);
}
