use ellipt2d_quadrature::univariate::{gauss, gauss_on_interval};
use ellipt2d_quadrature::{integrate, interval_for_order};

use matrixcompare::assert_scalar_eq;

fn monomial_integral(alpha: i32) -> f64 {
    (1.0 - (-1.0f64).powi(alpha + 1)) / (alpha as f64 + 1.0)
}

#[test]
fn gauss_rules_satisfy_expected_accuracy() {
    for n in 1..=30 {
        let expected_polynomial_degree = 2 * n - 1;
        let rule = gauss(n);

        assert!(rule.0.iter().all(|&w| w > 0.0));

        for alpha in 0..=expected_polynomial_degree as i32 {
            let estimated_integral = integrate(&rule, |x| x[0].powi(alpha));
            assert_scalar_eq!(estimated_integral, monomial_integral(alpha), comp = abs, tol = 1e-13);
        }
    }
}

#[test]
fn interval_rules_for_order_are_exact_up_to_order() {
    for order in 0..=20 {
        let rule = interval_for_order(order).unwrap();
        for alpha in 0..=order as i32 {
            let estimated_integral = integrate(&rule, |x| x[0].powi(alpha));
            assert_scalar_eq!(estimated_integral, monomial_integral(alpha), comp = abs, tol = 1e-13);
        }
    }
}

#[test]
fn gauss_on_interval_integrates_over_mapped_interval() {
    // int_0^2 x^3 dx = 4
    let rule = gauss_on_interval(0.0, 2.0, 2);
    assert_scalar_eq!(integrate(&rule, |x| x[0].powi(3)), 4.0, comp = abs, tol = 1e-13);
    assert!(rule.1.iter().all(|&[x]| x > 0.0 && x < 2.0));
}
