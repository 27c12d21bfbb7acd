use ellipt2d_quadrature::tensor::{quadrilateral_gauss, quadrilateral_gauss_anisotropic};
use ellipt2d_quadrature::{integrate, quadrilateral_for_order};

use matrixcompare::assert_scalar_eq;

fn monomial_integral(alpha: i32) -> f64 {
    (1.0 - (-1.0f64).powi(alpha + 1)) / (alpha as f64 + 1.0)
}

#[test]
fn quadrilateral_gauss_integrates_tensor_monomials() {
    for n in 1..=8 {
        let rule = quadrilateral_gauss(n);
        assert_eq!(rule.0.len(), n * n);
        let max_degree = 2 * n as i32 - 1;
        for alpha in 0..=max_degree {
            for beta in 0..=max_degree {
                let estimated = integrate(&rule, |x| x[0].powi(alpha) * x[1].powi(beta));
                let expected = monomial_integral(alpha) * monomial_integral(beta);
                assert_scalar_eq!(estimated, expected, comp = abs, tol = 1e-13);
            }
        }
    }
}

#[test]
fn anisotropic_rule_has_requested_point_counts() {
    let (weights, points) = quadrilateral_gauss_anisotropic(2, 5);
    assert_eq!(weights.len(), 10);
    assert_eq!(points.len(), 10);
    assert_scalar_eq!(weights.iter().sum::<f64>(), 4.0, comp = abs, tol = 1e-14);
}

#[test]
fn quadrilateral_rules_for_order_are_exact_per_direction() {
    for order in 0..=12 {
        let rule = quadrilateral_for_order(order).unwrap();
        for alpha in 0..=order as i32 {
            for beta in 0..=order as i32 {
                let estimated = integrate(&rule, |x| x[0].powi(alpha) * x[1].powi(beta));
                let expected = monomial_integral(alpha) * monomial_integral(beta);
                assert_scalar_eq!(estimated, expected, comp = abs, tol = 1e-13);
            }
        }
    }
}
