use std::f64::consts::PI;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use ndarray::{array, Array1, Array2};
use num_complex::Complex;
use proptest::prelude::*;

use crate::angmom::spherical_harmonics::{sh, sh_array, sh_formula, tabulated_lm, SH_LMAX};
use crate::errors::SharpoError;

/// Associated Legendre function $`P_l^{m}(x)`$ for $`m \ge 0`$ including the Condon--Shortley
/// phase, by upward recursion in $`l`$.
fn legendre_reference(l: u32, m: u32, x: f64) -> f64 {
    let mut pmm = 1.0;
    if m > 0 {
        let somx2 = ((1.0 - x) * (1.0 + x)).sqrt();
        let mut fact = 1.0;
        for _ in 0..m {
            pmm *= -fact * somx2;
            fact += 2.0;
        }
    }
    if l == m {
        return pmm;
    }
    let mut pmmp1 = x * f64::from(2 * m + 1) * pmm;
    if l == m + 1 {
        return pmmp1;
    }
    let mut pll = 0.0;
    for ll in (m + 2)..=l {
        pll = (x * f64::from(2 * ll - 1) * pmmp1 - f64::from(ll + m - 1) * pmm)
            / f64::from(ll - m);
        pmm = pmmp1;
        pmmp1 = pll;
    }
    pll
}

fn factorial(n: u32) -> f64 {
    (1..=n).map(f64::from).product()
}

/// Reference $`Y_l^m`$ built from the general normalisation formula.
fn sh_reference(l: u32, m: i32, theta: f64, phi: f64) -> Complex<f64> {
    let absm = m.unsigned_abs();
    let norm = (f64::from(2 * l + 1) / (4.0 * PI) * factorial(l - absm) / factorial(l + absm))
        .sqrt();
    let plm = legendre_reference(l, absm, theta.cos());
    let ypos = Complex::from_polar(norm * plm, f64::from(absm as i32) * phi);
    if m >= 0 {
        ypos
    } else {
        // Y_l^{-m} = (-1)^m conj(Y_l^m)
        let sign = if absm % 2 == 0 { 1.0 } else { -1.0 };
        ypos.conj() * sign
    }
}

#[test]
fn test_spherical_harmonics_count() {
    assert_eq!(tabulated_lm().count(), 49);
    assert!(tabulated_lm().all(|(l, m)| sh_formula(l, m).is_ok()));
}

#[test]
fn test_spherical_harmonics_y00() {
    let y00_ref = 1.0 / (2.0 * PI.sqrt());
    for (theta, phi) in [(0.0, 0.0), (0.3, 1.2), (PI / 2.0, 5.9), (PI, -2.0)] {
        let y00 = sh(0, 0, theta, phi).unwrap();
        assert_relative_eq!(y00.re, y00_ref, epsilon = 1e-15);
        assert_abs_diff_eq!(y00.im, 0.0);
    }
}

#[test]
fn test_spherical_harmonics_all_entries_against_reference() {
    let angles = [
        (0.1, 0.2),
        (0.7, 2.9),
        (1.3, -1.1),
        (PI / 2.0, 0.4),
        (2.2, 4.4),
        (3.0, 6.0),
    ];
    for (l, m) in tabulated_lm() {
        for &(theta, phi) in angles.iter() {
            let y = sh(l, m, theta, phi).unwrap();
            let y_ref = sh_reference(l, m, theta, phi);
            assert_abs_diff_eq!(y.re, y_ref.re, epsilon = 1e-12);
            assert_abs_diff_eq!(y.im, y_ref.im, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_spherical_harmonics_condon_shortley_phase() {
    // Y_l^{-m} = (-1)^m conj(Y_l^m)
    for (l, m) in tabulated_lm().filter(|(_, m)| *m > 0) {
        let y_pos = sh(l, m, 0.8, 1.7).unwrap();
        let y_neg = sh(l, -m, 0.8, 1.7).unwrap();
        let sign = if m % 2 == 0 { 1.0 } else { -1.0 };
        assert_abs_diff_eq!(y_neg.re, sign * y_pos.re, epsilon = 1e-14);
        assert_abs_diff_eq!(y_neg.im, -sign * y_pos.im, epsilon = 1e-14);
    }

    // Positive odd m carries the negative sign at phi = 0.
    let y11 = sh(1, 1, PI / 2.0, 0.0).unwrap();
    assert!(y11.re < 0.0);
    let y22 = sh(2, 2, PI / 2.0, 0.0).unwrap();
    assert!(y22.re > 0.0);
}

#[test]
fn test_spherical_harmonics_normalisation() {
    let n_theta = 400;
    let n_phi = 64;
    let dtheta = PI / n_theta as f64;
    let dphi = 2.0 * PI / n_phi as f64;
    for (l, m) in [(0, 0), (1, -1), (2, 2), (3, 0), (4, -3), (5, 5), (6, -2), (6, 6)] {
        let formula = sh_formula(l, m).unwrap();
        let integral = (0..n_theta)
            .flat_map(|i| (0..n_phi).map(move |j| (i, j)))
            .map(|(i, j)| {
                let theta = (i as f64 + 0.5) * dtheta;
                let phi = (j as f64 + 0.5) * dphi;
                formula(theta, phi).norm_sqr() * theta.sin() * dtheta * dphi
            })
            .sum::<f64>();
        assert_abs_diff_eq!(integral, 1.0, epsilon = 1e-4);
    }
}

#[test]
fn test_spherical_harmonics_orthogonality() {
    let n_theta = 300;
    let n_phi = 48;
    let dtheta = PI / n_theta as f64;
    let dphi = 2.0 * PI / n_phi as f64;
    for ((l1, m1), (l2, m2)) in [((1, 0), (3, 0)), ((2, 1), (2, -1)), ((4, 2), (6, 2))] {
        let f1 = sh_formula(l1, m1).unwrap();
        let f2 = sh_formula(l2, m2).unwrap();
        let overlap = (0..n_theta)
            .flat_map(|i| (0..n_phi).map(move |j| (i, j)))
            .map(|(i, j)| {
                let theta = (i as f64 + 0.5) * dtheta;
                let phi = (j as f64 + 0.5) * dphi;
                f1(theta, phi).conj() * f2(theta, phi) * (theta.sin() * dtheta * dphi)
            })
            .sum::<Complex<f64>>();
        assert_abs_diff_eq!(overlap.norm(), 0.0, epsilon = 1e-4);
    }
}

#[test]
fn test_spherical_harmonics_unsupported() {
    for (l, m) in [(7, 0), (2, 3), (0, -1), (6, -7), (100, 0)] {
        let err = sh(l, m, 0.5, 0.5).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SharpoError>(),
            Some(&SharpoError::UnsupportedQuantumNumbers { l, m })
        );
    }
}

#[test]
fn test_spherical_harmonics_broadcast() {
    let theta = array![[0.1, 0.5, 0.9], [1.3, 1.7, 2.1]];
    let phi = array![[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]];
    let y = sh_array(4, -2, &theta, &phi).unwrap();
    assert_eq!(y.shape(), &[2, 3]);
    for ((&t, &p), &v) in theta.iter().zip(phi.iter()).zip(y.iter()) {
        assert_eq!(v, sh(4, -2, t, p).unwrap());
    }

    let theta_1d = Array1::linspace(0.0, PI, 11);
    let phi_1d = Array1::from_elem(11, 0.3);
    let y_1d = sh_array(1, 0, &theta_1d, &phi_1d).unwrap();
    assert_relative_eq!(y_1d[0].re, 0.5 * (3.0 / PI).sqrt(), epsilon = 1e-15);
    assert_relative_eq!(y_1d[10].re, -0.5 * (3.0 / PI).sqrt(), epsilon = 1e-15);

    let phi_bad = Array2::<f64>::zeros((3, 2));
    let err = sh_array(1, 0, &theta, &phi_bad).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SharpoError>(),
        Some(SharpoError::ParameterValidation(_))
    ));
}

proptest! {
    #[test]
    fn test_spherical_harmonics_modulus_phi_independent(
        theta in 0.0..PI,
        phi_1 in -10.0..10.0f64,
        phi_2 in -10.0..10.0f64,
    ) {
        for (l, m) in tabulated_lm() {
            let y1 = sh(l, m, theta, phi_1).unwrap();
            let y2 = sh(l, m, theta, phi_2).unwrap();
            prop_assert!((y1.norm() - y2.norm()).abs() < 1e-12);
        }
    }

    #[test]
    fn test_spherical_harmonics_rejects_beyond_lmax(l in (SH_LMAX + 1)..50u32, m in -3..3i32) {
        prop_assert!(sh(l, m, 0.1, 0.2).is_err());
    }
}
