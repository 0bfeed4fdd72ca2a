//! Closed-form complex spherical harmonics $`Y_l^m(\theta, \phi)`$ for $`0 \le l \le 6`$.
//!
//! The functions follow the standard normalisation
//!
//! ```math
//!     \int_0^{2\pi} \int_0^{\pi} \lvert Y_l^m(\theta, \phi) \rvert^2 \sin\theta \,
//!     \mathrm{d}\theta \, \mathrm{d}\phi = 1
//! ```
//!
//! and include the Condon--Shortley phase $`(-1)^m`$ for positive odd $`m`$. Every tabulated
//! $`(l, m)`$ pair has its own explicit trigonometric expression; there is no recursion and
//! nothing is derived at run time.

use std::f64::consts::PI;

use anyhow::{self, ensure};
use ndarray::{Array, ArrayBase, Data, Dimension, Zip};
use num_complex::Complex;

use crate::errors::SharpoError;

#[cfg(test)]
#[path = "spherical_harmonics_tests.rs"]
mod spherical_harmonics_tests;

/// The largest angular momentum for which closed forms are tabulated.
pub const SH_LMAX: u32 = 6;

/// Signature of a tabulated spherical-harmonic formula taking $`(\theta, \phi)`$ in radians.
pub type ShFormula = fn(f64, f64) -> Complex<f64>;

/// Returns $`e^{\mathrm{i} m \phi}`$.
#[inline]
fn cis(m: i32, phi: f64) -> Complex<f64> {
    Complex::from_polar(1.0, f64::from(m) * phi)
}

/// Looks up the closed-form expression for $`Y_l^m`$.
///
/// # Arguments
///
/// * `l` - The angular momentum quantum number, $`0 \le l \le 6`$.
/// * `m` - The magnetic quantum number, $`-l \le m \le l`$.
///
/// # Errors
///
/// Errors with [`SharpoError::UnsupportedQuantumNumbers`] if $`(l, m)`$ is not tabulated.
pub fn sh_formula(l: u32, m: i32) -> Result<ShFormula, anyhow::Error> {
    let formula: ShFormula = match (l, m) {
        // -----
        // l = 0
        // -----
        (0, 0) => |_, _| Complex::new(0.5 * (1.0 / PI).sqrt(), 0.0),

        // -----
        // l = 1
        // -----
        (1, -1) => |t, p| cis(-1, p) * (0.5 * (3.0 / (2.0 * PI)).sqrt() * t.sin()),
        (1, 0) => |t, _| Complex::new(0.5 * (3.0 / PI).sqrt() * t.cos(), 0.0),
        (1, 1) => |t, p| cis(1, p) * (-0.5 * (3.0 / (2.0 * PI)).sqrt() * t.sin()),

        // -----
        // l = 2
        // -----
        (2, -2) => |t, p| cis(-2, p) * (0.25 * (15.0 / (2.0 * PI)).sqrt() * t.sin().powi(2)),
        (2, -1) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(-1, p) * (0.5 * (15.0 / (2.0 * PI)).sqrt() * s * c)
        },
        (2, 0) => |t, _| {
            let c = t.cos();
            Complex::new(0.25 * (5.0 / PI).sqrt() * (3.0 * c.powi(2) - 1.0), 0.0)
        },
        (2, 1) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(1, p) * (-0.5 * (15.0 / (2.0 * PI)).sqrt() * s * c)
        },
        (2, 2) => |t, p| cis(2, p) * (0.25 * (15.0 / (2.0 * PI)).sqrt() * t.sin().powi(2)),

        // -----
        // l = 3
        // -----
        (3, -3) => |t, p| cis(-3, p) * (0.125 * (35.0 / PI).sqrt() * t.sin().powi(3)),
        (3, -2) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(-2, p) * (0.25 * (105.0 / (2.0 * PI)).sqrt() * s.powi(2) * c)
        },
        (3, -1) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(-1, p) * (0.125 * (21.0 / PI).sqrt() * s * (5.0 * c.powi(2) - 1.0))
        },
        (3, 0) => |t, _| {
            let c = t.cos();
            Complex::new(
                0.25 * (7.0 / PI).sqrt() * (5.0 * c.powi(3) - 3.0 * c),
                0.0,
            )
        },
        (3, 1) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(1, p) * (-0.125 * (21.0 / PI).sqrt() * s * (5.0 * c.powi(2) - 1.0))
        },
        (3, 2) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(2, p) * (0.25 * (105.0 / (2.0 * PI)).sqrt() * s.powi(2) * c)
        },
        (3, 3) => |t, p| cis(3, p) * (-0.125 * (35.0 / PI).sqrt() * t.sin().powi(3)),

        // -----
        // l = 4
        // -----
        (4, -4) => |t, p| cis(-4, p) * (3.0 / 16.0 * (35.0 / (2.0 * PI)).sqrt() * t.sin().powi(4)),
        (4, -3) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(-3, p) * (3.0 / 8.0 * (35.0 / PI).sqrt() * s.powi(3) * c)
        },
        (4, -2) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(-2, p) * (3.0 / 8.0 * (5.0 / (2.0 * PI)).sqrt() * s.powi(2) * (7.0 * c.powi(2) - 1.0))
        },
        (4, -1) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(-1, p) * (3.0 / 8.0 * (5.0 / PI).sqrt() * s * (7.0 * c.powi(3) - 3.0 * c))
        },
        (4, 0) => |t, _| {
            let c = t.cos();
            Complex::new(
                3.0 / 16.0 * (1.0 / PI).sqrt() * (35.0 * c.powi(4) - 30.0 * c.powi(2) + 3.0),
                0.0,
            )
        },
        (4, 1) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(1, p) * (-3.0 / 8.0 * (5.0 / PI).sqrt() * s * (7.0 * c.powi(3) - 3.0 * c))
        },
        (4, 2) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(2, p) * (3.0 / 8.0 * (5.0 / (2.0 * PI)).sqrt() * s.powi(2) * (7.0 * c.powi(2) - 1.0))
        },
        (4, 3) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(3, p) * (-3.0 / 8.0 * (35.0 / PI).sqrt() * s.powi(3) * c)
        },
        (4, 4) => |t, p| cis(4, p) * (3.0 / 16.0 * (35.0 / (2.0 * PI)).sqrt() * t.sin().powi(4)),

        // -----
        // l = 5
        // -----
        (5, -5) => |t, p| cis(-5, p) * (3.0 / 32.0 * (77.0 / PI).sqrt() * t.sin().powi(5)),
        (5, -4) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(-4, p) * (3.0 / 16.0 * (385.0 / (2.0 * PI)).sqrt() * s.powi(4) * c)
        },
        (5, -3) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(-3, p) * (1.0 / 32.0 * (385.0 / PI).sqrt() * s.powi(3) * (9.0 * c.powi(2) - 1.0))
        },
        (5, -2) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(-2, p) * (0.125 * (1155.0 / (2.0 * PI)).sqrt() * s.powi(2) * (3.0 * c.powi(3) - c))
        },
        (5, -1) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(-1, p)
                * (1.0 / 16.0
                    * (165.0 / (2.0 * PI)).sqrt()
                    * s
                    * (21.0 * c.powi(4) - 14.0 * c.powi(2) + 1.0))
        },
        (5, 0) => |t, _| {
            let c = t.cos();
            Complex::new(
                1.0 / 16.0
                    * (11.0 / PI).sqrt()
                    * (63.0 * c.powi(5) - 70.0 * c.powi(3) + 15.0 * c),
                0.0,
            )
        },
        (5, 1) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(1, p)
                * (-1.0 / 16.0
                    * (165.0 / (2.0 * PI)).sqrt()
                    * s
                    * (21.0 * c.powi(4) - 14.0 * c.powi(2) + 1.0))
        },
        (5, 2) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(2, p) * (0.125 * (1155.0 / (2.0 * PI)).sqrt() * s.powi(2) * (3.0 * c.powi(3) - c))
        },
        (5, 3) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(3, p) * (-1.0 / 32.0 * (385.0 / PI).sqrt() * s.powi(3) * (9.0 * c.powi(2) - 1.0))
        },
        (5, 4) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(4, p) * (3.0 / 16.0 * (385.0 / (2.0 * PI)).sqrt() * s.powi(4) * c)
        },
        (5, 5) => |t, p| cis(5, p) * (-3.0 / 32.0 * (77.0 / PI).sqrt() * t.sin().powi(5)),

        // -----
        // l = 6
        // -----
        (6, -6) => |t, p| cis(-6, p) * (1.0 / 64.0 * (3003.0 / PI).sqrt() * t.sin().powi(6)),
        (6, -5) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(-5, p) * (3.0 / 32.0 * (1001.0 / PI).sqrt() * s.powi(5) * c)
        },
        (6, -4) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(-4, p)
                * (3.0 / 32.0 * (91.0 / (2.0 * PI)).sqrt() * s.powi(4) * (11.0 * c.powi(2) - 1.0))
        },
        (6, -3) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(-3, p)
                * (1.0 / 32.0 * (1365.0 / PI).sqrt() * s.powi(3) * (11.0 * c.powi(3) - 3.0 * c))
        },
        (6, -2) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(-2, p)
                * (1.0 / 64.0
                    * (1365.0 / PI).sqrt()
                    * s.powi(2)
                    * (33.0 * c.powi(4) - 18.0 * c.powi(2) + 1.0))
        },
        (6, -1) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(-1, p)
                * (1.0 / 16.0
                    * (273.0 / (2.0 * PI)).sqrt()
                    * s
                    * (33.0 * c.powi(5) - 30.0 * c.powi(3) + 5.0 * c))
        },
        (6, 0) => |t, _| {
            let c = t.cos();
            Complex::new(
                1.0 / 32.0
                    * (13.0 / PI).sqrt()
                    * (231.0 * c.powi(6) - 315.0 * c.powi(4) + 105.0 * c.powi(2) - 5.0),
                0.0,
            )
        },
        (6, 1) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(1, p)
                * (-1.0 / 16.0
                    * (273.0 / (2.0 * PI)).sqrt()
                    * s
                    * (33.0 * c.powi(5) - 30.0 * c.powi(3) + 5.0 * c))
        },
        (6, 2) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(2, p)
                * (1.0 / 64.0
                    * (1365.0 / PI).sqrt()
                    * s.powi(2)
                    * (33.0 * c.powi(4) - 18.0 * c.powi(2) + 1.0))
        },
        (6, 3) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(3, p)
                * (-1.0 / 32.0 * (1365.0 / PI).sqrt() * s.powi(3) * (11.0 * c.powi(3) - 3.0 * c))
        },
        (6, 4) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(4, p)
                * (3.0 / 32.0 * (91.0 / (2.0 * PI)).sqrt() * s.powi(4) * (11.0 * c.powi(2) - 1.0))
        },
        (6, 5) => |t, p| {
            let (s, c) = t.sin_cos();
            cis(5, p) * (-3.0 / 32.0 * (1001.0 / PI).sqrt() * s.powi(5) * c)
        },
        (6, 6) => |t, p| cis(6, p) * (1.0 / 64.0 * (3003.0 / PI).sqrt() * t.sin().powi(6)),

        _ => return Err(SharpoError::UnsupportedQuantumNumbers { l, m }.into()),
    };
    Ok(formula)
}

/// Iterates over every tabulated $`(l, m)`$ pair in increasing-$`l`$, increasing-$`m`$ order.
pub fn tabulated_lm() -> impl Iterator<Item = (u32, i32)> {
    (0..=SH_LMAX).flat_map(|l| {
        let l_i32 = l as i32;
        (-l_i32..=l_i32).map(move |m| (l, m))
    })
}

/// Evaluates $`Y_l^m(\theta, \phi)`$ at a single point.
///
/// # Arguments
///
/// * `l` - The angular momentum quantum number.
/// * `m` - The magnetic quantum number.
/// * `theta` - The polar angle in radians.
/// * `phi` - The azimuthal angle in radians.
///
/// # Errors
///
/// Errors with [`SharpoError::UnsupportedQuantumNumbers`] if $`(l, m)`$ is not tabulated.
pub fn sh(l: u32, m: i32, theta: f64, phi: f64) -> Result<Complex<f64>, anyhow::Error> {
    sh_formula(l, m).map(|formula| formula(theta, phi))
}

/// Evaluates $`Y_l^m`$ element-wise over arrays of polar and azimuthal angles of identical
/// shape.
///
/// # Arguments
///
/// * `l` - The angular momentum quantum number.
/// * `m` - The magnetic quantum number.
/// * `theta` - An array of polar angles in radians.
/// * `phi` - An array of azimuthal angles in radians with the same shape as `theta`.
///
/// # Returns
///
/// An array of the same shape containing the complex function values.
///
/// # Errors
///
/// Errors with [`SharpoError::UnsupportedQuantumNumbers`] if $`(l, m)`$ is not tabulated, or with
/// [`SharpoError::ParameterValidation`] if the two angle arrays differ in shape.
pub fn sh_array<S1, S2, D>(
    l: u32,
    m: i32,
    theta: &ArrayBase<S1, D>,
    phi: &ArrayBase<S2, D>,
) -> Result<Array<Complex<f64>, D>, anyhow::Error>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    let formula = sh_formula(l, m)?;
    ensure!(
        theta.shape() == phi.shape(),
        SharpoError::ParameterValidation(format!(
            "Mismatched angle grids: theta has shape {:?} but phi has shape {:?}.",
            theta.shape(),
            phi.shape()
        ))
    );
    Ok(Zip::from(theta)
        .and(phi)
        .map_collect(|&t, &p| formula(t, p)))
}
