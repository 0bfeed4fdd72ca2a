//! # Sharpo: Spherical HARmonics - Projected Orbitals
//!
//! Sharpo decomposes molecular orbitals into atom- and shell-resolved contributions and turns
//! them into projected densities of states. Given a wavefunction model (an atomic-orbital basis
//! layout and molecular-orbital coefficients), it
//! - sums the absolute coefficients of every selected orbital per atom and per angular-momentum
//!   shell ($`s`$ to $`g`$),
//! - broadens the resulting discrete spectrum with normalised Gaussians on a uniform energy grid,
//!   optionally in separate $`\alpha`$ and $`\beta`$ channels and relative to the highest occupied
//!   orbital, and
//! - writes fixed-width numeric tables per atom and summed over all atoms.
//!
//! Complex spherical harmonics up to $`l = 6`$ are tabulated in [`angmom::spherical_harmonics`] for
//! angular-decomposition consumers.
//!
//! ## Examples and usage
//!
//! For most items (structs, enums, functions, and traits), their usages are illustrated in test
//! functions. The `sharpo` binary reads a YAML input file; run `sharpo --template` to obtain a
//! starting point.
//!
//! ## License
//!
//! GNU Lesser General Public License v3.0.

pub mod angmom;
pub mod auxiliary;
pub mod basis;
pub mod drivers;
pub mod errors;
pub mod interfaces;
pub mod io;
pub mod projection;
pub mod smearing;
pub mod target;
