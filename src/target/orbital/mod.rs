//! Molecular orbitals and the wavefunction model they belong to.

use std::fmt;

use anyhow::{self, format_err};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::auxiliary::constants::PhysicalConstants;
use crate::basis::ao::BasisAngularOrder;
use crate::errors::SharpoError;
use crate::io::format::write_subtitle;

pub mod selection;


// ==================
// Struct definitions
// ==================

// -----------
// OrbitalSpin
// -----------

/// Enumerated type for the spin space an orbital belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum OrbitalSpin {
    /// The orbital carries no recognisable spin label.
    Unspecified,

    /// The orbital is an $`\alpha`$-spin orbital.
    Alpha,

    /// The orbital is a $`\beta`$-spin orbital.
    Beta,
}

impl OrbitalSpin {
    /// Deduces the spin space from a symmetry label. Labels containing `_a` are $`\alpha`$ and
    /// labels containing `_b` are $`\beta`$; `_a` takes precedence if both are present.
    pub fn from_symmetry_label(label: &str) -> Self {
        if label.contains("_a") {
            OrbitalSpin::Alpha
        } else if label.contains("_b") {
            OrbitalSpin::Beta
        } else {
            OrbitalSpin::Unspecified
        }
    }
}

impl fmt::Display for OrbitalSpin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrbitalSpin::Unspecified => write!(f, "--"),
            OrbitalSpin::Alpha => write!(f, "α"),
            OrbitalSpin::Beta => write!(f, "β"),
        }
    }
}

// ----------------
// MolecularOrbital
// ----------------

/// Structure holding one molecular orbital as delivered by the upstream wavefunction parser.
#[derive(Clone, Builder, Debug, PartialEq, Serialize, Deserialize)]
pub struct MolecularOrbital {
    /// The 1-based index of this orbital in the wavefunction model.
    pub index: usize,

    /// The orbital energy in Hartree.
    pub energy: f64,

    /// The occupation number of this orbital.
    #[builder(default = "0.0")]
    #[serde(default)]
    pub occupation: f64,

    /// The symmetry label of this orbital, which also encodes its spin space.
    #[builder(setter(into), default = "String::new()")]
    #[serde(default)]
    pub symmetry: String,

    /// The expansion coefficients with respect to the atomic-orbital basis functions.
    #[builder(setter(custom))]
    pub coefficients: Vec<f64>,
}

impl MolecularOrbitalBuilder {
    pub fn coefficients(&mut self, cs: &[f64]) -> &mut Self {
        self.coefficients = Some(cs.to_vec());
        self
    }
}

impl MolecularOrbital {
    /// Returns a builder to construct a new [`MolecularOrbital`].
    pub fn builder() -> MolecularOrbitalBuilder {
        MolecularOrbitalBuilder::default()
    }

    /// The spin space of this orbital deduced from its symmetry label.
    pub fn spin(&self) -> OrbitalSpin {
        OrbitalSpin::from_symmetry_label(&self.symmetry)
    }

    /// The number of expansion coefficients of this orbital.
    pub fn n_coefficients(&self) -> usize {
        self.coefficients.len()
    }
}

// -----------------
// WavefunctionModel
// -----------------

/// Structure holding the materialised wavefunction: the atomic-orbital basis layout and the
/// molecular orbitals expanded in it. The model is read-only for everything downstream.
#[derive(Clone, Builder, Debug, PartialEq, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate", error = "anyhow::Error"))]
pub struct WavefunctionModel {
    /// The atomic-orbital basis layout.
    bao: BasisAngularOrder,

    /// The molecular orbitals in their external order.
    #[builder(setter(custom))]
    orbitals: Vec<MolecularOrbital>,
}

impl WavefunctionModelBuilder {
    pub fn orbitals(&mut self, mos: &[MolecularOrbital]) -> &mut Self {
        self.orbitals = Some(mos.to_vec());
        self
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        let bao = self
            .bao
            .as_ref()
            .ok_or_else(|| format_err!("No basis angular order found."))?;
        let orbitals = self
            .orbitals
            .as_ref()
            .ok_or_else(|| format_err!("No molecular orbitals found."))?;
        check_model(bao, orbitals)
    }
}

/// Checks the internal consistency of a basis layout and its orbitals.
fn check_model(bao: &BasisAngularOrder, orbitals: &[MolecularOrbital]) -> Result<(), anyhow::Error> {
    bao.verify()?;
    if let Some((i, mo)) = orbitals
        .iter()
        .enumerate()
        .find(|(i, mo)| mo.index != i + 1)
    {
        return Err(SharpoError::ModelConsistency(format!(
            "Orbital at position {i} carries index {} instead of {}.",
            mo.index,
            i + 1
        ))
        .into());
    }
    if let Some(first) = orbitals.first() {
        let ncoeffs = first.n_coefficients();
        if let Some(mo) = orbitals.iter().find(|mo| mo.n_coefficients() != ncoeffs) {
            return Err(SharpoError::ModelConsistency(format!(
                "Orbital {} has {} coefficients, but orbital {} has {ncoeffs}.",
                mo.index,
                mo.n_coefficients(),
                first.index
            ))
            .into());
        }
    }
    Ok(())
}

impl WavefunctionModel {
    /// Returns a builder to construct a new [`WavefunctionModel`].
    pub fn builder() -> WavefunctionModelBuilder {
        WavefunctionModelBuilder::default()
    }

    /// Verifies the internal consistency of this model. This is needed after deserialisation,
    /// which bypasses the builder validation.
    pub fn verify(&self) -> Result<(), anyhow::Error> {
        check_model(&self.bao, &self.orbitals)
    }

    /// The atomic-orbital basis layout.
    pub fn bao(&self) -> &BasisAngularOrder {
        &self.bao
    }

    /// The molecular orbitals in their external order.
    pub fn orbitals(&self) -> &[MolecularOrbital] {
        &self.orbitals
    }

    /// The number of molecular orbitals.
    pub fn n_orbitals(&self) -> usize {
        self.orbitals.len()
    }

    /// The number of atoms carrying basis functions.
    pub fn n_atoms(&self) -> usize {
        self.bao.n_atoms()
    }

    /// Retrieves an orbital by its 1-based index.
    ///
    /// # Errors
    ///
    /// Errors with [`SharpoError::IndexOutOfRange`] if `index` lies outside $`[1, N]`$.
    pub fn orbital(&self, index: usize) -> Result<&MolecularOrbital, anyhow::Error> {
        index
            .checked_sub(1)
            .and_then(|i| self.orbitals.get(i))
            .ok_or_else(|| {
                SharpoError::IndexOutOfRange {
                    index,
                    n_orbitals: self.n_orbitals(),
                }
                .into()
            })
    }

    /// Returns `true` if at least one orbital carries an $`\alpha`$ or $`\beta`$ spin label.
    pub fn is_spin_labelled(&self) -> bool {
        self.orbitals
            .iter()
            .any(|mo| mo.spin() != OrbitalSpin::Unspecified)
    }

    /// The highest occupied molecular orbital, if any orbital is occupied.
    pub fn homo(&self) -> Option<&MolecularOrbital> {
        self.orbitals
            .iter()
            .filter(|mo| mo.occupation > 0.0)
            .max_by(|a, b| a.energy.total_cmp(&b.energy))
    }

    /// The energy of the highest occupied molecular orbital in electronvolts, or zero if no
    /// orbital is occupied.
    pub fn fermi_offset_ev(&self, constants: &PhysicalConstants) -> f64 {
        self.homo()
            .map(|homo| constants.to_ev(homo.energy))
            .unwrap_or(0.0)
    }

    /// Returns a displayable listing of all orbital energies.
    pub fn energy_table<'a>(&'a self, constants: &'a PhysicalConstants) -> OrbitalEnergyTable<'a> {
        OrbitalEnergyTable {
            model: self,
            constants,
        }
    }
}

// --------------------
// OrbitalEnergyTable
// --------------------

/// Structure for displaying the orbital energies of a wavefunction model.
pub struct OrbitalEnergyTable<'a> {
    model: &'a WavefunctionModel,
    constants: &'a PhysicalConstants,
}

impl<'a> fmt::Display for OrbitalEnergyTable<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_subtitle(f, "Molecular orbital energies")?;
        writeln!(f)?;
        let index_length = self
            .model
            .n_orbitals()
            .to_string()
            .chars()
            .count()
            .max(1);
        let sym_length = self
            .model
            .orbitals()
            .iter()
            .map(|mo| mo.symmetry.chars().count())
            .max()
            .unwrap_or(3)
            .max(3);
        let homo_index = self.model.homo().map(|homo| homo.index);
        let width = index_length + sym_length + 52;
        writeln!(f, "{}", "┈".repeat(width))?;
        writeln!(
            f,
            " {:>index_length$}  {:<sym_length$}  Spin  {:>6}  {:>14}  {:>14}",
            "#", "Sym", "Occ.", "E / a.u.", "E / eV"
        )?;
        writeln!(f, "{}", "┈".repeat(width))?;
        for mo in self.model.orbitals() {
            writeln!(
                f,
                " {:>index_length$}  {:<sym_length$}  {:<4}  {:>6.3}  {:>14.8}  {:>14.8}{}",
                mo.index,
                mo.symmetry,
                mo.spin().to_string(),
                mo.occupation,
                mo.energy,
                self.constants.to_ev(mo.energy),
                if Some(mo.index) == homo_index {
                    "  ← HOMO"
                } else {
                    ""
                }
            )?;
        }
        writeln!(f, "{}", "┈".repeat(width))?;
        Ok(())
    }
}

impl<'a> fmt::Debug for OrbitalEnergyTable<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{self}")
    }
}
