//! Selection of the molecular orbitals entering a projection.

use std::collections::HashSet;
use std::fmt;
use std::slice::Iter;

use anyhow::{self, ensure};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::auxiliary::constants::PhysicalConstants;
use crate::errors::SharpoError;
use crate::target::orbital::WavefunctionModel;

/// Energy windows whose two ends both lie within this distance of zero are treated as unset.
const UNSET_WINDOW_THRESHOLD: f64 = 1e-3;

/// The narrowest admissible explicit energy window in electronvolts.
const MIN_WINDOW_WIDTH: f64 = 0.1;

/// Structure holding an ordered, duplicate-free list of 1-based orbital indices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOrbitalSet {
    indices: Vec<usize>,
}

impl SelectedOrbitalSet {
    /// Constructs a selection from explicit 1-based indices.
    ///
    /// # Errors
    ///
    /// Errors with [`SharpoError::ParameterValidation`] if an index is repeated, or with
    /// [`SharpoError::IndexOutOfRange`] if an index lies outside $`[1, N]`$.
    pub fn new(indices: &[usize], model: &WavefunctionModel) -> Result<Self, anyhow::Error> {
        let selection = Self {
            indices: indices.to_vec(),
        };
        selection.verify(model)?;
        Ok(selection)
    }

    /// Selects every orbital of the model in its external order.
    pub fn all(model: &WavefunctionModel) -> Self {
        Self {
            indices: (1..=model.n_orbitals()).collect_vec(),
        }
    }

    /// Selects the orbitals whose energies, converted to electronvolts and shifted by
    /// `offset_ev`, lie within the closed window `window_ev`.
    pub fn from_energy_window(
        model: &WavefunctionModel,
        window_ev: (f64, f64),
        offset_ev: f64,
        constants: &PhysicalConstants,
    ) -> Self {
        let (emin, emax) = window_ev;
        let indices = model
            .orbitals()
            .iter()
            .filter(|mo| {
                let e = constants.to_ev(mo.energy) - offset_ev;
                emin <= e && e <= emax
            })
            .map(|mo| mo.index)
            .collect_vec();
        Self { indices }
    }

    /// Checks this selection against a wavefunction model.
    pub fn verify(&self, model: &WavefunctionModel) -> Result<(), anyhow::Error> {
        let unique = self.indices.iter().collect::<HashSet<_>>();
        ensure!(
            unique.len() == self.indices.len(),
            SharpoError::ParameterValidation(
                "The orbital selection contains duplicate indices.".to_string()
            )
        );
        let n_orbitals = model.n_orbitals();
        if let Some(&index) = self.indices.iter().find(|&&i| i == 0 || i > n_orbitals) {
            return Err(SharpoError::IndexOutOfRange { index, n_orbitals }.into());
        }
        Ok(())
    }

    /// Iterates over the selected 1-based indices in selection order.
    pub fn iter(&'_ self) -> Iter<'_, usize> {
        self.indices.iter()
    }

    /// The selected 1-based indices in selection order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// The number of selected orbitals.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns `true` if no orbital is selected.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl fmt::Display for SelectedOrbitalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.indices.iter().join(", "))
    }
}

/// Normalises a user-supplied energy window.
///
/// A reversed window is swapped. A window whose two ends are both (numerically) zero means that
/// no window has been set, in which case `None` is returned.
///
/// # Errors
///
/// Errors with [`SharpoError::ParameterValidation`] if the window is narrower than 0.1 eV while
/// being set, or if either end is not finite.
pub fn normalise_energy_window(window: (f64, f64)) -> Result<Option<(f64, f64)>, anyhow::Error> {
    let (a, b) = window;
    ensure!(
        a.is_finite() && b.is_finite(),
        SharpoError::ParameterValidation(format!(
            "The energy window ({a}, {b}) is not finite."
        ))
    );
    let (emin, emax) = if a > b { (b, a) } else { (a, b) };
    if emin.abs() < UNSET_WINDOW_THRESHOLD && emax.abs() < UNSET_WINDOW_THRESHOLD {
        return Ok(None);
    }
    ensure!(
        emax - emin >= MIN_WINDOW_WIDTH
            || emin.abs() < UNSET_WINDOW_THRESHOLD
            || emax.abs() < UNSET_WINDOW_THRESHOLD,
        SharpoError::ParameterValidation(format!(
            "Emin = {emin} eV and Emax = {emax} eV are too close to each other. Please choose a larger energy range."
        ))
    );
    Ok(Some((emin, emax)))
}
