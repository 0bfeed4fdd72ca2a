//! Accumulation of coefficient magnitudes per orbital, atom, and shell type.

use std::fmt;

use anyhow::{self, ensure};
use derive_builder::Builder;
use ndarray::{s, Array2, Array3, ArrayView1, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::basis::ao::{ShellCountPolicy, ShellType};
use crate::errors::SharpoError;
use crate::target::orbital::selection::SelectedOrbitalSet;
use crate::target::orbital::WavefunctionModel;

#[cfg(test)]
#[path = "shell_projection_tests.rs"]
mod shell_projection_tests;

// ----------------
// ProjectionTensor
// ----------------

/// Structure holding the accumulated coefficient magnitudes of a set of selected orbitals.
///
/// The underlying array has shape `(n_selected, n_atoms, ShellType::COUNT)`; the first axis
/// follows the selection order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectionTensor {
    selection: SelectedOrbitalSet,
    magnitudes: Array3<f64>,
}

impl ProjectionTensor {
    /// The orbital selection this tensor was built for.
    pub fn selection(&self) -> &SelectedOrbitalSet {
        &self.selection
    }

    /// The raw magnitude array of shape `(n_selected, n_atoms, ShellType::COUNT)`.
    pub fn magnitudes(&self) -> &Array3<f64> {
        &self.magnitudes
    }

    /// The number of atoms resolved by this tensor.
    pub fn n_atoms(&self) -> usize {
        self.magnitudes.shape()[1]
    }

    /// The magnitude for the orbital at position `pos` in the selection, on atom `atom`, in
    /// shells of type `shell_type`.
    pub fn magnitude(&self, pos: usize, atom: usize, shell_type: ShellType) -> f64 {
        self.magnitudes[[pos, atom, shell_type.index()]]
    }

    /// The shell-resolved magnitudes for one selected orbital on one atom.
    pub fn shell_magnitudes(&self, pos: usize, atom: usize) -> ArrayView1<'_, f64> {
        self.magnitudes.slice(s![pos, atom, ..])
    }

    /// The shell-resolved magnitudes summed over atoms, of shape
    /// `(n_selected, ShellType::COUNT)`.
    pub fn all_atoms(&self) -> Array2<f64> {
        self.magnitudes.sum_axis(Axis(1))
    }
}

impl fmt::Display for ProjectionTensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Projection tensor over {} selected orbital{} and {} atom{}",
            self.selection.len(),
            if self.selection.len() == 1 { "" } else { "s" },
            self.n_atoms(),
            if self.n_atoms() == 1 { "" } else { "s" },
        )
    }
}

// -------------------------
// ShellCoefficientProjector
// -------------------------

/// Structure for decomposing orbital coefficients by atom and shell type.
#[derive(Clone, Builder, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellCoefficientProjector {
    /// The number of coefficients consumed per shell type.
    #[builder(default)]
    policy: ShellCountPolicy,
}

impl ShellCoefficientProjector {
    /// Returns a builder to construct a new [`ShellCoefficientProjector`].
    pub fn builder() -> ShellCoefficientProjectorBuilder {
        ShellCoefficientProjectorBuilder::default()
    }

    /// Constructs a projector consuming coefficients according to `policy`.
    pub fn new(policy: ShellCountPolicy) -> Self {
        Self { policy }
    }

    /// The shell-count policy in effect.
    pub fn policy(&self) -> &ShellCountPolicy {
        &self.policy
    }

    /// Projects the selected orbitals of a model onto atoms and shell types.
    ///
    /// Each shell consumes a fixed number of consecutive coefficients, determined by its type and
    /// by the angular counting of the basis, and the absolute values of these coefficients are
    /// accumulated into the bucket of the shell's atom and type.
    ///
    /// # Errors
    ///
    /// Errors with [`SharpoError::IndexOutOfRange`] if the selection refers to orbitals absent
    /// from the model, or with [`SharpoError::ModelConsistency`] if a selected orbital has more or
    /// fewer coefficients than the basis consumes. All checks take place before any accumulation.
    pub fn project(
        &self,
        model: &WavefunctionModel,
        selection: &SelectedOrbitalSet,
    ) -> Result<ProjectionTensor, anyhow::Error> {
        selection.verify(model)?;
        let bao = model.bao();
        let nfuncs = bao.n_funcs(&self.policy);
        let mos = selection
            .iter()
            .map(|&index| model.orbital(index))
            .collect::<Result<Vec<_>, _>>()?;
        for mo in mos.iter() {
            ensure!(
                mo.n_coefficients() == nfuncs,
                SharpoError::ModelConsistency(format!(
                    "Orbital {} has {} coefficients, but the {} basis with {} shells consumes {nfuncs}.",
                    mo.index,
                    mo.n_coefficients(),
                    bao.counting(),
                    bao.n_shells(),
                ))
            );
        }

        let boundaries = bao.shell_boundary_indices(&self.policy);
        let mut magnitudes = Array3::<f64>::zeros((selection.len(), bao.n_atoms(), ShellType::COUNT));
        magnitudes
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(mos.par_iter())
            .for_each(|(mut orbital_magnitudes, mo)| {
                for (ao, &(start, end)) in bao.iter().zip(boundaries.iter()) {
                    let bucket = &mut orbital_magnitudes[[ao.atom, ao.shell_type.index()]];
                    for c in mo.coefficients[start..end].iter() {
                        *bucket += c.abs();
                    }
                }
            });
        log::debug!(
            "Projected {} orbital(s) onto {} atom(s) using {nfuncs} coefficients each.",
            selection.len(),
            bao.n_atoms()
        );

        Ok(ProjectionTensor {
            selection: selection.clone(),
            magnitudes,
        })
    }
}

impl Default for ShellCoefficientProjector {
    fn default() -> Self {
        Self::new(ShellCountPolicy::default())
    }
}
