//! Driver for atom- and shell-resolved projected densities of orbital character.

use std::fmt;

use anyhow::{self, ensure, format_err};
use derive_builder::Builder;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::auxiliary::constants::PhysicalConstants;
use crate::basis::ao::{ShellCountPolicy, ShellType};
use crate::drivers::SharpoDriver;
use crate::errors::SharpoError;
use crate::io::format::{
    log_subtitle, nice_bool, sharpo_output, sharpo_warn, write_subtitle, write_title,
    SharpoOutput,
};
use crate::io::tables::{Table, TableEmitter, TableSink};
use crate::projection::{ProjectionTensor, ShellCoefficientProjector};
use crate::smearing::{SmearedSpectrum, SpectralSmearer};
use crate::target::orbital::selection::{normalise_energy_window, SelectedOrbitalSet};
use crate::target::orbital::WavefunctionModel;

#[cfg(test)]
#[path = "projected_dos_tests.rs"]
mod projected_dos_tests;

/// The padding, in units of sigma, added on both sides of the orbital energy range when no
/// energy window is given.
const FULL_RANGE_PADDING: f64 = 5.0;

// ----------
// Parameters
// ----------

const fn default_sigma() -> f64 {
    0.1
}

const fn default_points_per_ev() -> f64 {
    50.0
}

const fn default_true() -> bool {
    true
}

/// Structure containing control parameters for projected-density calculations.
#[derive(Clone, Builder, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectedDosParams {
    /// The Gaussian smearing width in electronvolts.
    #[builder(default = "0.1")]
    #[serde(default = "default_sigma")]
    pub sigma: f64,

    /// The number of smeared grid points per electronvolt.
    #[builder(default = "50.0")]
    #[serde(default = "default_points_per_ev")]
    pub points_per_ev: f64,

    /// The energy window in electronvolts within which orbitals are considered. If the energies
    /// are referenced to the HOMO, so is this window. `None` or `(0, 0)` means the whole range.
    #[builder(default = "None")]
    #[serde(default)]
    pub energy_window: Option<(f64, f64)>,

    /// Boolean indicating if energies are referenced to the highest occupied orbital.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub fermi_shift: bool,

    /// Boolean indicating if $`\alpha`$ and $`\beta`$ orbitals are smeared into separate
    /// channels.
    #[builder(default = "false")]
    #[serde(default)]
    pub spin_polarised: bool,

    /// Boolean indicating if the discrete per-orbital tables are to be written.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub write_discrete: bool,

    /// Boolean indicating if the smeared tables are to be written.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub write_smeared: bool,

    /// Optional Gaussian window half-width in units of sigma. Dense accumulation if `None`.
    #[builder(default = "None")]
    #[serde(default)]
    pub truncation: Option<f64>,

    /// The physical constants used for energy conversion.
    #[builder(default)]
    #[serde(default)]
    pub constants: PhysicalConstants,

    /// The number of coefficients consumed per shell type.
    #[builder(default)]
    #[serde(default)]
    pub shell_counts: ShellCountPolicy,
}

impl ProjectedDosParams {
    /// Returns a builder to construct a [`ProjectedDosParams`] structure.
    pub fn builder() -> ProjectedDosParamsBuilder {
        ProjectedDosParamsBuilder::default()
    }
}

impl Default for ProjectedDosParams {
    fn default() -> Self {
        Self::builder()
            .build()
            .expect("Unable to construct a default `ProjectedDosParams`.")
    }
}

impl fmt::Display for ProjectedDosParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_title(f, "Projected Density of Orbital Character")?;
        writeln!(f)?;
        writeln!(f, "Gaussian width (σ): {} eV", self.sigma)?;
        writeln!(f, "Grid density: {} points per eV", self.points_per_ev)?;
        writeln!(
            f,
            "Energy window: {}",
            self.energy_window
                .map(|(emin, emax)| format!("[{emin}, {emax}] eV"))
                .unwrap_or_else(|| "whole range".to_string())
        )?;
        writeln!(f, "Energies relative to HOMO: {}", nice_bool(self.fermi_shift))?;
        writeln!(f, "Spin-polarised smearing: {}", nice_bool(self.spin_polarised))?;
        if let Some(k) = self.truncation {
            writeln!(f, "Gaussian truncation: {k}σ")?;
        }
        writeln!(f, "Write discrete tables: {}", nice_bool(self.write_discrete))?;
        writeln!(f, "Write smeared tables: {}", nice_bool(self.write_smeared))?;
        writeln!(f, "Hartree to eV: {}", self.constants.hartree_to_ev)?;
        writeln!(f)?;
        writeln!(f, "Coefficients consumed per shell:")?;
        write!(f, "{}", self.shell_counts)?;
        Ok(())
    }
}

// ------
// Result
// ------

/// Structure to contain projected-density results.
#[derive(Clone, Builder)]
pub struct ProjectedDosResult<'a> {
    /// The control parameters used to obtain this set of results.
    parameters: &'a ProjectedDosParams,

    /// The wavefunction model being projected.
    model: &'a WavefunctionModel,

    /// The energy, in electronvolts, subtracted from the grid in the smeared tables.
    offset_ev: f64,

    /// The per-orbital, per-atom, per-shell magnitudes.
    tensor: ProjectionTensor,

    /// The smeared spectrum, if smearing has been requested.
    #[builder(default = "None")]
    spectrum: Option<SmearedSpectrum>,
}

impl<'a> ProjectedDosResult<'a> {
    fn builder() -> ProjectedDosResultBuilder<'a> {
        ProjectedDosResultBuilder::default()
    }

    /// The energy, in electronvolts, subtracted from the grid in the smeared tables.
    pub fn offset_ev(&self) -> f64 {
        self.offset_ev
    }

    /// The orbitals that have been projected.
    pub fn selection(&self) -> &SelectedOrbitalSet {
        self.tensor.selection()
    }

    /// The per-orbital, per-atom, per-shell magnitudes.
    pub fn tensor(&self) -> &ProjectionTensor {
        &self.tensor
    }

    /// The smeared spectrum, if smearing has been requested.
    pub fn spectrum(&self) -> Option<&SmearedSpectrum> {
        self.spectrum.as_ref()
    }

    /// Builds all requested tables: the discrete tables followed by the smeared ones.
    pub fn tables(&self) -> Result<Vec<Table>, anyhow::Error> {
        let emitter = TableEmitter::new(self.parameters.constants.clone());
        let mut tables = if self.parameters.write_discrete {
            emitter.discrete_tables(self.model, &self.tensor)?
        } else {
            vec![]
        };
        if let Some(spectrum) = self.spectrum.as_ref() {
            tables.extend(emitter.smeared_tables(spectrum, self.offset_ev));
        }
        Ok(tables)
    }

    /// Hands all requested tables to a sink.
    pub fn emit(&self, sink: &mut dyn TableSink) -> Result<(), anyhow::Error> {
        let tables = self.tables()?;
        TableEmitter::new(self.parameters.constants.clone()).emit(&tables, sink)?;
        log::debug!("{} table(s) emitted.", tables.len());
        Ok(())
    }
}

impl<'a> fmt::Display for ProjectedDosResult<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_subtitle(f, "Shell-resolved orbital magnitudes summed over atoms")?;
        writeln!(f)?;
        let constants = &self.parameters.constants;
        let all_atoms = self.tensor.all_atoms();
        let index_length = self
            .model
            .n_orbitals()
            .to_string()
            .chars()
            .count()
            .max(2);
        let sym_length = self
            .selection()
            .iter()
            .filter_map(|&index| self.model.orbital(index).ok())
            .map(|mo| mo.symmetry.chars().count())
            .max()
            .unwrap_or(3)
            .max(3);
        let width = index_length + sym_length + 14 + 11 * ShellType::COUNT;
        writeln!(f, "{}", "┈".repeat(width))?;
        writeln!(
            f,
            " {:>index_length$}  {:<sym_length$}  {:>10}{}",
            "MO",
            "Sym",
            "E / eV",
            ShellType::ALL
                .iter()
                .map(|st| format!("{st:>11}"))
                .join("")
        )?;
        writeln!(f, "{}", "┈".repeat(width))?;
        for (&index, magnitudes) in self.selection().iter().zip(all_atoms.outer_iter()) {
            let mo = self.model.orbital(index).map_err(|_| fmt::Error)?;
            writeln!(
                f,
                " {:>index_length$}  {:<sym_length$}  {:>10.4}{}",
                index,
                mo.symmetry,
                constants.to_ev(mo.energy) - self.offset_ev,
                magnitudes.iter().map(|m| format!("{m:>11.6}")).join("")
            )?;
        }
        writeln!(f, "{}", "┈".repeat(width))?;
        writeln!(f)?;
        if self.offset_ev != 0.0 {
            writeln!(f, "Energies relative to HOMO at {:.6} eV.", self.offset_ev)?;
            writeln!(f)?;
        }
        if let Some(spectrum) = self.spectrum.as_ref() {
            write_subtitle(f, "Smeared spectrum")?;
            writeln!(f)?;
            write!(f, "{spectrum}")?;
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<'a> fmt::Debug for ProjectedDosResult<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{self}")
    }
}

// ------
// Driver
// ------

/// Driver structure for projecting orbital coefficients onto atoms and shells and smearing the
/// resulting discrete spectrum.
#[derive(Clone, Builder)]
#[builder(build_fn(validate = "Self::validate", error = "anyhow::Error"))]
pub struct ProjectedDosDriver<'a> {
    /// The control parameters.
    parameters: &'a ProjectedDosParams,

    /// The wavefunction model to be projected.
    model: &'a WavefunctionModel,

    /// Explicit 1-based orbital indices to be projected. If `None`, orbitals are selected by the
    /// energy window.
    #[builder(default = "None")]
    selection: Option<&'a [usize]>,

    /// The result of the projection.
    #[builder(setter(skip), default = "None")]
    result: Option<ProjectedDosResult<'a>>,
}

impl<'a> ProjectedDosDriverBuilder<'a> {
    fn validate(&self) -> Result<(), anyhow::Error> {
        let params = self
            .parameters
            .ok_or_else(|| format_err!("No projected-density parameters found."))?;
        ensure!(
            params.sigma.is_finite() && params.sigma > 0.0,
            SharpoError::ParameterValidation(format!(
                "The smearing width must be positive, but {} eV was given.",
                params.sigma
            ))
        );
        ensure!(
            params.points_per_ev.is_finite() && params.points_per_ev > 0.0,
            SharpoError::ParameterValidation(format!(
                "The grid density must be positive, but {} points per eV was given.",
                params.points_per_ev
            ))
        );
        let model = self
            .model
            .ok_or_else(|| format_err!("No wavefunction model found."))?;
        model.verify()?;
        ensure!(
            model.n_orbitals() > 0,
            SharpoError::ModelConsistency("The wavefunction model has no orbitals.".to_string())
        );
        Ok(())
    }
}

impl<'a> ProjectedDosDriver<'a> {
    /// Returns a builder to construct a [`ProjectedDosDriver`] structure.
    pub fn builder() -> ProjectedDosDriverBuilder<'a> {
        ProjectedDosDriverBuilder::default()
    }

    /// Determines the orbital selection and the absolute smearing window in electronvolts.
    fn select(&self, offset_ev: f64) -> Result<(SelectedOrbitalSet, (f64, f64)), anyhow::Error> {
        let params = self.parameters;
        let constants = &params.constants;
        let window = params
            .energy_window
            .map(normalise_energy_window)
            .transpose()?
            .flatten();

        let selection = match (self.selection, window) {
            (Some(indices), _) => SelectedOrbitalSet::new(indices, self.model)?,
            (None, Some(window)) => {
                SelectedOrbitalSet::from_energy_window(self.model, window, offset_ev, constants)
            }
            (None, None) => SelectedOrbitalSet::all(self.model),
        };
        ensure!(
            !selection.is_empty(),
            SharpoError::ParameterValidation(format!(
                "No orbitals lie within the energy window {}.",
                window
                    .map(|(emin, emax)| format!("[{emin}, {emax}] eV"))
                    .unwrap_or_else(|| "of the whole range".to_string())
            ))
        );

        let grid_window = match window {
            Some((emin, emax)) => (emin + offset_ev, emax + offset_ev),
            None => {
                let energies = selection
                    .iter()
                    .map(|&index| self.model.orbital(index).map(|mo| constants.to_ev(mo.energy)))
                    .collect::<Result<Vec<_>, _>>()?;
                let (emin, emax) = energies
                    .iter()
                    .copied()
                    .minmax_by(|a, b| a.total_cmp(b))
                    .into_option()
                    .ok_or_else(|| format_err!("Unable to determine the orbital energy range."))?;
                let padding = FULL_RANGE_PADDING * params.sigma;
                (emin - padding, emax + padding)
            }
        };
        Ok((selection, grid_window))
    }

    fn calc_projected_dos(&mut self) -> Result<(), anyhow::Error> {
        let params = self.parameters;
        let offset_ev = if params.fermi_shift {
            let offset_ev = self.model.fermi_offset_ev(&params.constants);
            if self.model.homo().is_none() {
                sharpo_warn!("No occupied orbital found. Energies will not be shifted.");
            }
            offset_ev
        } else {
            0.0
        };
        if params.spin_polarised && !self.model.is_spin_labelled() {
            sharpo_warn!(
                "Spin-polarised smearing requested, but no orbital carries an alpha or beta label. Both channels will be empty."
            );
        }

        let (selection, (emin, emax)) = self.select(offset_ev)?;
        let smearer = SpectralSmearer::builder()
            .sigma(params.sigma)
            .points_per_ev(params.points_per_ev)
            .emin(emin)
            .emax(emax)
            .spin_polarised(params.spin_polarised)
            .constants(params.constants.clone())
            .truncation(params.truncation)
            .build()?;
        log_subtitle("Smearing set-up");
        sharpo_output!("");
        sharpo_output!("Selected orbitals: {selection}");
        smearer.log_output_display();
        sharpo_output!("");

        let tensor = ShellCoefficientProjector::new(params.shell_counts.clone())
            .project(self.model, &selection)?;
        let spectrum = if params.write_smeared {
            Some(smearer.smear(self.model, &tensor)?)
        } else {
            None
        };

        self.result = Some(
            ProjectedDosResult::builder()
                .parameters(params)
                .model(self.model)
                .offset_ev(offset_ev)
                .tensor(tensor)
                .spectrum(spectrum)
                .build()?,
        );
        Ok(())
    }
}

impl<'a> fmt::Display for ProjectedDosDriver<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.parameters)?;
        writeln!(
            f,
            "Wavefunction: {} orbital{} over {} atom{}, {} shell{} ({} counting)",
            self.model.n_orbitals(),
            if self.model.n_orbitals() == 1 { "" } else { "s" },
            self.model.n_atoms(),
            if self.model.n_atoms() == 1 { "" } else { "s" },
            self.model.bao().n_shells(),
            if self.model.bao().n_shells() == 1 { "" } else { "s" },
            self.model.bao().counting()
        )?;
        if let Some(indices) = self.selection {
            writeln!(f, "Explicit orbital selection: [{}]", indices.iter().join(", "))?;
        }
        Ok(())
    }
}

impl<'a> fmt::Debug for ProjectedDosDriver<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{self}")
    }
}

impl<'a> SharpoDriver for ProjectedDosDriver<'a> {
    type Params = ProjectedDosParams;

    type Outcome = ProjectedDosResult<'a>;

    fn result(&self) -> Result<&Self::Outcome, anyhow::Error> {
        self.result
            .as_ref()
            .ok_or_else(|| format_err!("No projected-density results found."))
    }

    fn run(&mut self) -> Result<(), anyhow::Error> {
        self.log_output_display();
        self.calc_projected_dos()?;
        self.result()?.log_output_display();
        Ok(())
    }
}
