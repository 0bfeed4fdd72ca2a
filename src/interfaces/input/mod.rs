//! YAML input files for the `sharpo` binary.

use std::path::{Path, PathBuf};

use anyhow::{self, Context};
use serde::{Deserialize, Serialize};

use crate::basis::ao::{AngularCounting, BasisAngularOrder, ShellType};
use crate::drivers::projected_dos::{ProjectedDosDriver, ProjectedDosParams};
use crate::drivers::SharpoDriver;
use crate::interfaces::InputHandle;
use crate::io::format::{
    log_macsec_begin, log_macsec_end, log_title, sharpo_output, SharpoOutput,
};
use crate::io::read_sharpo_yaml;
use crate::io::tables::DirectorySink;
use crate::target::orbital::{MolecularOrbital, WavefunctionModel};

#[cfg(test)]
#[path = "input_tests.rs"]
mod input_tests;

fn default_output_directory() -> PathBuf {
    PathBuf::from("sharpo_tables")
}

/// An enumerated type representing the possible sources of the wavefunction model in a YAML
/// input file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum WavefunctionSource {
    /// Variant indicating that the wavefunction model is given in place.
    Inline(WavefunctionModel),

    /// Variant indicating that the wavefunction model is to be read in from a separate YAML file.
    /// Relative paths are resolved against the current working directory.
    FromFile(PathBuf),
}

impl WavefunctionSource {
    /// Materialises and verifies the wavefunction model.
    pub fn load(&self) -> Result<WavefunctionModel, anyhow::Error> {
        let model = match self {
            WavefunctionSource::Inline(model) => model.clone(),
            WavefunctionSource::FromFile(path) => read_sharpo_yaml::<WavefunctionModel, _>(path)
                .with_context(|| {
                    format!("Unable to read the wavefunction model from {}", path.display())
                })?,
        };
        // Deserialisation bypasses the builder checks.
        model.verify()?;
        Ok(model)
    }
}

impl Default for WavefunctionSource {
    fn default() -> Self {
        let bao = BasisAngularOrder::from_shells(&[(ShellType::S, 0)], AngularCounting::Pure)
            .expect("Unable to construct a default basis angular order.");
        let orbitals = [(-0.5, 2.0, "1.1_a"), (-0.3, 1.0, "1.1_b")]
            .iter()
            .enumerate()
            .map(|(i, &(energy, occupation, symmetry))| {
                MolecularOrbital::builder()
                    .index(i + 1)
                    .energy(energy)
                    .occupation(occupation)
                    .symmetry(symmetry)
                    .coefficients(&[1.0])
                    .build()
                    .expect("Unable to construct a default molecular orbital.")
            })
            .collect::<Vec<_>>();
        WavefunctionSource::Inline(
            WavefunctionModel::builder()
                .bao(bao)
                .orbitals(&orbitals)
                .build()
                .expect("Unable to construct a default wavefunction model."),
        )
    }
}

/// A structure containing Sharpo input parameters which can be serialised into and deserialised
/// from a YAML input file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Input {
    /// Specification of the wavefunction model to be projected.
    pub wavefunction: WavefunctionSource,

    /// Explicit 1-based orbital indices to be projected. If `None`, orbitals are selected by the
    /// energy window of the projected-density parameters.
    ///
    /// # Default
    ///
    /// If not specified, this will be taken to be `None`.
    #[serde(default)]
    pub selection: Option<Vec<usize>>,

    /// Control parameters for the projected-density calculation.
    #[serde(default)]
    pub projected_dos: ProjectedDosParams,

    /// Directory into which the numeric tables are written. It is created if missing.
    ///
    /// # Default
    ///
    /// If not specified, this will be taken to be `sharpo_tables`.
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,
}

impl Default for Input {
    fn default() -> Self {
        Input {
            wavefunction: WavefunctionSource::default(),
            selection: None,
            projected_dos: ProjectedDosParams::default(),
            output_directory: default_output_directory(),
        }
    }
}

impl Input {
    /// The directory into which the numeric tables are written.
    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    /// Logs the molecular-orbital energy table of the wavefunction model without projecting
    /// anything.
    pub fn log_orbital_energies(&self) -> Result<(), anyhow::Error> {
        let model = self.wavefunction.load()?;
        model
            .energy_table(&self.projected_dos.constants)
            .log_output_display();
        Ok(())
    }
}

impl InputHandle for Input {
    fn handle(&self) -> Result<(), anyhow::Error> {
        let model = self.wavefunction.load()?;
        log_title("Wavefunction Model");
        sharpo_output!("");
        model
            .energy_table(&self.projected_dos.constants)
            .log_output_display();
        sharpo_output!("");

        log_macsec_begin("Projected densities");
        sharpo_output!("");
        let mut driver = ProjectedDosDriver::builder()
            .parameters(&self.projected_dos)
            .model(&model)
            .selection(self.selection.as_deref())
            .build()?;
        let outcome = driver.run();
        log_macsec_end("Projected densities");
        sharpo_output!("");
        outcome?;

        let mut sink = DirectorySink::new(&self.output_directory)?;
        let result = driver.result()?;
        result.emit(&mut sink)?;
        sharpo_output!(
            "Tables written to {}.",
            self.output_directory.display()
        );
        Ok(())
    }
}
