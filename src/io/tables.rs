//! Fixed-width numeric tables and the sinks that receive them.

use std::collections::HashSet;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{self, ensure, Context};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::auxiliary::constants::PhysicalConstants;
use crate::basis::ao::ShellType;
use crate::projection::ProjectionTensor;
use crate::smearing::{SmearedSpectrum, SpinChannel};
use crate::target::orbital::WavefunctionModel;

#[cfg(test)]
#[path = "tables_tests.rs"]
mod tables_tests;

const DISCRETE_HEADER: &str = "#     E / a.u.         E / eV               c-s             c-p             c-d            c-f           c-g";

const SMEARED_HEADER: &str = "#  Energy [eV]      C-s         C-p         C-d         C-f         C-g";

const ALL_ATOMS: &str = "all_atoms";

// =====
// Table
// =====

/// Enumerated type for the kinds of numeric tables.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TableKind {
    /// One row per selected orbital: energy in Hartree, energy in eV, and the five shell
    /// magnitudes.
    Discrete,

    /// One row per grid point: shifted energy in eV and the five shell intensities.
    Smeared(SpinChannel),
}

/// Structure holding one named numeric table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// The stem of the table name: an atom index or `all_atoms`.
    stem: String,

    /// The kind of this table.
    kind: TableKind,

    /// The numeric rows.
    rows: Vec<Vec<f64>>,
}

impl Table {
    /// The stem of the table name: an atom index or `all_atoms`.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// The kind of this table.
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// The numeric rows.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// The full name of this table, which is also its file name in a directory sink, *e.g.*
    /// `0.dat`, `all_atoms.smeared.dat`, or `3.smeared.b.dat`.
    pub fn name(&self) -> String {
        match self.kind {
            TableKind::Discrete => format!("{}.dat", self.stem),
            TableKind::Smeared(channel) => match channel.suffix() {
                Some(suffix) => format!("{}.smeared.{suffix}.dat", self.stem),
                None => format!("{}.smeared.dat", self.stem),
            },
        }
    }

    /// The header line of this table.
    pub fn header(&self) -> &'static str {
        match self.kind {
            TableKind::Discrete => DISCRETE_HEADER,
            TableKind::Smeared(_) => SMEARED_HEADER,
        }
    }

    /// The number of columns of this table.
    pub fn width(&self) -> usize {
        match self.kind {
            TableKind::Discrete => ShellType::COUNT + 2,
            TableKind::Smeared(_) => ShellType::COUNT + 1,
        }
    }

    fn format_row(&self, row: &[f64]) -> String {
        match self.kind {
            TableKind::Discrete => row
                .iter()
                .enumerate()
                .map(|(i, v)| if i < 2 { format!("{v:16.8}") } else { format!("{v:13.8}") })
                .join("  "),
            TableKind::Smeared(_) => row
                .iter()
                .enumerate()
                .map(|(i, v)| if i == 0 { format!("{v:16.8}") } else { format!("{v:.8}") })
                .join("  "),
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header())?;
        for row in self.rows.iter() {
            writeln!(f, "{}", self.format_row(row))?;
        }
        Ok(())
    }
}

// ==========
// TableSink
// ==========

/// Trait for destinations receiving numeric tables.
pub trait TableSink {
    /// Receives one table.
    fn write_table(&mut self, table: &Table) -> Result<(), anyhow::Error>;
}

/// Sink writing each table into a file named after it inside a directory.
#[derive(Clone, Debug)]
pub struct DirectorySink {
    directory: PathBuf,
}

impl DirectorySink {
    /// Constructs a sink writing into `directory`, which is created if missing.
    pub fn new<P: AsRef<Path>>(directory: P) -> Result<Self, anyhow::Error> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)
            .with_context(|| format!("Unable to create directory {}", directory.display()))?;
        Ok(Self { directory })
    }

    /// The directory receiving the tables.
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl TableSink for DirectorySink {
    fn write_table(&mut self, table: &Table) -> Result<(), anyhow::Error> {
        let path = self.directory.join(table.name());
        let mut writer = BufWriter::new(
            File::create(&path).with_context(|| format!("Unable to create {}", path.display()))?,
        );
        write!(writer, "{table}")?;
        writer.flush()?;
        log::debug!("Table written to {}.", path.display());
        Ok(())
    }
}

/// Sink collecting tables in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    tables: Vec<Table>,
}

impl MemorySink {
    /// Constructs an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The collected tables in the order they were received.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Retrieves a collected table by its full name.
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.name() == name)
    }
}

impl TableSink for MemorySink {
    fn write_table(&mut self, table: &Table) -> Result<(), anyhow::Error> {
        self.tables.push(table.clone());
        Ok(())
    }
}

// ============
// TableEmitter
// ============

/// Structure for turning projection tensors and smeared spectra into tables.
#[derive(Clone, Debug, Default)]
pub struct TableEmitter {
    constants: PhysicalConstants,
}

impl TableEmitter {
    /// Constructs an emitter converting energies with `constants`.
    pub fn new(constants: PhysicalConstants) -> Self {
        Self { constants }
    }

    /// Builds one discrete table per atom followed by the table summed over all atoms.
    pub fn discrete_tables(
        &self,
        model: &WavefunctionModel,
        tensor: &ProjectionTensor,
    ) -> Result<Vec<Table>, anyhow::Error> {
        let energies = tensor
            .selection()
            .iter()
            .map(|&index| model.orbital(index).map(|mo| mo.energy))
            .collect::<Result<Vec<_>, _>>()?;
        let discrete_row = |energy: f64, magnitudes: Vec<f64>| {
            [energy, self.constants.to_ev(energy)]
                .into_iter()
                .chain(magnitudes)
                .collect::<Vec<_>>()
        };
        let all_atoms = tensor.all_atoms();
        let tables = (0..tensor.n_atoms())
            .map(|atom| Table {
                stem: atom.to_string(),
                kind: TableKind::Discrete,
                rows: energies
                    .iter()
                    .enumerate()
                    .map(|(pos, &energy)| {
                        discrete_row(energy, tensor.shell_magnitudes(pos, atom).to_vec())
                    })
                    .collect(),
            })
            .chain(std::iter::once(Table {
                stem: ALL_ATOMS.to_string(),
                kind: TableKind::Discrete,
                rows: energies
                    .iter()
                    .zip(all_atoms.outer_iter())
                    .map(|(&energy, magnitudes)| discrete_row(energy, magnitudes.to_vec()))
                    .collect(),
            }))
            .collect();
        Ok(tables)
    }

    /// Builds, for every channel, one smeared table per atom followed by the table summed over
    /// all atoms. The energy column holds the grid shifted by `offset_ev`.
    pub fn smeared_tables(&self, spectrum: &SmearedSpectrum, offset_ev: f64) -> Vec<Table> {
        let shifted = spectrum.grid().shifted(offset_ev);
        let smeared_row = |x: f64, intensities: Vec<f64>| {
            std::iter::once(x).chain(intensities).collect::<Vec<_>>()
        };
        spectrum
            .channels()
            .iter()
            .flat_map(|ch| {
                let kind = TableKind::Smeared(ch.channel());
                let n_atoms = ch.per_atom().shape()[1];
                let per_atom = (0..n_atoms).map(|atom| Table {
                    stem: atom.to_string(),
                    kind,
                    rows: shifted
                        .iter()
                        .zip(ch.atom(atom).outer_iter())
                        .map(|(&x, intensities)| smeared_row(x, intensities.to_vec()))
                        .collect(),
                });
                let all_atoms = Table {
                    stem: ALL_ATOMS.to_string(),
                    kind,
                    rows: shifted
                        .iter()
                        .zip(ch.all_atoms().outer_iter())
                        .map(|(&x, intensities)| smeared_row(x, intensities.to_vec()))
                        .collect(),
                };
                per_atom.chain(std::iter::once(all_atoms)).collect::<Vec<_>>()
            })
            .collect()
    }

    /// Hands tables to a sink in order.
    ///
    /// # Errors
    ///
    /// Errors if two tables share a name or if the sink fails to receive a table.
    pub fn emit(&self, tables: &[Table], sink: &mut dyn TableSink) -> Result<(), anyhow::Error> {
        let names = tables.iter().map(|table| table.name()).collect::<HashSet<_>>();
        ensure!(
            names.len() == tables.len(),
            "Tables with duplicate names cannot be emitted together."
        );
        for table in tables {
            ensure!(
                table.rows.iter().all(|row| row.len() == table.width()),
                "Table {} has rows of unexpected width.",
                table.name()
            );
            sink.write_table(table)?;
        }
        Ok(())
    }
}
