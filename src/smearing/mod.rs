//! Gaussian broadening of projected orbital magnitudes into continuous spectra.

use std::f64::consts::PI;
use std::fmt;

use anyhow::{self, ensure, format_err};
use derive_builder::Builder;
use itertools::Itertools;
use ndarray::{Array1, Array2, Array3, ArrayView2, Axis, Zip};
use serde::{Deserialize, Serialize};

use crate::auxiliary::constants::PhysicalConstants;
use crate::basis::ao::ShellType;
use crate::errors::SharpoError;
use crate::io::format::nice_bool;
use crate::projection::ProjectionTensor;
use crate::target::orbital::{OrbitalSpin, WavefunctionModel};


// ==========
// EnergyGrid
// ==========

/// The largest number of intervals an energy grid may span. Every spectrum channel holds
/// `n_atoms * 5` values per grid point, so this bounds the allocation before it is attempted.
pub const MAX_GRID_INTERVALS: usize = 1_000_000;

/// Computes the number of grid intervals $`\lfloor (E_{\mathrm{max}} - E_{\mathrm{min}}) \rho
/// \rfloor + 1`$, rejecting grids larger than [`MAX_GRID_INTERVALS`].
fn n_grid_intervals(emin: f64, emax: f64, points_per_ev: f64) -> Result<usize, anyhow::Error> {
    let n_intervals = ((emax - emin) * points_per_ev).floor() + 1.0;
    ensure!(
        n_intervals.is_finite() && n_intervals <= MAX_GRID_INTERVALS as f64,
        SharpoError::ParameterValidation(format!(
            "The energy window [{emin}, {emax}] eV at {points_per_ev} points per eV needs {n_intervals} grid intervals, more than the limit of {MAX_GRID_INTERVALS}."
        ))
    );
    Ok(n_intervals as usize)
}

/// Structure holding an equally spaced energy grid in electronvolts spanning `[emin, emax]`
/// inclusively.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnergyGrid {
    values: Array1<f64>,
    step: f64,
}

impl EnergyGrid {
    /// Constructs a grid over `[emin, emax]` with roughly `points_per_ev` points per
    /// electronvolt. The grid has $`\lfloor (E_{\mathrm{max}} - E_{\mathrm{min}}) \rho \rfloor + 2`$
    /// points where $`\rho`$ is `points_per_ev`.
    ///
    /// # Errors
    ///
    /// Errors with [`SharpoError::ParameterValidation`] if the density is not positive, if the
    /// window is reversed or not finite, or if the grid would exceed [`MAX_GRID_INTERVALS`]
    /// intervals.
    pub fn new(emin: f64, emax: f64, points_per_ev: f64) -> Result<Self, anyhow::Error> {
        ensure!(
            points_per_ev.is_finite() && points_per_ev > 0.0,
            SharpoError::ParameterValidation(format!(
                "The grid density must be positive, but {points_per_ev} points per eV was given."
            ))
        );
        ensure!(
            emin.is_finite() && emax.is_finite() && emin <= emax,
            SharpoError::ParameterValidation(format!(
                "The energy window [{emin}, {emax}] eV is not a normalised finite window."
            ))
        );
        let n_intervals = n_grid_intervals(emin, emax, points_per_ev)?;
        let step = (emax - emin) / n_intervals as f64;
        let values = Array1::from_shape_fn(n_intervals + 1, |i| emin + step * i as f64);
        Ok(Self { values, step })
    }

    /// The grid values in electronvolts.
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// The grid values shifted by `offset`, *i.e.* `values - offset`.
    pub fn shifted(&self, offset: f64) -> Array1<f64> {
        &self.values - offset
    }

    /// The spacing between consecutive grid points.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// The number of grid points.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the grid has no points.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The first grid value.
    pub fn emin(&self) -> f64 {
        self.values.first().copied().unwrap_or(0.0)
    }

    /// The last grid value.
    pub fn emax(&self) -> f64 {
        self.values.last().copied().unwrap_or(0.0)
    }
}

impl fmt::Display for EnergyGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.4}, {:.4}] eV, {} points, step {:.6} eV",
            self.emin(),
            self.emax(),
            self.len(),
            self.step
        )
    }
}

// ===========
// SpinChannel
// ===========

/// Enumerated type for the channels into which orbital contributions are accumulated.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum SpinChannel {
    /// All selected orbitals, regardless of spin.
    Total,

    /// Only orbitals labelled as $`\alpha`$.
    Alpha,

    /// Only orbitals labelled as $`\beta`$.
    Beta,
}

impl SpinChannel {
    /// Returns `true` if an orbital of spin `spin` contributes to this channel.
    pub fn admits(&self, spin: OrbitalSpin) -> bool {
        match self {
            SpinChannel::Total => true,
            SpinChannel::Alpha => spin == OrbitalSpin::Alpha,
            SpinChannel::Beta => spin == OrbitalSpin::Beta,
        }
    }

    /// The suffix distinguishing this channel in output names, if any.
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            SpinChannel::Total => None,
            SpinChannel::Alpha => Some("a"),
            SpinChannel::Beta => Some("b"),
        }
    }
}

impl fmt::Display for SpinChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpinChannel::Total => write!(f, "total"),
            SpinChannel::Alpha => write!(f, "α"),
            SpinChannel::Beta => write!(f, "β"),
        }
    }
}

// ===============
// ChannelSpectrum
// ===============

/// Structure holding the smeared intensities of one spin channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpectrum {
    channel: SpinChannel,

    /// Intensities of shape `(n_grid, n_atoms, ShellType::COUNT)`.
    per_atom: Array3<f64>,

    /// Intensities summed over atoms, of shape `(n_grid, ShellType::COUNT)`.
    all_atoms: Array2<f64>,

    /// The number of selected orbitals contributing to this channel.
    n_contributing: usize,
}

impl ChannelSpectrum {
    /// The spin channel.
    pub fn channel(&self) -> SpinChannel {
        self.channel
    }

    /// Intensities of shape `(n_grid, n_atoms, ShellType::COUNT)`.
    pub fn per_atom(&self) -> &Array3<f64> {
        &self.per_atom
    }

    /// The intensities on a single atom, of shape `(n_grid, ShellType::COUNT)`.
    pub fn atom(&self, atom: usize) -> ArrayView2<'_, f64> {
        self.per_atom.index_axis(Axis(1), atom)
    }

    /// Intensities summed over atoms, of shape `(n_grid, ShellType::COUNT)`.
    pub fn all_atoms(&self) -> &Array2<f64> {
        &self.all_atoms
    }

    /// The number of selected orbitals contributing to this channel.
    pub fn n_contributing(&self) -> usize {
        self.n_contributing
    }
}

// ===============
// SmearedSpectrum
// ===============

/// Structure holding the energy grid and the smeared intensities of every accumulated channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SmearedSpectrum {
    grid: EnergyGrid,
    channels: Vec<ChannelSpectrum>,
}

impl SmearedSpectrum {
    /// The energy grid.
    pub fn grid(&self) -> &EnergyGrid {
        &self.grid
    }

    /// The accumulated channels: either a single [`SpinChannel::Total`] or the pair
    /// [`SpinChannel::Alpha`], [`SpinChannel::Beta`].
    pub fn channels(&self) -> &[ChannelSpectrum] {
        &self.channels
    }

    /// Retrieves a channel, if it has been accumulated.
    pub fn channel(&self, channel: SpinChannel) -> Option<&ChannelSpectrum> {
        self.channels.iter().find(|ch| ch.channel == channel)
    }

    /// Returns `true` if this spectrum is resolved into $`\alpha`$ and $`\beta`$ channels.
    pub fn is_spin_polarised(&self) -> bool {
        self.channels
            .iter()
            .any(|ch| ch.channel != SpinChannel::Total)
    }
}

impl fmt::Display for SmearedSpectrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Grid: {}", self.grid)?;
        for ch in self.channels.iter() {
            writeln!(
                f,
                "Channel {}: {} contributing orbital{}, integrated intensity [{}]",
                ch.channel,
                ch.n_contributing,
                if ch.n_contributing == 1 { "" } else { "s" },
                ShellType::ALL
                    .iter()
                    .map(|st| format!(
                        "{st}: {:.6}",
                        ch.all_atoms.column(st.index()).sum() * self.grid.step()
                    ))
                    .join(", ")
            )?;
        }
        Ok(())
    }
}

// ===============
// SpectralSmearer
// ===============

/// Structure for broadening the discrete magnitudes of a [`ProjectionTensor`] with normalised
/// Gaussians centred at the orbital energies.
#[derive(Clone, Builder, Debug, PartialEq, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate", error = "anyhow::Error"))]
pub struct SpectralSmearer {
    /// The Gaussian standard deviation in electronvolts.
    sigma: f64,

    /// The number of grid points per electronvolt.
    points_per_ev: f64,

    /// The lower end of the energy grid in electronvolts.
    emin: f64,

    /// The upper end of the energy grid in electronvolts.
    emax: f64,

    /// Boolean indicating if $`\alpha`$ and $`\beta`$ orbitals are accumulated separately.
    #[builder(default = "false")]
    spin_polarised: bool,

    /// The constants used to convert orbital energies.
    #[builder(default)]
    constants: PhysicalConstants,

    /// Optional half-width of the Gaussian window in units of `sigma`. Contributions further away
    /// than this from a grid point are skipped. If `None`, every contribution is accumulated.
    #[builder(default = "None")]
    truncation: Option<f64>,
}

impl SpectralSmearerBuilder {
    fn validate(&self) -> Result<(), anyhow::Error> {
        let sigma = self.sigma.ok_or_else(|| format_err!("No smearing width found."))?;
        ensure!(
            sigma.is_finite() && sigma > 0.0,
            SharpoError::ParameterValidation(format!(
                "The smearing width must be positive, but {sigma} eV was given."
            ))
        );
        let points_per_ev = self
            .points_per_ev
            .ok_or_else(|| format_err!("No grid density found."))?;
        ensure!(
            points_per_ev.is_finite() && points_per_ev > 0.0,
            SharpoError::ParameterValidation(format!(
                "The grid density must be positive, but {points_per_ev} points per eV was given."
            ))
        );
        let emin = self.emin.ok_or_else(|| format_err!("No lower energy bound found."))?;
        let emax = self.emax.ok_or_else(|| format_err!("No upper energy bound found."))?;
        ensure!(
            emin.is_finite() && emax.is_finite() && emin <= emax,
            SharpoError::ParameterValidation(format!(
                "The energy window [{emin}, {emax}] eV must be finite and normalised."
            ))
        );
        n_grid_intervals(emin, emax, points_per_ev)?;
        if let Some(Some(k)) = self.truncation {
            ensure!(
                k.is_finite() && k > 0.0,
                SharpoError::ParameterValidation(format!(
                    "The Gaussian truncation must be a positive multiple of sigma, but {k} was given."
                ))
            );
        }
        Ok(())
    }
}

impl SpectralSmearer {
    /// Returns a builder to construct a new [`SpectralSmearer`].
    pub fn builder() -> SpectralSmearerBuilder {
        SpectralSmearerBuilder::default()
    }

    /// The Gaussian standard deviation in electronvolts.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Boolean indicating if $`\alpha`$ and $`\beta`$ orbitals are accumulated separately.
    pub fn spin_polarised(&self) -> bool {
        self.spin_polarised
    }

    /// Constructs the energy grid over which this smearer accumulates.
    pub fn grid(&self) -> Result<EnergyGrid, anyhow::Error> {
        EnergyGrid::new(self.emin, self.emax, self.points_per_ev)
    }

    /// The channels accumulated by this smearer.
    pub fn channels(&self) -> Vec<SpinChannel> {
        if self.spin_polarised {
            vec![SpinChannel::Alpha, SpinChannel::Beta]
        } else {
            vec![SpinChannel::Total]
        }
    }

    /// Smears the magnitudes of a projection tensor over the energy grid.
    ///
    /// Every selected orbital $`o`$ with energy $`E_o`$ (converted to electronvolts) adds
    ///
    /// ```math
    /// m_{o, A, t} \frac{1}{\sigma \sqrt{2\pi}}
    ///     \exp\left(-\frac{(x - E_o)^2}{2 \sigma^2}\right)
    /// ```
    ///
    /// to the intensity at grid point $`x`$, atom $`A`$, and shell type $`t`$ of each channel it
    /// belongs to. Orbitals without a recognisable spin label contribute to no channel of a
    /// spin-polarised accumulation.
    ///
    /// # Errors
    ///
    /// Errors if the tensor does not belong to `model`.
    pub fn smear(
        &self,
        model: &WavefunctionModel,
        tensor: &ProjectionTensor,
    ) -> Result<SmearedSpectrum, anyhow::Error> {
        tensor.selection().verify(model)?;
        ensure!(
            tensor.n_atoms() == model.n_atoms(),
            SharpoError::ModelConsistency(format!(
                "The projection tensor resolves {} atoms, but the model has {}.",
                tensor.n_atoms(),
                model.n_atoms()
            ))
        );
        let grid = self.grid()?;
        let mos = tensor
            .selection()
            .iter()
            .map(|&index| model.orbital(index))
            .collect::<Result<Vec<_>, _>>()?;
        let energies_ev = mos
            .iter()
            .map(|mo| self.constants.to_ev(mo.energy))
            .collect::<Vec<_>>();

        let prefactor = 1.0 / (self.sigma * (2.0 * PI).sqrt());
        let exponent_scale = 1.0 / (2.0 * self.sigma.powi(2));
        let cutoff = self.truncation.map(|k| k * self.sigma);
        let magnitudes = tensor.magnitudes();
        log::debug!(
            "Smearing {} orbital(s) over {} grid point(s) with sigma = {} eV.",
            mos.len(),
            grid.len(),
            self.sigma
        );

        let channels = self
            .channels()
            .into_iter()
            .map(|channel| {
                let contributing = mos
                    .iter()
                    .enumerate()
                    .filter_map(|(pos, mo)| channel.admits(mo.spin()).then_some(pos))
                    .collect::<Vec<_>>();
                let mut per_atom = Array3::<f64>::zeros((grid.len(), tensor.n_atoms(), ShellType::COUNT));
                Zip::from(per_atom.outer_iter_mut())
                    .and(grid.values())
                    .par_for_each(|mut row, &x| {
                        for &pos in contributing.iter() {
                            let dx = x - energies_ev[pos];
                            if cutoff.map_or(false, |c| dx.abs() > c) {
                                continue;
                            }
                            let weight = prefactor * (-exponent_scale * dx * dx).exp();
                            row.scaled_add(weight, &magnitudes.index_axis(Axis(0), pos));
                        }
                    });
                let all_atoms = per_atom.sum_axis(Axis(1));
                ChannelSpectrum {
                    channel,
                    per_atom,
                    all_atoms,
                    n_contributing: contributing.len(),
                }
            })
            .collect::<Vec<_>>();

        Ok(SmearedSpectrum { grid, channels })
    }
}

impl fmt::Display for SpectralSmearer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Gaussian width (σ): {} eV", self.sigma)?;
        writeln!(f, "Grid density: {} points per eV", self.points_per_ev)?;
        writeln!(f, "Grid window: [{}, {}] eV", self.emin, self.emax)?;
        writeln!(f, "Spin-polarised channels: {}", nice_bool(self.spin_polarised))?;
        match self.truncation {
            Some(k) => writeln!(f, "Gaussian truncation: {k}σ")?,
            None => writeln!(f, "Gaussian truncation: none")?,
        }
        Ok(())
    }
}
