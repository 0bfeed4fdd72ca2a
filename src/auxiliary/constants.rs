//! Physical constants used when converting orbital energies.

use std::fmt;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// The number of electronvolts in one Hartree used by default.
pub const HARTREE_TO_EV: f64 = 27.211386;

const fn default_hartree_to_ev() -> f64 {
    HARTREE_TO_EV
}

/// Structure holding the physical constants used by the projection and smearing machinery.
#[derive(Clone, Builder, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConstants {
    /// The conversion factor from Hartree to electronvolts.
    #[builder(default = "HARTREE_TO_EV")]
    #[serde(default = "default_hartree_to_ev")]
    pub hartree_to_ev: f64,
}

impl PhysicalConstants {
    /// Returns a builder to construct a new [`PhysicalConstants`] structure.
    pub fn builder() -> PhysicalConstantsBuilder {
        PhysicalConstantsBuilder::default()
    }

    /// Converts an energy in Hartree to electronvolts.
    pub fn to_ev(&self, energy_hartree: f64) -> f64 {
        energy_hartree * self.hartree_to_ev
    }
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self::builder()
            .build()
            .expect("Unable to construct default `PhysicalConstants`.")
    }
}

impl fmt::Display for PhysicalConstants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hartree to eV: {}", self.hartree_to_ev)
    }
}
