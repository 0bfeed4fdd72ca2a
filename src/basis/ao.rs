//! Atomic-orbital basis descriptors.

use std::fmt;
use std::slice::Iter;

use anyhow::{self, format_err};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::angmom::{ANGMOM_INDICES, ANGMOM_LABELS};
use crate::errors::SharpoError;

#[cfg(test)]
#[path = "ao_tests.rs"]
mod ao_tests;

// ---------
// ShellType
// ---------

/// Enumerated type for the angular momentum types of atomic-orbital shells resolved by the
/// projection.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellType {
    /// $`l = 0`$.
    S,

    /// $`l = 1`$.
    P,

    /// $`l = 2`$.
    D,

    /// $`l = 3`$.
    F,

    /// $`l = 4`$.
    G,
}

impl ShellType {
    /// All resolved shell types in increasing-$`l`$ order. The position of a shell type in this
    /// array is its bucket index in projection and smearing tensors.
    pub const ALL: [ShellType; 5] = [
        ShellType::S,
        ShellType::P,
        ShellType::D,
        ShellType::F,
        ShellType::G,
    ];

    /// The number of resolved shell types.
    pub const COUNT: usize = Self::ALL.len();

    /// Returns the angular momentum quantum number of this shell type.
    pub fn l(&self) -> u32 {
        match self {
            ShellType::S => 0,
            ShellType::P => 1,
            ShellType::D => 2,
            ShellType::F => 3,
            ShellType::G => 4,
        }
    }

    /// Returns the bucket index of this shell type.
    pub fn index(&self) -> usize {
        self.l() as usize
    }

    /// Returns the lowercase single-letter label of this shell type.
    pub fn label(&self) -> String {
        ANGMOM_LABELS[self.index()].to_lowercase()
    }
}

impl TryFrom<&str> for ShellType {
    type Error = anyhow::Error;

    fn try_from(label: &str) -> Result<Self, Self::Error> {
        let key = label.trim().to_uppercase();
        ANGMOM_INDICES
            .get(key.as_str())
            .and_then(|&l| ShellType::ALL.get(l as usize).copied())
            .ok_or_else(|| format_err!("Unsupported shell type label `{}`.", label.trim()))
    }
}

impl fmt::Display for ShellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------
// AngularCounting
// ---------------

/// Enumerated type indicating how the angular components of $`d`$, $`f`$, and $`g`$ shells are
/// counted in the coefficient vectors.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum AngularCounting {
    /// Pure (spherical) shells: $`2l + 1`$ components each.
    Pure,

    /// Cartesian shells: each pure block is followed by a Cartesian tail.
    Cart,
}

impl Default for AngularCounting {
    fn default() -> Self {
        AngularCounting::Pure
    }
}

impl fmt::Display for AngularCounting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AngularCounting::Pure => write!(f, "Pure"),
            AngularCounting::Cart => write!(f, "Cart"),
        }
    }
}

// ----------------
// ShellCountPolicy
// ----------------

/// Structure holding the number of coefficients consumed per shell type, split into the pure
/// block and the additional Cartesian tail.
///
/// The default table is s = 1, p = 3, d = 5 + 1, f = 7 + 3, g = 9 + 5. Note that the Cartesian
/// $`g`$ count is 14 rather than the conventional 15; this reproduces the upstream counting so
/// that results agree with existing data. [`ShellCountPolicy::conventional`] gives the
/// conventional 15.
#[derive(Clone, Builder, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ShellCountPolicy {
    /// The number of pure components per shell type, in [`ShellType::ALL`] order.
    #[builder(default = "[1, 3, 5, 7, 9]")]
    pub pure_counts: [usize; ShellType::COUNT],

    /// The number of additional Cartesian components per shell type, in [`ShellType::ALL`]
    /// order.
    #[builder(default = "[0, 0, 1, 3, 5]")]
    pub cart_tails: [usize; ShellType::COUNT],
}

impl ShellCountPolicy {
    /// Returns a builder to construct a new [`ShellCountPolicy`].
    pub fn builder() -> ShellCountPolicyBuilder {
        ShellCountPolicyBuilder::default()
    }

    /// Constructs a policy with the conventional Cartesian counts $`(l+1)(l+2)/2`$.
    pub fn conventional() -> Self {
        Self::builder()
            .cart_tails([0, 0, 1, 3, 6])
            .build()
            .expect("Unable to construct the conventional `ShellCountPolicy`.")
    }

    /// The number of coefficients consumed by one shell of the given type.
    pub fn n_funcs(&self, shell_type: ShellType, counting: AngularCounting) -> usize {
        let i = shell_type.index();
        match counting {
            AngularCounting::Pure => self.pure_counts[i],
            AngularCounting::Cart => self.pure_counts[i] + self.cart_tails[i],
        }
    }
}

impl Default for ShellCountPolicy {
    fn default() -> Self {
        Self::builder()
            .build()
            .expect("Unable to construct a default `ShellCountPolicy`.")
    }
}

impl fmt::Display for ShellCountPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "┈".repeat(24))?;
        writeln!(f, " Shell  Pure  Cart tail")?;
        writeln!(f, "{}", "┈".repeat(24))?;
        for shell_type in ShellType::ALL {
            let i = shell_type.index();
            writeln!(
                f,
                " {:<5}  {:>4}  {:>9}",
                shell_type, self.pure_counts[i], self.cart_tails[i]
            )?;
        }
        writeln!(f, "{}", "┈".repeat(24))?;
        Ok(())
    }
}

// -------------
// AtomicOrbital
// -------------

/// Structure describing one atomic-orbital shell in the basis.
#[derive(Clone, Builder, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct AtomicOrbital {
    /// The angular momentum type of this shell.
    pub shell_type: ShellType,

    /// The 0-based index of the atom on which this shell is centred.
    pub atom: usize,

    /// The 0-based position of this shell in the basis sequence.
    pub ordinal: usize,
}

impl AtomicOrbital {
    /// Returns a builder to construct a new [`AtomicOrbital`].
    pub fn builder() -> AtomicOrbitalBuilder {
        AtomicOrbitalBuilder::default()
    }

    /// Constructs a new [`AtomicOrbital`].
    pub fn new(shell_type: ShellType, atom: usize, ordinal: usize) -> Self {
        AtomicOrbital {
            shell_type,
            atom,
            ordinal,
        }
    }
}

// -----------------
// BasisAngularOrder
// -----------------

/// Structure containing the ordered atomic-orbital shells of a basis set together with the way
/// their angular components are counted.
#[derive(Clone, Builder, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate", error = "anyhow::Error"))]
pub struct BasisAngularOrder {
    /// The ordered sequence of shells.
    #[builder(setter(custom))]
    pub(crate) aos: Vec<AtomicOrbital>,

    /// The angular counting in effect for all shells.
    #[builder(default)]
    #[serde(default)]
    pub(crate) counting: AngularCounting,
}

impl BasisAngularOrderBuilder {
    pub fn aos(&mut self, aos: &[AtomicOrbital]) -> &mut Self {
        self.aos = Some(aos.to_vec());
        self
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        let aos = self
            .aos
            .as_ref()
            .ok_or_else(|| format_err!("No atomic-orbital shells found."))?;
        check_ordinals(aos)
    }
}

/// Checks that every shell's ordinal matches its position in the sequence.
fn check_ordinals(aos: &[AtomicOrbital]) -> Result<(), anyhow::Error> {
    match aos.iter().enumerate().find(|(i, ao)| ao.ordinal != *i) {
        Some((i, ao)) => Err(SharpoError::ModelConsistency(format!(
            "Shell at position {i} carries ordinal {}.",
            ao.ordinal
        ))
        .into()),
        None => Ok(()),
    }
}

impl BasisAngularOrder {
    /// Returns a builder to construct a new [`BasisAngularOrder`].
    pub fn builder() -> BasisAngularOrderBuilder {
        BasisAngularOrderBuilder::default()
    }

    /// Constructs a new [`BasisAngularOrder`] from `(shell type, atom index)` pairs listed in
    /// basis order. Ordinals are assigned from the list positions.
    pub fn from_shells(
        shells: &[(ShellType, usize)],
        counting: AngularCounting,
    ) -> Result<Self, anyhow::Error> {
        let aos = shells
            .iter()
            .enumerate()
            .map(|(i, (shell_type, atom))| AtomicOrbital::new(*shell_type, *atom, i))
            .collect::<Vec<_>>();
        Self::builder().aos(&aos).counting(counting).build()
    }

    /// Verifies that this basis is consistent. This is needed after deserialisation, which
    /// bypasses the builder validation.
    pub fn verify(&self) -> Result<(), anyhow::Error> {
        check_ordinals(&self.aos)
    }

    /// Iterates over the constituent shells.
    pub fn iter(&'_ self) -> Iter<'_, AtomicOrbital> {
        self.aos.iter()
    }

    /// The number of shells in this basis.
    pub fn n_shells(&self) -> usize {
        self.aos.len()
    }

    /// The angular counting in effect.
    pub fn counting(&self) -> AngularCounting {
        self.counting
    }

    /// The number of atoms, derived as the largest atom index plus one.
    pub fn n_atoms(&self) -> usize {
        self.aos.iter().map(|ao| ao.atom + 1).max().unwrap_or(0)
    }

    /// The number of coefficients covered by this basis under a shell-count policy.
    pub fn n_funcs(&self, policy: &ShellCountPolicy) -> usize {
        self.aos
            .iter()
            .map(|ao| policy.n_funcs(ao.shell_type, self.counting))
            .sum()
    }

    /// The ordered tuples of 0-based coefficient indices indicating the starting (inclusive) and
    /// ending (exclusive) positions of the shells in this basis.
    pub fn shell_boundary_indices(&self, policy: &ShellCountPolicy) -> Vec<(usize, usize)> {
        self.aos
            .iter()
            .scan(0, |acc, ao| {
                let start_index = *acc;
                *acc += policy.n_funcs(ao.shell_type, self.counting);
                Some((start_index, *acc))
            })
            .collect::<Vec<_>>()
    }
}

impl fmt::Display for BasisAngularOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let atom_index_length = self.n_atoms().to_string().chars().count().max(4);
        let shell_index_length = self.n_shells().to_string().chars().count().max(1);
        let width = atom_index_length + shell_index_length + 14;
        writeln!(f, "Angular counting: {}", self.counting)?;
        writeln!(f, "{}", "┈".repeat(width))?;
        writeln!(
            f,
            " {:>shell_index_length$}  {:>atom_index_length$}  Shell",
            "#", "Atom"
        )?;
        writeln!(f, "{}", "┈".repeat(width))?;
        for ao in self.aos.iter() {
            writeln!(
                f,
                " {:>shell_index_length$}  {:>atom_index_length$}  {}",
                ao.ordinal, ao.atom, ao.shell_type
            )?;
        }
        writeln!(f, "{}", "┈".repeat(width))?;
        Ok(())
    }
}
