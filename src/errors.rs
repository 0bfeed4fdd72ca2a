//! Error kinds raised by the projection and smearing machinery.
//!
//! These are raised into [`anyhow::Error`] at the point of failure, so callers that need to
//! distinguish between them can recover the kind with
//! [`anyhow::Error::downcast_ref::<SharpoError>`].

use std::fmt;

/// Enumerated type for the deterministic failures that can occur before any bulk numerical work
/// starts.
#[derive(Clone, PartialEq)]
pub enum SharpoError {
    /// A control parameter is out of its admissible range (*e.g.* non-positive smearing width or
    /// grid density, or an unnormalised energy window).
    ParameterValidation(String),

    /// A selected orbital index lies outside $`[1, N]`$.
    IndexOutOfRange {
        /// The offending 1-based orbital index.
        index: usize,

        /// The number of orbitals in the wavefunction model.
        n_orbitals: usize,
    },

    /// A spherical harmonic has been requested for quantum numbers outside the tabulated range.
    UnsupportedQuantumNumbers {
        /// The requested angular momentum quantum number.
        l: u32,

        /// The requested magnetic quantum number.
        m: i32,
    },

    /// The wavefunction model is internally inconsistent (*e.g.* a coefficient vector does not
    /// cover the atomic-orbital layout).
    ModelConsistency(String),
}

impl SharpoError {
    /// Returns a short name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            SharpoError::ParameterValidation(_) => "ParameterValidationError",
            SharpoError::IndexOutOfRange { .. } => "IndexOutOfRangeError",
            SharpoError::UnsupportedQuantumNumbers { .. } => "UnsupportedQuantumNumberError",
            SharpoError::ModelConsistency(_) => "ModelConsistencyError",
        }
    }
}

impl fmt::Display for SharpoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SharpoError::ParameterValidation(msg) => {
                write!(f, "{} with message: {msg}", self.kind())
            }
            SharpoError::IndexOutOfRange { index, n_orbitals } => write!(
                f,
                "{}: orbital index {index} lies outside [1, {n_orbitals}]",
                self.kind()
            ),
            SharpoError::UnsupportedQuantumNumbers { l, m } => write!(
                f,
                "{}: no spherical harmonic tabulated for (l, m) = ({l}, {m})",
                self.kind()
            ),
            SharpoError::ModelConsistency(msg) => {
                write!(f, "{} with message: {msg}", self.kind())
            }
        }
    }
}

impl fmt::Debug for SharpoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharpoError")
            .field("Kind", &self.kind())
            .field("Message", &self.to_string())
            .finish()
    }
}

impl std::error::Error for SharpoError {}
