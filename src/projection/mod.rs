//! Projection of molecular-orbital coefficients onto atoms and shell types.

pub mod shell_projection;

pub use shell_projection::{ProjectionTensor, ShellCoefficientProjector};
