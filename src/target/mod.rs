//! Targets of the projection: molecular orbitals and the wavefunction model holding them.

pub mod orbital;
