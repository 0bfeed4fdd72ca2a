//! Atomic-orbital basis information.

pub mod ao;
