//! Helper items to assist the working of Sharpo.

pub mod constants;
