//! Strategy layer — edge scoring and trade sizing.

pub mod edge;
pub mod sizing;
