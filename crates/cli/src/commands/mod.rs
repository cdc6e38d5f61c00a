//! Command implementations shared by the binaries

pub mod importance;
pub mod predict;
pub mod repackage;
