//! Command-line utilities for the demand prediction workflow
//!
//! Each binary under `src/bin` is a thin clap front end over a command here.
//! Commands write results to the writer they are given so stdout stays
//! reserved for the result and diagnostics go to stderr.

pub mod commands;
pub mod output;
