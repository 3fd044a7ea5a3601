//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All user-facing output goes through this module so `--quiet` is honored
//! in one place. Diagnostics use `tracing` instead.

pub mod output;
