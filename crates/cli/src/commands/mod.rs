//! Command implementations.

mod run;

pub use run::{log_level, resolve_settings, run_tee};
