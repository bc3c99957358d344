//! # Contracts
//!
//! Shared interface types for the mtee workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Line Model
//! - Input is a stream of `\n`-separated lines
//! - A line travels without its separator until the engine dispatches it

mod error;
mod line_source;
mod settings;

pub use error::*;
pub use line_source::{LineSource, LocalLineSource};
pub use settings::*;
