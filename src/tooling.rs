//! Tooling Layer
//!
//! Provides the grove CLI and the text rendering helpers it prints with.
//! Everything here sits on top of the library surface; nothing below this
//! module depends on it.

pub mod cli;
pub mod render;

pub use cli::{Cli, CliContext, Commands};
