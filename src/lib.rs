//! Grove: Course Content Tree Client
//!
//! A client-side cache and mutation layer for hierarchical course content.
//! Folder trees load lazily, mutations apply optimistically with rollback,
//! and a selection layer moves files and folders across trees.

pub mod cache;
pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod media;
pub mod mutation;
pub mod node;
pub mod ordering;
pub mod selector;
pub mod tooling;
pub mod transport;
pub mod types;
