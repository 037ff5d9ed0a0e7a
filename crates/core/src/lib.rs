//! Core library for the ComfyDock environment manager
//!
//! This crate contains the logic behind the create/duplicate environment
//! dialogs: the mount policy, path utilities, form state, the workflow state
//! machine, release caching, user settings, backend collaborator contracts,
//! logging, and error handling. Presentation (CLI or GUI) lives in dependent
//! crates.

pub mod backend;
pub mod debounce;
pub mod environment;
pub mod errors;
pub mod form;
pub mod logging;
pub mod mount;
pub mod paths;
pub mod releases;
pub mod settings;
pub mod store;
pub mod workflow;

// Re-export IndexMap for dependent crates (preserves insertion order for
// release/tag listings)
pub use indexmap::IndexMap;

/// Get the version of the core library
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
