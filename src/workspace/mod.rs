//! Sandboxed workspace access and checkpointing.
//!
//! `FileStore` confines every read/write/delete to one root directory and
//! enumerates the tracked files. `CheckpointManager` snapshots those files
//! into `.checkpoints/` before the pipeline mutates anything, and restores
//! the newest snapshot on demand.

mod checkpoint;
mod error;
mod rules;
mod scanner;
mod store;

// Re-exports
pub use checkpoint::{CheckpointManager, RestoreOutcome};
pub use error::WorkspaceError;
pub use store::FileStore;
