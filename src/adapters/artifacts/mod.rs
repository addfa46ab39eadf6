//! Artifact storage adapters.

pub mod fs_store;
pub mod glob;

pub use fs_store::FsArtifactStore;
pub use glob::AntGlob;
