//! Port traits. API boundaries for the hexagon.
//!
//! Outbound only: the application calls into infrastructure. The CLI drives
//! use cases directly.

pub mod outbound;
pub mod progress;

pub use outbound::{
    ArtifactLink, ArtifactReader, ArtifactStore, BotApi, BuildSource, DocumentUpload, Environment,
};
pub use progress::ProgressPort;
