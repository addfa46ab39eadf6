//! Implements ArtifactStore over a local directory.
//!
//! The directory is walked once per `list` call, sorted by file name at each
//! level, so enumeration order is stable between runs.

use crate::adapters::artifacts::glob::AntGlob;
use crate::domain::{Artifact, DomainError};
use crate::ports::{ArtifactReader, ArtifactStore};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;
use walkdir::WalkDir;

/// File-system artifact store rooted at the build's artifact directory.
pub struct FsArtifactStore {
    root: PathBuf,
    /// Public URL of `root`, used to build links for oversized artifacts.
    public_base_url: Option<String>,
}

impl FsArtifactStore {
    pub fn new(root: impl AsRef<Path>, public_base_url: Option<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            public_base_url,
        }
    }
}

fn scan(
    root: &Path,
    glob: &AntGlob,
    public_base_url: Option<&str>,
) -> Result<Vec<Artifact>, DomainError> {
    if !root.is_dir() {
        return Err(DomainError::ArtifactList(format!(
            "artifact directory {} does not exist",
            root.display()
        )));
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| DomainError::ArtifactList(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative_path = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if !glob.is_match(&relative_path) {
            continue;
        }
        let size_bytes = entry
            .metadata()
            .map_err(|e| DomainError::ArtifactList(e.to_string()))?
            .len();
        let public_url = public_base_url.and_then(|base| join_public_url(base, &relative_path));
        found.push(Artifact {
            relative_path,
            size_bytes,
            location: entry.path().display().to_string(),
            public_url,
        });
    }
    Ok(found)
}

/// Appends `relative_path` to `base`, percent-encoding each segment.
fn join_public_url(base: &str, relative_path: &str) -> Option<String> {
    let mut url = match Url::parse(base) {
        Ok(url) => url,
        Err(e) => {
            warn!(base, error = %e, "artifacts URL is not a valid URL");
            return None;
        }
    };
    {
        let mut segments = url.path_segments_mut().ok()?;
        segments.pop_if_empty();
        segments.extend(relative_path.split('/'));
    }
    Some(url.to_string())
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn list(&self, glob: &str) -> Result<Vec<Artifact>, DomainError> {
        let matcher = AntGlob::new(glob)?;
        let root = self.root.clone();
        let base = self.public_base_url.clone();
        let (abs_root, artifacts) = tokio::task::spawn_blocking(move || {
            let artifacts = scan(&root, &matcher, base.as_deref())?;
            let abs_root = root.canonicalize().unwrap_or(root);
            Ok::<_, DomainError>((abs_root, artifacts))
        })
        .await
        .map_err(|e| DomainError::ArtifactList(e.to_string()))??;

        info!(
            root = %abs_root.display(),
            glob,
            count = artifacts.len(),
            "listed artifacts"
        );
        Ok(artifacts)
    }

    async fn open(&self, artifact: &Artifact) -> Result<ArtifactReader, DomainError> {
        debug!(path = %artifact.location, "opening artifact");
        let file = tokio::fs::File::open(&artifact.location)
            .await
            .map_err(|e| {
                DomainError::ArtifactList(format!(
                    "can't read artifact '{}': {}",
                    artifact.relative_path, e
                ))
            })?;
        Ok(Box::new(file))
    }
}
