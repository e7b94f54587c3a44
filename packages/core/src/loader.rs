//! Startup loader for the model artifacts.
//!
//! Runs exactly once, before the listener binds. A failed role leaves its
//! slot unset so the service starts degraded and answers 503 instead of
//! crashing.

use crate::artifact::ArtifactModel;
use std::path::Path;

/// Artifact filename for the classification role.
pub const CLASSIFICATION_ARTIFACT: &str = "classification.bin";
/// Artifact filename for the clustering role.
pub const CLUSTERING_ARTIFACT: &str = "clustering.bin";

/// The immutable artifact slots held for the process lifetime.
///
/// Constructed once at startup and shared read-only behind an `Arc`; no
/// request ever mutates it, so predict calls need no lock.
#[derive(Debug, Default)]
pub struct ModelArtifacts {
    pub classification: Option<ArtifactModel>,
    pub clustering: Option<ArtifactModel>,
}

impl ModelArtifacts {
    /// Decode both roles from `dir`, logging and skipping failed roles.
    pub fn load(dir: &Path) -> Self {
        ModelArtifacts {
            classification: load_role(dir, CLASSIFICATION_ARTIFACT, "classification"),
            clustering: load_role(dir, CLUSTERING_ARTIFACT, "clustering"),
        }
    }

    /// True once both slots are populated.
    pub fn is_ready(&self) -> bool {
        self.classification.is_some() && self.clustering.is_some()
    }
}

fn load_role(dir: &Path, filename: &str, role: &str) -> Option<ArtifactModel> {
    let path = dir.join(filename);
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(role, path = %path.display(), error = %e, "Failed to read model artifact");
            return None;
        }
    };
    match ArtifactModel::from_bytes(&bytes) {
        Ok(model) => {
            tracing::info!(role, model = %model, "Loaded model artifact");
            Some(model)
        }
        Err(e) => {
            tracing::error!(role, path = %path.display(), error = %e, "Failed to decode model artifact");
            None
        }
    }
}
