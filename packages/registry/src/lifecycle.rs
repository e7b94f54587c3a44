//! Registration and deletion lifecycles for registered models.
//!
//! Registration per name: resolve the experiment, open a run, upload the
//! artifact bytes into the run's artifact location, then register a
//! version sourced from that location. Deletion per name: Unregistered →
//! Registered(versions) → Deleting → Unregistered. The registry rejects
//! deleting a name that still has versions, so every version goes first;
//! a version-deletion failure is a hard stop for that model and the named
//! entry is left in place.

use crate::client::RegistryClient;
use crate::error::RegistryError;
use crate::types::{ModelVersion, RegisteredModel, RunHandle};
use async_trait::async_trait;

/// The registry operations the lifecycle flows consume.
///
/// Seam for tests: call sequences are asserted against a fake instead of
/// a live tracking server.
#[async_trait]
pub trait Registry: Send + Sync {
    async fn get_experiment_by_name(&self, name: &str) -> Result<String, RegistryError>;
    async fn create_experiment(&self, name: &str) -> Result<String, RegistryError>;
    async fn upload_artifact(
        &self,
        artifact_location: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<(), RegistryError>;
    async fn create_registered_model(&self, name: &str) -> Result<(), RegistryError>;
    async fn create_model_version(
        &self,
        name: &str,
        source: &str,
        run_id: &str,
    ) -> Result<ModelVersion, RegistryError>;
    async fn get_registered_model(&self, name: &str) -> Result<RegisteredModel, RegistryError>;
    async fn delete_model_version(&self, name: &str, version: &str) -> Result<(), RegistryError>;
    async fn delete_registered_model(&self, name: &str) -> Result<(), RegistryError>;
}

#[async_trait]
impl Registry for RegistryClient {
    async fn get_experiment_by_name(&self, name: &str) -> Result<String, RegistryError> {
        RegistryClient::get_experiment_by_name(self, name)
            .await
            .map(|experiment| experiment.experiment_id)
    }

    async fn create_experiment(&self, name: &str) -> Result<String, RegistryError> {
        RegistryClient::create_experiment(self, name).await
    }

    async fn upload_artifact(
        &self,
        artifact_location: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<(), RegistryError> {
        RegistryClient::upload_artifact(self, artifact_location, filename, bytes).await
    }

    async fn create_registered_model(&self, name: &str) -> Result<(), RegistryError> {
        RegistryClient::create_registered_model(self, name).await
    }

    async fn create_model_version(
        &self,
        name: &str,
        source: &str,
        run_id: &str,
    ) -> Result<ModelVersion, RegistryError> {
        RegistryClient::create_model_version(self, name, source, run_id).await
    }

    async fn get_registered_model(&self, name: &str) -> Result<RegisteredModel, RegistryError> {
        RegistryClient::get_registered_model(self, name).await
    }

    async fn delete_model_version(&self, name: &str, version: &str) -> Result<(), RegistryError> {
        RegistryClient::delete_model_version(self, name, version).await
    }

    async fn delete_registered_model(&self, name: &str) -> Result<(), RegistryError> {
        RegistryClient::delete_registered_model(self, name).await
    }
}

/// Equivalent of `set_experiment`: reuse the named experiment or create
/// it.
pub async fn get_or_create_experiment(
    registry: &dyn Registry,
    name: &str,
) -> Result<String, RegistryError> {
    match registry.get_experiment_by_name(name).await {
        Ok(experiment_id) => Ok(experiment_id),
        Err(e) if e.is_not_found() => registry.create_experiment(name).await,
        Err(e) => Err(e),
    }
}

/// Log-and-register one model under an open run.
///
/// The artifact bytes are uploaded to `{artifact_path}/model.bin` inside
/// the run's artifact location before the version is created, so the
/// `runs:/{run_id}/{artifact_path}` source the version points at is
/// backed by real content. An already-registered name is fine; the new
/// version is appended to it.
pub async fn log_model(
    registry: &dyn Registry,
    name: &str,
    run: &RunHandle,
    artifact_path: &str,
    bytes: Vec<u8>,
) -> Result<ModelVersion, RegistryError> {
    let artifact_location = run.artifact_uri.as_deref().ok_or_else(|| {
        RegistryError::ArtifactStore(format!("run {} has no artifact location", run.run_id))
    })?;
    let filename = format!("{artifact_path}/model.bin");
    registry
        .upload_artifact(artifact_location, &filename, bytes)
        .await?;
    tracing::debug!(model = name, run = %run.run_id, "Uploaded model artifact");

    match registry.create_registered_model(name).await {
        Ok(()) => {}
        Err(e) if e.is_already_exists() => {}
        Err(e) => return Err(e),
    }
    let source = format!("runs:/{}/{}", run.run_id, artifact_path);
    registry.create_model_version(name, &source, &run.run_id).await
}

/// Delete a registered model and all its versions.
///
/// Every listed version is deleted before the named entry; if any version
/// deletion fails the named entry is not touched and the error is
/// returned to the caller.
pub async fn purge_model(registry: &dyn Registry, name: &str) -> Result<(), RegistryError> {
    let model = registry.get_registered_model(name).await?;
    tracing::info!(
        model = name,
        versions = model.latest_versions.len(),
        "Deleting registered model"
    );

    for version in &model.latest_versions {
        registry.delete_model_version(name, &version.version).await?;
        tracing::debug!(model = name, version = %version.version, "Deleted model version");
    }

    registry.delete_registered_model(name).await?;
    Ok(())
}

/// Re-fetch after a purge. `Ok(true)` means the registry confirmed the
/// name is gone; a successful fetch means the deletion did not take
/// effect and the caller should warn, not celebrate. Any other failure
/// (connection drop, server error) proves nothing and is passed through.
pub async fn verify_deleted(registry: &dyn Registry, name: &str) -> Result<bool, RegistryError> {
    match registry.get_registered_model(name).await {
        Ok(_) => Ok(false),
        Err(e) if e.is_not_found() => Ok(true),
        Err(e) => Err(e),
    }
}
