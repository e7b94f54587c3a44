//! Async REST client for the tracking server.

use crate::error::RegistryError;
use crate::types::{
    ApiErrorBody, CreateExperimentResponse, Experiment, ExperimentResponse, ModelVersion,
    ModelVersionResponse, RegisteredModel, RegisteredModelResponse, RunHandle, RunResponse,
    SearchExperimentsResponse,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};

pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    /// The tracking URI is configuration, e.g. `http://mlflow.internal:80`.
    pub fn new(tracking_uri: &str) -> Self {
        RegistryClient {
            http: reqwest::Client::new(),
            base_url: tracking_uri.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/2.0/mlflow/{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, RegistryError> {
        let response = request
            .send()
            .await
            .map_err(|e| RegistryError::Connection(e.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RegistryError::Connection(e.to_string()))?;

        if !status.is_success() {
            if let Ok(body) = serde_json::from_slice::<ApiErrorBody>(&bytes) {
                return Err(RegistryError::Api {
                    code: body.error_code,
                    message: body.message,
                });
            }
            return Err(RegistryError::Api {
                code: status.as_u16().to_string(),
                message: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| RegistryError::Decode(e.to_string()))
    }

    /// Like `send`, for endpoints whose success body is empty.
    async fn send_unit(&self, request: reqwest::RequestBuilder) -> Result<(), RegistryError> {
        let response = request
            .send()
            .await
            .map_err(|e| RegistryError::Connection(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RegistryError::Connection(e.to_string()))?;
        if let Ok(body) = serde_json::from_slice::<ApiErrorBody>(&bytes) {
            return Err(RegistryError::Api {
                code: body.error_code,
                message: body.message,
            });
        }
        Err(RegistryError::Api {
            code: status.as_u16().to_string(),
            message: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    /// Cheap connectivity probe; also used by the CLI before a batch.
    pub async fn search_experiments(
        &self,
        max_results: usize,
    ) -> Result<Vec<Experiment>, RegistryError> {
        let response: SearchExperimentsResponse = self
            .send(
                self.http
                    .post(self.endpoint("experiments/search"))
                    .json(&json!({ "max_results": max_results })),
            )
            .await?;
        Ok(response.experiments)
    }

    pub async fn get_experiment_by_name(&self, name: &str) -> Result<Experiment, RegistryError> {
        let response: ExperimentResponse = self
            .send(
                self.http
                    .get(self.endpoint("experiments/get-by-name"))
                    .query(&[("experiment_name", name)]),
            )
            .await?;
        Ok(response.experiment)
    }

    pub async fn create_experiment(&self, name: &str) -> Result<String, RegistryError> {
        let response: CreateExperimentResponse = self
            .send(
                self.http
                    .post(self.endpoint("experiments/create"))
                    .json(&json!({ "name": name })),
            )
            .await?;
        Ok(response.experiment_id)
    }

    pub async fn create_run(
        &self,
        experiment_id: &str,
        run_name: &str,
    ) -> Result<RunHandle, RegistryError> {
        let response: RunResponse = self
            .send(
                self.http.post(self.endpoint("runs/create")).json(&json!({
                    "experiment_id": experiment_id,
                    "run_name": run_name,
                    "start_time": now_millis(),
                })),
            )
            .await?;
        Ok(RunHandle {
            run_id: response.run.info.run_id,
            artifact_uri: response.run.info.artifact_uri,
        })
    }

    pub async fn terminate_run(&self, run_id: &str) -> Result<(), RegistryError> {
        self.send_unit(self.http.post(self.endpoint("runs/update")).json(&json!({
            "run_id": run_id,
            "status": "FINISHED",
            "end_time": now_millis(),
        })))
        .await
    }

    /// Upload one artifact file into a run's `mlflow-artifacts` location.
    ///
    /// `artifact_location` is the run's `artifact_uri`; only the
    /// server-proxied `mlflow-artifacts:` scheme is supported.
    pub async fn upload_artifact(
        &self,
        artifact_location: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<(), RegistryError> {
        let root = artifact_location
            .strip_prefix("mlflow-artifacts:")
            .ok_or_else(|| {
                RegistryError::ArtifactStore(format!(
                    "unsupported artifact location `{artifact_location}`"
                ))
            })?
            .trim_matches('/');
        let url = format!(
            "{}/api/2.0/mlflow-artifacts/artifacts/{}/{}",
            self.base_url, root, filename
        );
        self.send_unit(self.http.put(url).body(bytes)).await
    }

    pub async fn create_registered_model(&self, name: &str) -> Result<(), RegistryError> {
        self.send_unit(
            self.http
                .post(self.endpoint("registered-models/create"))
                .json(&json!({ "name": name })),
        )
        .await
    }

    pub async fn create_model_version(
        &self,
        name: &str,
        source: &str,
        run_id: &str,
    ) -> Result<ModelVersion, RegistryError> {
        let response: ModelVersionResponse = self
            .send(
                self.http
                    .post(self.endpoint("model-versions/create"))
                    .json(&json!({
                        "name": name,
                        "source": source,
                        "run_id": run_id,
                    })),
            )
            .await?;
        Ok(response.model_version)
    }

    pub async fn get_registered_model(&self, name: &str) -> Result<RegisteredModel, RegistryError> {
        let response: RegisteredModelResponse = self
            .send(
                self.http
                    .get(self.endpoint("registered-models/get"))
                    .query(&[("name", name)]),
            )
            .await?;
        Ok(response.registered_model)
    }

    pub async fn delete_model_version(
        &self,
        name: &str,
        version: &str,
    ) -> Result<(), RegistryError> {
        self.send_unit(
            self.http
                .delete(self.endpoint("model-versions/delete"))
                .json(&json!({ "name": name, "version": version })),
        )
        .await
    }

    pub async fn delete_registered_model(&self, name: &str) -> Result<(), RegistryError> {
        self.send_unit(
            self.http
                .delete(self.endpoint("registered-models/delete"))
                .json(&json!({ "name": name })),
        )
        .await
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
