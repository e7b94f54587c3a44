//! The request → response inference pipeline.
//!
//! Deterministic, no shared mutable state across requests. Every internal
//! failure is converted to a `GatewayError` at this boundary; nothing
//! escapes to the transport layer unhandled.

use crate::convert;
use crate::error::GatewayError;
use crate::loader::ModelArtifacts;
use crate::preprocess::{IdentityPreprocessor, Preprocessor};
use crate::schema::{PredictRequest, PredictResponse};
use std::sync::Arc;

/// Returned with status 503 while either artifact slot is unset.
pub const NOT_READY_MESSAGE: &str = "Models are not loaded. Service is unavailable.";
/// Returned with status 400 for empty or shapeless request bodies.
pub const NO_DATA_MESSAGE: &str = "No JSON data provided";
/// Static text attached to every successful response.
pub const SUCCESS_MESSAGE: &str = "Prediction successful";

pub struct InferencePipeline {
    preprocessor: Arc<dyn Preprocessor>,
}

impl Default for InferencePipeline {
    fn default() -> Self {
        InferencePipeline::new(Arc::new(IdentityPreprocessor))
    }
}

impl InferencePipeline {
    pub fn new(preprocessor: Arc<dyn Preprocessor>) -> Self {
        InferencePipeline { preprocessor }
    }

    /// Run one request body through validate → preprocess → predict →
    /// assemble.
    ///
    /// Classification runs first; clustering runs on the exact same
    /// preprocessed matrix and never runs if classification fails. Note
    /// this assumes both models were fit on identical feature schemas.
    pub fn run(
        &self,
        artifacts: &ModelArtifacts,
        body: &[u8],
    ) -> Result<PredictResponse, GatewayError> {
        let request = parse_request(body)?;

        let (Some(classifier), Some(clusterer)) =
            (&artifacts.classification, &artifacts.clustering)
        else {
            return Err(GatewayError::ServiceNotReady(NOT_READY_MESSAGE.into()));
        };

        let matrix = convert::request_to_matrix(&request)?;
        let input_rows = matrix.nrows();
        let matrix = self.preprocessor.transform(matrix)?;

        let labels = classifier
            .predict_labels(&matrix)
            .map_err(|e| GatewayError::Inference(e.to_string()))?;
        let groups = clusterer
            .predict_groups(&matrix)
            .map_err(|e| GatewayError::Inference(e.to_string()))?;

        // A length mismatch is a defect, not a recoverable condition.
        if labels.len() != input_rows || groups.len() != input_rows {
            return Err(GatewayError::Inference(format!(
                "prediction length mismatch: {} labels and {} groups for {} input rows",
                labels.len(),
                groups.len(),
                input_rows
            )));
        }

        Ok(PredictResponse {
            status: "success".into(),
            classification_label: labels,
            clustering_group_id: groups,
            message: SUCCESS_MESSAGE.into(),
        })
    }
}

/// Step A: reject empty or non-parseable payloads before anything runs.
fn parse_request(body: &[u8]) -> Result<PredictRequest, GatewayError> {
    if body.is_empty() {
        return Err(GatewayError::InvalidInput(NO_DATA_MESSAGE.into()));
    }
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| GatewayError::InvalidInput(format!("Invalid JSON payload: {e}")))?;
    // `{}`, `[]`, `null` and other shapeless bodies all count as no data.
    let request: PredictRequest = serde_json::from_value(value)
        .map_err(|_| GatewayError::InvalidInput(NO_DATA_MESSAGE.into()))?;
    if request.is_empty() {
        return Err(GatewayError::InvalidInput(NO_DATA_MESSAGE.into()));
    }
    Ok(request)
}
