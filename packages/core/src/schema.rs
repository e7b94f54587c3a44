//! Wire schemas for the prediction endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Accepted request bodies for `POST /predict`.
///
/// Either a bare JSON array of row objects (feature name → value) or the
/// schema-typed form `{"data": [[...], [...]]}` where each inner sequence
/// is one row.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PredictRequest {
    Typed(TypedPayload),
    Rows(Vec<Map<String, Value>>),
}

#[derive(Debug, Deserialize)]
pub struct TypedPayload {
    pub data: Vec<Vec<Value>>,
}

impl PredictRequest {
    pub fn row_count(&self) -> usize {
        match self {
            PredictRequest::Typed(payload) => payload.data.len(),
            PredictRequest::Rows(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}

/// Successful prediction response.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub status: String,
    /// One label per input row, positionally aligned.
    pub classification_label: Vec<String>,
    /// One group id per input row, positionally aligned.
    pub clustering_group_id: Vec<usize>,
    pub message: String,
}

/// Failure body, paired with a non-200 status by the HTTP layer.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
