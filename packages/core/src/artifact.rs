//! Serializable model artifacts backed by the `[linfa]` crate.
//!
//! An artifact is a previously fitted predictor stored on disk as a
//! version-tagged MessagePack envelope. The gateway never trains; it only
//! decodes artifacts at startup and calls predict.

use crate::error::ArtifactError;
use linfa::DatasetBase;
use linfa::traits::Predict;
use linfa_clustering::KMeans;
use linfa_nn::distance::L2Dist;
use linfa_trees::DecisionTree;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Envelope format version, bumped on incompatible payload changes.
const ENVELOPE_VERSION: u8 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ClassEntry {
    id: usize,
    name: String,
}

/// Helper-Module to serialize HashMap as Vec and deserialize Vec as HashMap
/// for the class mappings.
mod vec_as_map {
    use super::ClassEntry;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::HashMap;

    pub fn serialize<S>(
        map_opt: &Option<HashMap<usize, String>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match map_opt {
            Some(map) => {
                let mut seq = serializer.serialize_seq(Some(map.len()))?;
                for (id, name) in map {
                    let entry = ClassEntry {
                        id: *id,
                        name: name.clone(),
                    };
                    seq.serialize_element(&entry)?;
                }
                seq.end()
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<HashMap<usize, String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt_vec: Option<Vec<ClassEntry>> = Option::deserialize(deserializer)?;
        Ok(opt_vec.map(|v| v.into_iter().map(|e| (e.id, e.name)).collect()))
    }
}

/// A fitted linfa model attached with additional metadata.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelWithMeta<M> {
    pub model: M,
    /// Optional mapping from class index → class name
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(with = "vec_as_map")]
    pub classes: Option<HashMap<usize, String>>,
}

/// Unified type for the predictors the gateway can serve.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ArtifactModel {
    KMeans(ModelWithMeta<KMeans<f64, L2Dist>>),
    DecisionTree(ModelWithMeta<DecisionTree<f64, usize>>),
}

impl fmt::Display for ArtifactModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactModel::KMeans(_) => write!(f, "KMeans Clustering"),
            ArtifactModel::DecisionTree(_) => write!(f, "Decision Tree Classification"),
        }
    }
}

/// On-disk wrapper: the model is serialized to MessagePack, then wrapped
/// with a format version so future payload changes stay detectable.
#[derive(Serialize, Deserialize)]
struct ArtifactEnvelope {
    version: u8,
    payload: Vec<u8>,
}

impl ArtifactModel {
    /// Serialize the model into the version-tagged binary envelope.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        let payload =
            rmp_serde::to_vec(self).map_err(|e| ArtifactError::Encode(e.to_string()))?;
        let envelope = ArtifactEnvelope {
            version: ENVELOPE_VERSION,
            payload,
        };
        rmp_serde::to_vec(&envelope).map_err(|e| ArtifactError::Encode(e.to_string()))
    }

    /// Deserialize a model from the binary envelope.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let envelope: ArtifactEnvelope =
            rmp_serde::from_slice(bytes).map_err(|e| ArtifactError::Decode(e.to_string()))?;
        if envelope.version != ENVELOPE_VERSION {
            return Err(ArtifactError::UnsupportedVersion(envelope.version));
        }
        rmp_serde::from_slice(&envelope.payload).map_err(|e| ArtifactError::Decode(e.to_string()))
    }

    /// Number of features the model was fit on, where the model exposes it.
    fn check_features(&self, records: &Array2<f64>) -> Result<(), ArtifactError> {
        match self {
            ArtifactModel::KMeans(m) => {
                let expected = m.model.centroids().ncols();
                if records.ncols() != expected {
                    return Err(ArtifactError::Predict(format!(
                        "input has {} features, clustering model was fit on {}",
                        records.ncols(),
                        expected
                    )));
                }
            }
            ArtifactModel::DecisionTree(m) => {
                // The tree only records the feature indices it splits on.
                if let Some(&max) = m.model.features().iter().max() {
                    if records.ncols() <= max {
                        return Err(ArtifactError::Predict(format!(
                            "input has {} features, classification model splits on feature index {}",
                            records.ncols(),
                            max
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Predict one label per input row.
    ///
    /// Classified rows are mapped through the class-name metadata when
    /// present; otherwise the raw prediction id is rendered.
    pub fn predict_labels(&self, records: &Array2<f64>) -> Result<Vec<String>, ArtifactError> {
        self.check_features(records)?;
        match self {
            ArtifactModel::DecisionTree(m) => {
                let dataset = DatasetBase::from(records.clone());
                let predictions = m.model.predict(&dataset);
                predictions
                    .iter()
                    .map(|id| match &m.classes {
                        Some(classes) => classes.get(id).cloned().ok_or_else(|| {
                            ArtifactError::Predict(format!(
                                "Couldn't map prediction {} to any of these classes {:?}",
                                id, classes
                            ))
                        }),
                        None => Ok(id.to_string()),
                    })
                    .collect()
            }
            ArtifactModel::KMeans(m) => {
                let dataset = DatasetBase::from(records.clone());
                let predictions = m.model.predict(&dataset);
                Ok(predictions.iter().map(|id| id.to_string()).collect())
            }
        }
    }

    /// Predict one group id per input row.
    pub fn predict_groups(&self, records: &Array2<f64>) -> Result<Vec<usize>, ArtifactError> {
        self.check_features(records)?;
        match self {
            ArtifactModel::KMeans(m) => {
                let dataset = DatasetBase::from(records.clone());
                Ok(m.model.predict(&dataset).to_vec())
            }
            ArtifactModel::DecisionTree(m) => {
                let dataset = DatasetBase::from(records.clone());
                Ok(m.model.predict(&dataset).to_vec())
            }
        }
    }
}
