//! Tests for the core serving flow
//!
//! Covers row conversion, the artifact envelope, the startup loader, and
//! the inference pipeline's error taxonomy.

#[cfg(test)]
mod tests {
    use crate::artifact::{ArtifactModel, ModelWithMeta};
    use crate::convert::{data_to_matrix, rows_to_matrix};
    use crate::error::{ArtifactError, GatewayError};
    use crate::loader::{CLASSIFICATION_ARTIFACT, CLUSTERING_ARTIFACT, ModelArtifacts};
    use crate::pipeline::{InferencePipeline, NO_DATA_MESSAGE, NOT_READY_MESSAGE};
    use linfa::DatasetBase;
    use linfa::traits::Fit;
    use linfa_clustering::KMeans;
    use linfa_nn::distance::L2Dist;
    use linfa_trees::DecisionTree;
    use ndarray::array;
    use serde_json::json;
    use std::collections::HashMap;

    fn classifier(classes: Option<HashMap<usize, String>>) -> ArtifactModel {
        // two well-separated classes on two features
        let records = array![
            [0.0, 0.0],
            [0.1, 0.2],
            [0.2, 0.1],
            [5.0, 5.0],
            [5.2, 4.8],
            [4.9, 5.1]
        ];
        let targets = array![0usize, 0, 0, 1, 1, 1];
        let ds = DatasetBase::from(records).with_targets(targets);
        let tree = DecisionTree::params().fit(&ds).unwrap();
        ArtifactModel::DecisionTree(ModelWithMeta {
            model: tree,
            classes,
        })
    }

    fn clusterer() -> ArtifactModel {
        let records = array![[0.0, 0.0], [0.2, 0.1], [5.0, 5.0], [5.1, 4.9]];
        let ds = DatasetBase::from(records);
        let model: KMeans<f64, L2Dist> = KMeans::params(2).fit(&ds).unwrap();
        ArtifactModel::KMeans(ModelWithMeta {
            model,
            classes: None,
        })
    }

    fn loaded_artifacts() -> ModelArtifacts {
        ModelArtifacts {
            classification: Some(classifier(None)),
            clustering: Some(clusterer()),
        }
    }

    // ============================================================================
    // Row conversion tests
    // ============================================================================

    #[test]
    fn test_rows_to_matrix_basic() {
        let rows = vec![
            json!({"f1": 1.0, "f2": 2.0}).as_object().unwrap().clone(),
            json!({"f1": 3.0, "f2": 4.0}).as_object().unwrap().clone(),
        ];

        let matrix = rows_to_matrix(&rows).unwrap();
        assert_eq!(matrix.shape(), &[2, 2]);
        assert_eq!(matrix[[0, 0]], 1.0);
        assert_eq!(matrix[[1, 1]], 4.0);
    }

    #[test]
    fn test_rows_to_matrix_missing_feature() {
        let rows = vec![
            json!({"f1": 1.0, "f2": 2.0}).as_object().unwrap().clone(),
            json!({"f1": 3.0, "f3": 4.0}).as_object().unwrap().clone(),
        ];

        let result = rows_to_matrix(&rows);
        assert!(matches!(result, Err(GatewayError::Inference(_))));
    }

    #[test]
    fn test_rows_to_matrix_non_numeric() {
        let rows = vec![json!({"f1": "high"}).as_object().unwrap().clone()];

        let result = rows_to_matrix(&rows);
        assert!(matches!(result, Err(GatewayError::Inference(_))));
    }

    #[test]
    fn test_data_to_matrix_basic() {
        let data = vec![vec![json!(1.0), json!(2.0)], vec![json!(3), json!(4)]];

        let matrix = data_to_matrix(&data).unwrap();
        assert_eq!(matrix.shape(), &[2, 2]);
        assert_eq!(matrix[[1, 0]], 3.0);
    }

    #[test]
    fn test_data_to_matrix_inconsistent_lengths() {
        let data = vec![vec![json!(1.0), json!(2.0)], vec![json!(3.0)]];

        let result = data_to_matrix(&data);
        assert!(matches!(result, Err(GatewayError::Inference(_))));
    }

    // ============================================================================
    // Artifact envelope tests
    // ============================================================================

    #[test]
    fn test_envelope_round_trip_preserves_predictions() {
        let model = clusterer();
        let probe = array![[0.1, 0.1], [5.0, 5.0]];
        let before = model.predict_groups(&probe).unwrap();

        let bytes = model.to_bytes().unwrap();
        let restored = ArtifactModel::from_bytes(&bytes).unwrap();
        let after = restored.predict_groups(&probe).unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn test_envelope_rejects_corrupt_bytes() {
        let result = ArtifactModel::from_bytes(b"not an artifact");
        assert!(matches!(result, Err(ArtifactError::Decode(_))));
    }

    #[test]
    fn test_envelope_rejects_unknown_version() {
        #[derive(serde::Serialize)]
        struct Envelope {
            version: u8,
            payload: Vec<u8>,
        }
        let bytes = rmp_serde::to_vec(&Envelope {
            version: 9,
            payload: vec![],
        })
        .unwrap();

        let result = ArtifactModel::from_bytes(&bytes);
        assert!(matches!(result, Err(ArtifactError::UnsupportedVersion(9))));
    }

    #[test]
    fn test_class_names_survive_round_trip() {
        let classes: HashMap<usize, String> =
            [(0, "low".to_string()), (1, "high".to_string())].into();
        let model = classifier(Some(classes));

        let bytes = model.to_bytes().unwrap();
        let restored = ArtifactModel::from_bytes(&bytes).unwrap();

        let labels = restored.predict_labels(&array![[0.0, 0.0], [5.0, 5.0]]).unwrap();
        assert_eq!(labels, vec!["low".to_string(), "high".to_string()]);
    }

    // ============================================================================
    // Startup loader tests
    // ============================================================================

    #[test]
    fn test_loader_reads_both_roles() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CLASSIFICATION_ARTIFACT),
            classifier(None).to_bytes().unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join(CLUSTERING_ARTIFACT),
            clusterer().to_bytes().unwrap(),
        )
        .unwrap();

        let artifacts = ModelArtifacts::load(dir.path());
        assert!(artifacts.is_ready());
    }

    #[test]
    fn test_loader_leaves_slot_unset_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CLUSTERING_ARTIFACT),
            clusterer().to_bytes().unwrap(),
        )
        .unwrap();

        let artifacts = ModelArtifacts::load(dir.path());
        assert!(artifacts.classification.is_none());
        assert!(artifacts.clustering.is_some());
        assert!(!artifacts.is_ready());
    }

    #[test]
    fn test_loader_leaves_slot_unset_on_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CLASSIFICATION_ARTIFACT), b"garbage").unwrap();
        std::fs::write(
            dir.path().join(CLUSTERING_ARTIFACT),
            clusterer().to_bytes().unwrap(),
        )
        .unwrap();

        let artifacts = ModelArtifacts::load(dir.path());
        assert!(artifacts.classification.is_none());
        assert!(!artifacts.is_ready());
    }

    // ============================================================================
    // Pipeline tests
    // ============================================================================

    #[test]
    fn test_pipeline_success_row_objects() {
        let pipeline = InferencePipeline::default();
        let body = serde_json::to_vec(&json!([
            {"f1": 0.1, "f2": 0.1},
            {"f1": 5.0, "f2": 5.0}
        ]))
        .unwrap();

        let response = pipeline.run(&loaded_artifacts(), &body).unwrap();
        assert_eq!(response.status, "success");
        assert_eq!(response.classification_label.len(), 2);
        assert_eq!(response.clustering_group_id.len(), 2);
    }

    #[test]
    fn test_pipeline_success_typed_payload() {
        let pipeline = InferencePipeline::default();
        let body = serde_json::to_vec(&json!({"data": [[0.1, 0.1], [5.0, 5.0], [0.2, 0.0]]}))
            .unwrap();

        let response = pipeline.run(&loaded_artifacts(), &body).unwrap();
        assert_eq!(response.classification_label.len(), 3);
        assert_eq!(response.clustering_group_id.len(), 3);
    }

    #[test]
    fn test_pipeline_results_aligned_with_input_rows() {
        let pipeline = InferencePipeline::default();
        let rows: Vec<_> = (0..7).map(|i| json!({"f1": i as f64, "f2": 0.5})).collect();
        let body = serde_json::to_vec(&rows).unwrap();

        let response = pipeline.run(&loaded_artifacts(), &body).unwrap();
        assert_eq!(response.classification_label.len(), 7);
        assert_eq!(response.clustering_group_id.len(), 7);
    }

    #[test]
    fn test_pipeline_not_ready_when_slot_unset() {
        let pipeline = InferencePipeline::default();
        let artifacts = ModelArtifacts {
            classification: Some(classifier(None)),
            clustering: None,
        };
        let body = serde_json::to_vec(&json!([{"f1": 1.0, "f2": 2.0}])).unwrap();

        let result = pipeline.run(&artifacts, &body);
        match result {
            Err(GatewayError::ServiceNotReady(msg)) => assert_eq!(msg, NOT_READY_MESSAGE),
            other => panic!("expected ServiceNotReady, got {other:?}"),
        }
    }

    #[test]
    fn test_pipeline_empty_body() {
        let pipeline = InferencePipeline::default();

        let result = pipeline.run(&loaded_artifacts(), b"");
        match result {
            Err(GatewayError::InvalidInput(msg)) => assert_eq!(msg, NO_DATA_MESSAGE),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_pipeline_empty_object_body() {
        let pipeline = InferencePipeline::default();

        let result = pipeline.run(&loaded_artifacts(), b"{}");
        match result {
            Err(GatewayError::InvalidInput(msg)) => assert_eq!(msg, NO_DATA_MESSAGE),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_pipeline_non_json_body() {
        let pipeline = InferencePipeline::default();

        let result = pipeline.run(&loaded_artifacts(), b"definitely not json");
        assert!(matches!(result, Err(GatewayError::InvalidInput(_))));
    }

    #[test]
    fn test_pipeline_shape_mismatch_is_inference_error() {
        let pipeline = InferencePipeline::default();
        // models were fit on 2 features, request carries 3
        let body =
            serde_json::to_vec(&json!([{"f1": 1.0, "f2": 2.0, "f3": 3.0}])).unwrap();

        let result = pipeline.run(&loaded_artifacts(), &body);
        match result {
            Err(GatewayError::Inference(msg)) => assert!(msg.contains("features")),
            other => panic!("expected Inference, got {other:?}"),
        }
    }

    #[test]
    fn test_pipeline_never_predicts_when_not_ready() {
        // A body that would fail inference must still report 503 first.
        let pipeline = InferencePipeline::default();
        let artifacts = ModelArtifacts::default();
        let body = serde_json::to_vec(&json!([{"f1": "bad"}])).unwrap();

        let result = pipeline.run(&artifacts, &body);
        assert!(matches!(result, Err(GatewayError::ServiceNotReady(_))));
    }
}
