use thiserror::Error;

/// Closed error taxonomy for the serving path.
///
/// Every failure inside the pipeline is converted into one of these
/// variants at the pipeline boundary; the HTTP layer maps them to status
/// codes (400 / 503 / 500) without further inspection.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed or empty request body. Caused by the caller.
    #[error("{0}")]
    InvalidInput(String),
    /// One or both artifact slots are unset. The service started degraded.
    #[error("{0}")]
    ServiceNotReady(String),
    /// Failure inside preprocessing or a predict call, including shape
    /// mismatches between request rows and the fitted models.
    #[error("{0}")]
    Inference(String),
}

/// Failures in artifact serialization and prediction.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact encode failed: {0}")]
    Encode(String),
    #[error("artifact decode failed: {0}")]
    Decode(String),
    #[error("unsupported artifact envelope version: {0}")]
    UnsupportedVersion(u8),
    #[error("{0}")]
    Predict(String),
}
