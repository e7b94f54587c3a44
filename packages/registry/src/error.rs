use thiserror::Error;

/// Failures talking to the tracking server.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The server could not be reached at all.
    #[error("connection failed: {0}")]
    Connection(String),
    /// The server answered with a structured API error.
    #[error("{code}: {message}")]
    Api { code: String, message: String },
    /// The response body did not match the expected shape.
    #[error("failed to decode registry response: {0}")]
    Decode(String),
    /// The run's artifact location is missing or not proxied by the
    /// tracking server.
    #[error("artifact store error: {0}")]
    ArtifactStore(String),
}

impl RegistryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::Api { code, .. } if code == "RESOURCE_DOES_NOT_EXIST")
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, RegistryError::Api { code, .. } if code == "RESOURCE_ALREADY_EXISTS")
    }
}
