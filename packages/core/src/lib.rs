//! Core inference crate for the tabgate model-serving gateway.
//!
//! Holds the artifact model types (based on the `[linfa]` crate), the
//! startup loader, the preprocessing seam and the request/response
//! pipeline. The HTTP surface lives in the `tabgate-api` binary.

pub mod artifact;
pub mod convert;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod preprocess;
pub mod schema;

#[cfg(test)]
mod tests;

pub use artifact::{ArtifactModel, ModelWithMeta};
pub use error::{ArtifactError, GatewayError};
pub use loader::ModelArtifacts;
pub use pipeline::InferencePipeline;
pub use preprocess::{IdentityPreprocessor, Preprocessor};
pub use schema::{ErrorResponse, PredictRequest, PredictResponse};
