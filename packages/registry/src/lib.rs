//! Client for an MLflow-compatible model registry.
//!
//! The registry is an external collaborator reached only through its REST
//! surface; this crate wraps the handful of operations the lifecycle
//! commands need and keeps the registration and deletion orchestration
//! behind a trait seam so call sequences are testable without a server.

pub mod client;
pub mod error;
pub mod lifecycle;
pub mod types;


pub use client::RegistryClient;
pub use error::RegistryError;
pub use lifecycle::{Registry, get_or_create_experiment, log_model, purge_model, verify_deleted};
pub use types::{Experiment, ModelVersion, RegisteredModel, RunHandle};
