//! Preprocessing seam between the raw request matrix and the models.

use crate::error::GatewayError;
use ndarray::Array2;

/// Strategy interface for feature engineering.
///
/// Both models receive the same transformed matrix; there is no per-model
/// preprocessing divergence. Deployments substitute their own scaling or
/// encoding here without touching the pipeline.
pub trait Preprocessor: Send + Sync {
    fn transform(&self, records: Array2<f64>) -> Result<Array2<f64>, GatewayError>;
}

/// Default pass-through: no scaling, encoding, or feature selection.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityPreprocessor;

impl Preprocessor for IdentityPreprocessor {
    fn transform(&self, records: Array2<f64>) -> Result<Array2<f64>, GatewayError> {
        Ok(records)
    }
}
