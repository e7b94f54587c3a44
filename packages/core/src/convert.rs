//! Conversion from wire rows to the `Array2<f64>` the models expect.
//!
//! Feature completeness is not validated up front: a row that does not
//! match what the artifacts were fit on surfaces as an inference failure,
//! not a clean validation error.

use crate::error::GatewayError;
use crate::schema::PredictRequest;
use ndarray::Array2;
use serde_json::{Map, Value};

/// Build the prediction matrix from either request shape.
pub fn request_to_matrix(request: &PredictRequest) -> Result<Array2<f64>, GatewayError> {
    match request {
        PredictRequest::Rows(rows) => rows_to_matrix(rows),
        PredictRequest::Typed(payload) => data_to_matrix(&payload.data),
    }
}

/// Row objects → matrix. Columns are taken from the first row's key order;
/// every row must carry exactly those keys with numeric values.
pub fn rows_to_matrix(rows: &[Map<String, Value>]) -> Result<Array2<f64>, GatewayError> {
    let first = rows
        .first()
        .ok_or_else(|| GatewayError::Inference("Got no input rows".into()))?;
    let columns: Vec<&String> = first.keys().collect();
    let n_rows = rows.len();
    let n_cols = columns.len();

    let mut flat = Vec::with_capacity(n_rows * n_cols);
    for (r, row) in rows.iter().enumerate() {
        if row.len() != n_cols {
            return Err(GatewayError::Inference(format!(
                "Row {r}: inconsistent feature count (expected {n_cols}, got {})",
                row.len()
            )));
        }
        for col in &columns {
            let value = row.get(*col).ok_or_else(|| {
                GatewayError::Inference(format!("Row {r}: missing feature `{col}`"))
            })?;
            flat.push(value.as_f64().ok_or_else(|| {
                GatewayError::Inference(format!("Row {r}: failed to load `{col}` as f64"))
            })?);
        }
    }
    Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| GatewayError::Inference(e.to_string()))
}

/// Schema-typed 2-D array → matrix. Row width is fixed by the first row.
pub fn data_to_matrix(data: &[Vec<Value>]) -> Result<Array2<f64>, GatewayError> {
    let n_cols = data
        .first()
        .map(|row| row.len())
        .ok_or_else(|| GatewayError::Inference("Got no input rows".into()))?;
    let n_rows = data.len();

    let mut flat = Vec::with_capacity(n_rows * n_cols);
    for (r, row) in data.iter().enumerate() {
        if row.len() != n_cols {
            return Err(GatewayError::Inference(format!(
                "Row {r}: inconsistent length (expected {n_cols}, got {})",
                row.len()
            )));
        }
        for (j, value) in row.iter().enumerate() {
            flat.push(value.as_f64().ok_or_else(|| {
                GatewayError::Inference(format!("Row {r}, col {j}: failed to load as f64"))
            })?);
        }
    }
    Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| GatewayError::Inference(e.to_string()))
}
