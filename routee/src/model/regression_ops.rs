//! shared helpers for the regression-backed rate estimators: packing
//! observation and link tables into smartcore matrices, keeping only rows
//! with a complete feature vector.

use super::{LinkTable, ModelError, ObservationTable};
use smartcore::linalg::basic::matrix::DenseMatrix;

/// packs training rows with complete features into a row-major matrix and the
/// aligned rate target vector. `rates` must be parallel to the table's rows.
pub(super) fn training_matrix(
    table: &ObservationTable,
    features: &[String],
    rates: &[f64],
) -> Result<(DenseMatrix<f64>, Vec<f64>), ModelError> {
    let mut flat: Vec<f64> = vec![];
    let mut target: Vec<f64> = vec![];
    for (obs, rate) in table.observations.iter().zip(rates.iter()) {
        let row = features
            .iter()
            .map(|f| obs.features.get(f).copied())
            .collect::<Option<Vec<f64>>>();
        if let Some(values) = row {
            flat.extend(values);
            target.push(*rate);
        }
    }
    if target.is_empty() {
        return Err(ModelError::DataError(String::from(
            "no training rows carry a complete feature vector",
        )));
    }
    let matrix = DenseMatrix::new(target.len(), features.len(), flat, false);
    Ok((matrix, target))
}

/// packs prediction rows with complete features into a matrix, returning the
/// original row index of each packed row so predictions can be scattered
/// back. rows with any missing feature are left out.
pub(super) fn prediction_matrix(
    table: &LinkTable,
    features: &[String],
) -> (Vec<usize>, Option<DenseMatrix<f64>>) {
    let mut indices: Vec<usize> = vec![];
    let mut flat: Vec<f64> = vec![];
    for (idx, link) in table.rows.iter().enumerate() {
        let row = features
            .iter()
            .map(|f| link.features.get(f).copied())
            .collect::<Option<Vec<f64>>>();
        if let Some(values) = row {
            flat.extend(values);
            indices.push(idx);
        }
    }
    if indices.is_empty() {
        return (indices, None);
    }
    let matrix = DenseMatrix::new(indices.len(), features.len(), flat, false);
    (indices, Some(matrix))
}

/// scatters packed predictions back over the full row range
pub(super) fn scatter(n_rows: usize, indices: &[usize], values: &[f64]) -> Vec<Option<f64>> {
    let mut rates: Vec<Option<f64>> = vec![None; n_rows];
    for (idx, value) in indices.iter().zip(values.iter()) {
        rates[*idx] = Some(*value);
    }
    rates
}
