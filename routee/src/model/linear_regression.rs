use super::regression_ops;
use super::{LinkTable, ModelError, ObservationTable, RateEstimator};
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{LinearRegression, LinearRegressionParameters};

/// ordinary least squares over the feature vector, the baseline rate model.
/// useful as a sanity reference against the binned and forest variants.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinearRegressionModel {
    features: Vec<String>,
    regression: Option<LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>>,
}

impl LinearRegressionModel {
    pub fn new() -> LinearRegressionModel {
        LinearRegressionModel {
            features: vec![],
            regression: None,
        }
    }
}

impl Default for LinearRegressionModel {
    fn default() -> Self {
        LinearRegressionModel::new()
    }
}

impl RateEstimator for LinearRegressionModel {
    fn fit(&mut self, table: &ObservationTable, rates: &[f64]) -> Result<(), ModelError> {
        self.features = table.feature_names.clone();
        let (x, y) = regression_ops::training_matrix(table, &self.features, rates)?;
        let regression = LinearRegression::fit(&x, &y, LinearRegressionParameters::default())
            .map_err(|e| ModelError::DataError(format!("linear regression fit failed: {e}")))?;
        self.regression = Some(regression);
        Ok(())
    }

    fn predict_rates(&self, table: &LinkTable) -> Result<Vec<Option<f64>>, ModelError> {
        let regression = self.regression.as_ref().ok_or_else(|| {
            ModelError::DataError(String::from(
                "linear regression model has not been fitted",
            ))
        })?;
        let (indices, matrix) = regression_ops::prediction_matrix(table, &self.features);
        let matrix = match matrix {
            Some(m) => m,
            None => return Ok(vec![None; table.rows.len()]),
        };
        let predicted = regression
            .predict(&matrix)
            .map_err(|e| ModelError::DataError(format!("linear regression predict failed: {e}")))?;
        Ok(regression_ops::scatter(
            table.rows.len(),
            &indices,
            &predicted,
        ))
    }

    fn features(&self) -> &[String] {
        &self.features
    }
}
