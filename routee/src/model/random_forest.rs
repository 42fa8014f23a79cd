use super::regression_ops;
use super::{LinkTable, ModelError, ObservationTable, RateEstimator};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

/// fixed forest configuration used for production fitting. hyperparameter
/// search is out of scope here; these defaults were selected offline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestHyperparameters {
    pub n_trees: usize,
    pub max_depth: Option<u16>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestHyperparameters {
    fn default() -> Self {
        ForestHyperparameters {
            n_trees: 20,
            max_depth: Some(10),
            min_samples_split: 10,
            min_samples_leaf: 1,
            seed: 52,
        }
    }
}

impl From<&ForestHyperparameters> for RandomForestRegressorParameters {
    fn from(h: &ForestHyperparameters) -> Self {
        RandomForestRegressorParameters {
            max_depth: h.max_depth,
            min_samples_leaf: h.min_samples_leaf,
            min_samples_split: h.min_samples_split,
            n_trees: h.n_trees,
            m: None,
            keep_samples: false,
            seed: h.seed,
        }
    }
}

/// random forest regression over the feature vector, standing in for an
/// automatically constructed lookup table. any row with a complete feature
/// vector yields a rate; there is no unmatched-bin concept beyond missing
/// feature values.
#[derive(Debug, Serialize, Deserialize)]
pub struct RandomForestModel {
    pub hyperparameters: ForestHyperparameters,
    features: Vec<String>,
    forest: Option<RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>>,
}

impl RandomForestModel {
    pub fn new(hyperparameters: ForestHyperparameters) -> RandomForestModel {
        RandomForestModel {
            hyperparameters,
            features: vec![],
            forest: None,
        }
    }
}

impl RateEstimator for RandomForestModel {
    fn fit(&mut self, table: &ObservationTable, rates: &[f64]) -> Result<(), ModelError> {
        self.features = table.feature_names.clone();
        let (x, y) = regression_ops::training_matrix(table, &self.features, rates)?;
        let forest =
            RandomForestRegressor::fit(&x, &y, RandomForestRegressorParameters::from(
                &self.hyperparameters,
            ))
            .map_err(|e| ModelError::DataError(format!("random forest fit failed: {e}")))?;
        self.forest = Some(forest);
        Ok(())
    }

    fn predict_rates(&self, table: &LinkTable) -> Result<Vec<Option<f64>>, ModelError> {
        let forest = self.forest.as_ref().ok_or_else(|| {
            ModelError::DataError(String::from(
                "random forest model has not been fitted",
            ))
        })?;
        let (indices, matrix) = regression_ops::prediction_matrix(table, &self.features);
        let matrix = match matrix {
            Some(m) => m,
            None => return Ok(vec![None; table.rows.len()]),
        };
        let predicted = forest
            .predict(&matrix)
            .map_err(|e| ModelError::DataError(format!("random forest predict failed: {e}")))?;
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
