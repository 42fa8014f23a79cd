use super::explicit_bin::ExplicitBinModel;
use super::{LinearRegressionModel, LinkTable, ModelError, ObservationTable, RandomForestModel};
use serde::{Deserialize, Serialize};

/// the capability seam between the shared training/prediction lifecycle and
/// each model variant. a variant fits internal parameters from a training
/// partition and produces a per-row energy rate for prediction input, with
/// `None` marking rows it cannot resolve.
pub trait RateEstimator {
    /// fits variant parameters against a training partition. `rates` is the
    /// per-row target, energy per 100 distance-units, parallel to the
    /// table's rows.
    fn fit(&mut self, table: &ObservationTable, rates: &[f64]) -> Result<(), ModelError>;

    /// predicts an energy rate per input row, None for unresolvable rows
    fn predict_rates(&self, table: &LinkTable) -> Result<Vec<Option<f64>>, ModelError>;

    /// feature columns this variant consumes, fixed at fit time
    fn features(&self) -> &[String];
}

/// the family of interchangeable rate predictors. serialized with an explicit
/// variant tag so a persisted artifact decodes without depending on runtime
/// type identity.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RateModel {
    ExplicitBin(ExplicitBinModel),
    RandomForest(RandomForestModel),
    LinearRegression(LinearRegressionModel),
}

impl RateModel {
    /// the explicit bin payload, for operations that only exist on binned
    /// rate tables (CSV dumps, CAV remapping)
    pub fn as_explicit_bin(&self) -> Option<&ExplicitBinModel> {
        match self {
            RateModel::ExplicitBin(model) => Some(model),
            _ => None,
        }
    }
}

impl RateEstimator for RateModel {
    fn fit(&mut self, table: &ObservationTable, rates: &[f64]) -> Result<(), ModelError> {
        match self {
            RateModel::ExplicitBin(model) => model.fit(table, rates),
            RateModel::RandomForest(model) => model.fit(table, rates),
            RateModel::LinearRegression(model) => model.fit(table, rates),
        }
    }

    fn predict_rates(&self, table: &LinkTable) -> Result<Vec<Option<f64>>, ModelError> {
        match self {
            RateModel::ExplicitBin(model) => model.predict_rates(table),
            RateModel::RandomForest(model) => model.predict_rates(table),
            RateModel::LinearRegression(model) => model.predict_rates(table),
        }
    }

    fn features(&self) -> &[String] {
        match self {
            RateModel::ExplicitBin(model) => model.features(),
            RateModel::RandomForest(model) => model.features(),
            RateModel::LinearRegression(model) => model.features(),
        }
    }
}
