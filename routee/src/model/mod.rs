pub mod explicit_bin;
pub mod fieldname;
mod linear_regression;
mod model_error;
mod observation;
mod powertrain_model;
mod random_forest;
mod rate_estimator;
mod regression_ops;
mod split;

pub use explicit_bin::{ExplicitBinModel, FeatureBins};
pub use linear_regression::LinearRegressionModel;
pub use model_error::ModelError;
pub use observation::{LinkPass, LinkTable, Observation, ObservationTable};
pub use powertrain_model::{PowertrainModel, Prediction, TrainOptions};
pub use random_forest::{ForestHyperparameters, RandomForestModel};
pub use rate_estimator::{RateEstimator, RateModel};
pub use split::SplitRatios;
