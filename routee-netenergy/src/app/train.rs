use super::config::{TrainConfiguration, VariantConfiguration};
use super::NetEnergyError;
use routee::model::{
    ExplicitBinModel, FeatureBins, LinearRegressionModel, ObservationTable, PowertrainModel,
    RandomForestModel, RateModel, TrainOptions,
};
use std::path::Path;

/// trains a powertrain model from link-level consumption data and writes the
/// artifact the `run` subcommand consumes. error metrics land in the log and
/// inside the artifact.
pub fn train(configuration: &TrainConfiguration) -> Result<PowertrainModel, NetEnergyError> {
    let table = ObservationTable::from_csv(
        Path::new(&configuration.training_file),
        &configuration.energy,
        &configuration.distance,
        &configuration.trip_ids,
    )?;
    log::info!(
        "read {} observations over features [{}]",
        table.len(),
        table.feature_names.join(", ")
    );

    let rate_model = match &configuration.variant {
        VariantConfiguration::ExplicitBin { bins } => {
            let specs = bins
                .iter()
                .map(|b| (b.feature.clone(), b.edges.clone()))
                .collect();
            RateModel::ExplicitBin(ExplicitBinModel::new(FeatureBins::new(specs)?))
        }
        VariantConfiguration::RandomForest { hyperparameters } => {
            RateModel::RandomForest(RandomForestModel::new(hyperparameters.clone()))
        }
        VariantConfiguration::LinearRegression {} => {
            RateModel::LinearRegression(LinearRegressionModel::new())
        }
    };

    let options = TrainOptions {
        split: configuration.split,
        seed: configuration.seed,
    };
    let trained = PowertrainModel::train(
        &configuration.vehicle_description,
        rate_model,
        &table,
        &options,
    )?;
    trained.to_file(Path::new(&configuration.output_file))?;
    log::info!("wrote model artifact to {}", configuration.output_file);
    Ok(trained)
}
