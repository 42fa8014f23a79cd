use super::explicit_bin;
use super::split::{self, SplitRatios};
use super::{LinkTable, ModelError, ObservationTable, RateEstimator, RateModel};
use crate::roads::Route;
use crate::validation::{self, ErrorEstimate, TestRow};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// bumped whenever the persisted model layout changes shape
const ARTIFACT_VERSION: u64 = 1;

/// knobs for the shared training lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainOptions {
    pub split: SplitRatios,
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        TrainOptions {
            split: SplitRatios::default(),
            seed: 52,
        }
    }
}

/// predicted energy per resolvable input row. `energy` pairs each surviving
/// row's input index with its predicted consumption, in input order;
/// `dropped` counts rows excluded because no rate could be resolved.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub energy: Vec<(usize, f64)>,
    pub dropped: usize,
}

/// a trained energy consumption model for one vehicle, carrying the fitted
/// rate predictor together with the metadata needed to apply it: feature
/// columns, energy/distance/trip-id column names, and the error metrics
/// computed against the held-out test partition at training time.
#[derive(Debug, Serialize, Deserialize)]
pub struct PowertrainModel {
    pub vehicle_description: String,
    pub energy: String,
    pub distance: String,
    pub trip_ids: String,
    pub features: Vec<String>,
    pub model: RateModel,
    pub errors: Option<ErrorEstimate>,
}

impl PowertrainModel {
    /// trains an energy consumption model from link-level consumption data.
    ///
    /// rows missing feature values are excluded; the remainder is randomly
    /// partitioned into train/test/validation by `options.split`; the
    /// variant fits against the training partition; the three error metrics
    /// are computed against the test partition and stored on the result.
    ///
    /// # Arguments
    ///
    /// * `vehicle_description` - year/make/model text identifying the vehicle
    /// * `rate_model` - an untrained variant, e.g. an explicit bin model
    ///   around its bin specification
    /// * `table` - link-level energy consumption observations
    /// * `options` - split ratios and random seed
    pub fn train(
        vehicle_description: &str,
        mut rate_model: RateModel,
        table: &ObservationTable,
        options: &TrainOptions,
    ) -> Result<PowertrainModel, ModelError> {
        options.split.validate_ratios()?;
        let complete = table.drop_incomplete();
        if complete.is_empty() {
            return Err(ModelError::DataError(String::from(
                "no rows with complete feature values to train on",
            )));
        }
        let (train_idx, test_idx, _validate_idx) =
            split::split_indices(complete.len(), &options.split, options.seed);
        if train_idx.is_empty() || test_idx.is_empty() {
            return Err(ModelError::DataError(format!(
                "{} usable rows is too few to populate train and test partitions",
                complete.len()
            )));
        }
        let train_table = complete.subset(&train_idx);
        let train_rates = train_table.rates();
        rate_model.fit(&train_table, &train_rates)?;

        let test_table = complete.subset(&test_idx);
        let predicted = rate_model.predict_rates(&test_table.to_link_table())?;
        let test_rows: Vec<TestRow> = test_table
            .observations
            .iter()
            .zip(predicted.iter())
            .filter_map(|(obs, rate_pred)| {
                rate_pred.map(|rate| TestRow {
                    trip_id: obs.trip_id.clone(),
                    energy: obs.energy,
                    distance: obs.distance,
                    rate_pred: rate,
                })
            })
            .collect();
        let unmatched = test_table.len() - test_rows.len();
        if unmatched > 0 {
            log::warn!(
                "{unmatched} of {} test rows resolved no rate and were excluded from error metrics",
                test_table.len()
            );
        }
        let errors = validation::all_error(&test_rows)?;
        log::info!(
            "trained '{vehicle_description}': link error {:.4}, trip error {:.4}, net error {:.4}",
            errors.link_error_unweighted,
            errors.trip_error_weighted,
            errors.net_error
        );

        Ok(PowertrainModel {
            vehicle_description: vehicle_description.to_string(),
            energy: complete.energy.clone(),
            distance: complete.distance.clone(),
            trip_ids: complete.trip_ids.clone(),
            features: rate_model.features().to_vec(),
            model: rate_model,
            errors: Some(errors),
        })
    }

    /// applies the trained model to link passes, returning predicted energy
    /// consumption per resolvable row. rows with no resolvable rate are
    /// dropped from the output, never zero-filled.
    ///
    /// # Errors
    ///
    /// SchemaError when the input does not expose every trained feature column
    pub fn predict(&self, table: &LinkTable) -> Result<Prediction, ModelError> {
        table.require_features(&self.features)?;
        let rates = self.model.predict_rates(table)?;
        let mut energy: Vec<(usize, f64)> = vec![];
        let mut dropped: usize = 0;
        for (idx, (rate_opt, link)) in rates.iter().zip(table.rows.iter()).enumerate() {
            match rate_opt {
                Some(rate) => energy.push((idx, (rate / 100.0) * link.distance)),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            log::warn!(
                "dropped {dropped} of {} rows with no matching energy rate",
                table.rows.len()
            );
        }
        Ok(Prediction { energy, dropped })
    }

    /// predicts energy over a route's links, in link order
    pub fn predict_route(&self, route: &Route) -> Result<Prediction, ModelError> {
        let table = route.to_link_table(&self.distance)?;
        self.predict(&table)
    }

    /// derives a model for the same vehicle carrying connected/automated
    /// vehicle hardware, by remapping the trained rate table for the added
    /// auxiliary electrical load. only explicit bin models can be remapped.
    pub fn cavs_mapper(
        &self,
        aux_load_kw: f64,
        speed_feature: &str,
        cacc_equipped: bool,
    ) -> Result<PowertrainModel, ModelError> {
        let bin_model = self.model.as_explicit_bin().ok_or_else(|| {
            ModelError::DataError(String::from(
                "cavs remapping requires an explicit bin model",
            ))
        })?;
        let remapped = explicit_bin::cavs_mapper(
            bin_model,
            &self.energy,
            aux_load_kw,
            speed_feature,
            cacc_equipped,
        )?;
        Ok(PowertrainModel {
            vehicle_description: self.vehicle_description.clone(),
            energy: self.energy.clone(),
            distance: self.distance.clone(),
            trip_ids: self.trip_ids.clone(),
            features: self.features.clone(),
            model: RateModel::ExplicitBin(remapped),
            errors: self.errors,
        })
    }

    /// persists the trained model and its metadata as a versioned artifact
    pub fn to_file(&self, filepath: &Path) -> Result<(), ModelError> {
        let file = File::create(filepath).map_err(|e| {
            ModelError::SerializationError(format!(
                "failure creating '{}': {e}",
                filepath.to_str().unwrap_or_default()
            ))
        })?;
        let artifact = serde_json::json!({
            "version": ARTIFACT_VERSION,
            "model": self,
        });
        serde_json::to_writer(BufWriter::new(file), &artifact).map_err(|e| {
            ModelError::SerializationError(format!(
                "failure writing '{}': {e}",
                filepath.to_str().unwrap_or_default()
            ))
        })
    }

    /// reads a trained model from a persisted artifact. a corrupt payload or
    /// an artifact written by an incompatible version fails without side
    /// effects.
    pub fn from_file(filepath: &Path) -> Result<PowertrainModel, ModelError> {
        let name = filepath.to_str().unwrap_or_default().to_string();
        let file = File::open(filepath)
            .map_err(|e| ModelError::SerializationError(format!("failure opening '{name}': {e}")))?;
        let artifact: serde_json::Value = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ModelError::SerializationError(format!("failure decoding '{name}': {e}")))?;
        let version = artifact
            .get("version")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| {
                ModelError::SerializationError(format!("'{name}' carries no artifact version"))
            })?;
        if version != ARTIFACT_VERSION {
            return Err(ModelError::SerializationError(format!(
                "'{name}' has artifact version {version}, expected {ARTIFACT_VERSION}"
            )));
        }
        let model_value = artifact.get("model").ok_or_else(|| {
            ModelError::SerializationError(format!("'{name}' carries no model payload"))
        })?;
        serde_json::from_value(model_value.clone())
            .map_err(|e| ModelError::SerializationError(format!("failure decoding '{name}': {e}")))
    }
}
