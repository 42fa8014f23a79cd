use super::FeatureBins;
use crate::model::{LinkTable, ModelError, ObservationTable, RateEstimator};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// aggregate energy use for one bin combination of the trained rate table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateBin {
    /// per-feature bin indices, in the bin specification's feature order
    pub bin_indices: Vec<usize>,
    /// summed energy over all training rows landing in this combination
    pub energy: f64,
    /// summed distance over all training rows landing in this combination
    pub distance: f64,
    /// energy per 100 distance-units, 100 * energy / distance
    pub rate: f64,
}

/// energy rates table discretized over user-specified feature bins.
///
/// training groups observations by their full tuple of per-feature bin
/// indices and aggregates energy and distance within each group. prediction
/// assigns bins the same way and looks the combination up in the table; rows
/// with no matching combination carry no rate and are dropped downstream
/// rather than zero-filled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplicitBinModel {
    features: Vec<String>,
    pub bins: FeatureBins,
    pub rate_table: BTreeMap<String, RateBin>,
}

/// rate table key for a bin combination, bin indices joined in feature order
pub(super) fn bin_key(bin_indices: &[usize]) -> String {
    bin_indices.iter().join("|")
}

impl ExplicitBinModel {
    /// builds an untrained model around a bin specification
    pub fn new(bins: FeatureBins) -> ExplicitBinModel {
        ExplicitBinModel {
            features: bins.features(),
            bins,
            rate_table: BTreeMap::new(),
        }
    }

    pub(super) fn with_rate_table(
        bins: FeatureBins,
        rate_table: BTreeMap<String, RateBin>,
    ) -> ExplicitBinModel {
        ExplicitBinModel {
            features: bins.features(),
            bins,
            rate_table,
        }
    }

    /// looks up the trained rate for one bin combination
    pub fn rate(&self, bin_indices: &[usize]) -> Option<f64> {
        self.rate_table.get(&bin_key(bin_indices)).map(|b| b.rate)
    }

    /// writes the rate table alone to CSV, one row per bin combination with
    /// interval labels. model metadata is not included; use the artifact
    /// serialization on [`crate::model::PowertrainModel`] for that.
    pub fn dump_csv(&self, filepath: &Path) -> Result<(), ModelError> {
        let mut writer = csv::Writer::from_path(filepath).map_err(|e| {
            ModelError::SerializationError(format!(
                "failure opening rate table output {}: {e}",
                filepath.to_str().unwrap_or_default()
            ))
        })?;
        let header = self
            .features
            .iter()
            .map(|f| format!("{f}_bins"))
            .chain([
                String::from("energy"),
                String::from("distance"),
                String::from("rate"),
            ])
            .collect::<Vec<String>>();
        writer
            .write_record(&header)
            .map_err(|e| ModelError::SerializationError(format!("failure writing header: {e}")))?;
        for rate_bin in self.rate_table.values() {
            let labels = rate_bin
                .bin_indices
                .iter()
                .enumerate()
                .map(|(position, bin)| {
                    self.bins.label(position, *bin).ok_or_else(|| {
                        ModelError::SerializationError(format!(
                            "rate table key {:?} does not match the bin specification",
                            rate_bin.bin_indices
                        ))
                    })
                })
                .collect::<Result<Vec<String>, ModelError>>()?;
            let record = labels
                .into_iter()
                .chain([
                    rate_bin.energy.to_string(),
                    rate_bin.distance.to_string(),
                    rate_bin.rate.to_string(),
                ])
                .collect::<Vec<String>>();
            writer.write_record(&record).map_err(|e| {
                ModelError::SerializationError(format!("failure writing rate table row: {e}"))
            })?;
        }
        writer
            .flush()
            .map_err(|e| ModelError::SerializationError(format!("failure writing rate table: {e}")))
    }
}

impl RateEstimator for ExplicitBinModel {
    /// groups training rows by bin combination and aggregates energy and
    /// distance sums into the rate table. rows whose bin tuple contains any
    /// unmatched feature are excluded.
    fn fit(&mut self, table: &ObservationTable, _rates: &[f64]) -> Result<(), ModelError> {
        let mut groups: BTreeMap<String, RateBin> = BTreeMap::new();
        let mut unmatched: usize = 0;
        for obs in table.observations.iter() {
            match self.bins.assign(&obs.features) {
                Some(bin_indices) => {
                    let entry =
                        groups
                            .entry(bin_key(&bin_indices))
                            .or_insert_with(|| RateBin {
                                bin_indices,
                                energy: 0.0,
                                distance: 0.0,
                                rate: 0.0,
                            });
                    entry.energy += obs.energy;
                    entry.distance += obs.distance;
                }
                None => unmatched += 1,
            }
        }
        if groups.is_empty() {
            return Err(ModelError::DataError(String::from(
                "no training rows fell within the configured bin edges",
            )));
        }
        if unmatched > 0 {
            log::warn!("{unmatched} training rows fell outside the configured bin edges");
        }
        for rate_bin in groups.values_mut() {
            rate_bin.rate = 100.0 * rate_bin.energy / rate_bin.distance;
        }
        self.rate_table = groups;
        Ok(())
    }

    /// assigns bins to each input row and looks up the trained rate. rows
    /// with a missing feature, an out-of-range value, or a bin combination
    /// absent from the table yield None.
    fn predict_rates(&self, table: &LinkTable) -> Result<Vec<Option<f64>>, ModelError> {
        let rates = table
            .rows
            .iter()
            .map(|row| {
                self.bins
                    .assign(&row.features)
                    .and_then(|bin_indices| self.rate(&bin_indices))
            })
            .collect();
        Ok(rates)
    }

    fn features(&self) -> &[String] {
        &self.features
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{LinkPass, Observation};
    use std::collections::HashMap;

    fn observation(energy: f64, distance: f64, speed: f64) -> Observation {
        Observation {
            trip_id: String::from("t0"),
            energy,
            distance,
            features: HashMap::from([(String::from("speed_mph_float"), speed)]),
        }
    }

    fn speed_table(observations: Vec<Observation>) -> ObservationTable {
        ObservationTable::new(
            "gallons",
            "miles",
            "trip_ids",
            vec![String::from("speed_mph_float")],
            observations,
        )
        .expect("test invariant failed: table should build")
    }

    fn trained_speed_model(observations: Vec<Observation>) -> ExplicitBinModel {
        let bins = FeatureBins::new(vec![(
            String::from("speed_mph_float"),
            vec![0.0, 10.0, 20.0],
        )])
        .expect("test invariant failed: bins should build");
        let table = speed_table(observations);
        let rates = table.rates();
        let mut model = ExplicitBinModel::new(bins);
        model
            .fit(&table, &rates)
            .expect("test invariant failed: fit should succeed");
        model
    }

    // two rows sharing a bin: energy 10+20, distance 5+10 -> 100*(30/15)=200
    #[test]
    fn test_rate_aggregates_group_sums() {
        let model = trained_speed_model(vec![
            observation(10.0, 5.0, 5.0),
            observation(20.0, 10.0, 6.0),
        ]);
        assert_eq!(model.rate_table.len(), 1);
        assert_eq!(model.rate(&[0]), Some(200.0));
    }

    // two speed bins, both with rate 200, and a prediction at speed 5
    // over 2 miles yielding 4 gallons
    #[test]
    fn test_two_bin_scenario() {
        let model = trained_speed_model(vec![
            observation(10.0, 5.0, 5.0),
            observation(20.0, 10.0, 15.0),
        ]);
        assert_eq!(model.rate_table.len(), 2);
        assert_eq!(model.rate(&[0]), Some(200.0));
        assert_eq!(model.rate(&[1]), Some(200.0));

        let table = LinkTable::new(
            vec![String::from("speed_mph_float")],
            vec![LinkPass {
                features: HashMap::from([(String::from("speed_mph_float"), 5.0)]),
                distance: 2.0,
            }],
        );
        let rates = model
            .predict_rates(&table)
            .expect("test invariant failed: predict should succeed");
        let energy = (rates[0].expect("rate should resolve") / 100.0) * table.rows[0].distance;
        assert_eq!(energy, 4.0);
    }

    #[test]
    fn test_unmatched_prediction_row_has_no_rate() {
        let model = trained_speed_model(vec![observation(10.0, 5.0, 5.0)]);
        let table = LinkTable::new(
            vec![String::from("speed_mph_float")],
            vec![
                LinkPass {
                    features: HashMap::from([(String::from("speed_mph_float"), 50.0)]),
                    distance: 2.0,
                },
                // in range but no training rows landed in this bin
                LinkPass {
                    features: HashMap::from([(String::from("speed_mph_float"), 15.0)]),
                    distance: 2.0,
                },
            ],
        );
        let rates = model
            .predict_rates(&table)
            .expect("test invariant failed: predict should succeed");
        assert_eq!(rates, vec![None, None]);
    }

    #[test]
    fn test_dump_csv_writes_interval_labels() {
        let model = trained_speed_model(vec![
            observation(10.0, 5.0, 5.0),
            observation(20.0, 10.0, 15.0),
        ]);
        let path = std::env::temp_dir().join("routee_test_rate_table_dump.csv");
        model
            .dump_csv(&path)
            .expect("test invariant failed: dump should succeed");
        let text = std::fs::read_to_string(&path).expect("dump should be readable");
        std::fs::remove_file(&path).ok();
        assert!(text.starts_with("speed_mph_float_bins,energy,distance,rate"));
        assert!(text.contains("\"[0,10)\",10,5,200"));
        assert!(text.contains("\"[10,20)\",20,10,200"));
    }

    #[test]
    fn test_fit_fails_when_all_rows_unbinnable() {
        let bins = FeatureBins::new(vec![(
            String::from("speed_mph_float"),
            vec![0.0, 10.0],
        )])
        .expect("test invariant failed: bins should build");
        let table = speed_table(vec![observation(10.0, 5.0, 99.0)]);
        let rates = table.rates();
        let mut model = ExplicitBinModel::new(bins);
        assert!(matches!(
            model.fit(&table, &rates),
            Err(ModelError::DataError(_))
        ));
    }
}
