use super::ModelError;
use std::collections::HashMap;
use std::path::Path;

/// one vehicle pass over a road link with observed energy consumption.
///
/// feature values are keyed by column name. a feature absent from the map is
/// a missing value; rows with missing features are excluded from training.
#[derive(Debug, Clone)]
pub struct Observation {
    pub trip_id: String,
    pub energy: f64,
    pub distance: f64,
    pub features: HashMap<String, f64>,
}

/// tabular training input for a powertrain model. column names for the
/// energy target, distance, and trip identifier are recorded alongside the
/// remaining (feature) column names so that downstream models can reference
/// columns the way the source dataset named them.
#[derive(Debug, Clone)]
pub struct ObservationTable {
    pub energy: String,
    pub distance: String,
    pub trip_ids: String,
    pub feature_names: Vec<String>,
    pub observations: Vec<Observation>,
}

impl ObservationTable {
    /// builds a table from in-memory observations, validating the invariants
    /// that training depends on.
    ///
    /// # Errors
    ///
    /// * empty table or empty feature list
    /// * any observation with a zero or negative distance (the rate target
    ///   100 * energy / distance is undefined there)
    /// * any observation with negative energy
    pub fn new(
        energy: &str,
        distance: &str,
        trip_ids: &str,
        feature_names: Vec<String>,
        observations: Vec<Observation>,
    ) -> Result<ObservationTable, ModelError> {
        if observations.is_empty() {
            return Err(ModelError::DataError(String::from(
                "observation table is empty",
            )));
        }
        if feature_names.is_empty() {
            return Err(ModelError::DataError(format!(
                "observation table has no feature columns beyond '{energy}', '{distance}', '{trip_ids}'"
            )));
        }
        for (idx, obs) in observations.iter().enumerate() {
            if obs.distance <= 0.0 {
                return Err(ModelError::DataError(format!(
                    "row {idx} has non-positive '{distance}' value {}, rate is undefined",
                    obs.distance
                )));
            }
            if obs.energy < 0.0 {
                return Err(ModelError::DataError(format!(
                    "row {idx} has negative '{energy}' value {}",
                    obs.energy
                )));
            }
        }
        Ok(ObservationTable {
            energy: energy.to_string(),
            distance: distance.to_string(),
            trip_ids: trip_ids.to_string(),
            feature_names,
            observations,
        })
    }

    /// reads a training table from a CSV file. the `energy`, `distance` and
    /// `trip_ids` columns must be present; every other column is treated as a
    /// feature. empty or non-numeric feature cells become missing values,
    /// while rows missing their energy, distance or trip id are skipped with
    /// a warning.
    pub fn from_csv(
        filepath: &Path,
        energy: &str,
        distance: &str,
        trip_ids: &str,
    ) -> Result<ObservationTable, ModelError> {
        let mut reader = csv::Reader::from_path(filepath).map_err(|e| {
            ModelError::DataError(format!(
                "failure opening training file {}: {e}",
                filepath.to_str().unwrap_or_default()
            ))
        })?;
        let headers = reader
            .headers()
            .map_err(|e| ModelError::DataError(format!("failure reading CSV headers: {e}")))?
            .clone();
        let lookup: HashMap<&str, usize> =
            headers.iter().enumerate().map(|(i, s)| (s, i)).collect();
        for column in [energy, distance, trip_ids] {
            if !lookup.contains_key(column) {
                return Err(ModelError::DataError(format!(
                    "training file missing required column '{column}'"
                )));
            }
        }
        let feature_names: Vec<String> = headers
            .iter()
            .filter(|h| *h != energy && *h != distance && *h != trip_ids)
            .map(String::from)
            .collect();

        let mut observations: Vec<Observation> = vec![];
        let mut skipped: usize = 0;
        for (row_idx, row) in reader.records().enumerate() {
            let record = row
                .map_err(|e| ModelError::DataError(format!("failure reading row {row_idx}: {e}")))?;
            let get_f64 = |column: &str| -> Option<f64> {
                lookup
                    .get(column)
                    .and_then(|i| record.get(*i))
                    .and_then(|cell| cell.parse::<f64>().ok())
            };
            let trip_id = lookup
                .get(trip_ids)
                .and_then(|i| record.get(*i))
                .filter(|cell| !cell.is_empty())
                .map(String::from);
            match (get_f64(energy), get_f64(distance), trip_id) {
                (Some(e), Some(d), Some(t)) => {
                    let features = feature_names
                        .iter()
                        .filter_map(|f| get_f64(f).map(|v| (f.clone(), v)))
                        .collect::<HashMap<String, f64>>();
                    observations.push(Observation {
                        trip_id: t,
                        energy: e,
                        distance: d,
                        features,
                    });
                }
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            log::warn!("skipped {skipped} training rows missing '{energy}', '{distance}' or '{trip_ids}' values");
        }
        ObservationTable::new(energy, distance, trip_ids, feature_names, observations)
    }

    /// restricts the table to rows carrying a value for every feature column,
    /// preserving input order.
    pub fn drop_incomplete(&self) -> ObservationTable {
        let complete = self
            .observations
            .iter()
            .filter(|obs| self.feature_names.iter().all(|f| obs.features.contains_key(f)))
            .cloned()
            .collect();
        ObservationTable {
            energy: self.energy.clone(),
            distance: self.distance.clone(),
            trip_ids: self.trip_ids.clone(),
            feature_names: self.feature_names.clone(),
            observations: complete,
        }
    }

    /// projects the table onto the rows at `indices`, preserving order
    pub fn subset(&self, indices: &[usize]) -> ObservationTable {
        let observations = indices
            .iter()
            .filter_map(|idx| self.observations.get(*idx))
            .cloned()
            .collect();
        ObservationTable {
            energy: self.energy.clone(),
            distance: self.distance.clone(),
            trip_ids: self.trip_ids.clone(),
            feature_names: self.feature_names.clone(),
            observations,
        }
    }

    /// per-row energy rate, energy per 100 distance-units
    pub fn rates(&self) -> Vec<f64> {
        self.observations
            .iter()
            .map(|obs| 100.0 * obs.energy / obs.distance)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// projects the table into prediction input, carrying features and distance
    pub fn to_link_table(&self) -> LinkTable {
        let rows = self
            .observations
            .iter()
            .map(|obs| LinkPass {
                features: obs.features.clone(),
                distance: obs.distance,
            })
            .collect();
        LinkTable {
            feature_names: self.feature_names.clone(),
            rows,
        }
    }
}

/// one vehicle pass over a link, as prediction input: link attributes plus
/// the distance traveled. no energy observation is attached.
#[derive(Debug, Clone)]
pub struct LinkPass {
    pub features: HashMap<String, f64>,
    pub distance: f64,
}

/// prediction input table: the feature columns the caller can supply, and one
/// row per link pass. models check their trained feature list against
/// `feature_names` before predicting.
#[derive(Debug, Clone)]
pub struct LinkTable {
    pub feature_names: Vec<String>,
    pub rows: Vec<LinkPass>,
}

impl LinkTable {
    pub fn new(feature_names: Vec<String>, rows: Vec<LinkPass>) -> LinkTable {
        LinkTable {
            feature_names,
            rows,
        }
    }

    /// confirms every trained feature column is present in this table.
    ///
    /// # Errors
    ///
    /// SchemaError naming the first missing column. individual rows lacking a
    /// value are not an error here; they drop out of prediction as unmatched.
    pub fn require_features(&self, features: &[String]) -> Result<(), ModelError> {
        for feature in features.iter() {
            if !self.feature_names.contains(feature) {
                return Err(ModelError::SchemaError(feature.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn row(trip: &str, energy: f64, distance: f64, speed: f64) -> Observation {
        Observation {
            trip_id: trip.to_string(),
            energy,
            distance,
            features: HashMap::from([(String::from("speed_mph_float"), speed)]),
        }
    }

    #[test]
    fn test_rejects_empty_table() {
        let result = ObservationTable::new(
            "gallons",
            "miles",
            "trip_ids",
            vec![String::from("speed_mph_float")],
            vec![],
        );
        assert!(matches!(result, Err(ModelError::DataError(_))));
    }

    #[test]
    fn test_rejects_zero_distance() {
        let result = ObservationTable::new(
            "gallons",
            "miles",
            "trip_ids",
            vec![String::from("speed_mph_float")],
            vec![row("t0", 1.0, 0.0, 30.0)],
        );
        match result {
            Err(ModelError::DataError(msg)) => assert!(msg.contains("miles")),
            other => panic!("expected DataError, got {other:?}"),
        }
    }

    #[test]
    fn test_rates_scaled_per_100_units() {
        let table = ObservationTable::new(
            "gallons",
            "miles",
            "trip_ids",
            vec![String::from("speed_mph_float")],
            vec![row("t0", 1.0, 50.0, 30.0)],
        )
        .expect("test invariant failed: table should build");
        assert_eq!(table.rates(), vec![2.0]);
    }

    #[test]
    fn test_drop_incomplete_removes_rows_missing_features() {
        let mut incomplete = row("t1", 2.0, 10.0, 45.0);
        incomplete.features.clear();
        let table = ObservationTable::new(
            "gallons",
            "miles",
            "trip_ids",
            vec![String::from("speed_mph_float")],
            vec![row("t0", 1.0, 50.0, 30.0), incomplete],
        )
        .expect("test invariant failed: table should build");
        let complete = table.drop_incomplete();
        assert_eq!(complete.len(), 1);
        assert_eq!(complete.observations[0].trip_id, "t0");
    }

    #[test]
    fn test_require_features_flags_missing_column() {
        let table = LinkTable::new(vec![String::from("speed_mph_float")], vec![]);
        let result = table.require_features(&[
            String::from("speed_mph_float"),
            String::from("grade_percent_float"),
        ]);
        match result {
            Err(ModelError::SchemaError(column)) => {
                assert_eq!(column, "grade_percent_float")
            }
            other => panic!("expected SchemaError, got {other:?}"),
        }
    }
}
