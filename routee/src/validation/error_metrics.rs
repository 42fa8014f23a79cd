//! standard accuracy metrics computed against a model's held-out test
//! partition after training. all functions are pure over the rows provided.
//!
//! a zero actual energy denominator at any grouping level is a DataError
//! rather than a silently-propagated NaN or infinity.

use crate::model::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// one held-out test row carrying the observed energy and the model's
/// predicted rate for that row.
#[derive(Debug, Clone)]
pub struct TestRow {
    pub trip_id: String,
    pub energy: f64,
    pub distance: f64,
    pub rate_pred: f64,
}

/// the three error scalars persisted with a trained model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorEstimate {
    /// median of per-link |actual - predicted| / actual
    pub link_error_unweighted: f64,
    /// per-trip relative error weighted by each trip's share of total energy
    pub trip_error_weighted: f64,
    /// signed aggregate error, (sum predicted - sum actual) / sum actual
    pub net_error: f64,
}

/// converts a predicted energy rate and traversal distance into predicted
/// energy consumption for one row
pub fn predicted_energy(row: &TestRow) -> f64 {
    (row.rate_pred / 100.0) * row.distance
}

/// median relative link error, without weighting by distance or consumption
pub fn link_average_error_unweighted(rows: &[TestRow]) -> Result<f64, ModelError> {
    if rows.is_empty() {
        return Err(ModelError::DataError(String::from(
            "cannot compute link error over an empty test partition",
        )));
    }
    let mut errors: Vec<f64> = Vec::with_capacity(rows.len());
    for row in rows.iter() {
        if row.energy == 0.0 {
            return Err(ModelError::DataError(format!(
                "link error undefined: trip '{}' has a row with zero actual energy",
                row.trip_id
            )));
        }
        errors.push(((row.energy - predicted_energy(row)) / row.energy).abs());
    }
    errors.sort_by(|a, b| a.total_cmp(b));
    let mid = errors.len() / 2;
    let median = if errors.len() % 2 == 1 {
        errors[mid]
    } else {
        (errors[mid - 1] + errors[mid]) / 2.0
    };
    Ok(median)
}

/// relative error per trip, weighted by each trip's share of the total
/// observed energy. trips are formed by grouping rows on their trip id and
/// summing actual and predicted energy.
pub fn trip_average_error_weight(rows: &[TestRow]) -> Result<f64, ModelError> {
    if rows.is_empty() {
        return Err(ModelError::DataError(String::from(
            "cannot compute trip error over an empty test partition",
        )));
    }
    let mut trips: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for row in rows.iter() {
        let (actual, predicted) = trips.entry(row.trip_id.as_str()).or_insert((0.0, 0.0));
        *actual += row.energy;
        *predicted += predicted_energy(row);
    }
    let total: f64 = trips.values().map(|(actual, _)| actual).sum();
    if total == 0.0 {
        return Err(ModelError::DataError(String::from(
            "trip error undefined: total actual energy over test partition is zero",
        )));
    }
    let mut weighted = 0.0;
    for (trip_id, (actual, predicted)) in trips.iter() {
        if *actual == 0.0 {
            return Err(ModelError::DataError(format!(
                "trip error undefined: trip '{trip_id}' has zero actual energy"
            )));
        }
        weighted += (actual / total) * ((actual - predicted).abs() / actual);
    }
    Ok(weighted)
}

/// signed net energy prediction error over all rows in the test partition
pub fn net_energy_error(rows: &[TestRow]) -> Result<f64, ModelError> {
    let net: f64 = rows.iter().map(|row| row.energy).sum();
    if net == 0.0 {
        return Err(ModelError::DataError(String::from(
            "net error undefined: total actual energy over test partition is zero",
        )));
    }
    let net_pred: f64 = rows.iter().map(predicted_energy).sum();
    Ok((net_pred - net) / net)
}

/// computes all three error metrics for a freshly-trained model
pub fn all_error(rows: &[TestRow]) -> Result<ErrorEstimate, ModelError> {
    Ok(ErrorEstimate {
        link_error_unweighted: link_average_error_unweighted(rows)?,
        trip_error_weighted: trip_average_error_weight(rows)?,
        net_error: net_energy_error(rows)?,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn row(trip: &str, energy: f64, distance: f64, rate_pred: f64) -> TestRow {
        TestRow {
            trip_id: trip.to_string(),
            energy,
            distance,
            rate_pred,
        }
    }

    // when predicted equals actual for every row, all three metrics are zero
    #[test]
    fn test_exact_predictions_have_zero_error() {
        let rows = vec![
            row("t0", 2.0, 10.0, 20.0),
            row("t0", 1.0, 5.0, 20.0),
            row("t1", 3.0, 10.0, 30.0),
        ];
        let estimate = all_error(&rows).expect("test invariant failed: metrics should compute");
        assert_eq!(estimate.link_error_unweighted, 0.0);
        assert_eq!(estimate.trip_error_weighted, 0.0);
        assert_eq!(estimate.net_error, 0.0);
    }

    #[test]
    fn test_net_error_retains_sign() {
        // predicted energy 1.5 vs actual 1.0 -> +50%; and 0.5 vs 1.0 -> -50%
        let over = vec![row("t0", 1.0, 10.0, 15.0)];
        let under = vec![row("t0", 1.0, 10.0, 5.0)];
        let e_over = net_energy_error(&over).expect("test invariant failed");
        let e_under = net_energy_error(&under).expect("test invariant failed");
        assert!((e_over - 0.5).abs() < 1e-12);
        assert!((e_under + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_link_error_is_median_of_absolute_errors() {
        // relative errors: 0.0, 0.5, 1.0 -> median 0.5
        let rows = vec![
            row("t0", 1.0, 10.0, 10.0),
            row("t0", 1.0, 10.0, 15.0),
            row("t0", 1.0, 10.0, 20.0),
        ];
        let err = link_average_error_unweighted(&rows).expect("test invariant failed");
        assert!((err - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_trip_error_weights_by_energy_share() {
        // trip a: actual 4, predicted 2 -> rel err 0.5, share 0.8
        // trip b: actual 1, predicted 1 -> rel err 0.0, share 0.2
        let rows = vec![
            row("a", 4.0, 10.0, 20.0),
            row("b", 1.0, 10.0, 10.0),
        ];
        let err = trip_average_error_weight(&rows).expect("test invariant failed");
        assert!((err - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_zero_actual_energy_is_a_data_error() {
        let rows = vec![row("t0", 0.0, 10.0, 10.0)];
        assert!(matches!(
            link_average_error_unweighted(&rows),
            Err(ModelError::DataError(_))
        ));
        assert!(matches!(
            trip_average_error_weight(&rows),
            Err(ModelError::DataError(_))
        ));
        assert!(matches!(
            net_energy_error(&rows),
            Err(ModelError::DataError(_))
        ));
    }
}
