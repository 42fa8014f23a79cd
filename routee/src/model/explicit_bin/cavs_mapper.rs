use super::explicit_bin_model::bin_key;
use super::{ExplicitBinModel, RateBin};
use crate::model::{fieldname, ModelError};
use std::collections::BTreeMap;

/// low-speed drive-cycle smoothing benefit for CACC-equipped vehicles, as an
/// energy rate reduction. currently zero: the source data behind the rate
/// tables is highway-only, so no calibrated value exists yet. the
/// `cacc_equipped` flag is accepted so a calibrated benefit can drop in
/// without changing the call signature.
const CACC_LOW_SPEED_BENEFIT: f64 = 0.0;

/// maps a trained rate table for a human-driven vehicle onto one describing
/// the same vehicle carrying connected/automated-vehicle hardware.
///
/// each bin's rate gains the auxiliary electrical load spread over the bin's
/// representative speed (the midpoint of its speed interval):
/// `100 * aux_load_kw / speed` kWh per 100 distance-units, converted to the
/// model's energy unit when that unit is liquid fuel. bins whose
/// representative speed is not finite and positive take no adjustment.
///
/// # Arguments
///
/// * `model` - the trained explicit bin model to remap
/// * `energy_unit` - the trained model's energy column name, e.g. `gallons`
/// * `aux_load_kw` - additional electrical demand of the CAV hardware, kilowatts
/// * `speed_feature` - name of the binned speed feature
/// * `cacc_equipped` - whether to apply the low-speed smoothing benefit
///
/// # Returns
///
/// a new model sharing the bin specification, with a separately computed
/// rate table. the input model is untouched.
pub fn cavs_mapper(
    model: &ExplicitBinModel,
    energy_unit: &str,
    aux_load_kw: f64,
    speed_feature: &str,
    cacc_equipped: bool,
) -> Result<ExplicitBinModel, ModelError> {
    if !aux_load_kw.is_finite() || aux_load_kw < 0.0 {
        return Err(ModelError::DataError(format!(
            "auxiliary load must be finite and non-negative, found {aux_load_kw}"
        )));
    }
    let speed_position = model.bins.position(speed_feature).ok_or_else(|| {
        ModelError::DataError(format!(
            "speed feature '{speed_feature}' is not part of the bin specification"
        ))
    })?;

    let cacc_benefit = if cacc_equipped {
        CACC_LOW_SPEED_BENEFIT
    } else {
        0.0
    };

    let mut remapped: BTreeMap<String, RateBin> = BTreeMap::new();
    for rate_bin in model.rate_table.values() {
        let speed_bin = rate_bin.bin_indices.get(speed_position).ok_or_else(|| {
            ModelError::DataError(format!(
                "rate table key {:?} is narrower than the bin specification",
                rate_bin.bin_indices
            ))
        })?;
        let representative_speed = model
            .bins
            .midpoint(speed_position, *speed_bin)
            .ok_or_else(|| {
                ModelError::DataError(format!(
                    "rate table references speed bin {speed_bin} outside the bin specification"
                ))
            })?;

        let kwh_per_100 = if representative_speed.is_finite() && representative_speed > 0.0 {
            100.0 * (aux_load_kw / representative_speed)
        } else {
            0.0
        };
        let rate_add = if energy_unit == fieldname::GALLONS {
            kwh_per_100 / fieldname::KWH_PER_GALLON
        } else {
            kwh_per_100
        };

        let adjusted = RateBin {
            bin_indices: rate_bin.bin_indices.clone(),
            energy: rate_bin.energy,
            distance: rate_bin.distance,
            rate: rate_bin.rate + rate_add - cacc_benefit,
        };
        // first-value policy if a remapped key repeats
        remapped
            .entry(bin_key(&adjusted.bin_indices))
            .or_insert(adjusted);
    }

    Ok(ExplicitBinModel::with_rate_table(
        model.bins.clone(),
        remapped,
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{FeatureBins, Observation, ObservationTable, RateEstimator};
    use std::collections::HashMap;

    fn trained_model(energy_values: &[(f64, f64, f64)]) -> ExplicitBinModel {
        let bins = FeatureBins::new(vec![(
            String::from("speed_mph_float"),
            vec![0.0, 10.0, 20.0, 40.0],
        )])
        .expect("test invariant failed: bins should build");
        let observations = energy_values
            .iter()
            .map(|(energy, distance, speed)| Observation {
                trip_id: String::from("t0"),
                energy: *energy,
                distance: *distance,
                features: HashMap::from([(String::from("speed_mph_float"), *speed)]),
            })
            .collect();
        let table = ObservationTable::new(
            "gallons",
            "miles",
            "trip_ids",
            vec![String::from("speed_mph_float")],
            observations,
        )
        .expect("test invariant failed: table should build");
        let rates = table.rates();
        let mut model = ExplicitBinModel::new(bins);
        model
            .fit(&table, &rates)
            .expect("test invariant failed: fit should succeed");
        model
    }

    // with a positive auxiliary load, every remapped rate strictly exceeds
    // its original: representative speeds here are all finite and positive
    #[test]
    fn test_remap_is_monotone_over_original_rates() {
        let model = trained_model(&[(10.0, 5.0, 5.0), (20.0, 10.0, 15.0), (30.0, 10.0, 30.0)]);
        let remapped = cavs_mapper(&model, "gallons", 1.5, "speed_mph_float", false)
            .expect("test invariant failed: remap should succeed");
        assert_eq!(remapped.rate_table.len(), model.rate_table.len());
        for (key, original) in model.rate_table.iter() {
            let adjusted = remapped
                .rate_table
                .get(key)
                .expect("remap should preserve keys");
            assert!(adjusted.rate > original.rate);
        }
    }

    #[test]
    fn test_zero_aux_load_leaves_rates_unchanged() {
        let model = trained_model(&[(10.0, 5.0, 5.0), (20.0, 10.0, 15.0)]);
        let remapped = cavs_mapper(&model, "gallons", 0.0, "speed_mph_float", true)
            .expect("test invariant failed: remap should succeed");
        for (key, original) in model.rate_table.iter() {
            let adjusted = remapped
                .rate_table
                .get(key)
                .expect("remap should preserve keys");
            assert_eq!(adjusted.rate, original.rate);
        }
    }

    // aux load of 1 kW at a 5 mph midpoint adds 20 kWh/100mi, which lands in
    // gallons as 20 / 33.4
    #[test]
    fn test_gallon_models_convert_the_kwh_term() {
        let model = trained_model(&[(10.0, 5.0, 5.0)]);
        let remapped = cavs_mapper(&model, "gallons", 1.0, "speed_mph_float", false)
            .expect("test invariant failed: remap should succeed");
        let original = model.rate(&[0]).expect("trained rate should exist");
        let adjusted = remapped.rate(&[0]).expect("remapped rate should exist");
        let expected = original + 20.0 / fieldname::KWH_PER_GALLON;
        assert!((adjusted - expected).abs() < 1e-12);
    }

    #[test]
    fn test_kwh_models_take_the_raw_term() {
        let model = trained_model(&[(10.0, 5.0, 5.0)]);
        let remapped = cavs_mapper(&model, "kwh", 1.0, "speed_mph_float", false)
            .expect("test invariant failed: remap should succeed");
        let original = model.rate(&[0]).expect("trained rate should exist");
        let adjusted = remapped.rate(&[0]).expect("remapped rate should exist");
        assert!((adjusted - (original + 20.0)).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_speed_feature_is_rejected() {
        let model = trained_model(&[(10.0, 5.0, 5.0)]);
        let result = cavs_mapper(&model, "gallons", 1.0, "grade_percent_float", false);
        assert!(matches!(result, Err(ModelError::DataError(_))));
    }

    #[test]
    fn test_negative_aux_load_is_rejected() {
        let model = trained_model(&[(10.0, 5.0, 5.0)]);
        let result = cavs_mapper(&model, "gallons", -1.0, "speed_mph_float", false);
        assert!(matches!(result, Err(ModelError::DataError(_))));
    }
}
