use crate::model::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// discretization of one continuous link feature into half-open intervals.
/// `edges` must be strictly increasing with at least two entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureBinSpec {
    pub feature: String,
    pub edges: Vec<f64>,
}

/// ordered per-feature bin edges for an explicit bin model. the feature
/// order here fixes the order of bin indices in every rate table key.
///
/// bin assignment uses half-open intervals `[e_i, e_i+1)`: a value exactly on
/// an interior edge falls into the upper interval, and the topmost edge
/// itself is out of range. values outside `[e_0, e_n)` map to no bin, which
/// callers must propagate as an unmatched row rather than coerce to a
/// neighboring bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureBins {
    specs: Vec<FeatureBinSpec>,
}

impl FeatureBins {
    /// builds a bin specification from (feature, edges) pairs in lookup-key order
    pub fn new(specs: Vec<(String, Vec<f64>)>) -> Result<FeatureBins, ModelError> {
        if specs.is_empty() {
            return Err(ModelError::DataError(String::from(
                "explicit bin model requires at least one binned feature",
            )));
        }
        for (feature, edges) in specs.iter() {
            if edges.len() < 2 {
                return Err(ModelError::DataError(format!(
                    "feature '{feature}' needs at least two bin edges, found {}",
                    edges.len()
                )));
            }
            if edges.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(ModelError::DataError(format!(
                    "bin edges for feature '{feature}' must be strictly increasing"
                )));
            }
        }
        let specs = specs
            .into_iter()
            .map(|(feature, edges)| FeatureBinSpec { feature, edges })
            .collect();
        Ok(FeatureBins { specs })
    }

    /// binned feature names, in key order
    pub fn features(&self) -> Vec<String> {
        self.specs.iter().map(|s| s.feature.clone()).collect()
    }

    pub fn spec(&self, feature: &str) -> Option<&FeatureBinSpec> {
        self.specs.iter().find(|s| s.feature == feature)
    }

    /// position of a feature within the key order
    pub fn position(&self, feature: &str) -> Option<usize> {
        self.specs.iter().position(|s| s.feature == feature)
    }

    /// assigns a single value to a bin index for one feature, or None when
    /// the value lies outside all intervals
    pub fn bin_index(&self, feature_position: usize, value: f64) -> Option<usize> {
        let edges = &self.specs.get(feature_position)?.edges;
        if !value.is_finite() {
            return None;
        }
        // upper interval wins when the value sits exactly on an edge
        edges
            .windows(2)
            .position(|pair| pair[0] <= value && value < pair[1])
    }

    /// assigns a full bin combination for one row, or None when any feature
    /// is missing from the row or falls outside its edges
    pub fn assign(&self, features: &HashMap<String, f64>) -> Option<Vec<usize>> {
        self.specs
            .iter()
            .enumerate()
            .map(|(position, spec)| {
                features
                    .get(&spec.feature)
                    .and_then(|value| self.bin_index(position, *value))
            })
            .collect()
    }

    /// human-readable interval label for a bin, e.g. `[10,20)`
    pub fn label(&self, feature_position: usize, bin: usize) -> Option<String> {
        let edges = &self.specs.get(feature_position)?.edges;
        let lower = edges.get(bin)?;
        let upper = edges.get(bin + 1)?;
        Some(format!("[{lower},{upper})"))
    }

    /// midpoint of a bin interval, used as the representative value for
    /// rate adjustments keyed on that feature
    pub fn midpoint(&self, feature_position: usize, bin: usize) -> Option<f64> {
        let edges = &self.specs.get(feature_position)?.edges;
        let lower = edges.get(bin)?;
        let upper = edges.get(bin + 1)?;
        Some((lower + upper) / 2.0)
    }
}
