mod cavs_mapper;
mod explicit_bin_model;
mod feature_bins;

pub use cavs_mapper::cavs_mapper;
pub use explicit_bin_model::{ExplicitBinModel, RateBin};
pub use feature_bins::{FeatureBinSpec, FeatureBins};
