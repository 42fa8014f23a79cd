mod error_metrics;

pub use error_metrics::{
    all_error, link_average_error_unweighted, net_energy_error, predicted_energy,
    trip_average_error_weight, ErrorEstimate, TestRow,
};
