/// average traversal speed over a link, in miles per hour
pub const SPEED_MPH: &str = "speed_mph_float";

/// directional road grade as a percentage, negative downhill
pub const GRADE_PERCENT: &str = "grade_percent_float";

/// count of lanes available in the direction of travel
pub const NUM_LANES: &str = "num_lanes_int";

/// link length in miles
pub const MILES: &str = "miles";

/// liquid fuel consumed over a link, in gallons. models trained against
/// this energy column express rates in gallons per 100 miles, and the
/// CAV remap converts its auxiliary kWh load with [`KWH_PER_GALLON`].
pub const GALLONS: &str = "gallons";

/// electrical energy consumed over a link, in kilowatt-hours
pub const KWH: &str = "kwh";

/// energy rate target column derived during training, energy per 100 distance-units
pub const RATE: &str = "rate";

/// identifier grouping link observations into trips
pub const TRIP_IDS: &str = "trip_ids";

/// gasoline gallon equivalent conversion, kWh per gallon
pub const KWH_PER_GALLON: f64 = 33.4;
