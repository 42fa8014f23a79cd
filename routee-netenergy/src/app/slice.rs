use chrono::NaiveDate;
use itertools::iproduct;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// direction of travel over a link, relative to its digitized geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    pub fn all() -> [Direction; 2] {
        [Direction::Forward, Direction::Reverse]
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Reverse => write!(f, "reverse"),
        }
    }
}

/// one unit of aggregation output: a calendar date, an hour of day, and a
/// direction of travel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SliceKey {
    pub date: NaiveDate,
    pub hour: u8,
    pub direction: Direction,
}

impl SliceKey {
    /// every (hour, direction) slice for one date, hours ascending within
    /// each direction
    pub fn for_date(date: NaiveDate) -> Vec<SliceKey> {
        iproduct!(Direction::all(), 0..24)
            .map(|(direction, hour)| SliceKey {
                date,
                hour,
                direction,
            })
            .collect()
    }

    pub fn filename(&self) -> String {
        format!("{}_{}_{}.geojson", self.date, self.hour, self.direction)
    }
}

impl Display for SliceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} hour {} {}", self.date, self.hour, self.direction)
    }
}

/// per-link energy results within one slice. grade-adjusted quantities are
/// undefined on flat links and carry no value there rather than dividing by
/// zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceRow {
    pub link_id: i64,
    pub volume: f64,
    pub speed_mph_float: f64,
    pub miles: f64,
    pub energy: f64,
    pub energy_density: f64,
    pub energy_per_mile: f64,
    pub energy_density_per_mile: f64,
    pub energy_per_mile_per_lane: f64,
    pub energy_density_per_mile_per_lane: f64,
    pub energy_per_mile_per_lane_grade_adj: Option<f64>,
    pub energy_density_per_mile_per_lane_grade_adj: Option<f64>,
    pub grade_percent_float: f64,
    pub num_lanes_int: f64,
}

impl SliceRow {
    /// derives the energy quantity family for one link from its predicted
    /// energy, traffic volume, and link attributes
    pub fn new(
        link_id: i64,
        volume: f64,
        speed: f64,
        miles: f64,
        grade: f64,
        lanes: f64,
        energy: f64,
    ) -> SliceRow {
        let energy_per_mile = energy / miles;
        let energy_per_mile_per_lane = energy_per_mile / lanes;
        let grade_adj = if grade == 0.0 {
            None
        } else {
            Some(energy_per_mile_per_lane / (grade / 100.0))
        };
        SliceRow {
            link_id,
            volume,
            speed_mph_float: speed,
            miles,
            energy,
            energy_density: energy * volume,
            energy_per_mile,
            energy_density_per_mile: energy_per_mile * volume,
            energy_per_mile_per_lane,
            energy_density_per_mile_per_lane: energy_per_mile_per_lane * volume,
            energy_per_mile_per_lane_grade_adj: grade_adj,
            energy_density_per_mile_per_lane_grade_adj: grade_adj.map(|g| g * volume),
            grade_percent_float: grade,
            num_lanes_int: lanes,
        }
    }
}
