use super::config::SpeedVolumeColumns;
use super::slice::Direction;
use super::NetEnergyError;
use std::collections::HashMap;
use std::path::Path;

/// a link's observed speed and predicted volume across the 24 hours of one
/// day. hours with no probe coverage hold no value.
#[derive(Debug, Clone)]
pub struct HourlyProfile {
    pub speed_mph: [Option<f64>; 24],
    pub volume: [Option<f64>; 24],
}

impl HourlyProfile {
    fn empty() -> HourlyProfile {
        HourlyProfile {
            speed_mph: [None; 24],
            volume: [None; 24],
        }
    }
}

/// probe speed and predicted volume per (link, direction), pivoted from the
/// long-form table the volume estimation step produces. a negative link id
/// in the source data marks the reverse direction of that link.
#[derive(Debug, Clone, Default)]
pub struct SpeedVolumeTable {
    profiles: HashMap<(i64, Direction), HourlyProfile>,
}

impl SpeedVolumeTable {
    /// reads and pivots the long-form CSV. rows with an unparseable id or an
    /// hour outside [0,24) are skipped with a warning; rows missing speed or
    /// volume leave that hour unset.
    pub fn from_csv(
        filepath: &Path,
        columns: &SpeedVolumeColumns,
    ) -> Result<SpeedVolumeTable, NetEnergyError> {
        let name = filepath.to_str().unwrap_or_default().to_string();
        let mut reader = csv::Reader::from_path(filepath).map_err(|e| NetEnergyError::ReadError {
            filepath: name.clone(),
            error: e.to_string(),
        })?;
        let headers = reader
            .headers()
            .map_err(|e| NetEnergyError::ReadError {
                filepath: name.clone(),
                error: e.to_string(),
            })?
            .clone();
        let lookup: HashMap<&str, usize> =
            headers.iter().enumerate().map(|(i, s)| (s, i)).collect();
        let column_index = |column: &str| -> Result<usize, NetEnergyError> {
            lookup.get(column).copied().ok_or_else(|| NetEnergyError::ReadError {
                filepath: name.clone(),
                error: format!("missing column '{column}'"),
            })
        };
        let id_idx = column_index(&columns.link_id)?;
        let hour_idx = column_index(&columns.hour)?;
        let speed_idx = column_index(&columns.speed)?;
        let volume_idx = column_index(&columns.volume)?;

        let mut profiles: HashMap<(i64, Direction), HourlyProfile> = HashMap::new();
        let mut skipped: usize = 0;
        for (row_idx, row) in reader.records().enumerate() {
            let record = row.map_err(|e| NetEnergyError::ReadError {
                filepath: name.clone(),
                error: format!("row {row_idx}: {e}"),
            })?;
            let cell_f64 = |idx: usize| record.get(idx).and_then(|c| c.parse::<f64>().ok());
            let raw_id = record.get(id_idx).and_then(|c| c.parse::<f64>().ok());
            let hour = record.get(hour_idx).and_then(|c| c.parse::<f64>().ok());
            let (raw_id, hour) = match (raw_id, hour) {
                (Some(i), Some(h)) if (0.0..24.0).contains(&h) => (i, h as usize),
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            let direction = if raw_id < 0.0 {
                Direction::Reverse
            } else {
                Direction::Forward
            };
            let link_id = raw_id.abs() as i64;
            let profile = profiles
                .entry((link_id, direction))
                .or_insert_with(HourlyProfile::empty);
            profile.speed_mph[hour] = cell_f64(speed_idx);
            profile.volume[hour] = cell_f64(volume_idx);
        }
        if skipped > 0 {
            log::warn!("skipped {skipped} speed/volume rows with invalid id or hour");
        }
        Ok(SpeedVolumeTable { profiles })
    }

    pub fn profile(&self, link_id: i64, direction: Direction) -> Option<&HourlyProfile> {
        self.profiles.get(&(link_id, direction))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
