use super::config::NetworkColumns;
use super::slice::Direction;
use super::NetEnergyError;
use geo::Geometry;
use std::collections::HashMap;
use std::path::Path;
use wkt::TryFromWkt;

/// one road link from the network attribute table. directional attributes
/// are held per direction of travel; a direction with no lanes is not
/// traversable and takes no part in energy estimation.
#[derive(Debug, Clone)]
pub struct NetworkLink {
    pub link_id: i64,
    pub miles: f64,
    pub forward_lanes: Option<f64>,
    pub reverse_lanes: Option<f64>,
    pub forward_grade: Option<f64>,
    pub reverse_grade: Option<f64>,
    /// digitized geometry, passed through to slice outputs unmodified
    pub geometry: Geometry,
}

impl NetworkLink {
    pub fn lanes(&self, direction: Direction) -> Option<f64> {
        match direction {
            Direction::Forward => self.forward_lanes,
            Direction::Reverse => self.reverse_lanes,
        }
    }

    pub fn grade_percent(&self, direction: Direction) -> Option<f64> {
        match direction {
            Direction::Forward => self.forward_grade,
            Direction::Reverse => self.reverse_grade,
        }
    }
}

/// reads the network attribute table, dropping rows whose road flag is in
/// the excluded list (parking, centroid connectors, walk links and similar).
///
/// links must carry an id, a positive length, and a parseable WKT geometry;
/// a row failing those is an error, as silently losing network links would
/// understate every downstream energy total. lane and grade cells may be
/// empty, which excludes the link from affected slices later.
pub fn read_network(
    filepath: &Path,
    columns: &NetworkColumns,
) -> Result<Vec<NetworkLink>, NetEnergyError> {
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
    let lookup: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, s)| (s, i)).collect();
    let column_index = |column: &str| -> Result<usize, NetEnergyError> {
        lookup
            .get(column)
            .copied()
            .ok_or_else(|| NetEnergyError::ReadError {
                filepath: name.clone(),
                error: format!("missing column '{column}'"),
            })
    };
    let id_idx = column_index(&columns.link_id)?;
    let length_idx = column_index(&columns.length_miles)?;
    let road_flag_idx = column_index(&columns.road_flag)?;
    let geometry_idx = column_index(&columns.geometry)?;
    let forward_lanes_idx = column_index(&columns.forward_lanes)?;
    let reverse_lanes_idx = column_index(&columns.reverse_lanes)?;
    let forward_grade_idx = column_index(&columns.forward_grade)?;
    let reverse_grade_idx = column_index(&columns.reverse_grade)?;

    let mut links: Vec<NetworkLink> = vec![];
    let mut excluded: usize = 0;
    for (row_idx, row) in reader.records().enumerate() {
        let record = row.map_err(|e| NetEnergyError::ReadError {
            filepath: name.clone(),
            error: format!("row {row_idx}: {e}"),
        })?;
        let cell_f64 = |idx: usize| record.get(idx).and_then(|c| c.parse::<f64>().ok());

        if let Some(flag) = record.get(road_flag_idx).and_then(|c| c.parse::<i64>().ok()) {
            if columns.excluded_road_flags.contains(&flag) {
                excluded += 1;
                continue;
            }
        }

        let link_id = record
            .get(id_idx)
            .and_then(|c| c.parse::<i64>().ok())
            .ok_or_else(|| NetEnergyError::ReadError {
                filepath: name.clone(),
                error: format!("row {row_idx} has no parseable '{}' value", columns.link_id),
            })?;
        let miles = cell_f64(length_idx)
            .filter(|m| *m > 0.0)
            .ok_or_else(|| NetEnergyError::ReadError {
                filepath: name.clone(),
                error: format!(
                    "link {link_id} has no positive '{}' value",
                    columns.length_miles
                ),
            })?;
        let geometry_str =
            record
                .get(geometry_idx)
                .ok_or_else(|| NetEnergyError::ReadError {
                    filepath: name.clone(),
                    error: format!("link {link_id} missing geometry index"),
                })?;
        let geometry: Geometry =
            Geometry::try_from_wkt_str(geometry_str).map_err(|e| NetEnergyError::ReadError {
                filepath: name.clone(),
                error: format!("link {link_id} has invalid WKT geometry: {e}"),
            })?;

        links.push(NetworkLink {
            link_id,
            miles,
            forward_lanes: cell_f64(forward_lanes_idx),
            reverse_lanes: cell_f64(reverse_lanes_idx),
            forward_grade: cell_f64(forward_grade_idx),
            reverse_grade: cell_f64(reverse_grade_idx),
            geometry,
        });
    }
    if excluded > 0 {
        log::info!("excluded {excluded} links by road flag");
    }
    Ok(links)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    fn write_fixture(label: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "routee_netenergy_network_{label}_{}.csv",
            std::process::id()
        ));
        let mut file =
            std::fs::File::create(&path).expect("test invariant failed: fixture should write");
        file.write_all(content.as_bytes())
            .expect("test invariant failed: fixture should write");
        path
    }

    #[test]
    fn test_read_network_filters_road_flags() {
        let path = write_fixture(
            "flags",
            "ID,Length,ROAD_FLAG,AB_LANES,BA_LANES,AB_grade_p,BA_grade_p,geometry\n\
             1,0.5,100,2,1,1.5,-1.5,\"LINESTRING(0 0,1 1)\"\n\
             2,0.25,1100,1,1,0.0,0.0,\"LINESTRING(1 1,2 2)\"\n\
             3,0.75,100,2,,2.0,,\"LINESTRING(2 2,3 3)\"\n",
        );
        let links = read_network(&path, &NetworkColumns::default())
            .expect("test invariant failed: network should read");
        std::fs::remove_file(&path).ok();

        // the centroid connector (flag 1100) is excluded
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].link_id, 1);
        assert_eq!(links[0].lanes(Direction::Forward), Some(2.0));
        assert_eq!(links[0].grade_percent(Direction::Reverse), Some(-1.5));

        // empty directional cells parse as missing, not zero
        assert_eq!(links[1].lanes(Direction::Reverse), None);
        assert_eq!(links[1].grade_percent(Direction::Reverse), None);
    }

    #[test]
    fn test_invalid_geometry_is_an_error() {
        let path = write_fixture(
            "badwkt",
            "ID,Length,ROAD_FLAG,AB_LANES,BA_LANES,AB_grade_p,BA_grade_p,geometry\n\
             1,0.5,100,2,1,1.5,-1.5,not-wkt\n",
        );
        let result = read_network(&path, &NetworkColumns::default());
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(NetEnergyError::ReadError { .. })));
    }
}
