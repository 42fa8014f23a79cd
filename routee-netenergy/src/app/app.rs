use super::config::NetEnergyConfiguration;
use super::network::{self, NetworkLink};
use super::slice::{SliceKey, SliceRow};
use super::speed_volume::SpeedVolumeTable;
use super::NetEnergyError;
use chrono::NaiveDate;
use geojson::{Feature, FeatureCollection, GeoJson};
use kdam::{Bar, BarExt};
use rayon::prelude::*;
use routee::model::{fieldname, LinkPass, LinkTable, PowertrainModel};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// outcome of a full network energy run. slices are independent, so a fatal
/// error in one is recorded here while the others complete.
#[derive(Debug)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: Vec<(SliceKey, String)>,
    /// links written across all completed slices
    pub links_written: usize,
    /// links excluded across all completed slices because no energy rate matched
    pub links_unmatched: usize,
}

/// estimates link-level energy over the network for every (hour, direction)
/// slice of one day, writing one GeoJSON file per slice.
///
/// the trained model is loaded once and shared across slices; each slice
/// selects its own links, assembles feature rows, predicts energy, derives
/// the density quantities, and writes its own output file.
pub fn run(
    configuration: &NetEnergyConfiguration,
    date: NaiveDate,
) -> Result<RunSummary, NetEnergyError> {
    let model = PowertrainModel::from_file(Path::new(&configuration.input.model_file))?;
    let model = match &configuration.cavs {
        Some(cavs) => {
            log::info!(
                "remapping '{}' for CAV hardware with {} kW auxiliary load",
                model.vehicle_description,
                cavs.aux_load_kw
            );
            model.cavs_mapper(cavs.aux_load_kw, &cavs.speed_feature, cavs.cacc_equipped)?
        }
        None => model,
    };
    log::info!(
        "estimating energy for '{}' on {date}",
        model.vehicle_description
    );

    let network_links = network::read_network(
        Path::new(&configuration.input.network_file),
        &configuration.network,
    )?;
    let speed_volume = SpeedVolumeTable::from_csv(
        Path::new(&configuration.input.speed_volume_file),
        &configuration.speed_volume,
    )?;
    log::info!(
        "read {} network links and {} speed/volume profiles",
        network_links.len(),
        speed_volume.len()
    );

    let output_directory = Path::new(&configuration.output.directory);
    std::fs::create_dir_all(output_directory)?;

    let slices = SliceKey::for_date(date);
    let bar = Arc::new(Mutex::new(
        Bar::builder()
            .desc("energy slices")
            .total(slices.len())
            .build()
            .map_err(NetEnergyError::ConfigurationError)?,
    ));

    let results: Vec<(SliceKey, Result<SliceOutcome, NetEnergyError>)> = slices
        .into_par_iter()
        .map(|key| {
            let result = run_slice(&key, &model, &network_links, &speed_volume, output_directory);
            if let Ok(mut bar) = bar.lock() {
                let _ = bar.update(1);
            }
            (key, result)
        })
        .collect();

    let mut summary = RunSummary {
        completed: 0,
        failed: vec![],
        links_written: 0,
        links_unmatched: 0,
    };
    for (key, result) in results {
        match result {
            Ok(outcome) => {
                summary.completed += 1;
                summary.links_written += outcome.links_written;
                summary.links_unmatched += outcome.links_unmatched;
                if outcome.links_unmatched > 0 {
                    log::warn!(
                        "slice {key}: {} links had no matching energy rate and were dropped",
                        outcome.links_unmatched
                    );
                }
            }
            Err(e) => {
                log::error!("slice {key} failed: {e}");
                summary.failed.push((key, e.to_string()));
            }
        }
    }
    log::info!(
        "completed {} of {} slices, wrote {} link results",
        summary.completed,
        summary.completed + summary.failed.len(),
        summary.links_written
    );
    Ok(summary)
}

struct SliceOutcome {
    links_written: usize,
    links_unmatched: usize,
}

/// one selected link's inputs within a slice, kept alongside the feature row
/// so prediction output can be joined back to the link
struct SliceLink<'a> {
    link: &'a NetworkLink,
    volume: f64,
    speed: f64,
    grade: f64,
    lanes: f64,
}

/// estimates energy for every traversable link in one (hour, direction)
/// slice and writes the slice's GeoJSON file. links missing lanes, grade,
/// speed or volume for this slice are excluded from it rather than defaulted.
fn run_slice(
    key: &SliceKey,
    model: &PowertrainModel,
    network_links: &[NetworkLink],
    speed_volume: &SpeedVolumeTable,
    output_directory: &Path,
) -> Result<SliceOutcome, NetEnergyError> {
    let hour = key.hour as usize;
    let selected: Vec<SliceLink> = network_links
        .iter()
        .filter_map(|link| {
            let lanes = link.lanes(key.direction).filter(|l| *l > 0.0)?;
            let grade = link.grade_percent(key.direction)?;
            let profile = speed_volume.profile(link.link_id, key.direction)?;
            let speed = profile.speed_mph[hour]?;
            let volume = profile.volume[hour]?;
            Some(SliceLink {
                link,
                volume,
                speed,
                grade,
                lanes,
            })
        })
        .collect();

    let rows: Vec<LinkPass> = selected
        .iter()
        .map(|s| LinkPass {
            features: HashMap::from([
                (fieldname::SPEED_MPH.to_string(), s.speed),
                (fieldname::GRADE_PERCENT.to_string(), s.grade),
                (fieldname::NUM_LANES.to_string(), s.lanes),
            ]),
            distance: s.link.miles,
        })
        .collect();
    let table = LinkTable::new(
        vec![
            fieldname::SPEED_MPH.to_string(),
            fieldname::GRADE_PERCENT.to_string(),
            fieldname::NUM_LANES.to_string(),
        ],
        rows,
    );
    let prediction = model.predict(&table)?;

    let features = prediction
        .energy
        .iter()
        .map(|(idx, energy)| {
            let s = &selected[*idx];
            let row = SliceRow::new(
                s.link.link_id,
                s.volume,
                s.speed,
                s.link.miles,
                s.grade,
                s.lanes,
                *energy,
            );
            let properties = match serde_json::to_value(&row) {
                Ok(serde_json::Value::Object(map)) => map,
                _ => serde_json::Map::new(),
            };
            Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(
                    &s.link.geometry,
                ))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect::<Vec<Feature>>();

    let filepath = output_directory.join(key.filename());
    let file = File::create(&filepath).map_err(|e| NetEnergyError::WriteError {
        filepath: filepath.to_str().unwrap_or_default().to_string(),
        error: e.to_string(),
    })?;
    let collection = GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    });
    serde_json::to_writer(BufWriter::new(file), &collection).map_err(|e| {
        NetEnergyError::WriteError {
            filepath: filepath.to_str().unwrap_or_default().to_string(),
            error: e.to_string(),
        }
    })?;

    Ok(SliceOutcome {
        links_written: prediction.energy.len(),
        links_unmatched: prediction.dropped,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::app::config::{InputSection, NetworkColumns, OutputSection, SpeedVolumeColumns};
    use routee::model::{
        ExplicitBinModel, FeatureBins, Observation, ObservationTable, RateModel, TrainOptions,
    };
    use std::collections::HashMap;
    use std::io::Write;

    fn write_file(path: &Path, content: &str) {
        let mut file =
            File::create(path).expect("test invariant failed: fixture should write");
        file.write_all(content.as_bytes())
            .expect("test invariant failed: fixture should write");
    }

    /// a model over speed bins [0,100) where every training row carries a
    /// rate of 200 gallons per 100 miles
    fn write_model_artifact(path: &Path) {
        let observations = (0..200)
            .map(|i| Observation {
                trip_id: format!("t{}", i % 5),
                energy: 10.0,
                distance: 5.0,
                features: HashMap::from([(
                    fieldname::SPEED_MPH.to_string(),
                    10.0 + (i % 40) as f64,
                )]),
            })
            .collect();
        let table = ObservationTable::new(
            "gallons",
            "miles",
            "trip_ids",
            vec![fieldname::SPEED_MPH.to_string()],
            observations,
        )
        .expect("test invariant failed: table should build");
        let bins = FeatureBins::new(vec![(
            fieldname::SPEED_MPH.to_string(),
            vec![0.0, 50.0, 100.0],
        )])
        .expect("test invariant failed: bins should build");
        let trained = PowertrainModel::train(
            "2016 Volkswagen Tiguan",
            RateModel::ExplicitBin(ExplicitBinModel::new(bins)),
            &table,
            &TrainOptions::default(),
        )
        .expect("test invariant failed: training should succeed");
        trained
            .to_file(path)
            .expect("test invariant failed: artifact should write");
    }

    // a one-link network with forward travel at hour 7 produces exactly one
    // populated slice file carrying the predicted energy
    #[test]
    fn test_run_writes_one_file_per_slice() {
        let dir = std::env::temp_dir().join(format!("routee_netenergy_run_{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("test invariant failed: temp dir should build");

        let model_file = dir.join("tiguan.json");
        write_model_artifact(&model_file);

        let network_file = dir.join("network.csv");
        write_file(
            &network_file,
            "ID,Length,ROAD_FLAG,AB_LANES,BA_LANES,AB_grade_p,BA_grade_p,geometry\n\
             1,0.5,100,2,,1.5,,\"LINESTRING(0 0,1 1)\"\n",
        );

        let speed_volume_file = dir.join("speed_volume.csv");
        write_file(
            &speed_volume_file,
            "Id,HOUR,AvgSp,pred_volume\n1,7,34.5,120\n",
        );

        let output_directory = dir.join("EnergyData");
        let configuration = NetEnergyConfiguration {
            input: InputSection {
                speed_volume_file: speed_volume_file.to_str().unwrap().to_string(),
                network_file: network_file.to_str().unwrap().to_string(),
                model_file: model_file.to_str().unwrap().to_string(),
            },
            output: OutputSection {
                directory: output_directory.to_str().unwrap().to_string(),
            },
            network: NetworkColumns::default(),
            speed_volume: SpeedVolumeColumns::default(),
            cavs: None,
        };
        let date = NaiveDate::from_ymd_opt(2020, 2, 18)
            .expect("test invariant failed: date should build");

        let summary = run(&configuration, date).expect("test invariant failed: run should succeed");

        // ASSERTION 1: every slice completes and exactly one link result is written
        assert!(summary.failed.is_empty());
        assert_eq!(summary.completed, 48);
        assert_eq!(summary.links_written, 1);
        assert_eq!(summary.links_unmatched, 0);

        // ASSERTION 2: the populated slice carries the predicted energy,
        // rate 200 over half a mile -> 1 gallon
        let populated = output_directory.join("2020-02-18_7_forward.geojson");
        let text = std::fs::read_to_string(&populated)
            .expect("test invariant failed: slice file should exist");
        let decoded: serde_json::Value =
            serde_json::from_str(&text).expect("slice file should be valid JSON");
        let features = decoded["features"]
            .as_array()
            .expect("slice file should hold a feature collection");
        assert_eq!(features.len(), 1);
        let properties = &features[0]["properties"];
        assert_eq!(properties["link_id"], serde_json::json!(1));
        assert_eq!(properties["energy"], serde_json::json!(1.0));
        assert_eq!(properties["volume"], serde_json::json!(120.0));

        // ASSERTION 3: slices without probe coverage write empty collections
        let empty_slice = output_directory.join("2020-02-18_8_forward.geojson");
        let text = std::fs::read_to_string(&empty_slice)
            .expect("test invariant failed: slice file should exist");
        let decoded: serde_json::Value =
            serde_json::from_str(&text).expect("slice file should be valid JSON");
        assert_eq!(decoded["features"].as_array().map(|f| f.len()), Some(0));

        std::fs::remove_dir_all(&dir).ok();
    }
}
