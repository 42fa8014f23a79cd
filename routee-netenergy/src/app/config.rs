use super::NetEnergyError;
use routee::model::{ForestHyperparameters, SplitRatios};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// run configuration for network energy estimation, read from a TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetEnergyConfiguration {
    pub input: InputSection,
    pub output: OutputSection,
    #[serde(default)]
    pub network: NetworkColumns,
    #[serde(default)]
    pub speed_volume: SpeedVolumeColumns,
    /// when present, the loaded model is remapped for connected/automated
    /// vehicle hardware before prediction
    #[serde(default)]
    pub cavs: Option<CavsSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSection {
    /// long-form probe speed and predicted volume CSV
    pub speed_volume_file: String,
    /// road network attribute CSV with a WKT geometry column
    pub network_file: String,
    /// trained powertrain model artifact
    pub model_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    /// directory receiving one GeoJSON file per (date, hour, direction) slice
    pub directory: String,
}

/// column names in the network file. defaults match the travel demand model
/// network schema the tool was built against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkColumns {
    pub link_id: String,
    pub length_miles: String,
    pub road_flag: String,
    pub geometry: String,
    pub forward_lanes: String,
    pub reverse_lanes: String,
    pub forward_grade: String,
    pub reverse_grade: String,
    /// functional-class codes excluded from energy estimation, such as
    /// centroid connectors and walk links
    pub excluded_road_flags: Vec<i64>,
}

impl Default for NetworkColumns {
    fn default() -> Self {
        NetworkColumns {
            link_id: String::from("ID"),
            length_miles: String::from("Length"),
            road_flag: String::from("ROAD_FLAG"),
            geometry: String::from("geometry"),
            forward_lanes: String::from("AB_LANES"),
            reverse_lanes: String::from("BA_LANES"),
            forward_grade: String::from("AB_grade_p"),
            reverse_grade: String::from("BA_grade_p"),
            excluded_road_flags: vec![900, 1000, 1100, 1200, 1300],
        }
    }
}

/// column names in the long-form speed/volume file. a negative link id marks
/// travel in the reverse direction of the link's geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedVolumeColumns {
    pub link_id: String,
    pub hour: String,
    pub speed: String,
    pub volume: String,
}

impl Default for SpeedVolumeColumns {
    fn default() -> Self {
        SpeedVolumeColumns {
            link_id: String::from("Id"),
            hour: String::from("HOUR"),
            speed: String::from("AvgSp"),
            volume: String::from("pred_volume"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CavsSection {
    /// additional electrical demand of the automation hardware, kilowatts
    pub aux_load_kw: f64,
    /// whether the vehicle carries connected adaptive cruise control
    #[serde(default)]
    pub cacc_equipped: bool,
    /// name of the binned speed feature in the trained model
    pub speed_feature: String,
}

/// training configuration for the `train` subcommand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfiguration {
    /// link-level energy consumption CSV
    pub training_file: String,
    /// path to write the trained model artifact
    pub output_file: String,
    pub vehicle_description: String,
    pub energy: String,
    pub distance: String,
    pub trip_ids: String,
    pub variant: VariantConfiguration,
    #[serde(default)]
    pub split: SplitRatios,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_seed() -> u64 {
    52
}

/// which rate model to fit, and its variant-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VariantConfiguration {
    ExplicitBin { bins: Vec<BinSpecConfiguration> },
    RandomForest {
        #[serde(default)]
        hyperparameters: ForestHyperparameters,
    },
    LinearRegression {},
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinSpecConfiguration {
    pub feature: String,
    pub edges: Vec<f64>,
}

/// reads a TOML configuration file into the requested section type
pub fn read_configuration<T: DeserializeOwned>(filepath: &str) -> Result<T, NetEnergyError> {
    let file = config::File::new(filepath, config::FileFormat::Toml);
    let configuration = config::Config::builder()
        .add_source(file)
        .build()
        .map_err(|e| NetEnergyError::ConfigReadError {
            msg: format!("failed reading '{filepath}'"),
            source: e,
        })?;
    configuration
        .try_deserialize::<T>()
        .map_err(|e| NetEnergyError::ConfigReadError {
            msg: format!("failed decoding '{filepath}'"),
            source: e,
        })
}
