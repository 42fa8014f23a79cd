use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use routee_netenergy::app::{
    self,
    config::{self, NetEnergyConfiguration, TrainConfiguration},
    NetEnergyError,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct NetEnergyArguments {
    #[command(subcommand)]
    app: App,
}

#[derive(Subcommand)]
pub enum App {
    #[command(
        name = "train",
        about = "train a powertrain model from link-level energy consumption data"
    )]
    Train {
        #[arg(long, help = "path to a TOML training configuration file")]
        configuration_file: String,
    },
    #[command(
        name = "run",
        about = "estimate hourly link energy over a road network for one day"
    )]
    Run {
        #[arg(long, help = "path to a TOML run configuration file")]
        configuration_file: String,
        #[arg(long, help = "date of the probe speed dataset, YYYY-MM-DD")]
        date: String,
    },
}

pub fn run(app: &App) -> Result<(), NetEnergyError> {
    match app {
        App::Train { configuration_file } => {
            let configuration: TrainConfiguration = config::read_configuration(configuration_file)?;
            let trained = app::train(&configuration)?;
            if let Some(errors) = &trained.errors {
                eprintln!(
                    "trained '{}': link error {:.4}, trip error {:.4}, net error {:.4}",
                    trained.vehicle_description,
                    errors.link_error_unweighted,
                    errors.trip_error_weighted,
                    errors.net_error
                );
            }
            Ok(())
        }
        App::Run {
            configuration_file,
            date,
        } => {
            let configuration: NetEnergyConfiguration =
                config::read_configuration(configuration_file)?;
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| {
                NetEnergyError::ConfigurationError(format!("invalid date '{date}': {e}"))
            })?;
            let summary = app::run(&configuration, date)?;
            if !summary.failed.is_empty() {
                for (key, error) in summary.failed.iter() {
                    eprintln!("slice {key} failed: {error}");
                }
                return Err(NetEnergyError::ConfigurationError(format!(
                    "{} of {} slices failed",
                    summary.failed.len(),
                    summary.failed.len() + summary.completed
                )));
            }
            eprintln!("finished.");
            Ok(())
        }
    }
}

fn main() {
    env_logger::init();
    let args = NetEnergyArguments::parse();
    match run(&args.app) {
        Ok(_) => {}
        Err(e) => {
            log::error!("routee-netenergy failed: {e}");
            std::process::exit(1);
        }
    }
}
