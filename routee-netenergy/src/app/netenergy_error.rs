use routee::model::ModelError;

#[derive(thiserror::Error, Debug)]
pub enum NetEnergyError {
    #[error("failure reading run configuration: {0}")]
    ConfigurationError(String),
    #[error("{msg}: {source}")]
    ConfigReadError {
        msg: String,
        source: config::ConfigError,
    },
    #[error("failure reading '{filepath}': {error}")]
    ReadError { filepath: String, error: String },
    #[error("failure writing '{filepath}': {error}")]
    WriteError { filepath: String, error: String },
    #[error(transparent)]
    ModelError(#[from] ModelError),
    #[error("failure accessing the filesystem: {source}")]
    StdIoError {
        #[from]
        source: std::io::Error,
    },
}
