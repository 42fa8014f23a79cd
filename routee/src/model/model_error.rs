#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    /// training or metric computation received rows it cannot use, such as a
    /// missing column, an empty table, or a zero denominator
    #[error("invalid model data: {0}")]
    DataError(String),
    /// prediction input does not expose a feature column the model was trained on
    #[error("prediction input missing trained feature column '{0}'")]
    SchemaError(String),
    /// a model artifact could not be written, read, or decoded
    #[error("model artifact failure: {0}")]
    SerializationError(String),
}
