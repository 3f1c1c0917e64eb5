use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("no relation registered for alias \"{0}\"")]
    UnknownAlias(String),
    #[error("loader failed for alias \"{alias}\" at \"{path}\": {message}")]
    LoaderFailed { alias: String, path: String, message: String },
    #[error("rollup aggregation failed: {0}")]
    AggregationFailed(String),
}

pub type Result<T> = std::result::Result<T, ComposeError>;
