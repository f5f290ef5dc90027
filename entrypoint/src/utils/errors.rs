use listings::errors::{ConfigurationError, PipelineError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Config file {path} is not valid: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}
