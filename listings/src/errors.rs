use crawler::errors::PageAccessError;
use thiserror::Error;

/// Raised while building the pipeline, before anything is fetched.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Missing required selector(s): {0}")]
    MissingSelectors(String),
    #[error("Selector for {field} is not valid CSS ({selector}): {reason}")]
    InvalidSelector {
        field: String,
        selector: String,
        reason: String,
    },
    #[error("Invalid base URL {0}")]
    InvalidBaseUrl(String),
    #[error("Invalid option {option}: {reason}")]
    InvalidOption { option: String, reason: String },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("Failed to load page {page} ({url}): {source}")]
    PageAccess {
        page: u64,
        url: String,
        #[source]
        source: PageAccessError,
    },
}

impl PipelineError {
    pub fn page(&self) -> Option<u64> {
        match self {
            PipelineError::PageAccess { page, .. } => Some(*page),
            PipelineError::Configuration(_) => None,
        }
    }
}
