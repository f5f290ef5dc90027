use std::time::Duration;

use reqwest::header::{InvalidHeaderName, InvalidHeaderValue};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageAccessError {
    #[error("Navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Navigation to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("Navigation to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("Page {0} never finished loading")]
    NotReady(String),
    #[error("Page session is already closed")]
    SessionClosed,
    #[error("Crawler failed to create header")]
    InvalidHeader,
    #[error("Crawler failed to start: {0}")]
    ClientInit(String),
}

impl From<InvalidHeaderName> for PageAccessError {
    fn from(_err: InvalidHeaderName) -> Self {
        Self::InvalidHeader
    }
}

impl From<InvalidHeaderValue> for PageAccessError {
    fn from(_err: InvalidHeaderValue) -> Self {
        Self::InvalidHeader
    }
}
