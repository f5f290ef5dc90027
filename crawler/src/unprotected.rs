use std::{
    str::FromStr,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{
    Client, ClientBuilder,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use tracing::{debug, info, trace};

use crate::{
    errors::PageAccessError,
    request::Request,
    traits::{PageFetcher, PageHandle, PageSession},
};

const PAGE_TIMEOUT_SECONDS: u64 = 30;

const USER_AGENT: &str = "listing-monitor/0.1 (+https://github.com/listing-monitor)";

/// Plain HTTP fetcher. A page counts as loaded once its whole body has been
/// read, there is no script execution.
#[derive(Clone)]
pub struct UnprotectedCrawler {
    user_agent: String,
    timeout: Duration,
}

impl Default for UnprotectedCrawler {
    fn default() -> Self {
        Self::new()
    }
}

impl UnprotectedCrawler {
    pub fn new() -> Self {
        Self {
            user_agent: USER_AGENT.into(),
            timeout: Duration::from_secs(PAGE_TIMEOUT_SECONDS),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn create_client(&self) -> Result<Client, PageAccessError> {
        ClientBuilder::new()
            .gzip(true)
            .http1_ignore_invalid_headers_in_responses(true)
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(|err| PageAccessError::ClientInit(err.to_string()))
    }
}

#[async_trait]
impl PageFetcher for UnprotectedCrawler {
    async fn open_session(&self) -> Result<Box<dyn PageSession>, PageAccessError> {
        let client = self.create_client()?;

        debug!("Opened HTTP session");

        Ok(Box::new(UnprotectedSession {
            client,
            closed: AtomicBool::new(false),
        }))
    }
}

pub struct UnprotectedSession {
    client: Client,
    closed: AtomicBool,
}

#[async_trait]
impl PageSession for UnprotectedSession {
    async fn fetch(&self, request: Request) -> Result<PageHandle, PageAccessError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PageAccessError::SessionClosed);
        }

        let mut request_builder = self.client.get(request.url.clone());

        if let Some(headers) = request.headers {
            let mut header_map = HeaderMap::new();

            for (key, value) in headers.iter() {
                header_map.append(HeaderName::from_str(key)?, HeaderValue::from_str(value)?);
            }

            request_builder = request_builder.headers(header_map);
        }

        info!("Sending request to {}", request.url);

        let response = request_builder
            .send()
            .await
            .map_err(|source| PageAccessError::Navigation {
                url: request.url.clone(),
                source,
            })?;

        debug!("{response:?}");

        let status = response.status();
        if !status.is_success() {
            return Err(PageAccessError::HttpStatus {
                url: request.url,
                status: status.as_u16(),
            });
        }

        // the final URL matters for resolving relative links after redirects
        let final_url = response.url().to_string();

        let body = response
            .text()
            .await
            .map_err(|source| PageAccessError::Navigation {
                url: request.url.clone(),
                source,
            })?;

        trace!("{body}");

        Ok(PageHandle::loaded(final_url, body))
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!("Closed HTTP session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closed_session_refuses_requests() {
        let session = UnprotectedCrawler::new().open_session().await.unwrap();
        session.close().await;
        session.close().await;

        let request = Request::builder()
            .set_url("http://127.0.0.1:9/listings")
            .build();

        assert!(matches!(
            session.fetch(request).await,
            Err(PageAccessError::SessionClosed)
        ));
    }

    #[tokio::test]
    async fn invalid_header_is_reported() {
        let session = UnprotectedCrawler::new().open_session().await.unwrap();

        let request = Request::builder()
            .set_url("http://127.0.0.1:9/listings")
            .set_headers(&[("bad header".to_string(), "x".to_string())])
            .build();

        assert!(matches!(
            session.fetch(request).await,
            Err(PageAccessError::InvalidHeader)
        ));
    }
}
