//! Drives page fetches and feeds records through extract -> normalize ->
//! filter, in page order.

use std::{pin::pin, sync::Arc};

use async_stream::stream;
use common::{
    config::PipelineConfig,
    result::base::{NormalizedRecord, RawRecord},
};
use crawler::{
    errors::PageAccessError,
    request::RequestBuilder,
    traits::{PageFetcher, PageSession},
};
use futures::{Stream, StreamExt, stream};
use reqwest::Url;
use tokio::{runtime::Handle, time::sleep, time::timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    errors::{ConfigurationError, PipelineError},
    extractor::extract,
    filter::passes,
    normalizer::Normalizer,
    selectors::ListingSelectors,
    sink::{ResultSet, ResultSink},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CrawlStats {
    pub pages_fetched: u64,
    pub pages_skipped: u64,
    pub retries: u64,
    pub records_extracted: usize,
    pub records_filtered: usize,
    pub duplicates_dropped: usize,
}

#[derive(Debug)]
pub struct CrawlReport {
    pub results: ResultSet,
    /// Set when a page after the first one ran out of retries.
    pub halted: Option<PipelineError>,
    /// Pages given up on under `skipFailedPages`, in page order.
    pub skipped: Vec<PipelineError>,
    pub cancelled: bool,
    pub stats: CrawlStats,
}

#[derive(Debug)]
pub(crate) struct PageBatch {
    page: u64,
    extracted: usize,
    retries: u32,
    records: Vec<NormalizedRecord>,
}

#[derive(Debug)]
pub(crate) enum PageEvent {
    Loaded(PageBatch),
    Skipped(PipelineError),
    Halted(PipelineError),
    Cancelled { page: u64 },
}

enum FetchOutcome {
    Records { raw: Vec<RawRecord>, attempts: u32 },
    Failed { url: String, error: PageAccessError },
    Cancelled,
}

/// Owns the page session for the lifetime of one crawl. The session is
/// closed through [`SessionGuard::release`], or from `Drop` when the crawl
/// is abandoned half way.
struct SessionGuard {
    session: Option<Arc<dyn PageSession>>,
}

impl SessionGuard {
    fn new(session: Box<dyn PageSession>) -> Self {
        Self {
            session: Some(Arc::from(session)),
        }
    }

    fn session(&self) -> Option<Arc<dyn PageSession>> {
        self.session.clone()
    }

    async fn release(mut self) {
        if let Some(session) = self.session.take() {
            session.close().await;
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { session.close().await });
            }
            Err(_) => warn!("Page session dropped outside of a runtime, it was not closed"),
        }
    }
}

pub struct PaginationClient<'a> {
    config: &'a PipelineConfig,
    fetcher: Box<dyn PageFetcher>,
    selectors: ListingSelectors,
    normalizer: Normalizer,
    cancel: CancellationToken,
}

impl<'a> PaginationClient<'a> {
    /// Validates the configuration up front, nothing is fetched when this
    /// fails.
    pub fn new(
        config: &'a PipelineConfig,
        fetcher: Box<dyn PageFetcher>,
    ) -> Result<Self, ConfigurationError> {
        Self::validate(config)?;

        Ok(Self {
            config,
            fetcher,
            selectors: ListingSelectors::compile(&config.selectors)?,
            normalizer: Normalizer::new(config.decimal_separator),
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn validate(config: &PipelineConfig) -> Result<(), ConfigurationError> {
        let invalid = |option: &str, reason: &str| ConfigurationError::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        };

        if config.concurrency == 0 {
            return Err(invalid("concurrency", "must be at least 1"));
        }

        if config.max_pages == Some(0) {
            return Err(invalid("maxPages", "must be at least 1"));
        }

        if config.start_page == 0 {
            return Err(invalid("startPage", "pages are numbered from 1"));
        }

        // skipped pages never end the crawl, only a page bound does
        if config.skip_failed_pages && config.last_page().is_none() {
            return Err(invalid("skipFailedPages", "requires maxPages"));
        }

        if !matches!(config.decimal_separator, '.' | ',') {
            return Err(invalid("decimalSeparator", "must be '.' or ','"));
        }

        let first_url = config.page_url(config.start_page);
        if Url::parse(&first_url).is_err() {
            return Err(ConfigurationError::InvalidBaseUrl(config.base_url.clone()));
        }

        Ok(())
    }

    /// Runs the crawl to completion. A failure on the very first page is
    /// returned as an error, an empty result would look like "no listings".
    pub async fn crawl(self) -> Result<CrawlReport, PipelineError> {
        let start_page = self.config.start_page;

        let mut sink = ResultSink::new();
        let mut stats = CrawlStats::default();
        let mut halted = None;
        let mut skipped = Vec::new();
        let mut cancelled = false;

        let mut pages = pin!(self.pages());

        // drained to the end so the session is released before returning
        while let Some(event) = pages.next().await {
            match event {
                PageEvent::Loaded(batch) => {
                    debug!("Accumulating {} records from page {}", batch.records.len(), batch.page);

                    stats.pages_fetched += 1;
                    stats.retries += u64::from(batch.retries);
                    stats.records_extracted += batch.extracted;
                    stats.records_filtered += batch.extracted - batch.records.len();

                    sink.accumulate_all(batch.records);
                }
                PageEvent::Skipped(error) => {
                    stats.pages_skipped += 1;
                    skipped.push(error);
                }
                PageEvent::Cancelled { page } => {
                    debug!("Crawl stopped before page {page}");
                    cancelled = true;
                }
                PageEvent::Halted(error) => halted = Some(error),
            }
        }

        if let Some(error) = halted.take_if(|error| error.page() == Some(start_page)) {
            return Err(error);
        }

        stats.duplicates_dropped = sink.duplicates();

        info!(
            "Crawl finished with {} listings ({} pages, {} filtered out, {} duplicates)",
            sink.len(),
            stats.pages_fetched,
            stats.records_filtered,
            stats.duplicates_dropped
        );

        Ok(CrawlReport {
            results: sink.finalize(),
            halted,
            skipped,
            cancelled,
            stats,
        })
    }

    /// Lazy, page ordered sequence of records that passed the filters. Ends
    /// with an `Err` when a page runs out of retries. Consumes the client.
    pub fn records(self) -> impl Stream<Item = Result<NormalizedRecord, PipelineError>> + 'a {
        self.pages().flat_map(|event| {
            let items: Vec<Result<NormalizedRecord, PipelineError>> = match event {
                PageEvent::Loaded(batch) => batch.records.into_iter().map(Ok).collect(),
                PageEvent::Halted(error) => vec![Err(error)],
                PageEvent::Skipped(_) | PageEvent::Cancelled { .. } => Vec::new(),
            };

            stream::iter(items)
        })
    }

    pub(crate) fn pages(self) -> impl Stream<Item = PageEvent> + 'a {
        stream! {
            let Self { config, fetcher, selectors, normalizer, cancel } = self;
            let start_page = config.start_page;
            let last_page = config.last_page();

            let guard = match fetcher.open_session().await {
                Ok(session) => SessionGuard::new(session),
                Err(source) => {
                    error!("Failed to open page session: {source}");
                    yield PageEvent::Halted(PipelineError::PageAccess {
                        page: start_page,
                        url: config.page_url(start_page),
                        source,
                    });
                    return;
                }
            };

            let Some(session) = guard.session() else {
                return;
            };

            let selectors = &selectors;
            let page_numbers = (start_page..).take_while(move |page| last_page.is_none_or(|last| *page <= last));

            let mut fetches = stream::iter(page_numbers)
                .map(|page| {
                    let session = session.clone();
                    let cancel = cancel.clone();
                    async move {
                        let outcome = fetch_page(session, config, selectors, &cancel, page).await;
                        (page, outcome)
                    }
                })
                .buffered(config.concurrency);

            while let Some((page, outcome)) = fetches.next().await {
                match outcome {
                    FetchOutcome::Records { raw, attempts } => {
                        let extracted = raw.len();
                        let records: Vec<NormalizedRecord> = raw
                            .into_iter()
                            .map(|raw| normalizer.normalize(raw))
                            .filter(|record| passes(record, &config.filters))
                            .collect();

                        info!("Page {}: {} listings, {} kept", page, extracted, records.len());

                        yield PageEvent::Loaded(PageBatch {
                            page,
                            extracted,
                            retries: attempts.saturating_sub(1),
                            records,
                        });

                        if extracted == 0 {
                            info!("Page {page} has no listings, stopping");
                            break;
                        }
                    }
                    FetchOutcome::Failed { url, error } => {
                        let error = PipelineError::PageAccess { page, url, source: error };

                        if page != start_page && config.skip_failed_pages {
                            warn!("Skipping page: {error}");
                            yield PageEvent::Skipped(error);
                            continue;
                        }

                        error!("Stopping crawl: {error}");
                        yield PageEvent::Halted(error);
                        break;
                    }
                    FetchOutcome::Cancelled => {
                        info!("Crawl cancelled before page {page}");
                        yield PageEvent::Cancelled { page };
                        break;
                    }
                }
            }

            drop(fetches);
            drop(session);
            guard.release().await;
        }
    }
}

/// Fetches and extracts one page, retrying the same page on failure.
async fn fetch_page(
    session: Arc<dyn PageSession>,
    config: &PipelineConfig,
    selectors: &ListingSelectors,
    cancel: &CancellationToken,
    page: u64,
) -> FetchOutcome {
    let url = config.page_url(page);
    let headers = config.header_pairs();
    let mut attempts: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return FetchOutcome::Cancelled;
        }

        attempts += 1;

        let request = RequestBuilder::new()
            .set_url(url.clone())
            .set_headers(&headers)
            .build();

        let result = match timeout(config.per_fetch_timeout, session.fetch(request)).await {
            Ok(fetched) => fetched.and_then(|handle| extract(&handle, selectors)),
            Err(_) => Err(PageAccessError::Timeout {
                url: url.clone(),
                timeout: config.per_fetch_timeout,
            }),
        };

        let error = match result {
            Ok(raw) => return FetchOutcome::Records { raw, attempts },
            Err(error) => error,
        };

        if attempts > config.per_page_retry_budget {
            return FetchOutcome::Failed { url, error };
        }

        let backoff = config.retry_backoff * attempts;
        warn!(
            "Page {} failed (attempt {}): {}, retrying in {:?}",
            page, attempts, error, backoff
        );
        sleep(backoff).await;
        debug!("Retrying page {page}");
    }
}
