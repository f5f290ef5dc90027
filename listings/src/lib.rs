pub mod errors;
pub mod extractor;
pub mod filter;
pub mod normalizer;
pub mod pagination_client;
pub mod selectors;
pub mod sink;
pub(crate) mod utils;

pub use pagination_client::{CrawlReport, CrawlStats, PaginationClient};
pub use sink::{ResultSet, ResultSink};
