use async_trait::async_trait;

use crate::{errors::PageAccessError, request::Request};

/// A loaded page, handed out by a [`PageSession`] once the page stopped
/// loading resources ("network idle").
#[derive(Debug, Clone)]
pub struct PageHandle {
    pub url: String,
    pub body: String,
    ready: bool,
}

impl PageHandle {
    pub fn loaded(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
            ready: true,
        }
    }

    /// Handle for a navigation that was started but never settled.
    pub fn pending(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: String::new(),
            ready: false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Exclusive browsing session used by a single pipeline run.
#[async_trait]
pub trait PageSession: Send + Sync {
    async fn fetch(&self, request: Request) -> Result<PageHandle, PageAccessError>;

    /// Releases the session. Calling it more than once is a no-op.
    async fn close(&self);
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn PageSession>, PageAccessError>;
}
