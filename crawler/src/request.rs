#[derive(Debug, Clone)]
pub struct Request {
    pub(crate) url: String,
    pub(crate) headers: Option<Vec<(String, String)>>,
}

pub struct RequestBuilder {
    request: Request,
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Default for Request {
    fn default() -> Self {
        Request {
            url: Default::default(),
            headers: None,
        }
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            request: Request::default(),
        }
    }

    pub fn set_url(mut self, url: impl Into<String>) -> Self {
        self.request.url = url.into();

        self
    }

    pub fn set_headers(mut self, headers: &[(String, String)]) -> Self {
        if headers.is_empty() {
            return self;
        }

        self.request.headers = Some(headers.to_vec());

        self
    }

    pub fn build(self) -> Request {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_headers_are_not_attached() {
        let request = RequestBuilder::new()
            .set_url("https://example.com/listings")
            .set_headers(&[])
            .build();

        assert_eq!(request.url(), "https://example.com/listings");
        assert!(request.headers.is_none());
    }

    #[test]
    fn headers_are_copied_into_request() {
        let headers = [("Accept-Language".to_string(), "pt-PT".to_string())];
        let request = Request::builder()
            .set_url("https://example.com")
            .set_headers(&headers)
            .build();

        assert_eq!(request.headers, Some(headers.to_vec()));
    }
}
