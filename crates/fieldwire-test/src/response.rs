//! Recorded response.

use crate::error::TestError;
use bytes::Bytes;
use fieldwire_core::HttpResponse;
use http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A template render captured by [`RecordedResponse`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedHtml {
    /// Status passed to the renderer
    pub status: StatusCode,
    /// Template name
    pub template: String,
    /// Template model
    pub model: Map<String, Value>,
}

/// Everything written to the response, with helper methods for assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordedResponse {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
    html: Option<RenderedHtml>,
}

impl RecordedResponse {
    /// Status, if one was set.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns a reference to the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Gets a header value as a string.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// True if nothing at all was written.
    #[must_use]
    pub fn is_untouched(&self) -> bool {
        self.status.is_none() && self.headers.is_empty() && self.body.is_empty() && self.html.is_none()
    }

    /// Returns the body as a string.
    ///
    /// Returns an error if the body is not valid UTF-8.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.clone())
            .map_err(|e| TestError::BodyRead(format!("Invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        serde_json::from_slice(&self.body).map_err(TestError::Json)
    }

    /// The captured template render.
    #[must_use]
    pub fn html(&self) -> Option<&RenderedHtml> {
        self.html.as_ref()
    }

    // Assertion methods

    /// Asserts that the status code equals the expected value.
    ///
    /// # Panics
    ///
    /// Panics if no status was set or it differs from `expected`.
    #[track_caller]
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            Some(expected),
            "Expected status {expected}, got {:?}",
            self.status
        );
        self
    }

    /// Asserts that a header has the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the header is missing or differs from `expected`.
    #[track_caller]
    pub fn assert_header(&self, name: &str, expected: &str) -> &Self {
        assert_eq!(
            self.header_str(name),
            Some(expected),
            "Expected header {name}: {expected}"
        );
        self
    }
}

impl HttpResponse for RecordedResponse {
    fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    fn set_header(&mut self, name: &str, value: &str) {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            self.headers.insert(name, value);
        }
    }

    fn write_body(&mut self, body: Bytes) {
        self.body.extend_from_slice(&body);
    }

    fn render_html(&mut self, status: StatusCode, template: &str, model: &Map<String, Value>) {
        self.status = Some(status);
        self.html = Some(RenderedHtml {
            status,
            template: template.to_owned(),
            model: model.clone(),
        });
    }
}
