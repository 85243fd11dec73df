//! Test request building.

use crate::context::TestContext;
use crate::error::TestError;
use bytes::Bytes;
use fieldwire_core::{HttpRequest, RequestScope, SharedValue};
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// An in-memory request.
///
/// Presence follows the usual server semantics: a header or path parameter
/// counts as present only when non-empty, a query or form entry whenever its
/// key appears.
#[derive(Debug, Clone)]
pub struct TestRequest {
    /// HTTP method
    pub method: Method,
    /// Request URI
    pub uri: Uri,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Bytes,
    /// Decoded query string entries, in order
    pub query: Vec<(String, String)>,
    /// Decoded form entries, in order
    pub form: Vec<(String, String)>,
    /// Router path parameters
    pub path_params: HashMap<String, String>,
}

impl TestRequest {
    /// Creates a new GET request.
    pub fn get(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::GET, uri)
    }

    /// Creates a new POST request.
    pub fn post(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::POST, uri)
    }

    /// Creates a new PUT request.
    pub fn put(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PUT, uri)
    }

    /// Creates a new DELETE request.
    pub fn delete(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::DELETE, uri)
    }
}

fn first<'a>(entries: &'a [(String, String)], name: &str) -> Option<&'a str> {
    entries
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

impl HttpRequest for TestRequest {
    fn method(&self) -> &Method {
        &self.method
    }

    fn uri(&self) -> &Uri {
        &self.uri
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
    }

    fn query(&self, name: &str) -> Option<&str> {
        first(&self.query, name)
    }

    fn form(&self, name: &str) -> Option<&str> {
        first(&self.form, name)
    }

    fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    fn body(&self) -> &Bytes {
        &self.body
    }

    fn visit_query(&self, visitor: &mut dyn FnMut(&str, &str)) {
        for (key, value) in &self.query {
            visitor(key, value);
        }
    }

    fn visit_form(&self, visitor: &mut dyn FnMut(&str, &str)) {
        for (key, value) in &self.form {
            visitor(key, value);
        }
    }
}

/// Builder for constructing a [`TestContext`].
///
/// Invalid input (a bad header, an unserializable body) is remembered and
/// reported by [`TestRequestBuilder::build`].
#[must_use]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Option<Bytes>,
    form_fields: Vec<(String, String)>,
    path_params: HashMap<String, String>,
    values: HashMap<String, SharedValue>,
    scope: Option<RequestScope>,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a new request builder.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: HeaderMap::new(),
            body: None,
            form_fields: Vec::new(),
            path_params: HashMap::new(),
            values: HashMap::new(),
            scope: None,
            error: None,
        }
    }

    fn fail(mut self, error: TestError) -> Self {
        self.error.get_or_insert(error);
        self
    }

    /// Sets a header on the request.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let ctx = TestRequest::get("/users")
    ///     .header("Authorization", "Bearer token")
    ///     .header("X-Request-ID", "12345")
    ///     .build()?;
    /// ```
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = match HeaderName::try_from(name.as_ref()) {
            Ok(name) => name,
            Err(e) => return self.fail(TestError::InvalidHeader(e.to_string())),
        };
        let value = match HeaderValue::try_from(value.as_ref()) {
            Ok(value) => value,
            Err(e) => return self.fail(TestError::InvalidHeader(e.to_string())),
        };
        self.headers.insert(name, value);
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the request body as JSON.
    ///
    /// This also sets the `Content-Type` header to `application/json`.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Some(Bytes::from(bytes));
                self.content_type("application/json")
            }
            Err(e) => self.fail(e.into()),
        }
    }

    /// Sets the request body as form-urlencoded.
    ///
    /// This also sets the `Content-Type` header to `application/x-www-form-urlencoded`.
    pub fn form<T: Serialize>(mut self, value: &T) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(encoded) => {
                self.body = Some(Bytes::from(encoded));
                self.content_type(FORM_URLENCODED)
            }
            Err(e) => self.fail(e.into()),
        }
    }

    /// Adds one form entry; entries are encoded into the body on build.
    pub fn form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_fields.push((name.into(), value.into()));
        self
    }

    /// Sets a router path parameter.
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    /// Stores a context value, visible to `Ctx` fields.
    pub fn context_value<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.values.insert(key.into(), Arc::new(value));
        self
    }

    /// Sets the request scope.
    pub fn scope(mut self, scope: RequestScope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Builds the test context.
    pub fn build(self) -> Result<TestContext, TestError> {
        let mut builder = self;
        if let Some(error) = builder.error.take() {
            return Err(error);
        }
        if !builder.form_fields.is_empty() {
            let fields = std::mem::take(&mut builder.form_fields);
            builder = builder.form(&fields);
            if let Some(error) = builder.error.take() {
                return Err(error);
            }
        }

        let uri: Uri = builder
            .uri
            .parse()
            .map_err(|e| TestError::RequestBuild(format!("Invalid URI: {e}")))?;
        let query = match uri.query() {
            Some(query) => serde_urlencoded::from_str(query)?,
            None => Vec::new(),
        };

        let body = builder.body.unwrap_or_default();
        let is_form = builder
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with(FORM_URLENCODED));
        let form = if is_form {
            serde_urlencoded::from_bytes(&body)?
        } else {
            Vec::new()
        };

        let request = TestRequest {
            method: builder.method,
            uri,
            headers: builder.headers,
            body,
            query,
            form,
            path_params: builder.path_params,
        };
        TestContext::new(request, builder.values, builder.scope.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_request() {
        let ctx = TestRequest::get("/users").build().unwrap();
        assert_eq!(ctx.request.method, Method::GET);
        assert_eq!(ctx.request.uri.path(), "/users");
    }

    #[test]
    fn test_delete_request() {
        let ctx = TestRequest::delete("/users/123").build().unwrap();
        assert_eq!(ctx.request.method, Method::DELETE);
    }

    #[test]
    fn test_query_parsed_from_uri() {
        let ctx = TestRequest::get("/list?page=2&tag=a&tag=b&empty=").build().unwrap();
        let request = &ctx.request;

        assert_eq!(request.query("page"), Some("2"));
        assert_eq!(request.query("tag"), Some("a"));
        assert_eq!(request.query("empty"), Some(""));
        assert_eq!(request.query("missing"), None);
    }

    #[test]
    fn test_empty_header_is_absent() {
        let ctx = TestRequest::get("/")
            .header("X-Token", "")
            .header("X-Other", "v")
            .build()
            .unwrap();

        assert_eq!(ctx.request.header("X-Token"), None);
        assert_eq!(ctx.request.header("x-other"), Some("v"));
    }

    #[test]
    fn test_invalid_header_reported_on_build() {
        let result = TestRequest::get("/").header("bad header", "v").build();
        assert!(matches!(result, Err(TestError::InvalidHeader(_))));
    }

    #[test]
    fn test_json_body() {
        let ctx = TestRequest::post("/users")
            .json(&json!({"name": "Alice"}))
            .build()
            .unwrap();

        assert_eq!(ctx.request.content_type(), Some("application/json"));
        assert_eq!(ctx.request.body.as_ref(), b"{\"name\":\"Alice\"}");
        assert!(ctx.request.form.is_empty());
    }

    #[test]
    fn test_form_fields_encoded_and_decoded() {
        let ctx = TestRequest::post("/login")
            .form_field("user", "ann lee")
            .form_field("age", "30")
            .build()
            .unwrap();

        assert_eq!(ctx.request.form("user"), Some("ann lee"));
        assert_eq!(ctx.request.form("age"), Some("30"));
        assert_eq!(ctx.request.body.as_ref(), b"user=ann+lee&age=30");

        let mut seen = Vec::new();
        ctx.request.visit_form(&mut |key: &str, value: &str| seen.push(format!("{key}={value}")));
        assert_eq!(seen, ["user=ann lee", "age=30"]);
    }

    #[test]
    fn test_path_param_presence() {
        let ctx = TestRequest::get("/users/7")
            .path_param("id", "7")
            .path_param("blank", "")
            .build()
            .unwrap();

        assert_eq!(ctx.request.path_param("id"), Some("7"));
        assert_eq!(ctx.request.path_param("blank"), None);
    }

    #[test]
    fn test_invalid_uri() {
        let result = TestRequest::get("http://[::1").build();
        assert!(matches!(result, Err(TestError::RequestBuild(_))));
    }
}
