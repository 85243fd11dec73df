//! Handler return values.
//!
//! An action (or middleware, or error handler) returns a [`Reply`]:
//!
//! | Variant | Rendered as |
//! |---|---|
//! | [`Reply::Empty`] | nothing; the handler already wrote the response |
//! | [`Reply::Payload`] | JSON, status 200 |
//! | [`Reply::Response`] | by its [`RenderKind`] |
//!
//! # Example
//!
//! ```
//! use fieldwire_core::{Reply, Response};
//! use http::StatusCode;
//!
//! let reply = Reply::json(vec![1, 2, 3]);
//! assert!(matches!(reply, Reply::Payload(_)));
//!
//! let reply: Reply = Response::text("created")
//!     .with_status(StatusCode::CREATED)
//!     .with_header("x-request", "42")
//!     .into();
//! assert!(matches!(reply, Reply::Response(_)));
//! ```

use http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// How a [`Response`] body is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderKind {
    /// JSON-encoded body, `application/json`.
    #[default]
    Json,
    /// Template rendering; the body names the template.
    Html,
    /// Text body, `text/plain; charset=utf-8`.
    Text,
}

/// A response body.
///
/// Implemented for every `Serialize` type.
pub trait Payload: Send + Sync {
    /// JSON encoding.
    fn to_json(&self) -> Result<Vec<u8>, serde_json::Error>;

    /// Text form. Strings render without quotes, anything else as JSON.
    fn to_text(&self) -> String;
}

impl<T> Payload for T
where
    T: Serialize + Send + Sync + 'static,
{
    fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    fn to_text(&self) -> String {
        match serde_json::to_value(self) {
            Ok(Value::String(text)) => text,
            Ok(value) => value.to_string(),
            Err(_) => String::new(),
        }
    }
}

/// Structured response.
#[derive(Default)]
pub struct Response {
    /// Status; `None` resolves to 200 with a body and 204 without.
    pub status: Option<StatusCode>,
    /// Body.
    pub body: Option<Box<dyn Payload>>,
    /// Render kind.
    pub render: RenderKind,
    /// Headers applied before the body is written.
    pub headers: BTreeMap<String, String>,
    /// Template model, used by [`RenderKind::Html`] only.
    pub model: Option<Map<String, Value>>,
}

impl Response {
    /// JSON response.
    #[must_use]
    pub fn json(body: impl Payload + 'static) -> Self {
        Self {
            body: Some(Box::new(body)),
            render: RenderKind::Json,
            ..Self::default()
        }
    }

    /// Text response.
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: Some(Box::new(body.into())),
            render: RenderKind::Text,
            ..Self::default()
        }
    }

    /// HTML response rendering `template`.
    #[must_use]
    pub fn html(template: impl Into<String>) -> Self {
        Self {
            body: Some(Box::new(template.into())),
            render: RenderKind::Html,
            ..Self::default()
        }
    }

    /// Response without a body.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the template model.
    #[must_use]
    pub fn with_model(mut self, model: Map<String, Value>) -> Self {
        self.model = Some(model);
        self
    }

    /// Status after defaulting.
    pub fn resolved_status(&self) -> StatusCode {
        match self.status {
            Some(status) => status,
            None if self.body.is_some() => StatusCode::OK,
            None => StatusCode::NO_CONTENT,
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("body", &self.body.as_ref().map(|body| body.to_text()))
            .field("render", &self.render)
            .field("headers", &self.headers)
            .field("model", &self.model)
            .finish()
    }
}

/// What a handler returns.
pub enum Reply {
    /// Nothing to render.
    Empty,
    /// Plain value, rendered as JSON with status 200.
    Payload(Box<dyn Payload>),
    /// Explicit response.
    Response(Response),
}

impl Reply {
    /// Wraps any serializable value.
    #[must_use]
    pub fn json(body: impl Payload + 'static) -> Self {
        Self::Payload(Box::new(body))
    }

    /// True for [`Reply::Empty`].
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Converts into a response; `None` for [`Reply::Empty`].
    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::Empty => None,
            Self::Payload(body) => Some(Response {
                status: Some(StatusCode::OK),
                body: Some(body),
                render: RenderKind::Json,
                ..Response::default()
            }),
            Self::Response(response) => Some(response),
        }
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Payload(body) => f.debug_tuple("Payload").field(&body.to_text()).finish(),
            Self::Response(response) => f.debug_tuple("Response").field(response).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_status() {
        assert_eq!(Response::json(1).resolved_status(), StatusCode::OK);
        assert_eq!(Response::empty().resolved_status(), StatusCode::NO_CONTENT);
        assert_eq!(
            Response::empty()
                .with_status(StatusCode::ACCEPTED)
                .resolved_status(),
            StatusCode::ACCEPTED
        );
    }

    #[test]
    fn test_payload_text() {
        assert_eq!("hello".to_string().to_text(), "hello");
        assert_eq!(42_i32.to_text(), "42");
        assert_eq!(vec!["a"].to_text(), "[\"a\"]");
    }

    #[test]
    fn test_payload_json() {
        assert_eq!("hi".to_json().unwrap(), b"\"hi\"".to_vec());
    }

    #[test]
    fn test_payload_reply_becomes_json_ok() {
        let response = Reply::json("done").into_response().unwrap();
        assert_eq!(response.status, Some(StatusCode::OK));
        assert_eq!(response.render, RenderKind::Json);
        assert!(Reply::Empty.into_response().is_none());
    }

    #[test]
    fn test_html_response_carries_model() {
        let mut model = Map::new();
        model.insert("title".into(), Value::from("Home"));
        let response = Response::html("index.html").with_model(model);

        assert_eq!(response.render, RenderKind::Html);
        assert_eq!(response.body.as_ref().map(|b| b.to_text()).as_deref(), Some("index.html"));
        assert_eq!(response.model.as_ref().map(Map::len), Some(1));
    }

    #[test]
    fn test_debug_output() {
        let reply = Reply::json("x");
        assert_eq!(format!("{reply:?}"), "Payload(\"x\")");
    }
}
