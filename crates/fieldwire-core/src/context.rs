//! Capabilities a server adapter supplies to the engine.
//!
//! The engine never talks to a concrete HTTP server. An adapter wraps its
//! native request/response pair in a [`BindContext`], and the binding engine,
//! middleware, and responsors only ever see these traits.
//!
//! Lookups return `Option<&str>`: `None` means "absent". Whether a present but
//! empty value counts as present is the adapter's call.

use crate::meta::ActionMeta;
use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST};
use http::{HeaderMap, Method, StatusCode, Uri};
use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A value stored in the context or the singleton registry.
pub type SharedValue = Arc<dyn Any + Send + Sync>;

/// Read access to the incoming request.
pub trait HttpRequest: Send + Sync {
    /// Request method.
    fn method(&self) -> &Method;

    /// Full request URI.
    fn uri(&self) -> &Uri;

    /// All request headers.
    fn headers(&self) -> &HeaderMap;

    /// Single header value. Non-UTF-8 values are treated as absent.
    fn header(&self, name: &str) -> Option<&str> {
        self.headers().get(name).and_then(|value| value.to_str().ok())
    }

    /// Host from the `Host` header, else from the URI authority.
    fn host(&self) -> Option<&str> {
        self.header(HOST.as_str()).or_else(|| self.uri().host())
    }

    /// `Content-Type` header.
    fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    /// `Content-Length` header, parsed.
    fn content_length(&self) -> Option<u64> {
        self.header(CONTENT_LENGTH.as_str())
            .and_then(|value| value.trim().parse().ok())
    }

    /// First query string value for `name`.
    fn query(&self, name: &str) -> Option<&str>;

    /// First form value for `name`.
    fn form(&self, name: &str) -> Option<&str>;

    /// Router path parameter.
    fn path_param(&self, name: &str) -> Option<&str>;

    /// Raw request body.
    fn body(&self) -> &Bytes;

    /// Calls `visitor` with every query entry in order.
    fn visit_query(&self, visitor: &mut dyn FnMut(&str, &str));

    /// Calls `visitor` with every form entry in order.
    fn visit_form(&self, visitor: &mut dyn FnMut(&str, &str));
}

/// Write access to the outgoing response.
pub trait HttpResponse: Send + Sync {
    /// Sets the status code.
    fn set_status(&mut self, status: StatusCode);

    /// Sets (replaces) a header.
    fn set_header(&mut self, name: &str, value: &str);

    /// Writes the response body.
    fn write_body(&mut self, body: Bytes);

    /// Renders the named template with `model`.
    fn render_html(
        &mut self,
        status: StatusCode,
        template: &str,
        model: &serde_json::Map<String, serde_json::Value>,
    );
}

/// Per-request context handed through the middleware chain.
///
/// Besides request/response access it carries a key/value store (the
/// `Ctx` parameter source), the set of field names that were found in the
/// request, the action metadata, the bound action, and a [`RequestScope`].
pub trait BindContext: Send + Sync {
    /// The incoming request.
    fn request(&self) -> &dyn HttpRequest;

    /// The outgoing response.
    fn response(&mut self) -> &mut dyn HttpResponse;

    /// Reads a context value.
    fn get(&self, key: &str) -> Option<SharedValue>;

    /// Stores a context value.
    fn set(&mut self, key: &str, value: SharedValue);

    /// True if the binding engine found a value for `name` in this request.
    fn has_param(&self, name: &str) -> bool;

    /// Records that a value for `name` was found.
    fn report(&mut self, name: &str);

    /// Metadata of the action handling this request.
    fn action_meta(&self) -> Option<Arc<ActionMeta>>;

    /// Sets the action metadata.
    fn set_action_meta(&mut self, meta: Arc<ActionMeta>);

    /// The action instance bound for this request.
    ///
    /// Set once the action has run, so `around` tails, `after` hooks, and the
    /// error handler can inspect it. Downcast to the action type.
    fn action(&self) -> Option<SharedValue>;

    /// Records the bound action instance.
    fn set_action(&mut self, action: SharedValue);

    /// Type of the adapter's native request entity, if it exposes one.
    ///
    /// A field declared with this type is injected with [`BindContext::entity`].
    fn entity_type(&self) -> Option<TypeId> {
        None
    }

    /// A fresh handle to the adapter's native request entity.
    fn entity(&self) -> Option<Box<dyn Any + Send>> {
        None
    }

    /// Cancellation and deadline for this request.
    fn scope(&self) -> RequestScope;
}

/// Deadline and cancellation flag for a request.
///
/// Cloning shares the cancellation flag. A field of this type on an action is
/// injected from [`BindContext::scope`].
///
/// # Example
///
/// ```
/// use fieldwire_core::RequestScope;
/// use std::time::Duration;
///
/// let scope = RequestScope::with_timeout(Duration::from_secs(5));
/// let handle = scope.clone();
/// handle.cancel();
/// assert!(scope.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestScope {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl RequestScope {
    /// Scope without a deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope that expires at `deadline`.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: Arc::default(),
        }
    }

    /// Scope that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// The deadline, if any.
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline. `None` without a deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Marks the request cancelled.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// True once cancelled or past the deadline.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}
