//! In-memory [`BindContext`].

use crate::error::TestError;
use crate::request::TestRequest;
use crate::response::RecordedResponse;
use fieldwire_core::{ActionMeta, BindContext, HttpRequest, HttpResponse, RequestScope, SharedValue};
use http::request::Parts;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A binding context over a [`TestRequest`] that records the response.
///
/// The native entity is the request head as `Arc<http::request::Parts>`; an
/// action field of that type is injected with it.
pub struct TestContext {
    /// The request
    pub request: TestRequest,
    /// The recorded response
    pub response: RecordedResponse,
    parts: Arc<Parts>,
    values: HashMap<String, SharedValue>,
    reported: HashSet<String>,
    meta: Option<Arc<ActionMeta>>,
    action: Option<SharedValue>,
    scope: RequestScope,
}

impl TestContext {
    pub(crate) fn new(
        request: TestRequest,
        values: HashMap<String, SharedValue>,
        scope: RequestScope,
    ) -> Result<Self, TestError> {
        let (mut parts, ()) = http::Request::builder()
            .method(request.method.clone())
            .uri(request.uri.clone())
            .body(())
            .map_err(|e| TestError::RequestBuild(e.to_string()))?
            .into_parts();
        parts.headers = request.headers.clone();

        Ok(Self {
            request,
            response: RecordedResponse::default(),
            parts: Arc::new(parts),
            values,
            reported: HashSet::new(),
            meta: None,
            action: None,
            scope,
        })
    }

    /// Stores a context value.
    pub fn set_value<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Arc::new(value));
    }

    /// Reads a context value as a string.
    pub fn get_string(&self, key: &str) -> Option<String> {
        let value = self.values.get(key)?;
        value
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| value.downcast_ref::<&'static str>().map(|text| (*text).to_owned()))
    }

    /// Reads a context value as an integer.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        let value = self.values.get(key)?;
        value
            .downcast_ref::<i64>()
            .copied()
            .or_else(|| value.downcast_ref::<i32>().map(|n| i64::from(*n)))
            .or_else(|| value.downcast_ref::<u32>().map(|n| i64::from(*n)))
            .or_else(|| value.downcast_ref::<isize>().and_then(|n| i64::try_from(*n).ok()))
            .or_else(|| value.downcast_ref::<usize>().and_then(|n| i64::try_from(*n).ok()))
    }

    /// Names reported as present during binding, sorted.
    pub fn reported(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.reported.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The recorded response.
    pub fn recorded(&self) -> &RecordedResponse {
        &self.response
    }

    /// Consumes the context, returning the recorded response.
    pub fn into_response(self) -> RecordedResponse {
        self.response
    }
}

impl BindContext for TestContext {
    fn request(&self) -> &dyn HttpRequest {
        &self.request
    }

    fn response(&mut self) -> &mut dyn HttpResponse {
        &mut self.response
    }

    fn get(&self, key: &str) -> Option<SharedValue> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: SharedValue) {
        self.values.insert(key.to_owned(), value);
    }

    fn has_param(&self, name: &str) -> bool {
        self.reported.contains(name)
    }

    fn report(&mut self, name: &str) {
        self.reported.insert(name.to_owned());
    }

    fn action_meta(&self) -> Option<Arc<ActionMeta>> {
        self.meta.clone()
    }

    fn set_action_meta(&mut self, meta: Arc<ActionMeta>) {
        self.meta = Some(meta);
    }

    fn action(&self) -> Option<SharedValue> {
        self.action.clone()
    }

    fn set_action(&mut self, action: SharedValue) {
        self.action = Some(action);
    }

    fn entity_type(&self) -> Option<TypeId> {
        Some(TypeId::of::<Arc<Parts>>())
    }

    fn entity(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(Arc::clone(&self.parts)))
    }

    fn scope(&self) -> RequestScope {
        self.scope.clone()
    }
}
