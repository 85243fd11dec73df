//! Responsors: rendering a [`Response`] into the adapter's response.
//!
//! | Render kind | Content-Type | Body |
//! |-------------|--------------|------|
//! | [`RenderKind::Json`] | `application/json` | `serde_json` encoding of the body |
//! | [`RenderKind::Text`] | `text/plain; charset=utf-8` | text form of the body |
//! | [`RenderKind::Html`] | set by the adapter | template named by the body, rendered with the model |
//!
//! Every responsor applies the response headers first, then its content type,
//! then status and body. The status defaults to 200 with a body and 204
//! without one.
//!
//! # Example
//!
//! ```rust,ignore
//! let responders = Responders::new();
//! responders.render(&mut ctx, Reply::json(vec![1, 2, 3]));
//! ```

use bytes::Bytes;
use fieldwire_core::{BindContext, HttpResponse, RenderKind, Reply, Response};
use http::header::CONTENT_TYPE;
use http::StatusCode;
use serde_json::Map;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// `Content-Type` written by [`JsonResponsor`].
pub const APPLICATION_JSON: &str = "application/json";

/// `Content-Type` written by [`TextResponsor`].
pub const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// Renders one kind of response.
pub trait Responsor: Send + Sync {
    /// Writes `response` to the context's response.
    fn respond(&self, ctx: &mut dyn BindContext, response: Response);
}

impl<F> Responsor for F
where
    F: Fn(&mut dyn BindContext, Response) + Send + Sync,
{
    fn respond(&self, ctx: &mut dyn BindContext, response: Response) {
        self(ctx, response);
    }
}

fn apply_headers(out: &mut dyn HttpResponse, response: &Response) {
    for (name, value) in &response.headers {
        out.set_header(name, value);
    }
}

/// JSON responsor.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResponsor;

impl Responsor for JsonResponsor {
    fn respond(&self, ctx: &mut dyn BindContext, response: Response) {
        let status = response.resolved_status();
        let out = ctx.response();
        apply_headers(out, &response);
        out.set_header(CONTENT_TYPE.as_str(), APPLICATION_JSON);

        let Some(body) = response.body.as_ref() else {
            out.set_status(status);
            return;
        };
        match body.to_json() {
            Ok(encoded) => {
                out.set_status(status);
                out.write_body(Bytes::from(encoded));
            }
            Err(error) => {
                warn!(%error, "JSON encoding failed");
                out.set_status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    }
}

/// Plain text responsor.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextResponsor;

impl Responsor for TextResponsor {
    fn respond(&self, ctx: &mut dyn BindContext, response: Response) {
        let status = response.resolved_status();
        let out = ctx.response();
        apply_headers(out, &response);
        out.set_header(CONTENT_TYPE.as_str(), TEXT_PLAIN_UTF8);
        out.set_status(status);
        if let Some(body) = response.body.as_ref() {
            out.write_body(Bytes::from(body.to_text()));
        }
    }
}

/// Template responsor; the body's text form names the template.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlResponsor;

impl Responsor for HtmlResponsor {
    fn respond(&self, ctx: &mut dyn BindContext, response: Response) {
        let status = response.resolved_status();
        let template = response.body.as_ref().map(|body| body.to_text()).unwrap_or_default();
        let model = response.model.clone().unwrap_or_else(Map::new);
        let out = ctx.response();
        apply_headers(out, &response);
        out.render_html(status, &template, &model);
    }
}

/// Responsors keyed by render kind.
#[derive(Clone)]
pub struct Responders {
    by_kind: HashMap<RenderKind, Arc<dyn Responsor>>,
}

impl Responders {
    /// Responders for all three render kinds.
    #[must_use]
    pub fn new() -> Self {
        let mut responders = Self::empty();
        responders.register(RenderKind::Json, Arc::new(JsonResponsor));
        responders.register(RenderKind::Text, Arc::new(TextResponsor));
        responders.register(RenderKind::Html, Arc::new(HtmlResponsor));
        responders
    }

    /// No responsors at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            by_kind: HashMap::new(),
        }
    }

    /// Registers (or replaces) the responsor for `kind`.
    pub fn register(&mut self, kind: RenderKind, responsor: Arc<dyn Responsor>) {
        self.by_kind.insert(kind, responsor);
    }

    /// The responsor for `kind`.
    pub fn get(&self, kind: RenderKind) -> Option<&Arc<dyn Responsor>> {
        self.by_kind.get(&kind)
    }

    /// Renders a handler's reply.
    ///
    /// [`Reply::Empty`] writes nothing. A render kind without a responsor
    /// sets status 500.
    pub fn render(&self, ctx: &mut dyn BindContext, reply: Reply) {
        let Some(response) = reply.into_response() else {
            return;
        };
        match self.get(response.render) {
            Some(responsor) => responsor.respond(ctx, response),
            None => {
                warn!(render = ?response.render, "no responsor registered");
                ctx.response().set_status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    }
}

impl Default for Responders {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Responders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<String> = self.by_kind.keys().map(|kind| format!("{kind:?}")).collect();
        kinds.sort_unstable();
        f.debug_struct("Responders").field("kinds", &kinds).finish()
    }
}
