//! Action timing middleware.
//!
//! Wraps the inner chain and emits one `info` event per request with the
//! action name, the elapsed time, and whether the outcome was an error.
//!
//! # Log Format
//!
//! - `action` - Type name of the action, or `unknown` outside a handler
//! - `elapsed_ms` - Wall time of the inner chain in milliseconds
//! - `ok` - `false` if the inner chain returned an error

use crate::middleware::{BoxFuture, Middleware, Next, Outcome};
use fieldwire_core::BindContext;
use std::time::Instant;
use tracing::info;

/// Logs how long each action took.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimingMiddleware;

impl TimingMiddleware {
    /// Creates the middleware.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Middleware for TimingMiddleware {
    fn name(&self) -> &'static str {
        "timing"
    }

    fn around<'a>(&'a self, ctx: &'a mut dyn BindContext, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            let action = ctx.action_meta().map_or("unknown", |meta| meta.name());
            let start = Instant::now();
            let outcome = next.run(ctx).await;
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
            info!(action, elapsed_ms, ok = outcome.is_ok(), "action completed");
            outcome
        })
    }
}
