//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait that every layer implements.
//! A layer has four hooks, all with pass-through defaults:
//!
//! | Hook | Runs | Default |
//! |------|------|---------|
//! | `is_apply` | when the chain reaches the layer; `false` skips it entirely | `true` |
//! | `before` | after the gate passes | `Ok(None)` |
//! | `around` | wraps the rest of the chain | `next.run(ctx)` |
//! | `after` | on the layer's outcome, short-circuit included | identity |
//!
//! Inner layers are reached through `next`, so their gate and `before` see
//! whatever outer layers put on the context.
//!
//! # Example
//!
//! ```ignore
//! use fieldwire_middleware::{BoxFuture, Middleware, Next, Outcome};
//!
//! struct Logging;
//!
//! impl Middleware for Logging {
//!     fn name(&self) -> &'static str {
//!         "logging"
//!     }
//!
//!     fn around<'a>(
//!         &'a self,
//!         ctx: &'a mut dyn BindContext,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Outcome> {
//!         Box::pin(async move {
//!             println!("Request: {}", ctx.request().uri());
//!             let outcome = next.run(ctx).await;
//!             println!("Ok: {}", outcome.is_ok());
//!             outcome
//!         })
//!     }
//! }
//! ```

use crate::pipeline::BoxedMiddleware;
use fieldwire_core::{BindContext, BindError, Reply};
use std::fmt;
use std::future::{self, Future};
use std::pin::Pin;

/// A boxed future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of running an action or a layer.
pub type Outcome = Result<Reply, BindError>;

/// A middleware layer.
///
/// # Invariants
///
/// - `around` MUST call `next.run()` at most once
/// - a `before` that returns a reply or an error short-circuits the layer's
///   own `around`, every inner layer, and the action; `after` still runs on
///   that outcome
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this layer, used for logging and debugging.
    fn name(&self) -> &'static str;

    /// Whether the layer takes part in this request.
    fn is_apply(&self, ctx: &dyn BindContext) -> bool {
        let _ = ctx;
        true
    }

    /// Runs before the inner chain. `Some` or `Err` short-circuits it.
    fn before(&self, ctx: &mut dyn BindContext) -> Result<Option<Reply>, BindError> {
        let _ = ctx;
        Ok(None)
    }

    /// Wraps the inner chain.
    fn around<'a>(&'a self, ctx: &'a mut dyn BindContext, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        next.run(ctx)
    }

    /// Post-processes the outcome of the inner chain.
    fn after(&self, ctx: &mut dyn BindContext, outcome: Outcome) -> Outcome {
        let _ = ctx;
        outcome
    }
}

/// The innermost step of a chain: usually resolve, init, and run an action.
pub trait Endpoint: Send + Sync {
    /// Runs the endpoint.
    fn call<'a>(&'a self, ctx: &'a mut dyn BindContext) -> BoxFuture<'a, Outcome>;
}

/// Continuation handed to [`Middleware::around`].
///
/// Consumed by [`Next::run`], so it runs at most once. Dropping it without
/// running skips the inner chain.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

/// Internal representation of the rest of the chain.
enum NextInner<'a> {
    /// The remaining layers, innermost last, then the endpoint
    Layers {
        layers: &'a [BoxedMiddleware],
        endpoint: &'a dyn Endpoint,
    },
    /// The endpoint
    Endpoint(&'a dyn Endpoint),
    /// A short-circuit outcome standing in for the endpoint
    Ready(Outcome),
}

impl<'a> Next<'a> {
    /// Runs `layers`, first one outermost, around `endpoint`.
    pub(crate) fn layers(layers: &'a [BoxedMiddleware], endpoint: &'a dyn Endpoint) -> Self {
        Self {
            inner: NextInner::Layers { layers, endpoint },
        }
    }

    /// Terminal step invoking `endpoint`.
    pub fn endpoint(endpoint: &'a dyn Endpoint) -> Self {
        Self {
            inner: NextInner::Endpoint(endpoint),
        }
    }

    /// Terminal step yielding a ready outcome.
    pub fn ready(outcome: Outcome) -> Self {
        Self {
            inner: NextInner::Ready(outcome),
        }
    }

    /// Runs the rest of the chain.
    pub fn run(self, ctx: &'a mut dyn BindContext) -> BoxFuture<'a, Outcome> {
        match self.inner {
            NextInner::Layers { layers, endpoint } => run_layers(layers, endpoint, ctx),
            NextInner::Endpoint(endpoint) => endpoint.call(ctx),
            NextInner::Ready(outcome) => Box::pin(future::ready(outcome)),
        }
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            NextInner::Layers { layers, .. } => f
                .debug_tuple("Next::Layers")
                .field(&layers.iter().map(|layer| layer.name()).collect::<Vec<_>>())
                .finish(),
            NextInner::Endpoint(_) => f.write_str("Next::Endpoint"),
            NextInner::Ready(outcome) => f.debug_tuple("Next::Ready").field(&outcome.is_ok()).finish(),
        }
    }
}

/// One layer of the chain: gate, `before`, `around` over the rest, `after`.
fn run_layers<'a>(
    layers: &'a [BoxedMiddleware],
    endpoint: &'a dyn Endpoint,
    ctx: &'a mut dyn BindContext,
) -> BoxFuture<'a, Outcome> {
    let Some((layer, rest)) = layers.split_first() else {
        return endpoint.call(ctx);
    };
    Box::pin(async move {
        let next = Next::layers(rest, endpoint);
        if !layer.is_apply(&*ctx) {
            return next.run(ctx).await;
        }
        let outcome = match layer.before(&mut *ctx) {
            Ok(None) => layer.around(&mut *ctx, next).await,
            Ok(Some(reply)) => Ok(reply),
            Err(error) => Err(error),
        };
        layer.after(ctx, outcome)
    })
}

type ApplyFn = Box<dyn Fn(&dyn BindContext) -> bool + Send + Sync>;
type BeforeFn = Box<dyn Fn(&mut dyn BindContext) -> Result<Option<Reply>, BindError> + Send + Sync>;
type AfterFn = Box<dyn Fn(&mut dyn BindContext, Outcome) -> Outcome + Send + Sync>;

/// A middleware assembled from closures.
///
/// # Example
///
/// ```ignore
/// let deny = FnMiddleware::new("deny-anonymous")
///     .apply_when(|ctx| ctx.request().uri().path() != "/health")
///     .on_before(|ctx| match ctx.request().header("Authorization") {
///         Some(_) => Ok(None),
///         None => Err(BindError::validation("Authorization", "missing credentials")),
///     });
/// ```
pub struct FnMiddleware {
    name: &'static str,
    apply: Option<ApplyFn>,
    before: Option<BeforeFn>,
    after: Option<AfterFn>,
}

impl FnMiddleware {
    /// Creates a pass-through middleware.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            apply: None,
            before: None,
            after: None,
        }
    }

    /// Sets the `is_apply` gate.
    #[must_use]
    pub fn apply_when<F>(mut self, gate: F) -> Self
    where
        F: Fn(&dyn BindContext) -> bool + Send + Sync + 'static,
    {
        self.apply = Some(Box::new(gate));
        self
    }

    /// Sets the `before` hook.
    #[must_use]
    pub fn on_before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut dyn BindContext) -> Result<Option<Reply>, BindError> + Send + Sync + 'static,
    {
        self.before = Some(Box::new(hook));
        self
    }

    /// Sets the `after` hook.
    #[must_use]
    pub fn on_after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut dyn BindContext, Outcome) -> Outcome + Send + Sync + 'static,
    {
        self.after = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for FnMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .field("apply", &self.apply.is_some())
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

impl Middleware for FnMiddleware {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_apply(&self, ctx: &dyn BindContext) -> bool {
        self.apply.as_ref().map_or(true, |gate| gate(ctx))
    }

    fn before(&self, ctx: &mut dyn BindContext) -> Result<Option<Reply>, BindError> {
        match &self.before {
            Some(hook) => hook(ctx),
            None => Ok(None),
        }
    }

    fn after(&self, ctx: &mut dyn BindContext, outcome: Outcome) -> Outcome {
        match &self.after {
            Some(hook) => hook(ctx, outcome),
            None => outcome,
        }
    }
}
