//! Built action handlers.
//!
//! An [`ActionHandler`] is what the builder hands back for one action type.
//! Adapters call [`ActionHandler::call`] once per request; it never fails,
//! every error ends up rendered (or, for an unrecovered panic, as a bare
//! 500).

use crate::builder::{ErrorHandler, RecoverHook};
use fieldwire_core::{Action, ActionMeta, BindContext};
use fieldwire_extract::{FieldResolver, Responders};
use fieldwire_middleware::{BoxFuture, Endpoint, Outcome, Pipeline};
use futures_util::FutureExt;
use http::StatusCode;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::error;

/// Handler for requests bound to `A`.
///
/// Cheap to share behind an `Arc`; it holds no per-request state.
pub struct ActionHandler<A> {
    meta: Arc<ActionMeta>,
    pipeline: Pipeline,
    resolver: FieldResolver,
    responders: Responders,
    error_handler: ErrorHandler,
    recover: Option<RecoverHook>,
    _action: PhantomData<fn() -> A>,
}

impl<A: Action> ActionHandler<A> {
    pub(crate) fn new(
        meta: Arc<ActionMeta>,
        pipeline: Pipeline,
        resolver: FieldResolver,
        responders: Responders,
        error_handler: ErrorHandler,
        recover: Option<RecoverHook>,
    ) -> Self {
        Self {
            meta,
            pipeline,
            resolver,
            responders,
            error_handler,
            recover,
            _action: PhantomData,
        }
    }

    /// Introspected metadata of `A`.
    pub fn meta(&self) -> &Arc<ActionMeta> {
        &self.meta
    }

    /// The middleware chain, global layers first.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Handles one request.
    ///
    /// 1. publishes the action metadata on the context
    /// 2. runs the middleware chain around resolve, `init`, and `go`, then
    ///    records the bound action with [`BindContext::set_action`]
    /// 3. routes an error through the error handler
    /// 4. renders the reply
    ///
    /// A panic anywhere in step 2 is caught. With a recovery hook its
    /// outcome continues at step 3; without one the status is set to 500
    /// and nothing else is written.
    pub async fn call(&self, ctx: &mut dyn BindContext) {
        ctx.set_action_meta(Arc::clone(&self.meta));

        let endpoint = Invoke::<A> {
            resolver: &self.resolver,
            meta: &self.meta,
            _action: PhantomData,
        };
        let caught = AssertUnwindSafe(self.pipeline.run(&mut *ctx, &endpoint))
            .catch_unwind()
            .await;

        let outcome = match caught {
            Ok(outcome) => outcome,
            Err(payload) => {
                error!(
                    action = self.meta.name(),
                    panic = %panic_message(payload.as_ref()),
                    recovered = self.recover.is_some(),
                    "action panicked"
                );
                match &self.recover {
                    Some(recover) => recover(&mut *ctx, payload),
                    None => {
                        ctx.response().set_status(StatusCode::INTERNAL_SERVER_ERROR);
                        return;
                    }
                }
            }
        };

        let reply = match outcome {
            Ok(reply) => reply,
            Err(error) => (self.error_handler)(&mut *ctx, error),
        };
        self.responders.render(ctx, reply);
    }
}

impl<A> fmt::Debug for ActionHandler<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionHandler")
            .field("action", &self.meta.name())
            .field("pipeline", &self.pipeline)
            .field("recover", &self.recover.is_some())
            .finish_non_exhaustive()
    }
}

/// The innermost step: bind a fresh `A`, run it, then publish it on the
/// context.
struct Invoke<'h, A> {
    resolver: &'h FieldResolver,
    meta: &'h ActionMeta,
    _action: PhantomData<fn() -> A>,
}

impl<A: Action> Endpoint for Invoke<'_, A> {
    fn call<'a>(&'a self, ctx: &'a mut dyn BindContext) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            let mut action: A = self.resolver.resolve(ctx, self.meta)?;
            let outcome = match action.init() {
                Ok(()) => action.go().await,
                Err(error) => Err(error),
            };
            ctx.set_action(Arc::new(action));
            outcome
        })
    }
}

/// Type-erased handler, for routers storing handlers of different actions.
///
/// # Example
///
/// ```rust,ignore
/// let routes: HashMap<&str, Arc<dyn Handle>> = HashMap::from([
///     ("/login", Arc::new(builder.build_action(Login::default(), vec![])?) as Arc<dyn Handle>),
///     ("/search", Arc::new(builder.build_action(Search::default(), vec![])?) as Arc<dyn Handle>),
/// ]);
/// ```
pub trait Handle: Send + Sync {
    /// Metadata of the bound action.
    fn meta(&self) -> &Arc<ActionMeta>;

    /// Handles one request.
    fn handle<'a>(&'a self, ctx: &'a mut dyn BindContext) -> BoxFuture<'a, ()>;
}

impl<A: Action> Handle for ActionHandler<A> {
    fn meta(&self) -> &Arc<ActionMeta> {
        &self.meta
    }

    fn handle<'a>(&'a self, ctx: &'a mut dyn BindContext) -> BoxFuture<'a, ()> {
        Box::pin(self.call(ctx))
    }
}

/// Text of a panic payload, for `&str` and `String` payloads.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-text payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_text_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("kaboom"));
        assert_eq!(panic_message(payload.as_ref()), "kaboom");

        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "panic with a non-text payload");
    }
}
