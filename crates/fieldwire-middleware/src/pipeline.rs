//! Middleware chain composition.
//!
//! A [`Pipeline`] is an ordered list of layers, first registered outermost.
//! Each layer runs inside the continuation of the layer around it:
//!
//! ```text
//! is_apply(A) ─► before(A) ─► around(A, is_apply(B) ─► before(B) ─► around(B, endpoint) ─► after(B)) ─► after(A)
//! ```
//!
//! 1. A layer whose `is_apply` returns `false` is passed over; the chain
//!    continues with the next layer.
//! 2. `before` runs next. A reply or an error short-circuits: the layer's own
//!    `around`, every inner layer, and the endpoint are skipped.
//! 3. Otherwise `around` runs with the rest of the chain as `next`.
//! 4. `after` runs on whatever the layer produced, short-circuit included.
//!
//! With pass-through `around` hooks, two layers A and B observe
//! `before(A)`, `before(B)`, the endpoint, `after(B)`, `after(A)`.

use crate::middleware::{Endpoint, Middleware, Next, Outcome};
use fieldwire_core::BindContext;
use std::fmt;
use std::sync::Arc;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An immutable, ordered middleware chain.
///
/// # Example
///
/// ```ignore
/// use fieldwire_middleware::{Pipeline, TimingMiddleware};
///
/// let pipeline = Pipeline::builder()
///     .layer(TimingMiddleware::new())
///     .layer(auth)
///     .build();
///
/// let outcome = pipeline.run(&mut ctx, &endpoint).await;
/// ```
#[derive(Clone, Default)]
pub struct Pipeline {
    layers: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Creates a pipeline from layers, first one outermost.
    #[must_use]
    pub fn new(layers: Vec<BoxedMiddleware>) -> Self {
        Self { layers }
    }

    /// Runs the chain around `endpoint`.
    pub async fn run(&self, ctx: &mut dyn BindContext, endpoint: &dyn Endpoint) -> Outcome {
        Next::layers(&self.layers, endpoint).run(ctx).await
    }

    /// Returns the names of all layers in order.
    #[must_use]
    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|layer| layer.name()).collect()
    }

    /// Number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// True if the pipeline has no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("layers", &self.layer_names())
            .finish()
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
#[must_use]
pub struct PipelineBuilder {
    layers: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a layer inside the ones added so far.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        self.layers.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared layer.
    pub fn shared(mut self, middleware: BoxedMiddleware) -> Self {
        self.layers.push(middleware);
        self
    }

    /// Appends several shared layers, in order.
    pub fn extend(mut self, layers: impl IntoIterator<Item = BoxedMiddleware>) -> Self {
        self.layers.extend(layers);
        self
    }

    /// Builds the pipeline.
    pub fn build(self) -> Pipeline {
        Pipeline::new(self.layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{BoxFuture, FnMiddleware};
    use fieldwire_core::{BindError, Reply};
    use fieldwire_test::TestRequest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
    }

    impl Endpoint for Counting {
        fn call<'a>(&'a self, _ctx: &'a mut dyn BindContext) -> BoxFuture<'a, Outcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(Reply::json(1)) })
        }
    }

    #[tokio::test]
    async fn test_empty_pipeline_calls_endpoint() {
        let mut ctx = TestRequest::get("/").build().unwrap();
        let endpoint = Counting {
            calls: AtomicUsize::new(0),
        };

        let outcome = Pipeline::default().run(&mut ctx, &endpoint).await;
        assert!(outcome.is_ok());
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_in_before_skips_endpoint() {
        let mut ctx = TestRequest::get("/").build().unwrap();
        let endpoint = Counting {
            calls: AtomicUsize::new(0),
        };
        let pipeline = Pipeline::builder()
            .layer(FnMiddleware::new("deny").on_before(|_| Err(BindError::validation("token", "denied"))))
            .build();

        let outcome = pipeline.run(&mut ctx, &endpoint).await;
        assert_eq!(outcome.unwrap_err().message(), "denied");
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_layer_names_in_order() {
        let pipeline = Pipeline::builder()
            .layer(FnMiddleware::new("outer"))
            .shared(Arc::new(FnMiddleware::new("middle")))
            .extend([Arc::new(FnMiddleware::new("inner")) as BoxedMiddleware])
            .build();

        assert_eq!(pipeline.layer_names(), ["outer", "middle", "inner"]);
        assert_eq!(pipeline.len(), 3);
        assert!(!pipeline.is_empty());
    }
}
