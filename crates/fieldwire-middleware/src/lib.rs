//! # Fieldwire Middleware
//!
//! Composable middleware for fieldwire actions.
//!
//! Every layer can gate itself, act before the action, wrap it, and
//! post-process its outcome:
//!
//! ```text
//! Request → before(A) → around(A) ┐
//!           ┌─────────────────────┘
//!           └→ before(B) → around(B) → Action
//!                                        ↓
//! Outcome ← after(A) ← after(B) ←────────┘
//! ```
//!
//! An inner layer is only reached through the outer layer's `around`, so
//! its gate and `before` see what the outer layer put on the context.
//!
//! | Hook | Purpose |
//! |------|---------|
//! | `is_apply` | Skip the layer for this request |
//! | `before` | Short-circuit with a reply or an error |
//! | `around` | Wrap the inner chain (timing, scoping) |
//! | `after` | Replace or adjust the outcome |
//!
//! ## Key Features
//!
//! - **Ordered**: Global layers first, then per-action, first registered outermost
//! - **Short-circuit safe**: `after` still runs when a `before` short-circuits
//! - **Async**: `around` returns a boxed future and runs the rest of the chain in place
//!
//! ## Example
//!
//! ```ignore
//! use fieldwire_middleware::{FnMiddleware, Pipeline, TimingMiddleware};
//!
//! let pipeline = Pipeline::builder()
//!     .layer(TimingMiddleware::new())
//!     .layer(FnMiddleware::new("audit").on_after(|_, outcome| outcome))
//!     .build();
//! assert_eq!(pipeline.layer_names(), ["timing", "audit"]);
//! ```

#![doc(html_root_url = "https://docs.rs/fieldwire-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod middleware;
pub mod pipeline;
pub mod stages;

// Re-export main types at crate root
pub use middleware::{BoxFuture, Endpoint, FnMiddleware, Middleware, Next, Outcome};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder};
pub use stages::TimingMiddleware;
