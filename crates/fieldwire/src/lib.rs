//! # Fieldwire
//!
//! **Declarative request binding and middleware for HTTP handlers**
//!
//! Fieldwire turns a plain struct into a request handler. Each field says
//! where its value comes from (header, query, path, form, body, or the
//! per-request context), how it is checked, and what it defaults to. A
//! [`FieldwireBuilder`] turns such a struct into an [`ActionHandler`] that an
//! HTTP adapter calls once per request.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fieldwire::prelude::*;
//!
//! #[derive(Default, Bindable)]
//! struct Greet {
//!     #[bind(param = "Query,name", checker = "required")]
//!     name: String,
//!     #[bind(param = "Header,X-Times", default = "1")]
//!     times: u32,
//! }
//!
//! impl Action for Greet {
//!     async fn go(&mut self) -> Result<Reply, BindError> {
//!         Ok(Reply::json(vec![format!("hello {}", self.name); self.times as usize]))
//!     }
//! }
//!
//! let mut builder = FieldwireBuilder::new();
//! builder.add_middleware(TimingMiddleware::new());
//! let handler = builder.build_action(Greet::default(), Vec::new())?;
//!
//! // per request, from the adapter:
//! handler.call(&mut ctx).await;
//! ```
//!
//! ## Request Flow
//!
//! ```text
//! ActionHandler::call
//!   └─ recovery boundary
//!        └─ before(A) ─► around(A, before(B) ─► around(B, resolve ─► init ─► go) ─► after(B)) ─► after(A)
//!   └─ error handler (on Err) ─► responder
//! ```

#![doc(html_root_url = "https://docs.rs/fieldwire/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod builder;
pub mod config;
mod handler;

pub use builder::{ErrorHandler, FieldwireBuilder, RecoverHook};
pub use config::{ConfigError, FieldwireConfig, FieldwireOptions};
pub use handler::{panic_message, ActionHandler, Handle};

// Re-export core types at the root; derived impls refer to them here
pub use fieldwire_core::*;

// Re-export binding and rendering
pub use fieldwire_extract as extract;

// Re-export middleware types
pub use fieldwire_middleware as middleware;

// Re-export the derive macro
pub use fieldwire_macros::Bindable;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use fieldwire::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{ActionHandler, FieldwireBuilder, FieldwireConfig, FieldwireOptions, Handle};

    pub use fieldwire_core::{
        Action, BindContext, BindError, Bindable, BuildError, HttpRequest, HttpResponse, ParamMeta,
        RenderKind, Reply, RequestScope, Response, Src,
    };

    // Re-export the derive macro alongside its trait
    pub use fieldwire_macros::Bindable;

    pub use fieldwire_extract::Responsor;

    pub use fieldwire_middleware::{
        BoxFuture, FnMiddleware, Middleware, Next, Outcome, TimingMiddleware,
    };
}
