//! # Fieldwire Extract
//!
//! Binding and rendering for fieldwire actions.
//!
//! | Stage | Type | When |
//! |-------|------|------|
//! | Registries | [`Registries`] | wiring time: named validators, named and typed resolvers |
//! | Introspection | [`Introspector`] | wiring time, once per action type |
//! | Resolution | [`FieldResolver`] | per request, fills a fresh action instance |
//! | Rendering | [`Responders`] | per request, writes the handler's [`Reply`](fieldwire_core::Reply) |
//!
//! ## Example
//!
//! ```rust,ignore
//! use fieldwire_extract::{FieldResolver, Introspector, Registries, Responders};
//!
//! let registries = Registries::new();
//! let meta = Introspector::new(&registries, Src::ANY).introspect::<Login>()?;
//!
//! let resolver = FieldResolver::default();
//! let login: Login = resolver.resolve(&mut ctx, &meta)?;
//! Responders::new().render(&mut ctx, login.go().await?);
//! ```

#![doc(html_root_url = "https://docs.rs/fieldwire-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod introspect;
pub mod registry;
pub mod resolve;
pub mod responder;

pub use introspect::{Introspector, AUTO, RECURSIVE};
pub use registry::{json_resolver, required_validator, Registries, JSON, REQUIRED};
pub use resolve::{draw_out, FieldResolver, RawValue};
pub use responder::{
    HtmlResponsor, JsonResponsor, Responders, Responsor, TextResponsor, APPLICATION_JSON,
    TEXT_PLAIN_UTF8,
};
