//! # Fieldwire Core
//!
//! Core types and traits for the fieldwire binding engine.
//!
//! This crate provides the foundational types used throughout fieldwire:
//!
//! - [`Src`] - Parameter origin mask with a fixed lookup precedence
//! - [`convert`] - String to scalar / `Option` / `Vec` conversion engine
//! - [`BindContext`], [`HttpRequest`], [`HttpResponse`] - Capabilities an adapter supplies
//! - [`Bindable`] and [`FieldDescriptor`] - Per-type field tables (usually derived)
//! - [`ActionMeta`] and [`ParamMeta`] - Introspected, immutable field metadata
//! - [`Action`] - Business entry point of a bound handler
//! - [`Reply`] and [`Response`] - Handler return values
//! - [`SingletonRegistry`] - Named instances injected into autowired fields
//! - [`BindError`] - Per-request error type

#![doc(html_root_url = "https://docs.rs/fieldwire-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod context;
pub mod convert;
mod descriptor;
mod error;
mod meta;
mod response;
mod singleton;
mod source;

pub use action::Action;
pub use context::{BindContext, HttpRequest, HttpResponse, RequestScope, SharedValue};
pub use convert::{convert, ConvertError, FromParam, ScalarKind, TypeShape};
pub use descriptor::{json_decoder, Bindable, BindableVTable, FieldDescriptor, FieldTags, JsonDecodeFn};
pub use error::{BindError, BuildError, RegistryError};
pub use meta::{ActionMeta, ParamMeta, Resolver, Validator};
pub use response::{Payload, RenderKind, Reply, Response};
pub use singleton::{Singleton, SingletonRegistry};
pub use source::Src;
