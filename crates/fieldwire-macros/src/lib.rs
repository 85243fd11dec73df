//! Procedural macros for fieldwire.
//!
//! `#[derive(Bindable)]` publishes a struct's field table and typed
//! accessors so the binding engine can introspect and populate it without
//! runtime reflection.
//!
//! # Example
//!
//! ```rust,ignore
//! use fieldwire::prelude::*;
//!
//! #[derive(Default, Bindable)]
//! struct Login {
//!     #[bind(param = "Header,token", checker = "required")]
//!     token: String,
//!     #[bind(param = "Query,Form", default = "1")]
//!     page: u32,
//!     #[bind(autowire = "users")]
//!     users: Option<Arc<UserService>>,
//! }
//! ```
//!
//! # Macro Expansion
//!
//! The derive generates an `impl Bindable` with:
//!
//! 1. `descriptors()`: one `FieldDescriptor` per field, in declaration order,
//!    carrying the raw tag text
//! 2. a nested type table for fields whose `param` contains `Recursive`
//! 3. a JSON decoder for fields with `resolver = "Json"`
//! 4. `assign`/`field` accessors for every field
//! 5. `assign_shared` for autowired fields and fields whose `param` contains
//!    `Ctx` or `Auto`; these fields must be `Clone`
//! 6. `share_field` for autowired fields; an `Option` field holding `None`
//!    shares nothing
//!
//! Generated code refers to `::fieldwire`; `#[bind(crate = "...")]` on the
//! struct changes that path.

mod bindable;
mod parse;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives `Bindable` for a struct with named fields.
///
/// # Field Attributes
///
/// - `param`: comma-separated origins (`Header`, `Query`, `Path`, `Form`,
///   `Body`, `Ctx`), `Auto`, `Recursive`, and an optional lookup name
/// - `checker`: comma-separated validator names
/// - `default`: default value text
/// - `resolver`: resolver name
/// - `autowire`: singleton name; disables every other tag
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Default, Bindable)]
/// struct Search {
///     #[bind(param = "Query,q", checker = "required")]
///     query: String,
///     #[bind(param = "Body", resolver = "Json")]
///     filters: Filters,
/// }
/// ```
#[proc_macro_derive(Bindable, attributes(bind))]
pub fn derive_bindable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    bindable::expand_bindable(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
