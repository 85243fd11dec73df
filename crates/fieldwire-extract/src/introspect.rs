//! Metadata introspection.
//!
//! Turns a type's [`FieldDescriptor`] table into an [`ActionMeta`] by parsing
//! the raw tag text against the registries. This happens once per action
//! type, when its handler is built.
//!
//! Per field, in this order:
//!
//! 1. `autowire` present: the field is autowired and nothing else is parsed.
//! 2. `param` tokens (comma-separated, trimmed, empty ones skipped):
//!    `Query`, `Form`, `Body`, `Header`, `Path`, `Ctx` add an origin; `Auto`
//!    adds the configured auto mask; `Recursive` introspects the field's own
//!    type; anything else replaces the lookup name. `Header` upper-cases the
//!    first character of the lookup name as it stands when the token is seen.
//! 3. `checker` names; unknown names are dropped.
//! 4. `resolver` name; an unknown name means no resolver.
//! 5. `default` text.

use crate::registry::Registries;
use fieldwire_core::{ActionMeta, Bindable, BindableVTable, BuildError, FieldDescriptor, ParamMeta, Src};
use std::any::TypeId;
use std::sync::Arc;
use tracing::debug;

/// `param` keyword: add the configured auto mask.
pub const AUTO: &str = "Auto";

/// `param` keyword: bind the field's own type recursively.
pub const RECURSIVE: &str = "Recursive";

/// Builds [`ActionMeta`] from descriptor tables.
///
/// # Example
///
/// ```rust,ignore
/// let registries = Registries::new();
/// let meta = Introspector::new(&registries, Src::ANY).introspect::<Login>()?;
/// assert_eq!(meta.fields()[0].name(), "Token");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Introspector<'r> {
    registries: &'r Registries,
    auto: Src,
}

impl<'r> Introspector<'r> {
    /// Creates an introspector resolving names against `registries`, with
    /// `auto` as the mask for the `Auto` keyword.
    #[must_use]
    pub const fn new(registries: &'r Registries, auto: Src) -> Self {
        Self { registries, auto }
    }

    /// Introspects `A`.
    pub fn introspect<A: Bindable>(&self) -> Result<ActionMeta, BuildError> {
        self.introspect_vtable(&BindableVTable::of::<A>())
    }

    /// Introspects the type of `prototype`.
    ///
    /// The prototype's values play no part in the metadata; they are only
    /// used by the builder to harvest autowired instances.
    pub fn introspect_prototype<A: Bindable>(&self, _prototype: &A) -> Result<ActionMeta, BuildError> {
        self.introspect::<A>()
    }

    /// Introspects a type through its vtable.
    pub fn introspect_vtable(&self, vtable: &BindableVTable) -> Result<ActionMeta, BuildError> {
        let mut path = Vec::new();
        self.walk(vtable, &mut path)
    }

    fn walk(&self, vtable: &BindableVTable, path: &mut Vec<TypeId>) -> Result<ActionMeta, BuildError> {
        let descriptors = (vtable.descriptors)();
        if descriptors.len() != vtable.field_count {
            return Err(BuildError::FieldCountMismatch {
                action: vtable.type_name,
                declared: vtable.field_count,
                described: descriptors.len(),
            });
        }

        path.push(vtable.type_id);
        let fields = descriptors
            .iter()
            .enumerate()
            .map(|(index, descriptor)| self.field(vtable, index, descriptor, path))
            .collect::<Result<Vec<_>, _>>();
        path.pop();

        Ok(ActionMeta::new(*vtable, fields?))
    }

    fn field(
        &self,
        owner: &BindableVTable,
        index: usize,
        descriptor: &FieldDescriptor,
        path: &mut Vec<TypeId>,
    ) -> Result<ParamMeta, BuildError> {
        let mut meta = ParamMeta::from_descriptor(index, descriptor);
        let tags = &descriptor.tags;

        if let Some(key) = tags.autowire {
            let key = key.trim();
            if !key.is_empty() {
                meta.set_autowire(key);
            }
            return Ok(meta);
        }

        for token in split_tokens(tags.param) {
            match token {
                RECURSIVE => {
                    let nested = descriptor.nested.ok_or(BuildError::MissingNested {
                        action: owner.type_name,
                        field: descriptor.name,
                    })?;
                    if path.contains(&nested.type_id) {
                        return Err(BuildError::Cycle {
                            action: owner.type_name,
                            field: descriptor.name,
                        });
                    }
                    meta.set_nested(Arc::new(self.walk(&nested, path)?));
                }
                AUTO => meta.add_source(self.auto),
                _ => match Src::from_token(token) {
                    Some(Src::HEADER) => {
                        meta.add_source(Src::HEADER);
                        let capitalized = capitalize(meta.name());
                        meta.set_name(capitalized);
                    }
                    Some(source) => meta.add_source(source),
                    None => meta.set_name(token),
                },
            }
        }

        for name in split_tokens(tags.checker) {
            match self.registries.validator(name) {
                Some(validator) => meta.push_validator(name, Arc::clone(validator)),
                None => debug!(field = descriptor.name, validator = name, "unknown validator dropped"),
            }
        }

        if let Some(name) = tags.resolver.map(str::trim) {
            match self.registries.resolver(name) {
                Some(resolver) => meta.set_resolver(name, Arc::clone(resolver)),
                None => debug!(field = descriptor.name, resolver = name, "unknown resolver ignored"),
            }
        }

        if let Some(default) = tags.default {
            meta.set_default(default);
        }

        Ok(meta)
    }
}

fn split_tokens(tag: Option<&'static str>) -> impl Iterator<Item = &'static str> {
    tag.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
