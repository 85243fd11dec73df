//! Validator and resolver registries.
//!
//! Registries map the names used in `checker = "..."` and `resolver = "..."`
//! tags to functions, and declared field types to typed resolvers. They are
//! filled at wiring time; lookups during introspection copy the `Arc`ed
//! functions into each [`ParamMeta`].
//!
//! Two built-ins are always present:
//!
//! | Name | Kind | Behavior |
//! |---|---|---|
//! | `required` | validator | fails with `field <name> is required` when the field was not assigned |
//! | `Json` | resolver | decodes the raw text as JSON into the field's type |

use fieldwire_core::{BindContext, BindError, ParamMeta, Resolver, Validator};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Name of the built-in presence validator.
pub const REQUIRED: &str = "required";

/// Name of the built-in JSON resolver.
pub const JSON: &str = "Json";

/// Named validators, named resolvers, and resolvers keyed by field type.
#[derive(Clone)]
pub struct Registries {
    validators: HashMap<String, Validator>,
    resolvers: HashMap<String, Resolver>,
    typed_resolvers: HashMap<TypeId, Resolver>,
}

impl Registries {
    /// Registries holding only the built-ins.
    #[must_use]
    pub fn new() -> Self {
        let mut registries = Self::empty();
        registries.register_validator(REQUIRED, required_validator());
        registries.register_resolver(JSON, json_resolver());
        registries
    }

    /// Registries without any entry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            validators: HashMap::new(),
            resolvers: HashMap::new(),
            typed_resolvers: HashMap::new(),
        }
    }

    /// Registers (or replaces) a validator.
    pub fn register_validator(&mut self, name: impl Into<String>, validator: Validator) {
        self.validators.insert(name.into(), validator);
    }

    /// Registers (or replaces) a named resolver.
    pub fn register_resolver(&mut self, name: impl Into<String>, resolver: Resolver) {
        self.resolvers.insert(name.into(), resolver);
    }

    /// Registers `resolver` for every field declared with one of `types`.
    pub fn register_typed_resolver(&mut self, types: &[TypeId], resolver: Resolver) {
        for type_id in types {
            self.typed_resolvers.insert(*type_id, Arc::clone(&resolver));
        }
    }

    /// Looks a validator up.
    pub fn validator(&self, name: &str) -> Option<&Validator> {
        self.validators.get(name)
    }

    /// Looks a named resolver up.
    pub fn resolver(&self, name: &str) -> Option<&Resolver> {
        self.resolvers.get(name)
    }

    /// Looks a typed resolver up.
    pub fn typed_resolver(&self, type_id: TypeId) -> Option<&Resolver> {
        self.typed_resolvers.get(&type_id)
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut validators: Vec<&str> = self.validators.keys().map(String::as_str).collect();
        let mut resolvers: Vec<&str> = self.resolvers.keys().map(String::as_str).collect();
        validators.sort_unstable();
        resolvers.sort_unstable();
        f.debug_struct("Registries")
            .field("validators", &validators)
            .field("resolvers", &resolvers)
            .field("typed_resolvers", &self.typed_resolvers.len())
            .finish()
    }
}

/// Fails when the field was never assigned.
pub fn required_validator() -> Validator {
    Arc::new(
        |_: &dyn BindContext, meta: &ParamMeta, value: Option<&dyn Any>| match value {
            Some(_) => Ok(()),
            None => Err(BindError::validation(
                meta.name(),
                format!("field {} is required", meta.name()),
            )),
        },
    )
}

/// Decodes JSON text into the field's declared type.
///
/// Fields without a JSON decoder, and text that fails to decode, leave the
/// field unset.
pub fn json_resolver() -> Resolver {
    Arc::new(
        |_: &dyn BindContext,
         meta: &ParamMeta,
         text: &str|
         -> Result<Option<Box<dyn Any + Send>>, BindError> {
            let Some(decode) = meta.json_decoder() else {
                debug!(field = meta.name(), ty = meta.type_name(), "no JSON decoder for field");
                return Ok(None);
            };
            match decode(text) {
                Ok(value) => Ok(Some(value)),
                Err(error) => {
                    debug!(field = meta.name(), %error, "JSON decoding failed, field left unset");
                    Ok(None)
                }
            }
        },
    )
}
