//! Introspected action metadata.
//!
//! [`ActionMeta`] is computed once per action type when the handler is built
//! and is immutable afterwards. It is shared between requests behind an
//! `Arc`.

use crate::context::BindContext;
use crate::convert::TypeShape;
use crate::descriptor::{BindableVTable, FieldDescriptor, JsonDecodeFn};
use crate::error::BindError;
use crate::source::Src;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Checks a field after all fields were resolved.
///
/// Receives `None` when the field was never assigned.
pub type Validator =
    Arc<dyn Fn(&dyn BindContext, &ParamMeta, Option<&dyn Any>) -> Result<(), BindError> + Send + Sync>;

/// Produces a field value from raw request text.
///
/// Returning `Ok(None)` leaves the field unset; an error aborts the request.
pub type Resolver = Arc<
    dyn Fn(&dyn BindContext, &ParamMeta, &str) -> Result<Option<Box<dyn Any + Send>>, BindError>
        + Send
        + Sync,
>;

/// Metadata of one action (or nested) type.
#[derive(Debug)]
pub struct ActionMeta {
    name: &'static str,
    type_id: TypeId,
    field_count: usize,
    fields: Vec<ParamMeta>,
    vtable: BindableVTable,
}

impl ActionMeta {
    /// Assembles metadata from already introspected fields.
    #[must_use]
    pub fn new(vtable: BindableVTable, fields: Vec<ParamMeta>) -> Self {
        Self {
            name: vtable.type_name,
            type_id: vtable.type_id,
            field_count: vtable.field_count,
            fields,
            vtable,
        }
    }

    /// Type name of the action.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// `TypeId` of the action.
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Declared number of fields.
    pub const fn field_count(&self) -> usize {
        self.field_count
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[ParamMeta] {
        &self.fields
    }

    /// Looks a field up by its declared name.
    pub fn field(&self, name: &str) -> Option<&ParamMeta> {
        self.fields.iter().find(|field| field.field_name == name)
    }

    /// Type-erased entry points of the action type.
    pub const fn vtable(&self) -> &BindableVTable {
        &self.vtable
    }
}

/// Metadata of one field.
#[derive(Clone)]
pub struct ParamMeta {
    index: usize,
    field_name: &'static str,
    name: String,
    type_id: TypeId,
    type_name: &'static str,
    shape: TypeShape,
    source: Src,
    default: Option<String>,
    validators: Vec<(String, Validator)>,
    resolver: Option<(String, Resolver)>,
    autowire: Option<String>,
    nested: Option<Arc<ActionMeta>>,
    decode_json: Option<JsonDecodeFn>,
}

impl ParamMeta {
    /// Starts from a descriptor: lookup name equals the field name, no source.
    #[must_use]
    pub fn from_descriptor(index: usize, descriptor: &FieldDescriptor) -> Self {
        Self {
            index,
            field_name: descriptor.name,
            name: descriptor.name.to_owned(),
            type_id: descriptor.type_id,
            type_name: descriptor.type_name,
            shape: descriptor.shape,
            source: Src::NONE,
            default: None,
            validators: Vec::new(),
            resolver: None,
            autowire: None,
            nested: None,
            decode_json: descriptor.decode_json,
        }
    }

    /// Position of the field in its struct.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Field name as declared.
    pub const fn field_name(&self) -> &'static str {
        self.field_name
    }

    /// Name used to look the value up in the request.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Declared type name.
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Conversion shape of the declared type.
    pub const fn shape(&self) -> TypeShape {
        self.shape
    }

    /// Enabled origins.
    pub const fn source(&self) -> Src {
        self.source
    }

    /// Default value text.
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// True if a default was declared.
    pub const fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Validators in declaration order, with their registered names.
    pub fn validators(&self) -> &[(String, Validator)] {
        &self.validators
    }

    /// Resolver and its registered name.
    pub fn resolver(&self) -> Option<&Resolver> {
        self.resolver.as_ref().map(|(_, resolver)| resolver)
    }

    /// Singleton name for autowired fields.
    pub fn autowire(&self) -> Option<&str> {
        self.autowire.as_deref()
    }

    /// True for autowired fields.
    pub const fn is_autowired(&self) -> bool {
        self.autowire.is_some()
    }

    /// Nested metadata for recursive fields.
    pub fn nested(&self) -> Option<&Arc<ActionMeta>> {
        self.nested.as_ref()
    }

    /// True for recursive fields.
    pub const fn is_recursive(&self) -> bool {
        self.nested.is_some()
    }

    /// JSON decoder for the declared type.
    pub const fn json_decoder(&self) -> Option<JsonDecodeFn> {
        self.decode_json
    }

    /// Replaces the lookup name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Adds origins to the source mask.
    pub fn add_source(&mut self, source: Src) {
        self.source |= source;
    }

    /// Declares a default value.
    pub fn set_default(&mut self, default: impl Into<String>) {
        self.default = Some(default.into());
    }

    /// Appends a validator.
    pub fn push_validator(&mut self, name: impl Into<String>, validator: Validator) {
        self.validators.push((name.into(), validator));
    }

    /// Sets the resolver.
    pub fn set_resolver(&mut self, name: impl Into<String>, resolver: Resolver) {
        self.resolver = Some((name.into(), resolver));
    }

    /// Marks the field autowired from singleton `name`.
    pub fn set_autowire(&mut self, name: impl Into<String>) {
        self.autowire = Some(name.into());
    }

    /// Marks the field recursive.
    pub fn set_nested(&mut self, nested: Arc<ActionMeta>) {
        self.nested = Some(nested);
    }
}

impl fmt::Debug for ParamMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let validators: Vec<&str> = self.validators.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("ParamMeta")
            .field("index", &self.index)
            .field("field_name", &self.field_name)
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("shape", &self.shape)
            .field("source", &self.source)
            .field("default", &self.default)
            .field("validators", &validators)
            .field("resolver", &self.resolver.as_ref().map(|(name, _)| name))
            .field("autowire", &self.autowire)
            .field("nested", &self.nested.as_ref().map(|nested| nested.name()))
            .finish()
    }
}
