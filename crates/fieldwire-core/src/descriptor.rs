//! Static field tables for bindable types.
//!
//! Rust has no runtime reflection, so every bindable type publishes a table
//! of [`FieldDescriptor`]s plus typed accessors through the [`Bindable`]
//! trait. `#[derive(Bindable)]` generates both; the introspector turns the
//! table into an [`ActionMeta`](crate::ActionMeta).
//!
//! Field values cross the trait boundary as `Box<dyn Any + Send>`. An
//! assignment whose runtime type differs from the declared field type is
//! rejected and the value handed back.

use crate::context::SharedValue;
use crate::convert::TypeShape;
use serde::de::DeserializeOwned;
use std::any::{Any, TypeId};
use std::fmt;

/// Decodes JSON text into a boxed value of a field's declared type.
pub type JsonDecodeFn = fn(&str) -> Result<Box<dyn Any + Send>, serde_json::Error>;

/// Returns a [`JsonDecodeFn`] producing `T`.
pub fn json_decoder<T>() -> JsonDecodeFn
where
    T: DeserializeOwned + Send + 'static,
{
    |text| serde_json::from_str::<T>(text).map(|value| Box::new(value) as Box<dyn Any + Send>)
}

/// Raw tag text of one field, exactly as written in `#[bind(...)]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldTags {
    /// Comma-separated origins, keywords, and an optional lookup name.
    pub param: Option<&'static str>,
    /// Comma-separated validator names.
    pub checker: Option<&'static str>,
    /// Default value text.
    pub default: Option<&'static str>,
    /// Resolver name.
    pub resolver: Option<&'static str>,
    /// Singleton name.
    pub autowire: Option<&'static str>,
}

/// Description of one field of a bindable type.
///
/// # Example
///
/// ```
/// use fieldwire_core::{FieldDescriptor, TypeShape};
///
/// let field = FieldDescriptor::new::<Option<u32>>("page")
///     .param("Query,Form")
///     .default("1");
/// assert_eq!(field.shape, TypeShape::of::<Option<u32>>());
/// assert_eq!(field.tags.param, Some("Query,Form"));
/// ```
#[derive(Clone)]
pub struct FieldDescriptor {
    /// Field name as declared.
    pub name: &'static str,
    /// Declared type.
    pub type_id: TypeId,
    /// Declared type name, for diagnostics.
    pub type_name: &'static str,
    /// Conversion shape of the declared type.
    pub shape: TypeShape,
    /// Raw tag text.
    pub tags: FieldTags,
    /// Table of the field's own type, for recursive fields.
    pub nested: Option<BindableVTable>,
    /// JSON decoder for the declared type, when requested.
    pub decode_json: Option<JsonDecodeFn>,
}

impl FieldDescriptor {
    /// Describes a field of type `F`.
    #[must_use]
    pub fn new<F: 'static>(name: &'static str) -> Self {
        Self {
            name,
            type_id: TypeId::of::<F>(),
            type_name: std::any::type_name::<F>(),
            shape: TypeShape::of::<F>(),
            tags: FieldTags::default(),
            nested: None,
            decode_json: None,
        }
    }

    /// Sets the `param` tag.
    #[must_use]
    pub const fn param(mut self, param: &'static str) -> Self {
        self.tags.param = Some(param);
        self
    }

    /// Sets the `checker` tag.
    #[must_use]
    pub const fn checker(mut self, checker: &'static str) -> Self {
        self.tags.checker = Some(checker);
        self
    }

    /// Sets the `default` tag.
    #[must_use]
    pub const fn default(mut self, default: &'static str) -> Self {
        self.tags.default = Some(default);
        self
    }

    /// Sets the `resolver` tag.
    #[must_use]
    pub const fn resolver(mut self, resolver: &'static str) -> Self {
        self.tags.resolver = Some(resolver);
        self
    }

    /// Sets the `autowire` tag.
    #[must_use]
    pub const fn autowire(mut self, autowire: &'static str) -> Self {
        self.tags.autowire = Some(autowire);
        self
    }

    /// Attaches the nested type's table.
    #[must_use]
    pub const fn nested(mut self, vtable: BindableVTable) -> Self {
        self.nested = Some(vtable);
        self
    }

    /// Attaches a JSON decoder for the declared type.
    #[must_use]
    pub const fn json_decoder(mut self, decode: JsonDecodeFn) -> Self {
        self.decode_json = Some(decode);
        self
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("shape", &self.shape)
            .field("tags", &self.tags)
            .field("nested", &self.nested.map(|nested| nested.type_name))
            .field("decode_json", &self.decode_json.is_some())
            .finish()
    }
}

/// A struct whose fields can be populated from a request.
///
/// Field indices follow declaration order and match [`Bindable::descriptors`].
/// Usually derived with `#[derive(Bindable)]`.
pub trait Bindable: Default + Send + 'static {
    /// Field table in declaration order.
    fn descriptors() -> Vec<FieldDescriptor>;

    /// Number of declared fields.
    fn field_count() -> usize;

    /// Type name reported in metadata.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Moves `value` into field `index`.
    ///
    /// Returns the value back if the index is out of range or the runtime type
    /// differs from the declared one.
    fn assign(&mut self, index: usize, value: Box<dyn Any + Send>) -> Result<(), Box<dyn Any + Send>>;

    /// Clones a shared value into field `index`.
    ///
    /// Only fields that can be drawn from the context or a singleton support
    /// this; all others return `false`.
    fn assign_shared(&mut self, index: usize, value: &(dyn Any + Send + Sync)) -> bool;

    /// Borrows field `index`.
    fn field(&self, index: usize) -> Option<&dyn Any>;

    /// Shares the current value of an autowired field.
    ///
    /// `Option` fields holding `None` share nothing.
    fn share_field(&self, index: usize) -> Option<SharedValue>;
}

/// Type-erased entry points of a [`Bindable`] type.
#[derive(Clone, Copy)]
pub struct BindableVTable {
    /// Declared type.
    pub type_id: TypeId,
    /// Declared type name.
    pub type_name: &'static str,
    /// Declared field count.
    pub field_count: usize,
    /// Field table.
    pub descriptors: fn() -> Vec<FieldDescriptor>,
    /// Creates a default instance.
    pub create: fn() -> Box<dyn Any + Send>,
    /// Assigns into a field of an erased instance.
    pub assign: fn(&mut dyn Any, usize, Box<dyn Any + Send>) -> Result<(), Box<dyn Any + Send>>,
    /// Clones a shared value into a field of an erased instance.
    pub assign_shared: fn(&mut dyn Any, usize, &(dyn Any + Send + Sync)) -> bool,
    /// Borrows a field of an erased instance.
    pub field: for<'a> fn(&'a dyn Any, usize) -> Option<&'a dyn Any>,
    /// Shares an autowired field of an erased instance.
    pub share_field: fn(&dyn Any, usize) -> Option<SharedValue>,
}

impl BindableVTable {
    /// Builds the table for `T`.
    #[must_use]
    pub fn of<T: Bindable>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: T::type_name(),
            field_count: T::field_count(),
            descriptors: T::descriptors,
            create: create::<T>,
            assign: assign::<T>,
            assign_shared: assign_shared::<T>,
            field: field::<T>,
            share_field: share_field::<T>,
        }
    }
}

impl fmt::Debug for BindableVTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindableVTable")
            .field("type_name", &self.type_name)
            .field("field_count", &self.field_count)
            .finish_non_exhaustive()
    }
}

fn create<T: Bindable>() -> Box<dyn Any + Send> {
    Box::new(T::default())
}

fn assign<T: Bindable>(
    target: &mut dyn Any,
    index: usize,
    value: Box<dyn Any + Send>,
) -> Result<(), Box<dyn Any + Send>> {
    match target.downcast_mut::<T>() {
        Some(target) => target.assign(index, value),
        None => Err(value),
    }
}

fn assign_shared<T: Bindable>(
    target: &mut dyn Any,
    index: usize,
    value: &(dyn Any + Send + Sync),
) -> bool {
    target
        .downcast_mut::<T>()
        .is_some_and(|target| target.assign_shared(index, value))
}

fn field<T: Bindable>(target: &dyn Any, index: usize) -> Option<&dyn Any> {
    target.downcast_ref::<T>()?.field(index)
}

fn share_field<T: Bindable>(target: &dyn Any, index: usize) -> Option<SharedValue> {
    target.downcast_ref::<T>()?.share_field(index)
}
