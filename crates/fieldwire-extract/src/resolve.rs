//! Field resolution.
//!
//! [`FieldResolver`] creates a fresh action instance and fills it from the
//! request, field by field, following the action's [`ActionMeta`]:
//!
//! - autowired fields are cloned from the singleton registry;
//! - recursive fields are resolved into a nested instance and assigned whole;
//! - [`RequestScope`] fields and fields of the adapter's entity type are
//!   injected from the context;
//! - every other field draws a raw value from the first enabled origin that
//!   has one, in [`Src::PRECEDENCE`] order, falling back to its default.
//!
//! A raw value becomes a typed value through, in order of preference: the
//! field's resolver, a typed resolver for the declared type, the raw body for
//! `Body`, and the conversion engine. A value whose type differs from the
//! declared one is dropped and the field keeps its default.
//!
//! After all fields are set, validators run in field order; the first error
//! aborts the request.

use crate::registry::Registries;
use bytes::Bytes;
use fieldwire_core::{
    convert, ActionMeta, Bindable, BindContext, BindError, ParamMeta, RequestScope, SharedValue,
    SingletonRegistry, Src,
};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::debug;

/// A raw value drawn from the request.
#[derive(Debug, Clone)]
pub enum RawValue {
    /// Header, query, path, form, or default text.
    Text(String),
    /// Request body.
    Bytes(Bytes),
    /// Context value.
    Shared(SharedValue),
}

impl RawValue {
    /// Text form; body bytes are decoded lossily and shared values have none.
    pub fn text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Text(text) => Some(Cow::Borrowed(text)),
            Self::Bytes(bytes) => Some(String::from_utf8_lossy(bytes)),
            Self::Shared(_) => None,
        }
    }
}

/// Outcome of resolving one field, kept for the validation pass.
#[derive(Debug)]
enum FieldState {
    Unset,
    Set,
    Nested(Vec<FieldState>),
}

/// A typed value ready for assignment.
enum Bound {
    Owned(Box<dyn Any + Send>),
    Shared(SharedValue),
}

/// Fills action instances from requests.
///
/// Cheap to clone; registries and singletons are shared.
#[derive(Clone, Default)]
pub struct FieldResolver {
    registries: Arc<RwLock<Registries>>,
    singletons: Arc<RwLock<SingletonRegistry>>,
}

impl FieldResolver {
    /// Creates a resolver reading typed resolvers from `registries` and
    /// autowired instances from `singletons`.
    #[must_use]
    pub fn new(registries: Arc<RwLock<Registries>>, singletons: Arc<RwLock<SingletonRegistry>>) -> Self {
        Self {
            registries,
            singletons,
        }
    }

    /// Resolves and validates a new `A`.
    pub fn resolve<A: Bindable>(&self, ctx: &mut dyn BindContext, meta: &ActionMeta) -> Result<A, BindError> {
        let instance = self.resolve_erased(ctx, meta)?;
        instance.downcast::<A>().map(|action| *action).map_err(|_| {
            BindError::handler(format!(
                "metadata of `{}` used to resolve `{}`",
                meta.name(),
                A::type_name()
            ))
        })
    }

    /// Resolves and validates a new instance of the type `meta` describes.
    pub fn resolve_erased(
        &self,
        ctx: &mut dyn BindContext,
        meta: &ActionMeta,
    ) -> Result<Box<dyn Any + Send>, BindError> {
        let mut instance = (meta.vtable().create)();
        let states = self.populate(ctx, meta, instance.as_mut())?;
        validate(&*ctx, meta, instance.as_ref(), &states)?;
        Ok(instance)
    }

    fn populate(
        &self,
        ctx: &mut dyn BindContext,
        meta: &ActionMeta,
        target: &mut dyn Any,
    ) -> Result<Vec<FieldState>, BindError> {
        let vtable = meta.vtable();
        let mut states = Vec::with_capacity(meta.fields().len());

        for field in meta.fields() {
            if let Some(key) = field.autowire() {
                let singletons = self.singletons.read();
                let assigned = singletons.by_name(key).is_some_and(|singleton| {
                    (vtable.assign_shared)(target, field.index(), singleton.instance.as_ref())
                });
                if !assigned {
                    debug!(
                        action = meta.name(),
                        field = field.field_name(),
                        singleton = key,
                        "no compatible singleton, field left unset"
                    );
                }
                states.push(if assigned { FieldState::Set } else { FieldState::Unset });
                continue;
            }

            if let Some(nested) = field.nested() {
                let mut child = (nested.vtable().create)();
                let child_states = self.populate(ctx, nested, child.as_mut())?;
                let state = match (vtable.assign)(target, field.index(), child) {
                    Ok(()) => FieldState::Nested(child_states),
                    Err(_) => {
                        debug!(action = meta.name(), field = field.field_name(), "nested type mismatch");
                        FieldState::Unset
                    }
                };
                states.push(state);
                continue;
            }

            let assigned = match self.bind(ctx, field)? {
                None => false,
                Some(Bound::Owned(value)) => (vtable.assign)(target, field.index(), value).is_ok(),
                Some(Bound::Shared(value)) => (vtable.assign_shared)(target, field.index(), value.as_ref()),
            };
            if !assigned && ctx.has_param(field.name()) {
                debug!(
                    action = meta.name(),
                    field = field.field_name(),
                    ty = field.type_name(),
                    "value incompatible with declared type, field left unset"
                );
            }
            states.push(if assigned { FieldState::Set } else { FieldState::Unset });
        }

        Ok(states)
    }

    /// Produces the typed value for a plain field, if any.
    fn bind(&self, ctx: &mut dyn BindContext, field: &ParamMeta) -> Result<Option<Bound>, BindError> {
        if field.type_id() == TypeId::of::<RequestScope>() {
            return Ok(Some(Bound::Owned(Box::new(ctx.scope()))));
        }
        if ctx.entity_type() == Some(field.type_id()) {
            return Ok(ctx.entity().map(Bound::Owned));
        }

        let Some((raw, source)) = draw_out(&*ctx, field) else {
            return Ok(None);
        };
        ctx.report(field.name());

        if let RawValue::Shared(value) = raw {
            return Ok(Some(Bound::Shared(value)));
        }

        let resolver = field
            .resolver()
            .cloned()
            .or_else(|| self.registries.read().typed_resolver(field.type_id()).cloned());
        if let Some(resolver) = resolver {
            let text = raw.text().unwrap_or_default();
            return resolver(&*ctx, field, &*text).map(|value| value.map(Bound::Owned));
        }

        if let (Src::BODY, RawValue::Bytes(body)) = (source, &raw) {
            return Ok(Some(Bound::Owned(body_value(field, body))));
        }

        let text = raw.text().unwrap_or_default();
        match convert(&text, field.shape()) {
            Ok(value) => Ok(Some(Bound::Owned(value))),
            Err(error) => {
                debug!(
                    field = field.field_name(),
                    source = %source,
                    input = %error.input,
                    target = error.target,
                    "conversion failed, field left unset"
                );
                Ok(None)
            }
        }
    }
}

/// Draws the raw value for `field` from the first enabled origin that has one.
///
/// The body counts as present only when non-empty. Without any value the
/// declared default is returned with [`Src::DEFAULT`].
pub fn draw_out(ctx: &dyn BindContext, field: &ParamMeta) -> Option<(RawValue, Src)> {
    let name = field.name();
    let mask = field.source();
    let request = ctx.request();

    for source in Src::PRECEDENCE.into_iter().filter(|source| mask.contains(*source)) {
        let raw = match source {
            Src::HEADER => request.header(name).map(|value| RawValue::Text(value.to_owned())),
            Src::QUERY => request.query(name).map(|value| RawValue::Text(value.to_owned())),
            Src::PATH => request.path_param(name).map(|value| RawValue::Text(value.to_owned())),
            Src::FORM => request.form(name).map(|value| RawValue::Text(value.to_owned())),
            Src::BODY => Some(request.body())
                .filter(|body| !body.is_empty())
                .map(|body| RawValue::Bytes(body.clone())),
            Src::CONTEXT => ctx.get(name).map(RawValue::Shared),
            _ => None,
        };
        if let Some(raw) = raw {
            return Some((raw, source));
        }
    }

    field
        .default_value()
        .map(|default| (RawValue::Text(default.to_owned()), Src::DEFAULT))
}

/// Body as the field's type: text for `String`, bytes for `Vec<u8>`,
/// otherwise [`Bytes`].
fn body_value(field: &ParamMeta, body: &Bytes) -> Box<dyn Any + Send> {
    if field.shape().is_text() {
        Box::new(String::from_utf8_lossy(body).into_owned())
    } else if field.type_id() == TypeId::of::<Vec<u8>>() {
        Box::new(body.to_vec())
    } else {
        Box::new(body.clone())
    }
}

fn validate(
    ctx: &dyn BindContext,
    meta: &ActionMeta,
    target: &dyn Any,
    states: &[FieldState],
) -> Result<(), BindError> {
    for (field, state) in meta.fields().iter().zip(states) {
        let value = match state {
            FieldState::Unset => None,
            FieldState::Set | FieldState::Nested(_) => (meta.vtable().field)(target, field.index()),
        };
        for (_, validator) in field.validators() {
            validator(ctx, field, value)?;
        }
        if let (FieldState::Nested(children), Some(nested), Some(child)) = (state, field.nested(), value) {
            validate(ctx, nested, child, children)?;
        }
    }
    Ok(())
}
