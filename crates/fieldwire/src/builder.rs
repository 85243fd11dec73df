//! Handler builder.
//!
//! [`FieldwireBuilder`] owns everything an action handler consults at
//! request time:
//!
//! | Registry | Filled by | Consulted |
//! |---|---|---|
//! | validators | [`register_validator`](FieldwireBuilder::register_validator) | at introspection |
//! | named resolvers | [`register_resolver`](FieldwireBuilder::register_resolver) | at introspection |
//! | typed resolvers | [`register_typed_resolver`](FieldwireBuilder::register_typed_resolver) | per request |
//! | singletons | [`register_singleton`](FieldwireBuilder::register_singleton), autowired prototype fields | per request |
//! | responsors | [`register_responsor`](FieldwireBuilder::register_responsor) | per request |
//! | global middleware | [`add_middleware`](FieldwireBuilder::add_middleware) | per request |
//!
//! Names are resolved when an action is built, so validators and named
//! resolvers must be registered before [`FieldwireBuilder::build_action`].
//! Typed resolvers and singletons are shared with built handlers and must
//! be registered before serving begins.

use crate::config::FieldwireOptions;
use crate::handler::ActionHandler;
use fieldwire_core::{
    Action, ActionMeta, BindContext, BindError, BuildError, ParamMeta, RegistryError, RenderKind, Reply,
    SingletonRegistry, Src,
};
use fieldwire_extract::{FieldResolver, Introspector, Registries, Responders, Responsor};
use fieldwire_middleware::{BoxedMiddleware, Middleware, Outcome, Pipeline};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Turns an error into the reply that is rendered instead.
pub type ErrorHandler = Arc<dyn Fn(&mut dyn BindContext, BindError) -> Reply + Send + Sync>;

/// Turns a caught panic payload into an outcome.
pub type RecoverHook = Arc<dyn Fn(&mut dyn BindContext, Box<dyn Any + Send>) -> Outcome + Send + Sync>;

/// Registers everything handlers need, then builds them.
///
/// # Example
///
/// ```rust,ignore
/// let mut builder = FieldwireBuilder::new();
/// builder
///     .register_validator("positive", |_, meta, value| match value.and_then(|v| v.downcast_ref::<i64>()) {
///         Some(n) if *n <= 0 => Err(BindError::validation(meta.name(), "must be positive")),
///         _ => Ok(()),
///     })
///     .add_middleware(TimingMiddleware::new())
///     .set_error_handler(|_, err| Response::json(err.to_string()).with_status(err.status_code()).into());
/// builder.register_singleton("users", Arc::new(UserService::connect()?))?;
///
/// let handler = builder.build_action(CreateUser::default(), vec![])?;
/// ```
pub struct FieldwireBuilder {
    registries: Arc<RwLock<Registries>>,
    singletons: Arc<RwLock<SingletonRegistry>>,
    responders: Responders,
    middleware: Vec<BoxedMiddleware>,
    error_handler: ErrorHandler,
    recover: Option<RecoverHook>,
    options: FieldwireOptions,
}

impl FieldwireBuilder {
    /// A builder with the built-in validator, resolver, and responsors.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(FieldwireOptions::default())
    }

    /// A builder using `options`.
    #[must_use]
    pub fn with_options(options: FieldwireOptions) -> Self {
        Self {
            registries: Arc::new(RwLock::new(Registries::new())),
            singletons: Arc::new(RwLock::new(SingletonRegistry::new())),
            responders: Responders::new(),
            middleware: Vec::new(),
            error_handler: Arc::new(default_error_handler),
            recover: None,
            options,
        }
    }

    /// Current options.
    pub const fn options(&self) -> &FieldwireOptions {
        &self.options
    }

    /// Sets the origins the `Auto` keyword expands to for actions built
    /// from now on.
    pub fn define_auto(&mut self, sources: &[Src]) -> &mut Self {
        self.options.define_auto(sources);
        self
    }

    /// Registers (or replaces) a named validator.
    pub fn register_validator<F>(&mut self, name: &str, validator: F) -> &mut Self
    where
        F: Fn(&dyn BindContext, &ParamMeta, Option<&dyn Any>) -> Result<(), BindError>
            + Send
            + Sync
            + 'static,
    {
        self.registries
            .write()
            .register_validator(name, Arc::new(validator));
        self
    }

    /// Registers (or replaces) a named resolver.
    pub fn register_resolver<F>(&mut self, name: &str, resolver: F) -> &mut Self
    where
        F: Fn(&dyn BindContext, &ParamMeta, &str) -> Result<Option<Box<dyn Any + Send>>, BindError>
            + Send
            + Sync
            + 'static,
    {
        self.registries
            .write()
            .register_resolver(name, Arc::new(resolver));
        self
    }

    /// Registers a resolver for every field declared with one of `types`.
    ///
    /// A field's own `resolver` tag takes precedence.
    pub fn register_typed_resolver<F>(&mut self, types: &[TypeId], resolver: F) -> &mut Self
    where
        F: Fn(&dyn BindContext, &ParamMeta, &str) -> Result<Option<Box<dyn Any + Send>>, BindError>
            + Send
            + Sync
            + 'static,
    {
        self.registries
            .write()
            .register_typed_resolver(types, Arc::new(resolver));
        self
    }

    /// Registers a resolver for fields declared as `T`.
    pub fn register_typed_resolver_for<T, F>(&mut self, resolver: F) -> &mut Self
    where
        T: Any + Send,
        F: Fn(&dyn BindContext, &ParamMeta, &str) -> Result<Option<T>, BindError>
            + Send
            + Sync
            + 'static,
    {
        self.register_typed_resolver(&[TypeId::of::<T>()], move |ctx, meta, text| {
            resolver(ctx, meta, text)
                .map(|value| value.map(|value| Box::new(value) as Box<dyn Any + Send>))
        })
    }

    /// Registers a named singleton.
    ///
    /// `instance` must have the exact type of the fields it is injected
    /// into, typically `Arc<Service>`. An empty name falls back to the type
    /// name.
    pub fn register_singleton<T>(&mut self, name: &str, instance: T) -> Result<&mut Self, RegistryError>
    where
        T: Any + Send + Sync,
    {
        self.singletons.write().register(name, instance)?;
        Ok(self)
    }

    /// Clones the singleton named `name` out as `T`.
    pub fn singleton<T: Any + Clone>(&self, name: &str) -> Option<T> {
        self.singletons.read().resolve(name)
    }

    /// Registers (or replaces) the responsor for `kind`.
    pub fn register_responsor(&mut self, kind: RenderKind, responsor: impl Responsor + 'static) -> &mut Self {
        self.responders.register(kind, Arc::new(responsor));
        self
    }

    /// Appends a global middleware, inside the ones added so far.
    ///
    /// Global middleware wraps per-action middleware.
    pub fn add_middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Replaces the error handler.
    ///
    /// The default renders the error's message as a JSON payload with
    /// status 200.
    pub fn set_error_handler<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut dyn BindContext, BindError) -> Reply + Send + Sync + 'static,
    {
        self.error_handler = Arc::new(handler);
        self
    }

    /// Installs a hook turning caught panics into an outcome.
    pub fn register_recover<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut dyn BindContext, Box<dyn Any + Send>) -> Outcome + Send + Sync + 'static,
    {
        self.recover = Some(Arc::new(hook));
        self
    }

    /// Builds the handler for `A`.
    ///
    /// The prototype's autowired fields that hold a value are registered as
    /// singletons under their autowire name, unless that name is taken.
    /// `middleware` runs inside the global middleware, first one outermost.
    pub fn build_action<A: Action>(
        &mut self,
        prototype: A,
        middleware: Vec<BoxedMiddleware>,
    ) -> Result<ActionHandler<A>, BuildError> {
        let meta = Introspector::new(&self.registries.read(), self.options.auto())
            .introspect_prototype(&prototype)?;
        self.harvest_autowired(&meta, &prototype);

        let pipeline = Pipeline::builder()
            .extend(self.middleware.iter().cloned())
            .extend(middleware)
            .build();
        debug!(action = meta.name(), layers = ?pipeline.layer_names(), "action built");

        Ok(ActionHandler::new(
            Arc::new(meta),
            pipeline,
            FieldResolver::new(Arc::clone(&self.registries), Arc::clone(&self.singletons)),
            self.responders.clone(),
            Arc::clone(&self.error_handler),
            self.recover.clone(),
        ))
    }

    fn harvest_autowired<A: Action>(&self, meta: &ActionMeta, prototype: &A) {
        let mut singletons = self.singletons.write();
        for field in meta.fields() {
            let Some(name) = field.autowire() else {
                continue;
            };
            let Some(instance) = (meta.vtable().share_field)(prototype, field.index()) else {
                continue;
            };
            // Existing entries win; a taken name is not an error here.
            if let Ok(false) =
                singletons.register_shared(name, field.type_id(), field.type_name(), instance, true)
            {
                debug!(
                    action = meta.name(),
                    singleton = name,
                    "singleton already registered, prototype value ignored"
                );
            }
        }
    }
}

impl Default for FieldwireBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FieldwireBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldwireBuilder")
            .field("registries", &*self.registries.read())
            .field("singletons", &*self.singletons.read())
            .field("responders", &self.responders)
            .field(
                "middleware",
                &self.middleware.iter().map(|layer| layer.name()).collect::<Vec<_>>(),
            )
            .field("recover", &self.recover.is_some())
            .field("options", &self.options)
            .finish()
    }
}

/// Renders the message as a JSON payload, so the status stays 200; hosts wanting
/// error statuses install a handler using [`BindError::status_code`].
fn default_error_handler(_ctx: &mut dyn BindContext, error: BindError) -> Reply {
    Reply::json(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldwire_middleware::FnMiddleware;

    #[test]
    fn test_new_builder_has_defaults() {
        let builder = FieldwireBuilder::new();
        assert_eq!(builder.options().auto(), Src::ANY);
        assert!(builder.registries.read().validator("required").is_some());
        assert!(builder.registries.read().resolver("Json").is_some());
        assert!(builder.responders.get(RenderKind::Html).is_some());
    }

    #[test]
    fn test_define_auto() {
        let mut builder = FieldwireBuilder::new();
        builder.define_auto(&[Src::QUERY]);
        assert_eq!(builder.options().auto(), Src::QUERY);
    }

    #[test]
    fn test_register_singleton_duplicate() {
        let mut builder = FieldwireBuilder::new();
        builder.register_singleton("limit", 10_u32).unwrap();

        let err = builder.register_singleton("limit", 20_u32).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateSingleton { name: "limit".into() });
        assert_eq!(builder.singleton::<u32>("limit"), Some(10));
    }

    #[test]
    fn test_typed_resolver_for_boxes_value() {
        let mut builder = FieldwireBuilder::new();
        builder.register_typed_resolver_for::<u8, _>(|_, _, text| Ok(text.parse().ok()));
        assert!(builder
            .registries
            .read()
            .typed_resolver(TypeId::of::<u8>())
            .is_some());
    }

    #[test]
    fn test_debug_lists_middleware() {
        let mut builder = FieldwireBuilder::new();
        builder.add_middleware(FnMiddleware::new("auth"));
        let debug = format!("{builder:?}");
        assert!(debug.contains("auth"));
    }
}
