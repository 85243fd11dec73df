//! Singleton registry.
//!
//! Singletons are named, shared instances injected into autowired fields.
//! Each entry is indexed by name and by concrete type; the stored value's
//! concrete type must equal the autowired field's declared type (typically an
//! `Arc<Service>`), since injection clones the stored value into the field.
//!
//! # Example
//!
//! ```rust
//! use fieldwire_core::SingletonRegistry;
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! let mut registry = SingletonRegistry::new();
//! registry
//!     .register("db", Arc::new(Database { url: "postgres://localhost".into() }))
//!     .unwrap();
//!
//! let db: Arc<Database> = registry.resolve::<Arc<Database>>("db").unwrap();
//! assert_eq!(db.url, "postgres://localhost");
//! ```

use crate::context::SharedValue;
use crate::error::RegistryError;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A registered instance.
#[derive(Clone)]
pub struct Singleton {
    /// Registration name.
    pub name: String,
    /// Concrete type of the instance.
    pub type_id: TypeId,
    /// Concrete type name.
    pub type_name: &'static str,
    /// The instance.
    pub instance: SharedValue,
}

impl Singleton {
    /// Borrows the instance as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.instance.downcast_ref::<T>()
    }
}

impl fmt::Debug for Singleton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Singleton")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Named instances, indexed by name and by type.
///
/// # Thread Safety
///
/// The registry is `Send + Sync`. It is filled at wiring time and only read
/// while serving requests.
#[derive(Default, Clone)]
pub struct SingletonRegistry {
    by_name: HashMap<String, Singleton>,
    by_type: HashMap<TypeId, Singleton>,
}

impl SingletonRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `instance` under `name`.
    ///
    /// An empty name falls back to the type name.
    pub fn register<T>(&mut self, name: &str, instance: T) -> Result<(), RegistryError>
    where
        T: Any + Send + Sync,
    {
        self.register_shared(
            name,
            TypeId::of::<T>(),
            std::any::type_name::<T>(),
            Arc::new(instance),
            false,
        )
        .map(|_| ())
    }

    /// Registers an already shared instance.
    ///
    /// With `ignore_duplicate`, an existing entry of the same name is kept and
    /// `Ok(false)` is returned; without it a duplicate is an error. Returns
    /// `Ok(true)` when the entry was inserted.
    pub fn register_shared(
        &mut self,
        name: &str,
        type_id: TypeId,
        type_name: &'static str,
        instance: SharedValue,
        ignore_duplicate: bool,
    ) -> Result<bool, RegistryError> {
        let name = if name.is_empty() { type_name } else { name };
        if self.by_name.contains_key(name) {
            if ignore_duplicate {
                return Ok(false);
            }
            return Err(RegistryError::DuplicateSingleton {
                name: name.to_owned(),
            });
        }

        let singleton = Singleton {
            name: name.to_owned(),
            type_id,
            type_name,
            instance,
        };
        self.by_type.insert(type_id, singleton.clone());
        self.by_name.insert(singleton.name.clone(), singleton);
        Ok(true)
    }

    /// Looks an entry up by name.
    pub fn by_name(&self, name: &str) -> Option<&Singleton> {
        self.by_name.get(name)
    }

    /// Looks the most recent entry of a type up.
    pub fn by_type(&self, type_id: TypeId) -> Option<&Singleton> {
        self.by_type.get(&type_id)
    }

    /// Clones the instance named `name` out as `T`.
    pub fn resolve<T: Any + Clone>(&self, name: &str) -> Option<T> {
        self.by_name(name)?.downcast_ref::<T>().cloned()
    }

    /// True if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl fmt::Debug for SingletonRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("SingletonRegistry")
            .field("names", &names)
            .finish()
    }
}
