//! Error types for fieldwire.
//!
//! Errors fall into two groups:
//!
//! | Type | When | Effect |
//! |---|---|---|
//! | [`BuildError`], [`RegistryError`] | wiring time | handler is never built |
//! | [`BindError`] | per request | routed to the error handler |
//!
//! Conversion failures ([`ConvertError`](crate::ConvertError)) never surface
//! here; the field is simply left unset.

use http::StatusCode;
use thiserror::Error;

/// Per-request failure.
///
/// The display text is the bare message, which is what the default error
/// handler sends back to the client.
///
/// # Example
///
/// ```
/// use fieldwire_core::BindError;
///
/// let err = BindError::validation("name", "field name is required");
/// assert_eq!(err.to_string(), "field name is required");
/// assert_eq!(err.status_code().as_u16(), 400);
/// ```
#[derive(Error, Debug)]
pub enum BindError {
    /// A resolver rejected the raw value.
    #[error("{message}")]
    Resolver {
        /// Field lookup name.
        field: String,
        /// Human-readable error message.
        message: String,
    },

    /// A validator rejected the field.
    #[error("{message}")]
    Validation {
        /// Field lookup name.
        field: String,
        /// Human-readable error message.
        message: String,
    },

    /// The action's initializer hook failed.
    #[error("{message}")]
    Init {
        /// Human-readable error message.
        message: String,
    },

    /// The action's business method (or a middleware) failed.
    #[error("{message}")]
    Handler {
        /// Human-readable error message.
        message: String,
        /// Underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A panic was caught and turned into an error by a recovery hook.
    #[error("{message}")]
    Panic {
        /// Panic payload rendered as text.
        message: String,
    },
}

impl BindError {
    /// Creates a resolver error.
    pub fn resolver(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolver {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an initializer error.
    pub fn init(message: impl Into<String>) -> Self {
        Self::Init {
            message: message.into(),
        }
    }

    /// Creates a handler error.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a handler error wrapping `source`.
    pub fn handler_with_source(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Handler {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a panic error.
    pub fn panic(message: impl Into<String>) -> Self {
        Self::Panic {
            message: message.into(),
        }
    }

    /// The bare message.
    pub fn message(&self) -> &str {
        match self {
            Self::Resolver { message, .. }
            | Self::Validation { message, .. }
            | Self::Init { message }
            | Self::Handler { message, .. }
            | Self::Panic { message } => message,
        }
    }

    /// Field the error concerns, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Resolver { field, .. } | Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Suggested HTTP status for adapters that map errors to statuses.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Resolver { .. } | Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Init { .. } | Self::Handler { .. } | Self::Panic { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<anyhow::Error> for BindError {
    fn from(source: anyhow::Error) -> Self {
        Self::Handler {
            message: source.to_string(),
            source: Some(source),
        }
    }
}

/// The action type cannot be bound.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A `Recursive` field has no nested table.
    #[error("field `{field}` of `{action}` is recursive but its type is not bindable")]
    MissingNested {
        /// Action type name.
        action: &'static str,
        /// Field name.
        field: &'static str,
    },

    /// The descriptor table disagrees with the declared field count.
    #[error("`{action}` declares {declared} fields but describes {described}")]
    FieldCountMismatch {
        /// Action type name.
        action: &'static str,
        /// Declared field count.
        declared: usize,
        /// Number of descriptors.
        described: usize,
    },

    /// A recursive field refers back to a type already being introspected.
    #[error("`{action}` embeds itself through field `{field}`")]
    Cycle {
        /// Action type name.
        action: &'static str,
        /// Field name.
        field: &'static str,
    },
}

/// Singleton registration failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A singleton with this name already exists.
    #[error("singleton `{name}` is already registered")]
    DuplicateSingleton {
        /// Singleton name.
        name: String,
    },
}
