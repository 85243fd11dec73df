//! Binding options and their configuration source.
//!
//! [`FieldwireOptions`] is what the builder consumes. It can be set up in
//! code, or produced from a [`FieldwireConfig`] loaded from TOML and
//! overridden from the environment:
//!
//! ```toml
//! [binding]
//! auto = ["Query", "Form"]
//! ```
//!
//! | Variable | Overrides | Format |
//! |---|---|---|
//! | `FIELDWIRE_AUTO` | `binding.auto` | comma-separated origin names |
//!
//! Origin names are case-insensitive: `Header`, `Query`, `Path`, `Form`,
//! `Body`, `Ctx` (or `Context`), and `Any`.

use fieldwire_core::Src;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding `binding.auto`.
pub const AUTO_ENV: &str = "FIELDWIRE_AUTO";

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Failed to read configuration file.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Invalid configuration value.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// The field with the invalid value.
        field: String,
        /// Explanation of why the value is invalid.
        reason: String,
    },

    /// Environment variable parsing error.
    #[error("failed to parse environment variable {var}: {reason}")]
    EnvParseError {
        /// The environment variable name.
        var: String,
        /// Explanation of the parsing error.
        reason: String,
    },
}

impl ConfigError {
    /// Create a new invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new environment variable parse error.
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }
}

/// Options applied when actions are introspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldwireOptions {
    auto: Src,
}

impl FieldwireOptions {
    /// Default options: `Auto` expands to [`Src::ANY`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the origins the `Auto` keyword expands to.
    ///
    /// An empty list makes `Auto` contribute nothing.
    pub fn define_auto(&mut self, sources: &[Src]) -> &mut Self {
        self.auto = sources.iter().fold(Src::NONE, |mask, source| mask | *source);
        self
    }

    /// Origins the `Auto` keyword expands to.
    pub const fn auto(&self) -> Src {
        self.auto
    }
}

impl Default for FieldwireOptions {
    fn default() -> Self {
        Self { auto: Src::ANY }
    }
}

/// Serializable form of [`FieldwireOptions`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldwireConfig {
    /// Binding section.
    pub binding: BindingConfig,
}

/// `[binding]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindingConfig {
    /// Origin names for `Auto`; unset keeps the default.
    pub auto: Option<Vec<String>>,
}

impl FieldwireConfig {
    /// Parses TOML text.
    ///
    /// # Example
    ///
    /// ```
    /// use fieldwire::FieldwireConfig;
    /// use fieldwire::Src;
    ///
    /// let config = FieldwireConfig::from_toml("[binding]\nauto = [\"Query\", \"Form\"]").unwrap();
    /// let options = config.into_options().unwrap();
    /// assert_eq!(options.auto(), Src::QUERY | Src::FORM);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads and parses a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Applies `FIELDWIRE_AUTO` if it is set.
    pub fn with_env(mut self) -> Result<Self, ConfigError> {
        match env::var(AUTO_ENV) {
            Ok(value) => self.apply_env_var(AUTO_ENV, &value)?,
            Err(env::VarError::NotPresent) => {}
            Err(env::VarError::NotUnicode(_)) => {
                return Err(ConfigError::env_parse_error(AUTO_ENV, "not valid unicode"))
            }
        }
        Ok(self)
    }

    /// Converts into options, rejecting unknown origin names.
    pub fn into_options(&self) -> Result<FieldwireOptions, ConfigError> {
        let mut options = FieldwireOptions::default();
        if let Some(names) = &self.binding.auto {
            let sources = names
                .iter()
                .map(|name| {
                    Src::from_name(name).ok_or_else(|| {
                        ConfigError::invalid_value("binding.auto", format!("unknown origin `{name}`"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            options.define_auto(&sources);
        }
        Ok(options)
    }

    // Apply a single environment variable
    fn apply_env_var(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            AUTO_ENV => {
                let names: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_owned)
                    .collect();
                if let Some(unknown) = names.iter().find(|name| Src::from_name(name).is_none()) {
                    return Err(ConfigError::env_parse_error(
                        key,
                        format!("unknown origin `{unknown}`"),
                    ));
                }
                self.binding.auto = Some(names);
                Ok(())
            }
            _ => Err(ConfigError::env_parse_error(key, "unknown variable")),
        }
    }
}
