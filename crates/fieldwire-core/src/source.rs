//! Parameter origins.
//!
//! A [`Src`] is a bitmask naming where a field's value may come from. Lookup
//! always walks [`Src::PRECEDENCE`] in order and stops at the first origin
//! that is both enabled in the mask and has a value.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bitmask of parameter origins.
///
/// # Example
///
/// ```
/// use fieldwire_core::Src;
///
/// let mask = Src::QUERY | Src::FORM;
/// assert!(mask.contains(Src::FORM));
/// assert!(!mask.contains(Src::BODY));
/// assert!(!Src::ANY.contains(Src::BODY));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Src(u8);

impl Src {
    /// No origin.
    pub const NONE: Self = Self(0);
    /// Request header.
    pub const HEADER: Self = Self(1 << 0);
    /// URL query string.
    pub const QUERY: Self = Self(1 << 1);
    /// Router path parameter.
    pub const PATH: Self = Self(1 << 2);
    /// Form body field.
    pub const FORM: Self = Self(1 << 3);
    /// Raw request body.
    pub const BODY: Self = Self(1 << 4);
    /// Per-request context key/value store.
    pub const CONTEXT: Self = Self(1 << 5);
    /// Synthetic origin for a declared default value.
    pub const DEFAULT: Self = Self(1 << 7);
    /// Every real origin except [`Src::BODY`].
    pub const ANY: Self = Self(
        Self::HEADER.0 | Self::QUERY.0 | Self::PATH.0 | Self::FORM.0 | Self::CONTEXT.0,
    );

    /// Lookup order used when drawing a raw value.
    pub const PRECEDENCE: [Self; 6] = [
        Self::HEADER,
        Self::QUERY,
        Self::PATH,
        Self::FORM,
        Self::BODY,
        Self::CONTEXT,
    ];

    /// Returns the raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if every bit of `other` is set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    /// Returns true if no origin is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Maps a `param` tag token to an origin.
    ///
    /// `Auto`, `Recursive` and free-form names are not origins and return `None`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "Header" => Some(Self::HEADER),
            "Query" => Some(Self::QUERY),
            "Path" => Some(Self::PATH),
            "Form" => Some(Self::FORM),
            "Body" => Some(Self::BODY),
            "Ctx" => Some(Self::CONTEXT),
            _ => None,
        }
    }

    /// Parses a configuration name (case-insensitive, `Ctx` or `Context`, `Any`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "header" => Some(Self::HEADER),
            "query" => Some(Self::QUERY),
            "path" => Some(Self::PATH),
            "form" => Some(Self::FORM),
            "body" => Some(Self::BODY),
            "ctx" | "context" => Some(Self::CONTEXT),
            "any" => Some(Self::ANY),
            _ => None,
        }
    }

    /// Name of a single origin flag.
    pub const fn name(self) -> &'static str {
        match self {
            Self::HEADER => "Header",
            Self::QUERY => "Query",
            Self::PATH => "Path",
            Self::FORM => "Form",
            Self::BODY => "Body",
            Self::CONTEXT => "Ctx",
            Self::DEFAULT => "Default",
            Self::NONE => "None",
            _ => "Mixed",
        }
    }
}

impl BitOr for Src {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Src {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Src {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Src({self})")
    }
}

impl fmt::Display for Src {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        let mut first = true;
        let flags = Self::PRECEDENCE.iter().chain(std::iter::once(&Self::DEFAULT));
        for flag in flags.filter(|flag| self.contains(**flag)) {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(flag.name())?;
            first = false;
        }
        Ok(())
    }
}
