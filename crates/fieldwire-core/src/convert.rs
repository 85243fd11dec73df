//! String to typed value conversion.
//!
//! Every raw request value arrives as text. This module turns that text into
//! one of four shapes over a fixed set of scalars:
//!
//! | Shape | Rust type |
//! |---|---|
//! | scalar | `T` |
//! | pointer | `Option<T>` |
//! | sequence | `Vec<T>` |
//! | sequence of pointers | `Vec<Option<T>>` |
//!
//! Sequences split on a literal `,` with no escaping, so an element can never
//! contain a comma.
//!
//! Integers accept the usual literal forms: an optional sign (signed targets
//! only), `0x` / `0o` / `0b` prefixes, a legacy leading `0` for octal, and `_`
//! between digits.
//!
//! # Example
//!
//! ```
//! use fieldwire_core::{convert, FromParam, ScalarKind, TypeShape};
//!
//! assert_eq!(i32::from_param("0x1F").unwrap(), 31);
//! assert_eq!(Vec::<u8>::from_param("1,2,3").unwrap(), vec![1, 2, 3]);
//!
//! let boxed = convert("-12", TypeShape::Pointer(ScalarKind::I64)).unwrap();
//! assert_eq!(boxed.downcast_ref::<Option<i64>>(), Some(&Some(-12)));
//! ```

use std::any::{Any, TypeId};
use thiserror::Error;

/// Element separator for sequence shapes.
pub const SEQUENCE_SEPARATOR: char = ',';

/// Conversion failure.
///
/// Every failure carries the same message; the offending input and target are
/// kept for logging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parameter parsing error")]
pub struct ConvertError {
    /// Text that failed to convert.
    pub input: String,
    /// Name of the requested target type.
    pub target: &'static str,
}

impl ConvertError {
    fn new<T>(input: &str) -> Self {
        Self {
            input: input.to_owned(),
            target: std::any::type_name::<T>(),
        }
    }
}

/// Scalar types the engine can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// `bool`
    Bool,
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `isize`
    Isize,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `usize`
    Usize,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// `String`
    String,
}

/// Expands `$body` once per scalar kind with `$alias` bound to the Rust type.
macro_rules! with_scalar {
    ($kind:expr, $alias:ident => $body:expr) => {
        match $kind {
            ScalarKind::Bool => {
                type $alias = bool;
                $body
            }
            ScalarKind::I8 => {
                type $alias = i8;
                $body
            }
            ScalarKind::I16 => {
                type $alias = i16;
                $body
            }
            ScalarKind::I32 => {
                type $alias = i32;
                $body
            }
            ScalarKind::I64 => {
                type $alias = i64;
                $body
            }
            ScalarKind::Isize => {
                type $alias = isize;
                $body
            }
            ScalarKind::U8 => {
                type $alias = u8;
                $body
            }
            ScalarKind::U16 => {
                type $alias = u16;
                $body
            }
            ScalarKind::U32 => {
                type $alias = u32;
                $body
            }
            ScalarKind::U64 => {
                type $alias = u64;
                $body
            }
            ScalarKind::Usize => {
                type $alias = usize;
                $body
            }
            ScalarKind::F32 => {
                type $alias = f32;
                $body
            }
            ScalarKind::F64 => {
                type $alias = f64;
                $body
            }
            ScalarKind::String => {
                type $alias = String;
                $body
            }
        }
    };
}

impl ScalarKind {
    /// Every supported scalar.
    pub const ALL: [Self; 14] = [
        Self::Bool,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::Isize,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::Usize,
        Self::F32,
        Self::F64,
        Self::String,
    ];

    /// `TypeId` of the bare scalar.
    pub fn rust_type_id(self) -> TypeId {
        with_scalar!(self, T => TypeId::of::<T>())
    }
}

/// Conversion shape of a field's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeShape {
    /// `T`
    Scalar(ScalarKind),
    /// `Option<T>`
    Pointer(ScalarKind),
    /// `Vec<T>`
    Sequence(ScalarKind),
    /// `Vec<Option<T>>`
    SequenceOfPointer(ScalarKind),
    /// Anything the engine cannot produce from text.
    Opaque,
}

impl TypeShape {
    /// Classifies `T` by comparing it against every supported shape.
    ///
    /// Type aliases resolve to their target, so `type Id = u64;` is a scalar.
    pub fn of<T: ?Sized + 'static>() -> Self {
        let id = TypeId::of::<T>();
        for kind in ScalarKind::ALL {
            let shape = with_scalar!(kind, S => {
                if id == TypeId::of::<S>() {
                    Some(Self::Scalar(kind))
                } else if id == TypeId::of::<Option<S>>() {
                    Some(Self::Pointer(kind))
                } else if id == TypeId::of::<Vec<S>>() {
                    Some(Self::Sequence(kind))
                } else if id == TypeId::of::<Vec<Option<S>>>() {
                    Some(Self::SequenceOfPointer(kind))
                } else {
                    None
                }
            });
            if let Some(shape) = shape {
                return shape;
            }
        }
        Self::Opaque
    }

    /// Returns the scalar kind, if the shape is convertible.
    pub const fn scalar(self) -> Option<ScalarKind> {
        match self {
            Self::Scalar(kind)
            | Self::Pointer(kind)
            | Self::Sequence(kind)
            | Self::SequenceOfPointer(kind) => Some(kind),
            Self::Opaque => None,
        }
    }

    /// True for a bare `String`.
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Scalar(ScalarKind::String))
    }
}

/// Parses a typed value from request text.
pub trait FromParam: Sized + Send + 'static {
    /// Converts `text` into `Self`.
    fn from_param(text: &str) -> Result<Self, ConvertError>;
}

impl FromParam for String {
    fn from_param(text: &str) -> Result<Self, ConvertError> {
        Ok(text.to_owned())
    }
}

impl FromParam for bool {
    /// Recognizes `true` / `false` in any letter case.
    ///
    /// Any other token yields `false` without an error. Callers relying on a
    /// strict boolean should validate the field.
    fn from_param(text: &str) -> Result<Self, ConvertError> {
        Ok(text.eq_ignore_ascii_case("true"))
    }
}

macro_rules! impl_from_param_float {
    ($($ty:ty),*) => {$(
        impl FromParam for $ty {
            fn from_param(text: &str) -> Result<Self, ConvertError> {
                text.parse::<$ty>().map_err(|_| ConvertError::new::<$ty>(text))
            }
        }
    )*};
}

impl_from_param_float!(f32, f64);

macro_rules! impl_from_param_signed {
    ($($ty:ty),*) => {$(
        impl FromParam for $ty {
            fn from_param(text: &str) -> Result<Self, ConvertError> {
                parse_signed(text)
                    .and_then(|value| <$ty>::try_from(value).ok())
                    .ok_or_else(|| ConvertError::new::<$ty>(text))
            }
        }
    )*};
}

macro_rules! impl_from_param_unsigned {
    ($($ty:ty),*) => {$(
        impl FromParam for $ty {
            fn from_param(text: &str) -> Result<Self, ConvertError> {
                parse_unsigned(text)
                    .and_then(|value| <$ty>::try_from(value).ok())
                    .ok_or_else(|| ConvertError::new::<$ty>(text))
            }
        }
    )*};
}

impl_from_param_signed!(i8, i16, i32, i64, isize);
impl_from_param_unsigned!(u8, u16, u32, u64, usize);

impl<T: FromParam> FromParam for Option<T> {
    fn from_param(text: &str) -> Result<Self, ConvertError> {
        T::from_param(text).map(Some)
    }
}

impl<T: FromParam> FromParam for Vec<T> {
    fn from_param(text: &str) -> Result<Self, ConvertError> {
        text.split(SEQUENCE_SEPARATOR).map(T::from_param).collect()
    }
}

/// Converts `text` into a boxed value of the given shape.
///
/// The box's concrete type is exactly the Rust type the shape names, so the
/// caller can downcast or assign it to a field of that type.
pub fn convert(text: &str, shape: TypeShape) -> Result<Box<dyn Any + Send>, ConvertError> {
    match shape {
        TypeShape::Scalar(kind) => with_scalar!(kind, T => boxed::<T>(text)),
        TypeShape::Pointer(kind) => with_scalar!(kind, T => boxed::<Option<T>>(text)),
        TypeShape::Sequence(kind) => with_scalar!(kind, T => boxed::<Vec<T>>(text)),
        TypeShape::SequenceOfPointer(kind) => {
            with_scalar!(kind, T => boxed::<Vec<Option<T>>>(text))
        }
        TypeShape::Opaque => Err(ConvertError {
            input: text.to_owned(),
            target: "opaque",
        }),
    }
}

fn boxed<T: FromParam>(text: &str) -> Result<Box<dyn Any + Send>, ConvertError> {
    T::from_param(text).map(|value| Box::new(value) as Box<dyn Any + Send>)
}

fn parse_signed(text: &str) -> Option<i128> {
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let magnitude = i128::try_from(parse_unsigned(digits)?).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Parses an unsigned integer literal, inferring the base from its prefix.
fn parse_unsigned(text: &str) -> Option<u128> {
    if text.is_empty() {
        return None;
    }
    if text.contains('_') && !underscores_ok(text) {
        return None;
    }

    let bytes = text.as_bytes();
    let (radix, digits) = if bytes[0] == b'0' {
        match bytes.get(1).map(u8::to_ascii_lowercase) {
            Some(b'x') if bytes.len() >= 3 => (16, &text[2..]),
            Some(b'o') if bytes.len() >= 3 => (8, &text[2..]),
            Some(b'b') if bytes.len() >= 3 => (2, &text[2..]),
            _ => (8, &text[1..]),
        }
    } else {
        (10, text)
    };

    let mut value: u128 = 0;
    for ch in digits.chars().filter(|ch| *ch != '_') {
        let digit = ch.to_digit(radix)?;
        value = value
            .checked_mul(u128::from(radix))?
            .checked_add(u128::from(digit))?;
    }
    Some(value)
}

/// An underscore must follow a digit or the base prefix and precede a digit.
fn underscores_ok(text: &str) -> bool {
    #[derive(PartialEq)]
    enum Seen {
        Start,
        Digit,
        Underscore,
        Other,
    }

    let bytes = text.as_bytes();
    let mut seen = Seen::Start;
    let mut index = 0;
    let mut hex = false;
    if bytes.len() >= 2 && bytes[0] == b'0' {
        let marker = bytes[1].to_ascii_lowercase();
        if matches!(marker, b'b' | b'o' | b'x') {
            index = 2;
            seen = Seen::Digit;
            hex = marker == b'x';
        }
    }

    for &byte in &bytes[index..] {
        if byte.is_ascii_digit() || (hex && byte.is_ascii_hexdigit()) {
            seen = Seen::Digit;
        } else if byte == b'_' {
            if seen != Seen::Digit {
                return false;
            }
            seen = Seen::Underscore;
        } else {
            if seen == Seen::Underscore {
                return false;
            }
            seen = Seen::Other;
        }
    }
    seen != Seen::Underscore
}
