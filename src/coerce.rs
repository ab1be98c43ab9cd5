//! String-to-primitive coercion.
//!
//! An empty source string is never parsed: the field keeps its zero value.
//! A non-empty string that fails to parse also leaves the zero value under
//! the default [`CoercionPolicy::Lenient`]; [`CoercionPolicy::Strict`]
//! reports it instead.

use tracing::debug;

use crate::config::CoercionPolicy;
use crate::error::PolicyViolation;
use crate::shape::PrimitiveKind;

/// A primitive a path or query string can be coerced into.
pub trait Coerce: Default + Sized {
    const KIND: PrimitiveKind;

    /// Parse a non-empty source string. `None` means malformed.
    fn parse_source(raw: &str) -> Option<Self>;
}

impl Coerce for bool {
    const KIND: PrimitiveKind = PrimitiveKind::Bool;

    fn parse_source(raw: &str) -> Option<Self> {
        parse_bool(raw)
    }
}

impl Coerce for String {
    const KIND: PrimitiveKind = PrimitiveKind::String;

    fn parse_source(raw: &str) -> Option<Self> {
        Some(raw.to_owned())
    }
}

macro_rules! coerce_from_str {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Coerce for $ty {
                const KIND: PrimitiveKind = PrimitiveKind::$kind;

                fn parse_source(raw: &str) -> Option<Self> {
                    raw.parse::<$ty>().ok()
                }
            }
        )*
    };
}

coerce_from_str! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
}

/// Boolean literal forms: `1 t T TRUE true True` and `0 f F FALSE false False`.
#[must_use]
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Coerce one source string into `T`.
///
/// `field` is the external field name, used for logging and errors.
///
/// # Errors
///
/// Only under [`CoercionPolicy::Strict`], when a non-empty value fails to parse.
pub fn coerce_value<T: Coerce>(
    field: &str,
    raw: &str,
    policy: CoercionPolicy,
) -> Result<T, PolicyViolation> {
    if raw.is_empty() {
        return Ok(T::default());
    }
    match T::parse_source(raw) {
        Some(value) => Ok(value),
        None => match policy {
            CoercionPolicy::Lenient => {
                debug!(
                    field = field,
                    value = raw,
                    kind = %T::KIND,
                    "Malformed value left at zero"
                );
                Ok(T::default())
            }
            CoercionPolicy::Strict => Err(PolicyViolation::Coercion {
                field: field.to_string(),
                value: raw.to_string(),
                kind: T::KIND,
            }),
        },
    }
}
