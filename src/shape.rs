//! Shape inspection.
//!
//! Every handler is described by a [`Signature`]: the ordered list of its
//! input shapes. The first input is the flat shape bound from path and query
//! parameters, the optional second input is the JSON body. [`inspect`]
//! validates a signature before any request data is touched.
//!
//! Descriptors are produced by `#[derive(FlatShape)]` (or a hand-written
//! [`FlatShape`] impl) and are built once per handler by
//! [`Binder::new`](crate::handler::Binder::new).

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{BindError, ConfigurationError};
use crate::resolve::ResolvedFields;

/// Primitive kinds a path or query string can be coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    String,
}

impl PrimitiveKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::Isize => "isize",
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::Usize => "usize",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
            PrimitiveKind::String => "string",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason a field type cannot be bound from strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedKind {
    /// A nested struct or other named type
    Record,
    /// `HashMap`, `BTreeMap` and friends
    Map,
    /// References, raw pointers, `Option`, `Box` and other indirections
    Pointer,
    Tuple,
    /// Fixed-size arrays and slices
    Array,
    /// `Vec<Vec<_>>`
    NestedSequence,
    Other,
}

impl fmt::Display for UnsupportedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UnsupportedKind::Record => "a nested record",
            UnsupportedKind::Map => "a map",
            UnsupportedKind::Pointer => "a pointer or optional",
            UnsupportedKind::Tuple => "a tuple",
            UnsupportedKind::Array => "a fixed-size array or slice",
            UnsupportedKind::NestedSequence => "a nested sequence",
            UnsupportedKind::Other => "an unsupported type",
        };
        f.write_str(label)
    }
}

/// Declared kind of a flat-shape field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "of")]
pub enum FieldKind {
    Scalar(PrimitiveKind),
    /// `Vec<T>` of a primitive `T`
    Sequence(PrimitiveKind),
    Unsupported(UnsupportedKind),
}

impl FieldKind {
    #[must_use]
    pub fn is_supported(self) -> bool {
        !matches!(self, FieldKind::Unsupported(_))
    }

    #[must_use]
    pub fn is_sequence(self) -> bool {
        matches!(self, FieldKind::Sequence(_))
    }

    /// The primitive kind values are coerced into, if any.
    #[must_use]
    pub fn primitive(self) -> Option<PrimitiveKind> {
        match self {
            FieldKind::Scalar(kind) | FieldKind::Sequence(kind) => Some(kind),
            FieldKind::Unsupported(_) => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Scalar(kind) => write!(f, "a {kind}"),
            FieldKind::Sequence(kind) => write!(f, "a sequence of {kind}"),
            FieldKind::Unsupported(kind) => kind.fmt(f),
        }
    }
}

/// One field of a flat shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Rust identifier of the field
    pub ident: &'static str,
    /// Name matched against path and query keys
    pub external_name: &'static str,
    /// Declared type as written in source
    pub rust_type: &'static str,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    #[must_use]
    pub const fn new(
        ident: &'static str,
        external_name: &'static str,
        rust_type: &'static str,
        kind: FieldKind,
    ) -> Self {
        Self {
            ident,
            external_name,
            rust_type,
            kind,
        }
    }
}

/// What kind of type a handler input is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "of")]
pub enum ShapeKind {
    /// A struct with named fields (possibly none)
    Record,
    /// An opaque shape decoded from the JSON body
    Body,
    /// Anything else; the payload names what it is
    NotRecord(&'static str),
}

/// Descriptor of one handler input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapeDescriptor {
    pub type_name: &'static str,
    pub kind: ShapeKind,
    pub fields: Vec<FieldDescriptor>,
}

impl ShapeDescriptor {
    #[must_use]
    pub fn record(type_name: &'static str, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            type_name,
            kind: ShapeKind::Record,
            fields,
        }
    }

    #[must_use]
    pub fn body(type_name: &'static str) -> Self {
        Self {
            type_name,
            kind: ShapeKind::Body,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn not_record(type_name: &'static str, kind: &'static str) -> Self {
        Self {
            type_name,
            kind: ShapeKind::NotRecord(kind),
            fields: Vec::new(),
        }
    }

    /// Fields whose kind cannot be bound.
    pub fn unsupported_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| !f.kind.is_supported())
    }
}

/// Ordered input shapes of a handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub inputs: Vec<ShapeDescriptor>,
}

impl Signature {
    #[must_use]
    pub fn new(inputs: Vec<ShapeDescriptor>) -> Self {
        Self { inputs }
    }

    /// The flat shape, if the signature declares any input at all.
    #[must_use]
    pub fn flat(&self) -> Option<&ShapeDescriptor> {
        self.inputs.first()
    }

    #[must_use]
    pub fn has_body(&self) -> bool {
        self.inputs.len() == 2
    }
}

/// A record type bindable from path and query parameters.
///
/// Implement with `#[derive(FlatShape)]`. `()` implements it as the empty
/// record for handlers that only need a body.
pub trait FlatShape: Sized {
    /// Describe the fields. Called once per handler registration.
    fn shape() -> ShapeDescriptor;

    /// Build the value from resolved sources, in [`FlatShape::shape`] field order.
    fn from_resolved(fields: &mut ResolvedFields) -> Result<Self, BindError>;
}

impl FlatShape for () {
    fn shape() -> ShapeDescriptor {
        ShapeDescriptor::record("()", Vec::new())
    }

    fn from_resolved(_fields: &mut ResolvedFields) -> Result<Self, BindError> {
        Ok(())
    }
}

/// Validate a handler signature.
///
/// Checks, in order: one or two inputs, the first input is a record, and
/// every field of it is a primitive or a sequence of primitives.
///
/// # Errors
///
/// Returns the first [`ConfigurationError`] found.
pub fn inspect(signature: &Signature) -> Result<(), ConfigurationError> {
    let result = check(signature);
    match &result {
        Ok(()) => {
            let flat = &signature.inputs[0];
            info!(
                flat_shape = flat.type_name,
                field_count = flat.fields.len(),
                body_shape = signature.inputs.get(1).map(|b| b.type_name),
                "Handler shape inspected"
            );
        }
        Err(err) => {
            warn!(error = %err, "Handler shape rejected");
        }
    }
    result
}

fn check(signature: &Signature) -> Result<(), ConfigurationError> {
    let arity = signature.inputs.len();
    if arity != 1 && arity != 2 {
        return Err(ConfigurationError::Arity { found: arity });
    }

    let flat = &signature.inputs[0];
    match flat.kind {
        ShapeKind::Record => {}
        ShapeKind::Body => {
            return Err(ConfigurationError::NotRecord {
                type_name: flat.type_name.to_string(),
                kind: "an opaque body shape",
            })
        }
        ShapeKind::NotRecord(kind) => {
            return Err(ConfigurationError::NotRecord {
                type_name: flat.type_name.to_string(),
                kind,
            })
        }
    }

    if let Some(field) = flat.unsupported_fields().next() {
        return Err(ConfigurationError::UnsupportedField {
            shape: flat.type_name.to_string(),
            field: field.ident.to_string(),
            rust_type: field.rust_type.to_string(),
            kind: field.kind,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(fields: Vec<FieldDescriptor>) -> ShapeDescriptor {
        ShapeDescriptor::record("Params", fields)
    }

    fn id_field() -> FieldDescriptor {
        FieldDescriptor::new("id", "id", "i64", FieldKind::Scalar(PrimitiveKind::I64))
    }

    #[test]
    fn test_accepts_one_or_two_inputs() {
        assert!(inspect(&Signature::new(vec![flat(vec![id_field()])])).is_ok());
        assert!(inspect(&Signature::new(vec![
            flat(vec![id_field()]),
            ShapeDescriptor::body("User")
        ]))
        .is_ok());
    }

    #[test]
    fn test_rejects_wrong_arity() {
        assert_eq!(
            inspect(&Signature::new(Vec::new())),
            Err(ConfigurationError::Arity { found: 0 })
        );
        let three = Signature::new(vec![
            flat(Vec::new()),
            ShapeDescriptor::body("A"),
            ShapeDescriptor::body("B"),
        ]);
        assert_eq!(inspect(&three), Err(ConfigurationError::Arity { found: 3 }));
    }

    #[test]
    fn test_rejects_non_record_first_input() {
        let sig = Signature::new(vec![ShapeDescriptor::not_record("i64", "a primitive")]);
        assert!(matches!(
            inspect(&sig),
            Err(ConfigurationError::NotRecord { kind: "a primitive", .. })
        ));

        let sig = Signature::new(vec![ShapeDescriptor::body("User")]);
        assert!(matches!(
            inspect(&sig),
            Err(ConfigurationError::NotRecord { .. })
        ));
    }

    #[test]
    fn test_rejects_first_unsupported_field() {
        let sig = Signature::new(vec![flat(vec![
            id_field(),
            FieldDescriptor::new(
                "tags",
                "tags",
                "HashMap<String,String>",
                FieldKind::Unsupported(UnsupportedKind::Map),
            ),
            FieldDescriptor::new(
                "owner",
                "owner",
                "Option<String>",
                FieldKind::Unsupported(UnsupportedKind::Pointer),
            ),
        ])]);
        match inspect(&sig) {
            Err(ConfigurationError::UnsupportedField { field, kind, .. }) => {
                assert_eq!(field, "tags");
                assert_eq!(kind, FieldKind::Unsupported(UnsupportedKind::Map));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_sequences_of_primitives_are_supported() {
        let sig = Signature::new(vec![flat(vec![FieldDescriptor::new(
            "ids",
            "ids",
            "Vec<u32>",
            FieldKind::Sequence(PrimitiveKind::U32),
        )])]);
        assert!(inspect(&sig).is_ok());
    }

    #[test]
    fn test_unit_is_an_empty_record() {
        let shape = <() as FlatShape>::shape();
        assert_eq!(shape.kind, ShapeKind::Record);
        assert!(shape.fields.is_empty());
    }

    #[test]
    fn test_field_kind_display() {
        assert_eq!(FieldKind::Scalar(PrimitiveKind::I32).to_string(), "a i32");
        assert_eq!(
            FieldKind::Sequence(PrimitiveKind::String).to_string(),
            "a sequence of string"
        );
        assert_eq!(
            FieldKind::Unsupported(UnsupportedKind::Map).to_string(),
            "a map"
        );
    }
}
