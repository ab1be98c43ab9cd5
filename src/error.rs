//! Error types returned by the binding engine.
//!
//! Only two conditions are fatal to a binding invocation by default:
//!
//! - [`ConfigurationError`] - the handler's declared shapes cannot be bound.
//!   This is a programming mistake and is raised before any request data is
//!   read, ideally once when the handler is registered.
//! - [`DecodeError`] - the JSON body could not be read or decoded.
//!
//! A third family, [`PolicyViolation`], only exists when a stricter
//! [`BindPolicy`](crate::config::BindPolicy) is configured.
//!
//! None of these ever abort the process; the request layer decides the
//! HTTP response via [`BindError::status_code`].

use std::fmt;

use crate::shape::{FieldKind, PrimitiveKind};

/// Top-level error of a binding invocation.
#[derive(Debug)]
pub enum BindError {
    /// The handler's declared shapes cannot be bound
    Configuration(ConfigurationError),
    /// The JSON request body could not be decoded
    Decode(DecodeError),
    /// A strict [`BindPolicy`](crate::config::BindPolicy) rejected the request
    Policy(PolicyViolation),
}

impl BindError {
    /// HTTP status the request layer should answer with.
    ///
    /// Configuration errors are server-side mistakes (500); decode failures
    /// and policy rejections are the client's fault (400).
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            BindError::Configuration(_) => 500,
            BindError::Decode(_) | BindError::Policy(_) => 400,
        }
    }

    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, BindError::Configuration(_))
    }

    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, BindError::Decode(_))
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::Configuration(err) => write!(f, "handler configuration error: {err}"),
            BindError::Decode(err) => write!(f, "request body decode error: {err}"),
            BindError::Policy(err) => write!(f, "request rejected by binding policy: {err}"),
        }
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BindError::Configuration(err) => Some(err),
            BindError::Decode(err) => Some(err),
            BindError::Policy(err) => Some(err),
        }
    }
}

impl From<ConfigurationError> for BindError {
    fn from(err: ConfigurationError) -> Self {
        BindError::Configuration(err)
    }
}

impl From<DecodeError> for BindError {
    fn from(err: DecodeError) -> Self {
        BindError::Decode(err)
    }
}

impl From<PolicyViolation> for BindError {
    fn from(err: PolicyViolation) -> Self {
        BindError::Policy(err)
    }
}

/// The handler's declared input shapes cannot be bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The handler declares a number of inputs other than one or two
    Arity {
        /// Number of inputs the handler declares
        found: usize,
    },
    /// The first input is not a record with named fields
    NotRecord {
        /// Rust type name of the offending input
        type_name: String,
        /// What kind of type it is instead
        kind: &'static str,
    },
    /// A field of the first input has a kind that cannot be bound from
    /// path or query strings
    UnsupportedField {
        /// Rust type name of the flat shape
        shape: String,
        /// Field identifier
        field: String,
        /// Declared type of the field as written in source
        rust_type: String,
        /// Classified kind of the field
        kind: FieldKind,
    },
    /// A hand-written `from_resolved` asked for a field the shape does not declare
    FieldIndex {
        /// Rust type name of the flat shape
        shape: String,
        /// Requested field index
        index: usize,
        /// Number of fields the shape declares
        field_count: usize,
    },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::Arity { found } => write!(
                f,
                "handler must declare one or two inputs (flat parameters, optional body), found {found}"
            ),
            ConfigurationError::NotRecord { type_name, kind } => write!(
                f,
                "first handler input `{type_name}` must be a struct with named fields, found {kind}"
            ),
            ConfigurationError::UnsupportedField {
                shape,
                field,
                rust_type,
                kind,
            } => write!(
                f,
                "field `{field}: {rust_type}` of `{shape}` is {kind}; only primitives and \
                 sequences of primitives can be bound from path and query parameters"
            ),
            ConfigurationError::FieldIndex {
                shape,
                index,
                field_count,
            } => write!(
                f,
                "`{shape}` requested field #{index} but its descriptor declares {field_count} fields"
            ),
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Why a JSON body could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Reading the body stream failed
    Io,
    /// The body is not syntactically valid JSON
    Syntax,
    /// Valid JSON that does not fit the declared body shape
    Data,
    /// The body ended before a complete JSON value (includes empty bodies)
    Eof,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DecodeErrorKind::Io => "io",
            DecodeErrorKind::Syntax => "syntax",
            DecodeErrorKind::Data => "data",
            DecodeErrorKind::Eof => "eof",
        };
        f.write_str(label)
    }
}

/// The JSON request body could not be decoded into the declared body shape.
#[derive(Debug)]
pub struct DecodeError {
    kind: DecodeErrorKind,
    target: &'static str,
    source: serde_json::Error,
}

impl DecodeError {
    pub(crate) fn new(target: &'static str, source: serde_json::Error) -> Self {
        let kind = match source.classify() {
            serde_json::error::Category::Io => DecodeErrorKind::Io,
            serde_json::error::Category::Syntax => DecodeErrorKind::Syntax,
            serde_json::error::Category::Data => DecodeErrorKind::Data,
            serde_json::error::Category::Eof => DecodeErrorKind::Eof,
        };
        Self {
            kind,
            target,
            source,
        }
    }

    #[must_use]
    pub fn kind(&self) -> DecodeErrorKind {
        self.kind
    }

    /// Rust type name of the body shape that was being decoded.
    #[must_use]
    pub fn target(&self) -> &'static str {
        self.target
    }

    /// One-based line of the failure, 0 for I/O failures.
    #[must_use]
    pub fn line(&self) -> usize {
        self.source.line()
    }

    /// One-based column of the failure, 0 for I/O failures.
    #[must_use]
    pub fn column(&self) -> usize {
        self.source.column()
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot decode body into `{}` ({}): {}",
            self.target, self.kind, self.source
        )
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// A request rejected by a strict [`BindPolicy`](crate::config::BindPolicy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyViolation {
    /// A non-empty source string could not be parsed into the field's kind
    Coercion {
        /// External name of the field
        field: String,
        /// Raw value that failed to parse
        value: String,
        /// Kind the value was parsed as
        kind: PrimitiveKind,
    },
    /// A query key does not correspond to any field of the flat shape
    UnknownQueryKey {
        /// The key as it appeared in the query string
        key: String,
    },
    /// A scalar field received more than one query value
    DuplicateScalar {
        /// External name of the field
        field: String,
        /// Number of values received
        count: usize,
    },
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyViolation::Coercion { field, value, kind } => {
                write!(f, "value {value:?} for `{field}` is not a valid {kind}")
            }
            PolicyViolation::UnknownQueryKey { key } => {
                write!(f, "query parameter `{key}` does not match any field")
            }
            PolicyViolation::DuplicateScalar { field, count } => {
                write!(f, "`{field}` accepts a single value but received {count}")
            }
        }
    }
}

impl std::error::Error for PolicyViolation {}
