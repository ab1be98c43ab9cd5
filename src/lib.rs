//! # bindparams
//!
//! **bindparams** binds the three untyped parts of an HTTP request (path
//! parameters, the query string and a JSON body) straight into the typed
//! arguments of a handler function, then calls it.
//!
//! ## Overview
//!
//! A handler declares one or two inputs:
//!
//! - a **flat shape**: a struct whose fields are primitives (`bool`, integers,
//!   floats, `String`) or `Vec`s of primitives, filled from path parameters
//!   and the query string;
//! - an optional **body shape**: any `serde::Deserialize` type, decoded from
//!   the JSON body.
//!
//! Each invocation runs four steps in order:
//!
//! 1. **[`shape`]** - the handler's input shapes are inspected and rejected
//!    with a [`ConfigurationError`] if they cannot be bound.
//! 2. **[`resolve`]** - every flat field is resolved from the path lookup
//!    first, the query string second, and coerced by [`coerce`].
//! 3. **[`body`]** - the JSON body is decoded into the body shape, if any.
//! 4. **[`handler`]** - the handler is called and its return value handed back.
//!
//! ## Example
//!
//! ```rust
//! use bindparams::{bind_into, BindingRequest, FlatShape, PathTemplate};
//! use serde::Deserialize;
//!
//! #[derive(FlatShape, Debug)]
//! struct Params {
//!     id: i64,
//! }
//!
//! #[derive(Deserialize, Debug)]
//! struct User {
//!     name: String,
//!     age: u32,
//! }
//!
//! let template = PathTemplate::parse("/user/{id}").unwrap();
//! let path = template.match_path("/user/1234").unwrap();
//!
//! let req = http::Request::post("/user/1234")
//!     .body(br#"{"name":"Ronald","age":27}"#.to_vec())
//!     .unwrap();
//!
//! let (id, name) = bind_into(BindingRequest::from_http(&req), &path, |p: Params, u: User| {
//!     (p.id, u.name)
//! })
//! .unwrap();
//! assert_eq!(id, 1234);
//! assert_eq!(name, "Ronald");
//! ```
//!
//! ## Field names
//!
//! A flat field is matched by its external name: `#[bind(rename = "...")]`
//! if present, otherwise the identifier in lower camel case (`post_id`
//! matches `postId`). Matching is case-insensitive and a trailing `[]` on a
//! query key is ignored, so `filterArrInt`, `FILTERARRINT` and
//! `filterArrInt[]` all bind `filter_arr_int`.
//!
//! ## Errors
//!
//! Binding never panics on bad input. See [`error`] for the taxonomy and
//! [`config`] for the opt-in strict policies.

extern crate self as bindparams;

pub mod body;
pub mod coerce;
pub mod config;
pub mod error;
pub mod handler;
pub mod names;
pub mod path;
pub mod request;
pub mod resolve;
pub mod shape;

pub use bindparams_macros::FlatShape;
pub use body::decode_body;
pub use coerce::Coerce;
pub use config::{BindPolicy, CoercionPolicy, DuplicateScalarPolicy, UnknownKeyPolicy};
pub use error::{BindError, ConfigurationError, DecodeError, DecodeErrorKind, PolicyViolation};
pub use handler::{bind_into, Binder, Handler, HandlerArgs};
pub use path::{PathTemplate, TemplateError};
pub use request::{BindingRequest, PathLookup, PathParams, QueryMultimap};
pub use resolve::{resolve, FieldSource, ResolvedFields};
pub use shape::{
    inspect, FieldDescriptor, FieldKind, FlatShape, PrimitiveKind, ShapeDescriptor, ShapeKind,
    Signature, UnsupportedKind,
};
