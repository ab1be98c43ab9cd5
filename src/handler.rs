//! Handler invocation.
//!
//! A handler is any `Fn(P) -> R` or `Fn(P, B) -> R` where `P` is a
//! [`FlatShape`] bound from path and query parameters and `B` is a
//! `DeserializeOwned` body shape. Whatever the handler returns is handed back
//! unchanged: `()` for no outputs, a tuple for several.
//!
//! ```rust
//! use bindparams::{BindingRequest, Binder, FlatShape, PathParams, QueryMultimap};
//!
//! #[derive(FlatShape, Debug)]
//! struct Params {
//!     id: i64,
//!     filter_str: String,
//! }
//!
//! let binder = Binder::new(|p: Params| (p.id, p.filter_str)).unwrap();
//!
//! let path: PathParams = [("id", "1234")].into_iter().collect();
//! let request = BindingRequest::without_body(QueryMultimap::parse("filterStr=hello"));
//! let (id, filter) = binder.bind(request, &path).unwrap();
//! assert_eq!(id, 1234);
//! assert_eq!(filter, "hello");
//! ```

use std::io::Read;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use tracing::{debug, debug_span};

use crate::body::decode_body;
use crate::config::BindPolicy;
use crate::error::{BindError, ConfigurationError};
use crate::request::{BindingRequest, PathLookup};
use crate::resolve::resolve;
use crate::shape::{inspect, FlatShape, ShapeDescriptor, Signature};

/// The argument list of a handler: `(P,)` or `(P, B)`.
pub trait HandlerArgs: Sized {
    /// Descriptors of every input, in argument order.
    fn signature() -> Signature;

    /// Populate the arguments from one request.
    ///
    /// `signature` must be the value returned by [`HandlerArgs::signature`],
    /// already validated by [`inspect`].
    ///
    /// # Errors
    ///
    /// [`BindError::Decode`] when the body cannot be decoded,
    /// [`BindError::Policy`] when a strict policy rejects the request.
    fn bind<R, L>(
        signature: &Signature,
        request: BindingRequest<R>,
        lookup: &L,
        policy: &BindPolicy,
    ) -> Result<Self, BindError>
    where
        R: Read,
        L: PathLookup + ?Sized;
}

fn bind_flat<P, L>(
    signature: &Signature,
    query: &crate::request::QueryMultimap,
    lookup: &L,
    policy: &BindPolicy,
) -> Result<P, BindError>
where
    P: FlatShape,
    L: PathLookup + ?Sized,
{
    let flat = signature
        .flat()
        .ok_or(ConfigurationError::Arity { found: 0 })?;
    let mut resolved = resolve(flat, query, lookup, policy)?;
    P::from_resolved(&mut resolved)
}

impl<P> HandlerArgs for (P,)
where
    P: FlatShape,
{
    fn signature() -> Signature {
        Signature::new(vec![P::shape()])
    }

    fn bind<R, L>(
        signature: &Signature,
        request: BindingRequest<R>,
        lookup: &L,
        policy: &BindPolicy,
    ) -> Result<Self, BindError>
    where
        R: Read,
        L: PathLookup + ?Sized,
    {
        let params = bind_flat::<P, L>(signature, &request.query, lookup, policy)?;
        Ok((params,))
    }
}

impl<P, B> HandlerArgs for (P, B)
where
    P: FlatShape,
    B: DeserializeOwned,
{
    fn signature() -> Signature {
        Signature::new(vec![
            P::shape(),
            ShapeDescriptor::body(std::any::type_name::<B>()),
        ])
    }

    fn bind<R, L>(
        signature: &Signature,
        request: BindingRequest<R>,
        lookup: &L,
        policy: &BindPolicy,
    ) -> Result<Self, BindError>
    where
        R: Read,
        L: PathLookup + ?Sized,
    {
        let params = bind_flat::<P, L>(signature, &request.query, lookup, policy)?;
        let body = decode_body::<B, R>(request.body)?;
        Ok((params, body))
    }
}

/// A callable taking the arguments `Args`.
pub trait Handler<Args> {
    type Output;

    fn call(&self, args: Args) -> Self::Output;
}

impl<F, P, R> Handler<(P,)> for F
where
    F: Fn(P) -> R,
{
    type Output = R;

    fn call(&self, (params,): (P,)) -> R {
        (self)(params)
    }
}

impl<F, P, B, R> Handler<(P, B)> for F
where
    F: Fn(P, B) -> R,
{
    type Output = R;

    fn call(&self, (params, body): (P, B)) -> R {
        (self)(params, body)
    }
}

/// A handler whose shapes were inspected once, at construction.
///
/// Build one per route at registration time; [`Binder::bind`] can then be
/// called from any number of request threads.
pub struct Binder<H, Args> {
    handler: H,
    signature: Signature,
    policy: BindPolicy,
    _args: PhantomData<fn(Args)>,
}

impl<H, Args> std::fmt::Debug for Binder<H, Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("signature", &self.signature)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<H, Args> Binder<H, Args>
where
    H: Handler<Args>,
    Args: HandlerArgs,
{
    /// Inspect the handler's shapes and keep the descriptors.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError`] when the flat shape cannot be bound.
    pub fn new(handler: H) -> Result<Self, ConfigurationError> {
        let signature = Args::signature();
        inspect(&signature)?;
        Ok(Self {
            handler,
            signature,
            policy: BindPolicy::default(),
            _args: PhantomData,
        })
    }

    #[must_use]
    pub fn with_policy(mut self, policy: BindPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    #[must_use]
    pub fn policy(&self) -> &BindPolicy {
        &self.policy
    }

    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Bind one request and call the handler.
    ///
    /// # Errors
    ///
    /// [`BindError::Decode`] when the body cannot be decoded,
    /// [`BindError::Policy`] when a strict policy rejects the request.
    pub fn bind<R, L>(&self, request: BindingRequest<R>, lookup: &L) -> Result<H::Output, BindError>
    where
        R: Read,
        L: PathLookup + ?Sized,
    {
        let span = debug_span!(
            "bind",
            flat_shape = self.signature.inputs[0].type_name,
            has_body = self.signature.has_body()
        );
        let _enter = span.enter();

        let args = Args::bind(&self.signature, request, lookup, &self.policy)?;
        debug!("Invoking handler");
        Ok(self.handler.call(args))
    }
}

/// Inspect, bind and invoke in one call, with the default lenient policy.
///
/// Prefer [`Binder`] on hot paths so inspection runs once per handler
/// instead of once per request.
///
/// # Errors
///
/// [`BindError::Configuration`] for unbindable shapes (before the request is
/// touched), [`BindError::Decode`] for undecodable bodies.
pub fn bind_into<H, Args, R, L>(
    request: BindingRequest<R>,
    lookup: &L,
    handler: H,
) -> Result<H::Output, BindError>
where
    H: Handler<Args>,
    Args: HandlerArgs,
    R: Read,
    L: PathLookup + ?Sized,
{
    Binder::new(handler)?.bind(request, lookup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{PathParams, QueryMultimap};
    use crate::FlatShape;

    #[derive(FlatShape, Debug, PartialEq)]
    struct Params {
        id: i64,
    }

    #[test]
    fn test_signature_of_one_and_two_inputs() {
        assert_eq!(<(Params,)>::signature().inputs.len(), 1);
        let two = <(Params, serde_json::Value)>::signature();
        assert_eq!(two.inputs.len(), 2);
        assert!(two.has_body());
    }

    #[test]
    fn test_body_is_not_read_without_body_shape() {
        struct Untouchable;
        impl Read for Untouchable {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                panic!("body must not be read");
            }
        }
        let path: PathParams = [("id", "3")].into_iter().collect();
        let request = BindingRequest::new(QueryMultimap::new(), Untouchable);
        let out = bind_into(request, &path, |p: Params| p.id).unwrap();
        assert_eq!(out, 3);
    }

    #[test]
    fn test_unit_output() {
        let binder = Binder::new(|_: Params| {}).unwrap();
        let request = BindingRequest::without_body(QueryMultimap::new());
        binder.bind(request, &PathParams::new()).unwrap();
    }
}
