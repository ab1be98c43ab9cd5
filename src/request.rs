//! Inbound request model.
//!
//! A binding invocation reads from three places: a [`PathLookup`] for path
//! parameters, a [`QueryMultimap`] for the query string, and a body stream.
//! [`BindingRequest`] carries the latter two.

use std::io::Read;
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::debug;

use crate::names::{keys_match, normalize_key};

/// Maximum number of path parameters before heap allocation.
/// Most REST APIs have ≤4 path params (e.g., /users/{id}/posts/{postId}).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage. Names are `Arc<str>` because they come
/// from a route template shared by every request on that route.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Resolves a path parameter by name. An empty string means "not found".
pub trait PathLookup {
    fn lookup(&self, name: &str) -> String;
}

impl<F> PathLookup for F
where
    F: Fn(&str) -> String,
{
    fn lookup(&self, name: &str) -> String {
        (self)(name)
    }
}

/// Path parameters captured by a route match, in path order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(ParamVec);

impl PathParams {
    #[must_use]
    pub fn new() -> Self {
        Self(ParamVec::new())
    }

    pub fn push(&mut self, name: impl Into<Arc<str>>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Get a path parameter by name, case-insensitively.
    ///
    /// Uses "last write wins" semantics: if duplicate parameter names exist
    /// at different path depths (e.g., `/org/{id}/team/{team_id}/user/{id}`),
    /// returns the last occurrence (the user id, not the org id).
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .rfind(|(k, _)| keys_match(k, name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PathLookup for PathParams {
    fn lookup(&self, name: &str) -> String {
        self.get(name).map(str::to_owned).unwrap_or_default()
    }
}

impl<K, V> FromIterator<(K, V)> for PathParams
where
    K: Into<Arc<str>>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.push(k, v);
        }
        params
    }
}

/// Query-string multimap.
///
/// Keys keep their first-appearance order and every value under a key is
/// kept in order, duplicates included. `a` and `a[]` stay distinct keys here;
/// they are only unified when matched against a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryMultimap {
    groups: Vec<(String, Vec<String>)>,
}

impl QueryMultimap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string (with or without the leading `?`).
    ///
    /// Names and values are `application/x-www-form-urlencoded` decoded.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut map = Self::new();
        for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
            map.append(k.into_owned(), v.into_owned());
        }
        debug!(
            key_count = map.len(),
            "Query params parsed"
        );
        map
    }

    /// Parse the query component of a request URI.
    #[must_use]
    pub fn from_uri(uri: &http::Uri) -> Self {
        uri.query().map(Self::parse).unwrap_or_default()
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.groups.push((key, vec![value])),
        }
    }

    /// All values under exactly this key.
    #[must_use]
    pub fn get_all(&self, key: &str) -> &[String] {
        self.groups
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// First value under exactly this key.
    #[must_use]
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    /// First key group whose normalized key matches `name`.
    ///
    /// When a query string carries both `a=1` and `a[]=2`, whichever key
    /// appeared first wins and the other group is not merged in.
    #[must_use]
    pub fn find_normalized(&self, name: &str) -> Option<(&str, &[String])> {
        let wanted = normalize_key(name);
        self.groups
            .iter()
            .find(|(k, _)| normalize_key(k) == wanted)
            .map(|(k, values)| (k.as_str(), values.as_slice()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups
            .iter()
            .map(|(k, values)| (k.as_str(), values.as_slice()))
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryMultimap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.append(k, v);
        }
        map
    }
}

/// The request half of a binding invocation: query string plus body stream.
///
/// The body is read at most once, and only when the handler declares a body
/// shape.
#[derive(Debug)]
pub struct BindingRequest<R> {
    pub query: QueryMultimap,
    pub body: R,
}

impl<R: Read> BindingRequest<R> {
    pub fn new(query: QueryMultimap, body: R) -> Self {
        Self { query, body }
    }

    /// Build from a request URI and a body reader.
    pub fn from_uri(uri: &http::Uri, body: R) -> Self {
        Self::new(QueryMultimap::from_uri(uri), body)
    }
}

impl BindingRequest<std::io::Empty> {
    /// A request with a query string and no body.
    #[must_use]
    pub fn without_body(query: QueryMultimap) -> Self {
        Self::new(query, std::io::empty())
    }
}

impl<'a> BindingRequest<&'a [u8]> {
    /// Borrow the query and body of an `http::Request`.
    pub fn from_http<B: AsRef<[u8]>>(req: &'a http::Request<B>) -> Self {
        Self::new(QueryMultimap::from_uri(req.uri()), req.body().as_ref())
    }
}
