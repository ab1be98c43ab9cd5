//! Flat-field resolution.
//!
//! For each field of the flat shape, in declaration order:
//!
//! 1. The path lookup is asked for the field's external name. A non-empty
//!    answer resolves the field and no other source is consulted.
//! 2. Otherwise the first query key that normalizes to the field's name
//!    supplies its values. Scalars use the first value; sequences use all of
//!    them in order.
//! 3. Otherwise the field is unmatched and keeps its zero value (an empty
//!    `Vec` for sequences).
//!
//! Coercion into the declared Rust type happens afterwards, when the shape's
//! `from_resolved` pulls each field out of [`ResolvedFields`].

use tracing::debug;

use crate::coerce::{coerce_value, Coerce};
use crate::config::{BindPolicy, CoercionPolicy, DuplicateScalarPolicy, UnknownKeyPolicy};
use crate::error::{BindError, ConfigurationError, PolicyViolation};
use crate::names::keys_match;
use crate::request::{PathLookup, QueryMultimap};
use crate::shape::{FieldDescriptor, ShapeDescriptor};

/// Where a field's raw value came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldSource {
    /// Neither a path parameter nor a query key named the field
    #[default]
    Unmatched,
    /// A non-empty path parameter
    Path(String),
    /// Every value under the matched query key, in order (never empty)
    Query(Vec<String>),
}

impl FieldSource {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            FieldSource::Unmatched => "unmatched",
            FieldSource::Path(_) => "path",
            FieldSource::Query(_) => "query",
        }
    }
}

/// Raw per-field values for one binding invocation.
#[derive(Debug)]
pub struct ResolvedFields<'s> {
    shape: &'s ShapeDescriptor,
    sources: Vec<FieldSource>,
    coercion: CoercionPolicy,
}

impl<'s> ResolvedFields<'s> {
    /// Number of fields, equal to the shape's field count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    #[must_use]
    pub fn source(&self, index: usize) -> Option<&FieldSource> {
        self.sources.get(index)
    }

    /// Fields paired with their sources, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldDescriptor, &FieldSource)> {
        self.shape.fields.iter().zip(self.sources.iter())
    }

    /// Take field `index` as a scalar.
    ///
    /// # Errors
    ///
    /// A policy violation under strict coercion, or a configuration error if
    /// `index` is not a field of the shape.
    pub fn scalar<T: Coerce>(&mut self, index: usize) -> Result<T, BindError> {
        let (field, source) = self.take(index)?;
        let value = match source {
            FieldSource::Unmatched => T::default(),
            FieldSource::Path(raw) => coerce_value(field.external_name, &raw, self.coercion)?,
            FieldSource::Query(values) => {
                let raw = values.first().map(String::as_str).unwrap_or_default();
                coerce_value(field.external_name, raw, self.coercion)?
            }
        };
        Ok(value)
    }

    /// Take field `index` as a sequence. The result holds exactly as many
    /// elements as values were matched; a path value counts as one.
    ///
    /// # Errors
    ///
    /// Same as [`ResolvedFields::scalar`].
    pub fn sequence<T: Coerce>(&mut self, index: usize) -> Result<Vec<T>, BindError> {
        let (field, source) = self.take(index)?;
        match source {
            FieldSource::Unmatched => Ok(Vec::new()),
            FieldSource::Path(raw) => Ok(vec![coerce_value(
                field.external_name,
                &raw,
                self.coercion,
            )?]),
            FieldSource::Query(values) => {
                let mut out = Vec::with_capacity(values.len());
                for raw in &values {
                    out.push(coerce_value(field.external_name, raw, self.coercion)?);
                }
                Ok(out)
            }
        }
    }

    /// Field `index` has a kind that cannot be bound.
    ///
    /// Inspection rejects such shapes before resolution, so this is only
    /// reached when binding bypasses [`inspect`](crate::shape::inspect).
    ///
    /// # Errors
    ///
    /// Always.
    pub fn unsupported<T>(&mut self, index: usize) -> Result<T, BindError> {
        let (field, _) = self.take(index)?;
        Err(ConfigurationError::UnsupportedField {
            shape: self.shape.type_name.to_string(),
            field: field.ident.to_string(),
            rust_type: field.rust_type.to_string(),
            kind: field.kind,
        }
        .into())
    }

    fn take(&mut self, index: usize) -> Result<(&'s FieldDescriptor, FieldSource), BindError> {
        let shape: &'s ShapeDescriptor = self.shape;
        match (shape.fields.get(index), self.sources.get_mut(index)) {
            (Some(field), Some(source)) => Ok((field, std::mem::take(source))),
            _ => Err(ConfigurationError::FieldIndex {
                shape: shape.type_name.to_string(),
                index,
                field_count: shape.fields.len(),
            }
            .into()),
        }
    }
}

/// Resolve every field of `shape` from path parameters, then the query string.
///
/// # Errors
///
/// Only when `policy` rejects unknown query keys or duplicate scalar values.
pub fn resolve<'s, L>(
    shape: &'s ShapeDescriptor,
    query: &QueryMultimap,
    lookup: &L,
    policy: &BindPolicy,
) -> Result<ResolvedFields<'s>, PolicyViolation>
where
    L: PathLookup + ?Sized,
{
    if policy.unknown_query_keys == UnknownKeyPolicy::Reject {
        if let Some((key, _)) = query.iter().find(|(key, _)| {
            !shape
                .fields
                .iter()
                .any(|field| keys_match(field.external_name, key))
        }) {
            return Err(PolicyViolation::UnknownQueryKey {
                key: key.to_string(),
            });
        }
    }

    let mut sources = Vec::with_capacity(shape.fields.len());
    for field in &shape.fields {
        let source = resolve_field(field, query, lookup, policy)?;
        debug!(
            field = field.external_name,
            source = source.label(),
            value_count = match &source {
                FieldSource::Unmatched => 0,
                FieldSource::Path(_) => 1,
                FieldSource::Query(values) => values.len(),
            },
            "Field resolved"
        );
        sources.push(source);
    }

    Ok(ResolvedFields {
        shape,
        sources,
        coercion: policy.coercion,
    })
}

fn resolve_field<L>(
    field: &FieldDescriptor,
    query: &QueryMultimap,
    lookup: &L,
    policy: &BindPolicy,
) -> Result<FieldSource, PolicyViolation>
where
    L: PathLookup + ?Sized,
{
    let from_path = lookup.lookup(field.external_name);
    if !from_path.is_empty() {
        return Ok(FieldSource::Path(from_path));
    }

    let Some((_, values)) = query.find_normalized(field.external_name) else {
        return Ok(FieldSource::Unmatched);
    };

    if !field.kind.is_sequence()
        && values.len() > 1
        && policy.duplicate_scalars == DuplicateScalarPolicy::Reject
    {
        return Err(PolicyViolation::DuplicateScalar {
            field: field.external_name.to_string(),
            count: values.len(),
        });
    }

    Ok(FieldSource::Query(values.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::PathParams;
    use crate::shape::{FieldKind, PrimitiveKind};

    fn shape() -> ShapeDescriptor {
        ShapeDescriptor::record(
            "Params",
            vec![
                FieldDescriptor::new("id", "id", "i64", FieldKind::Scalar(PrimitiveKind::I64)),
                FieldDescriptor::new(
                    "filter_arr_int",
                    "filterArrInt",
                    "Vec<i64>",
                    FieldKind::Sequence(PrimitiveKind::I64),
                ),
            ],
        )
    }

    #[test]
    fn test_sources_by_precedence() {
        let shape = shape();
        let path: PathParams = [("id", "1234")].into_iter().collect();
        let query = QueryMultimap::parse("id=99&filterArrInt[]=1&filterArrInt[]=2");
        let resolved = resolve(&shape, &query, &path, &BindPolicy::default()).unwrap();

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved.source(0), Some(&FieldSource::Path("1234".into())));
        assert_eq!(
            resolved.source(1),
            Some(&FieldSource::Query(vec!["1".into(), "2".into()]))
        );
    }

    #[test]
    fn test_empty_path_value_falls_through_to_query() {
        let shape = shape();
        let path: PathParams = [("id", "")].into_iter().collect();
        let query = QueryMultimap::parse("ID=5");
        let mut resolved = resolve(&shape, &query, &path, &BindPolicy::default()).unwrap();
        assert_eq!(resolved.scalar::<i64>(0).unwrap(), 5);
        assert_eq!(resolved.sequence::<i64>(1).unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn test_take_out_of_range_is_configuration_error() {
        let shape = shape();
        let mut resolved =
            resolve(&shape, &QueryMultimap::new(), &PathParams::new(), &BindPolicy::default())
                .unwrap();
        let err = resolved.scalar::<i64>(7).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_unsupported_always_errors() {
        let shape = shape();
        let mut resolved =
            resolve(&shape, &QueryMultimap::new(), &PathParams::new(), &BindPolicy::default())
                .unwrap();
        let err = resolved.unsupported::<()>(0).unwrap_err();
        assert_eq!(err.status_code(), 500);
    }
}
