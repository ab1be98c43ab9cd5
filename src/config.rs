//! # Binding Policy
//!
//! The default binding behavior is lenient: malformed numbers and booleans
//! become zero values, unknown query keys are ignored, and scalar fields take
//! the first of several query values. Each of those can be tightened
//! independently through a [`BindPolicy`].
//!
//! ## Environment Variables
//!
//! ### `BINDPARAMS_COERCION`
//!
//! `lenient` (default) or `strict`. Strict rejects non-empty values that do not
//! parse into the field's kind.
//!
//! ### `BINDPARAMS_UNKNOWN_QUERY_KEYS`
//!
//! `ignore` (default) or `reject`. Reject fails the request when a query key
//! matches no field of the flat shape.
//!
//! ### `BINDPARAMS_DUPLICATE_SCALARS`
//!
//! `first` (default) or `reject`. Reject fails the request when a scalar field
//! receives more than one query value.
//!
//! ## Usage
//!
//! ```rust
//! use bindparams::config::BindPolicy;
//!
//! let policy = BindPolicy::from_env().unwrap_or_default();
//! println!("coercion: {:?}", policy.coercion);
//! ```
//!
//! Policies also deserialize from service configuration files:
//!
//! ```yaml
//! binding:
//!   coercion: strict
//!   unknown_query_keys: reject
//! ```

use std::env;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const ENV_COERCION: &str = "BINDPARAMS_COERCION";
pub const ENV_UNKNOWN_QUERY_KEYS: &str = "BINDPARAMS_UNKNOWN_QUERY_KEYS";
pub const ENV_DUPLICATE_SCALARS: &str = "BINDPARAMS_DUPLICATE_SCALARS";

/// What to do with a non-empty value that does not parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionPolicy {
    /// Leave the field at its zero value
    #[default]
    Lenient,
    /// Reject the request
    Strict,
}

/// What to do with query keys that match no field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKeyPolicy {
    #[default]
    Ignore,
    Reject,
}

/// What to do when a scalar field receives several query values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateScalarPolicy {
    /// Keep the first value, ignore the rest
    #[default]
    First,
    Reject,
}

/// Binding strictness, lenient by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindPolicy {
    pub coercion: CoercionPolicy,
    pub unknown_query_keys: UnknownKeyPolicy,
    pub duplicate_scalars: DuplicateScalarPolicy,
}

impl BindPolicy {
    /// Every check enabled.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            coercion: CoercionPolicy::Strict,
            unknown_query_keys: UnknownKeyPolicy::Reject,
            duplicate_scalars: DuplicateScalarPolicy::Reject,
        }
    }

    #[must_use]
    pub fn with_coercion(mut self, coercion: CoercionPolicy) -> Self {
        self.coercion = coercion;
        self
    }

    #[must_use]
    pub fn with_unknown_query_keys(mut self, policy: UnknownKeyPolicy) -> Self {
        self.unknown_query_keys = policy;
        self
    }

    #[must_use]
    pub fn with_duplicate_scalars(mut self, policy: DuplicateScalarPolicy) -> Self {
        self.duplicate_scalars = policy;
        self
    }

    /// Load the policy from `BINDPARAMS_*` environment variables.
    ///
    /// Unset variables keep their lenient default.
    ///
    /// # Errors
    ///
    /// Returns an error naming the variable when a value is not recognized.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load the policy through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error naming the variable when a value is not recognized.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut policy = Self::default();

        if let Some(raw) = lookup(ENV_COERCION) {
            policy.coercion = parse_choice(&raw, &[
                ("lenient", CoercionPolicy::Lenient),
                ("strict", CoercionPolicy::Strict),
            ])
            .with_context(|| format!("invalid {ENV_COERCION}"))?;
        }
        if let Some(raw) = lookup(ENV_UNKNOWN_QUERY_KEYS) {
            policy.unknown_query_keys = parse_choice(&raw, &[
                ("ignore", UnknownKeyPolicy::Ignore),
                ("reject", UnknownKeyPolicy::Reject),
            ])
            .with_context(|| format!("invalid {ENV_UNKNOWN_QUERY_KEYS}"))?;
        }
        if let Some(raw) = lookup(ENV_DUPLICATE_SCALARS) {
            policy.duplicate_scalars = parse_choice(&raw, &[
                ("first", DuplicateScalarPolicy::First),
                ("reject", DuplicateScalarPolicy::Reject),
            ])
            .with_context(|| format!("invalid {ENV_DUPLICATE_SCALARS}"))?;
        }

        Ok(policy)
    }
}

fn parse_choice<T: Copy>(raw: &str, choices: &[(&str, T)]) -> Result<T> {
    let wanted = raw.trim();
    if let Some((_, value)) = choices
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
    {
        return Ok(*value);
    }
    let expected: Vec<&str> = choices.iter().map(|(name, _)| *name).collect();
    bail!("unrecognized value {raw:?}, expected one of {expected:?}")
}
