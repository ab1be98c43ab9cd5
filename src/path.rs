//! Route templates such as `/user/{id}/post/{postId}`.
//!
//! Matching a request path against a [`PathTemplate`] yields the
//! [`PathParams`] the resolver consults first. This is a single-template
//! matcher; choosing between many routes belongs to the surrounding router.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::request::PathParams;

/// A template could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A `{` without a matching `}` or a brace in the middle of a segment
    MalformedSegment {
        /// The offending segment
        segment: String,
    },
    /// `{}` with no parameter name
    EmptyParameter,
    /// The generated pattern failed to compile
    Regex(String),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::MalformedSegment { segment } => write!(
                f,
                "malformed template segment '{segment}': parameters must span a whole segment, e.g. {{id}}"
            ),
            TemplateError::EmptyParameter => write!(f, "template contains an empty parameter '{{}}'"),
            TemplateError::Regex(err) => write!(f, "template pattern failed to compile: {err}"),
        }
    }
}

impl std::error::Error for TemplateError {}

/// A compiled route template.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    template: String,
    regex: Regex,
    param_names: Vec<Arc<str>>,
}

impl PathTemplate {
    /// Compile a template. Parameters are whole segments wrapped in braces.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] for unbalanced braces or empty names.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut pattern = String::with_capacity(template.len() + 5);
        pattern.push('^');
        let mut param_names = Vec::with_capacity(template.matches('{').count());

        for segment in template.split('/') {
            if segment.starts_with('{') && segment.ends_with('}') && segment.len() >= 2 {
                let name = &segment[1..segment.len() - 1];
                if name.is_empty() {
                    return Err(TemplateError::EmptyParameter);
                }
                if name.contains(['{', '}']) {
                    return Err(TemplateError::MalformedSegment {
                        segment: segment.to_string(),
                    });
                }
                pattern.push_str("/([^/]+)");
                param_names.push(Arc::from(name));
            } else if segment.contains(['{', '}']) {
                return Err(TemplateError::MalformedSegment {
                    segment: segment.to_string(),
                });
            } else if !segment.is_empty() {
                pattern.push('/');
                pattern.push_str(&regex::escape(segment));
            }
        }

        if param_names.is_empty() && pattern == "^" {
            pattern.push('/');
        }
        pattern.push_str("/?$");

        let regex = Regex::new(&pattern).map_err(|e| TemplateError::Regex(e.to_string()))?;
        debug!(
            template = template,
            pattern = %pattern,
            param_count = param_names.len(),
            "Path template compiled"
        );

        Ok(Self {
            template: template.to_string(),
            regex,
            param_names,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.param_names.iter().map(|name| &**name)
    }

    /// Match a request path (query string, if any, is ignored).
    ///
    /// Captured segments are percent-decoded; a segment that is not valid
    /// UTF-8 once decoded is kept verbatim.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<PathParams> {
        let path = path.split('?').next().unwrap_or(path);
        let captures = self.regex.captures(path)?;
        let mut params = PathParams::new();
        for (name, capture) in self.param_names.iter().zip(captures.iter().skip(1)) {
            let raw = capture.map(|m| m.as_str()).unwrap_or_default();
            let value = urlencoding::decode(raw)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            params.push(Arc::clone(name), value);
        }
        Some(params)
    }
}
