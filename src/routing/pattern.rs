//! Route template compilation.
//!
//! # Responsibilities
//! - Split a template on `/` and classify each segment
//! - Replace `:name` segments with a capturing sub-pattern
//! - Record parameter names in capture order
//! - Produce an anchored regex that only accepts whole paths
//!
//! # Template Syntax
//! ```text
//! /user/:id              → ^(?:/user/([^/]+))$      params: [id]
//! /user/:id([0-9]+)      → ^(?:/user/([0-9]+))$     params: [id]
//! /a/:x/b/:y             → ^(?:/a/([^/]+)/b/([^/]+))$  params: [x, y]
//! ```
//!
//! # Design Decisions
//! - Literal segments are escaped; only inline overrides carry regex syntax
//! - Parameter count must equal capture group count, checked at compile time
//! - Matching re-checks the full-match span even though the regex is anchored

use regex::Regex;
use thiserror::Error;

/// Marks a named parameter segment.
pub const PARAM_MARKER: char = ':';

/// Sub-pattern used when a parameter has no inline override.
pub const DEFAULT_PARAM_PATTERN: &str = "([^/]+)";

/// Errors raised while compiling a route template.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid route pattern `{template}`: {source}")]
    InvalidRegex {
        template: String,
        #[source]
        source: regex::Error,
    },

    #[error("route pattern `{template}` has a parameter segment without a name")]
    EmptyParameterName { template: String },

    #[error("route pattern `{template}` names {params} parameter(s) but captures {groups} group(s)")]
    GroupCountMismatch {
        template: String,
        params: usize,
        groups: usize,
    },
}

/// Position-ordered parameter names. Index `i` names capture group `i + 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterMap {
    names: Vec<String>,
}

impl ParameterMap {
    /// Name of the parameter at the given zero-based capture position.
    pub fn name(&self, position: usize) -> Option<&str> {
        self.names.get(position).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    fn push(&mut self, name: &str) {
        self.names.push(name.to_string());
    }
}

/// A route template compiled into an anchored matcher.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    template: String,
    regex: Regex,
}

impl CompiledPattern {
    /// The template this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The generated regular expression.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Match `path` and return the captured sub-matches in order.
    ///
    /// Returns `None` unless the match covers the whole path.
    pub fn captures<'p>(&self, path: &'p str) -> Option<Vec<&'p str>> {
        let caps = self.regex.captures(path)?;
        let full = caps.get(0)?;
        if full.start() != 0 || full.len() != path.len() {
            return None;
        }

        Some(
            caps.iter()
                .skip(1)
                .map(|m| m.map(|m| m.as_str()).unwrap_or_default())
                .collect(),
        )
    }

    /// Returns true if the pattern matches the whole path.
    pub fn is_match(&self, path: &str) -> bool {
        self.captures(path).is_some()
    }
}

/// Compile a route template into a pattern and its parameter map.
pub fn compile(template: &str) -> Result<(CompiledPattern, ParameterMap), PatternError> {
    let mut params = ParameterMap::default();

    let parts: Vec<String> = template
        .split('/')
        .map(|segment| match segment.strip_prefix(PARAM_MARKER) {
            Some(param) => {
                // `:id([0-9]+)` overrides the default sub-pattern
                let (name, expr) = match param.find('(') {
                    Some(index) => (&param[..index], &param[index..]),
                    None => (param, DEFAULT_PARAM_PATTERN),
                };
                if name.is_empty() {
                    return Err(PatternError::EmptyParameterName {
                        template: template.to_string(),
                    });
                }
                params.push(name);
                Ok(expr.to_string())
            }
            None => Ok(regex::escape(segment)),
        })
        .collect::<Result<_, _>>()?;

    let expr = format!("^(?:{})$", parts.join("/"));
    let regex = Regex::new(&expr).map_err(|source| PatternError::InvalidRegex {
        template: template.to_string(),
        source,
    })?;

    let groups = regex.captures_len() - 1;
    if groups != params.len() {
        return Err(PatternError::GroupCountMismatch {
            template: template.to_string(),
            params: params.len(),
            groups,
        });
    }

    let pattern = CompiledPattern {
        template: template.to_string(),
        regex,
    };
    Ok((pattern, params))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_template() {
        let (pattern, params) = compile("/about/team").unwrap();
        assert!(params.is_empty());
        assert!(pattern.is_match("/about/team"));
        assert!(!pattern.is_match("/about/team/"));
        assert!(!pattern.is_match("/about"));
    }

    #[test]
    fn test_default_parameter() {
        let (pattern, params) = compile("/user/:name").unwrap();
        assert_eq!(params.name(0), Some("name"));
        assert_eq!(pattern.captures("/user/alice"), Some(vec!["alice"]));
        assert_eq!(pattern.captures("/user/alice/posts"), None);
        assert_eq!(pattern.captures("/user/"), None);
    }

    #[test]
    fn test_inline_override() {
        let (pattern, params) = compile("/user/:id([0-9]+)").unwrap();
        assert_eq!(params.iter().collect::<Vec<_>>(), vec!["id"]);
        assert_eq!(pattern.captures("/user/42"), Some(vec!["42"]));
        assert_eq!(pattern.captures("/user/abc"), None);
        assert_eq!(pattern.captures("/user/42abc"), None);
    }

    #[test]
    fn test_parameters_keep_template_order() {
        let (pattern, params) = compile("/:org/repos/:repo/issues/:n([0-9]+)").unwrap();
        assert_eq!(params.iter().collect::<Vec<_>>(), vec!["org", "repo", "n"]);
        assert_eq!(
            pattern.captures("/rust-lang/repos/regex/issues/7"),
            Some(vec!["rust-lang", "regex", "7"])
        );
    }

    #[test]
    fn test_substituted_values_round_trip() {
        let (pattern, params) = compile("/a/:x/b/:y/c/:z").unwrap();
        let values = ["with space", "dots.and-dashes", "ümlaut"];
        let path = format!("/a/{}/b/{}/c/{}", values[0], values[1], values[2]);

        let captured = pattern.captures(&path).unwrap();
        assert_eq!(captured, values);
        assert_eq!(params.len(), captured.len());
    }

    #[test]
    fn test_literal_segments_are_escaped() {
        let (pattern, _) = compile("/static/app.js").unwrap();
        assert!(pattern.is_match("/static/app.js"));
        assert!(!pattern.is_match("/static/appxjs"));
    }

    #[test]
    fn test_prefix_or_suffix_match_is_rejected() {
        let (pattern, _) = compile("/api").unwrap();
        assert!(!pattern.is_match("/api/v1"));
        assert!(!pattern.is_match("/v1/api"));
    }

    #[test]
    fn test_malformed_override_fails() {
        let err = compile("/user/:id([0-9+").unwrap_err();
        assert!(matches!(err, PatternError::InvalidRegex { .. }));
        assert!(err.to_string().contains("/user/:id([0-9+"));
    }

    #[test]
    fn test_override_group_count_must_match() {
        let err = compile("/tag/:name((a|b)+)").unwrap_err();
        assert!(matches!(
            err,
            PatternError::GroupCountMismatch { params: 1, groups: 2, .. }
        ));

        let err = compile("/tag/:name(?:x)").unwrap_err();
        assert!(matches!(
            err,
            PatternError::GroupCountMismatch { params: 1, groups: 0, .. }
        ));
    }

    #[test]
    fn test_empty_parameter_name_fails() {
        let err = compile("/user/:").unwrap_err();
        assert!(matches!(err, PatternError::EmptyParameterName { .. }));
    }
}
