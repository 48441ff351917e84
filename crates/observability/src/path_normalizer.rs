//! Canonical request paths and the monitoring exclusion set.

use std::fmt;

/// Per-request identity used to label metrics and gate tracing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: String,
    pub raw_path: String,
    pub normalized_path: String,
}

impl RequestDescriptor {
    pub fn new(method: impl Into<String>, raw_path: &str, route_template: Option<&str>) -> Self {
        Self {
            method: method.into(),
            raw_path: raw_path.to_string(),
            normalized_path: normalize_path(raw_path, route_template),
        }
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.normalized_path)
    }
}

/// Canonicalizes a request path for use as a metric label.
///
/// The route template wins when one was resolved, so `/users/42` matched by
/// `/users/{id}` becomes `/users/:id`. The result always starts with `/`,
/// never ends with `/` unless it is the root, carries no query string and
/// contains no empty segments. Applying it twice changes nothing.
pub fn normalize_path(raw_path: &str, route_template: Option<&str>) -> String {
    let source = route_template.unwrap_or(raw_path);
    let source = source
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    let mut normalized = String::with_capacity(source.len() + 1);
    for segment in source.split('/').filter(|s| !s.is_empty()) {
        normalized.push('/');
        push_segment(&mut normalized, segment);
    }

    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

// `{id}` -> `:id`, `{*rest}` -> `*rest`
fn push_segment(out: &mut String, segment: &str) {
    match segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
    {
        Some(param) if param.starts_with('*') => out.push_str(param),
        Some(param) if !param.is_empty() => {
            out.push(':');
            out.push_str(param);
        }
        _ => out.push_str(segment),
    }
}

/// Path prefixes that are neither measured nor traced.
///
/// Fixed at startup. A normalized path is excluded when it equals a prefix
/// or continues it with a `/` (so `/health` excludes `/health/db` but not
/// `/healthz`).
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    prefixes: Vec<String>,
}

impl ExclusionSet {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for prefix in prefixes {
            let prefix = normalize_path(prefix.as_ref(), None);
            if !normalized.contains(&prefix) {
                normalized.push(prefix);
            }
        }
        Self {
            prefixes: normalized,
        }
    }

    pub fn is_excluded(&self, normalized_path: &str) -> bool {
        self.prefixes.iter().any(|prefix| {
            normalized_path == prefix
                || normalized_path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_preferred_over_raw_path() {
        assert_eq!(normalize_path("/users/42", Some("/users/{id}")), "/users/:id");
        assert_eq!(normalize_path("/users/42", None), "/users/42");
        assert_eq!(
            normalize_path("/files/a/b", Some("/files/{*path}")),
            "/files/*path"
        );
    }

    #[test]
    fn test_slashes_and_query_are_cleaned() {
        assert_eq!(normalize_path("", None), "/");
        assert_eq!(normalize_path("/", None), "/");
        assert_eq!(normalize_path("//", None), "/");
        assert_eq!(normalize_path("users/", None), "/users");
        assert_eq!(normalize_path("//users//42///", None), "/users/42");
        assert_eq!(normalize_path("/users?page=2", None), "/users");
        assert_eq!(normalize_path("/users#top", None), "/users");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let samples = [
            "",
            "/",
            "users",
            "/users/",
            "//a//b/",
            "/users/:id",
            "/users/{id}",
            "/x?y=/z",
            "/files/{*rest}",
            "/{}",
        ];
        for sample in samples {
            let once = normalize_path(sample, None);
            assert_eq!(normalize_path(&once, None), once, "input {sample:?}");
            assert!(once.starts_with('/'));
            assert!(once == "/" || !once.ends_with('/'));
        }
    }

    #[test]
    fn test_exclusion_matches_exact_and_segment_prefix() {
        let exclusions = ExclusionSet::new(["/health", "/metrics/", "api-docs"]);
        assert_eq!(exclusions.prefixes(), ["/health", "/metrics", "/api-docs"]);

        assert!(exclusions.is_excluded("/health"));
        assert!(exclusions.is_excluded("/health/db"));
        assert!(exclusions.is_excluded("/metrics"));
        assert!(exclusions.is_excluded("/api-docs/swagger.json"));

        assert!(!exclusions.is_excluded("/healthz"));
        assert!(!exclusions.is_excluded("/users"));
        assert!(!exclusions.is_excluded("/"));
    }

    #[test]
    fn test_empty_exclusion_set_excludes_nothing() {
        let exclusions = ExclusionSet::default();
        assert!(exclusions.is_empty());
        assert!(!exclusions.is_excluded("/health"));
    }

    #[test]
    fn test_descriptor_uses_template() {
        let descriptor = RequestDescriptor::new("GET", "/users/42", Some("/users/{id}"));
        assert_eq!(descriptor.raw_path, "/users/42");
        assert_eq!(descriptor.normalized_path, "/users/:id");
        assert_eq!(descriptor.to_string(), "GET /users/:id");
    }
}
