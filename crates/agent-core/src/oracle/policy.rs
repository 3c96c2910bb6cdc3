//! Allow-list for outbound oracle traffic.

use serde::{Deserialize, Serialize};
use url::Url;

/// Destinations the oracle client may reach. An empty allow-list admits
/// nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundPolicy {
    #[serde(default)]
    allowed: Vec<String>,
}

impl OutboundPolicy {
    /// Policy admitting only the origin of `url`.
    pub fn allowing_origin_of(url: &str) -> Self {
        let allowed = Url::parse(url)
            .ok()
            .map(|parsed| parsed.origin().ascii_serialization())
            .filter(|origin| origin != "null")
            .into_iter()
            .collect();
        Self { allowed }
    }

    /// Policy that admits any destination.
    pub fn permissive() -> Self {
        Self {
            allowed: vec!["*".to_string()],
        }
    }

    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed.extend(
            patterns
                .into_iter()
                .map(Into::into)
                .map(|p| p.trim().trim_end_matches('/').to_string())
                .filter(|p| !p.is_empty()),
        );
        self
    }

    pub fn patterns(&self) -> &[String] {
        &self.allowed
    }

    /// Whether a request to `url` is admitted. Patterns are compared to
    /// both the origin (`https://host:port`) and the bare host.
    pub fn permits(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let origin = parsed.origin().ascii_serialization();
        let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
        self.allowed
            .iter()
            .any(|pattern| pattern_matches(pattern, &origin) || pattern_matches(pattern, &host))
    }
}

fn pattern_matches(pattern: &str, candidate: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if let Some(idx) = pattern.find('*') {
        let prefix = &pattern[..idx];
        let suffix = &pattern[idx + 1..];
        return candidate.len() >= prefix.len() + suffix.len()
            && candidate.starts_with(prefix)
            && candidate.ends_with(suffix);
    }
    candidate == pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_policy_admits_only_that_origin() {
        let policy = OutboundPolicy::allowing_origin_of("http://127.0.0.1:8000/api/v1");
        assert!(policy.permits("http://127.0.0.1:8000/api/v1/ai/pick-element"));
        assert!(!policy.permits("http://127.0.0.1:9000/api/v1/ai/pick-element"));
        assert!(!policy.permits("https://evil.example/ai"));
    }

    #[test]
    fn wildcard_patterns_match_hosts() {
        let policy = OutboundPolicy::default().with_patterns(["*.oracle.internal"]);
        assert!(policy.permits("https://eu.oracle.internal/api"));
        assert!(!policy.permits("https://oracle.internal.evil.com/api"));
    }

    #[test]
    fn empty_policy_blocks_everything() {
        let policy = OutboundPolicy::default();
        assert!(!policy.permits("http://localhost:8000"));
        assert!(OutboundPolicy::permissive().permits("http://localhost:8000"));
    }

    #[test]
    fn unparseable_urls_are_refused() {
        assert!(!OutboundPolicy::permissive().permits("not a url"));
    }
}
