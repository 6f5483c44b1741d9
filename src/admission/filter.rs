use std::collections::HashSet;
use url::Url;

use crate::admission::errors::AdmissionError;
use crate::config::AdmissionPolicy;

/// Decides whether a discovered URL is eligible for crawling.
///
/// The filter is immutable after construction, so one instance can be shared
/// by every worker without synchronization.
#[derive(Debug, Clone)]
pub struct AdmissionFilter {
    allowed_domains: Vec<String>,
    denied_path_fragments: Vec<String>,
    blocked_query_fragments: Vec<String>,
    blocked_extensions: HashSet<String>,
}

fn lowered(entries: &[String]) -> impl Iterator<Item = String> + '_ {
    entries
        .iter()
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
}

// Domains and extensions may be configured with a leading dot.
fn lowered_undotted(entries: &[String]) -> impl Iterator<Item = String> + '_ {
    lowered(entries)
        .map(|entry| entry.trim_start_matches('.').to_string())
        .filter(|entry| !entry.is_empty())
}

impl AdmissionFilter {
    pub fn new(policy: &AdmissionPolicy) -> Self {
        Self {
            allowed_domains: lowered_undotted(&policy.allowed_domains).collect(),
            denied_path_fragments: lowered(&policy.denied_path_fragments).collect(),
            blocked_query_fragments: lowered(&policy.blocked_query_fragments).collect(),
            blocked_extensions: lowered_undotted(&policy.blocked_extensions).collect(),
        }
    }

    /// Admission check for a URL handed over by the link extractor.
    ///
    /// This is the contract boundary for extracted links. They reach the
    /// filter already resolved to absolute URLs, so one that does not parse
    /// is reported instead of being quietly dropped. Links produced by
    /// [`extract_links`](crate::extractor::extract_links) always parse;
    /// callers holding arbitrary strings want [`is_valid`](Self::is_valid).
    pub fn check(&self, raw: &str) -> Result<bool, AdmissionError> {
        let url = Url::parse(raw).map_err(|source| AdmissionError::MalformedUrl {
            url: raw.to_string(),
            source,
        })?;
        Ok(self.admits(&url))
    }

    /// Plain predicate form of [`check`](Self::check): unparseable input is
    /// not admitted.
    pub fn is_valid(&self, raw: &str) -> bool {
        self.check(raw).unwrap_or(false)
    }

    pub fn admits(&self, url: &Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }

        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        if !self
            .allowed_domains
            .iter()
            .any(|domain| is_same_or_subdomain(&host, domain))
        {
            return false;
        }

        let path = url.path().to_lowercase();
        if self
            .denied_path_fragments
            .iter()
            .any(|fragment| path.contains(fragment.as_str()))
        {
            return false;
        }

        let query = url.query().unwrap_or_default().to_lowercase();
        if self
            .blocked_query_fragments
            .iter()
            .any(|fragment| query.contains(fragment.as_str()))
        {
            return false;
        }

        !self.has_blocked_extension(&path)
    }

    fn has_blocked_extension(&self, path: &str) -> bool {
        let last_segment = path.rsplit('/').next().unwrap_or_default();
        match last_segment.rsplit_once('.') {
            Some((_, extension)) => self.blocked_extensions.contains(extension),
            None => false,
        }
    }
}

fn is_same_or_subdomain(host: &str, domain: &str) -> bool {
    match host.strip_suffix(domain) {
        Some(rest) => rest.is_empty() || rest.ends_with('.'),
        None => false,
    }
}
