use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use url::Url;

/// Canonical key for a URL: scheme, host, path and query with the fragment
/// removed and trailing slashes trimmed from non-root paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NormalizedUrl {
    key: String,
    host: Option<String>,
}

impl NormalizedUrl {
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Lowercased host, when the input was an absolute URL with one.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn into_string(self) -> String {
        self.key
    }
}

impl Display for NormalizedUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key)
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        &self.key
    }
}

/// Canonicalize `raw` for use as a dedup/admission key.
///
/// Total and idempotent. Input the URL parser rejects is still keyed: the
/// fragment is cut textually and the same slash policy applies, with any
/// whitespace mixed into the trailing slashes trimmed along with them.
pub fn normalize(raw: &str) -> NormalizedUrl {
    let raw = raw.trim();
    match Url::parse(raw) {
        Ok(mut url) => {
            url.set_fragment(None);
            if !url.cannot_be_a_base() {
                let path = url.path();
                if path.len() > 1 && path.ends_with('/') {
                    let trimmed = path.trim_end_matches('/');
                    let trimmed = if trimmed.is_empty() { "/" } else { trimmed }.to_string();
                    url.set_path(&trimmed);
                }
            }
            let host = url.host_str().map(str::to_ascii_lowercase);
            NormalizedUrl {
                key: url.into(),
                host,
            }
        }
        Err(_) => {
            let without_fragment = raw.split('#').next().unwrap_or_default();
            NormalizedUrl {
                key: without_fragment
                    .trim_end_matches(|c: char| c == '/' || c.is_whitespace())
                    .to_string(),
                host: None,
            }
        }
    }
}
