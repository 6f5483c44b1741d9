//! Configuration handling for the admission core.
//!
//! Trap signatures are site-specific, so every policy table the admission
//! filter and deduplicator consult comes from here rather than from literals
//! in the filtering code. `Config::from_env` reads an optional JSON policy
//! file and then applies individual environment overrides on top of it,
//! falling back to the defaults the crawler was originally tuned with.

use serde::{Deserialize, Serialize};
use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

use crate::dedup::FINGERPRINT_BITS;

/// Environment variable names. Public so the replay driver and tests can
/// refer to them.
pub const ENV_CONFIG_PATH: &str = "SIEVE_CONFIG_PATH";
pub const ENV_NEAR_DUPLICATE_THRESHOLD: &str = "NEAR_DUPLICATE_THRESHOLD";
pub const ENV_TRACKED_DOMAIN_SUFFIX: &str = "TRACKED_DOMAIN_SUFFIX";
pub const ENV_REPORT_TOP_WORDS: &str = "REPORT_TOP_WORDS";

const DEFAULT_NEAR_DUPLICATE_THRESHOLD: u32 = 5;
const DEFAULT_TRACKED_DOMAIN_SUFFIX: &str = ".uci.edu";
const DEFAULT_TOP_WORDS: usize = 50;

const DEFAULT_ALLOWED_DOMAINS: &[&str] = &[
    "ics.uci.edu",
    "cs.uci.edu",
    "informatics.uci.edu",
    "stat.uci.edu",
];

const DEFAULT_DENIED_PATH_FRAGMENTS: &[&str] = &[
    "calendar", "event", "events", "commit", "pix", "tags", "tree", "doku.php",
];

const DEFAULT_BLOCKED_QUERY_FRAGMENTS: &[&str] = &[
    "do=",
    "tab_",
    "image=",
    "idx=",
    "action=",
    "controller=",
    "commit=",
    "view=",
    "from=",
    "precision=",
    "p=",
    "page_id=",
    "share=",
    "redirect_to=",
];

const DEFAULT_BLOCKED_EXTENSIONS: &[&str] = &[
    "css", "js", "bmp", "gif", "jpg", "jpeg", "ico", "png", "tif", "tiff", "mid", "mp2", "mp3",
    "mp4", "wav", "avi", "mov", "mpeg", "ram", "m4v", "mkv", "ogg", "ogv", "pdf", "ps", "eps",
    "tex", "ppt", "pptx", "doc", "docx", "xls", "xlsx", "names", "data", "dat", "exe", "bz2",
    "tar", "msi", "bin", "7z", "psd", "dmg", "iso", "epub", "dll", "cnf", "tgz", "sha1", "thmx",
    "mso", "arff", "rtf", "jar", "csv", "rm", "smil", "wmv", "swf", "wma", "zip", "rar", "gz",
];

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Policy tables consulted by the admission filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionPolicy {
    /// Hosts that may be crawled, together with all of their subdomains.
    pub allowed_domains: Vec<String>,
    /// Substrings of a lowercased path that mark a crawler trap.
    pub denied_path_fragments: Vec<String>,
    /// Substrings of a lowercased query string that mark a crawler trap.
    pub blocked_query_fragments: Vec<String>,
    /// File extensions (without the dot) that are never HTML.
    pub blocked_extensions: Vec<String>,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            allowed_domains: to_strings(DEFAULT_ALLOWED_DOMAINS),
            denied_path_fragments: to_strings(DEFAULT_DENIED_PATH_FRAGMENTS),
            blocked_query_fragments: to_strings(DEFAULT_BLOCKED_QUERY_FRAGMENTS),
            blocked_extensions: to_strings(DEFAULT_BLOCKED_EXTENSIONS),
        }
    }
}

/// Runtime configuration of the admission core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    policy: AdmissionPolicy,
    near_duplicate_threshold: u32,
    tracked_domain_suffix: String,
    top_words: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: AdmissionPolicy::default(),
            near_duplicate_threshold: DEFAULT_NEAR_DUPLICATE_THRESHOLD,
            tracked_domain_suffix: DEFAULT_TRACKED_DOMAIN_SUFFIX.to_string(),
            top_words: DEFAULT_TOP_WORDS,
        }
    }
}

impl Config {
    /// Create a config explicitly. The result is validated.
    pub fn new(
        policy: AdmissionPolicy,
        near_duplicate_threshold: u32,
        tracked_domain_suffix: impl Into<String>,
        top_words: usize,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            policy,
            near_duplicate_threshold,
            tracked_domain_suffix: tracked_domain_suffix.into(),
            top_words,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load the policy file named by `SIEVE_CONFIG_PATH` (if set), then apply
    /// the individual environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match env::var(ENV_CONFIG_PATH) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path)?,
            _ => Self::default(),
        };

        if let Ok(raw) = env::var(ENV_NEAR_DUPLICATE_THRESHOLD) {
            config.near_duplicate_threshold =
                parse_var("near_duplicate_threshold", &raw)?;
        }
        if let Ok(raw) = env::var(ENV_TRACKED_DOMAIN_SUFFIX) {
            config.tracked_domain_suffix = raw.trim().to_string();
        }
        if let Ok(raw) = env::var(ENV_REPORT_TOP_WORDS) {
            config.top_words = parse_var("top_words", &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Read a JSON policy file. Keys that are absent keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&raw)
    }

    /// Parse a JSON policy document. Keys that are absent keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self
            .policy
            .allowed_domains
            .iter()
            .all(|d| d.trim().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                field: "allowed_domains",
                reason: "at least one domain must be allowed".to_string(),
            });
        }
        if self.near_duplicate_threshold > FINGERPRINT_BITS {
            return Err(ConfigError::InvalidValue {
                field: "near_duplicate_threshold",
                reason: format!(
                    "{} exceeds the fingerprint width of {} bits",
                    self.near_duplicate_threshold, FINGERPRINT_BITS
                ),
            });
        }
        Ok(())
    }

    /// Admission filter tables.
    pub fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }
    /// Hamming distance strictly below which two pages are near-duplicates.
    pub fn near_duplicate_threshold(&self) -> u32 {
        self.near_duplicate_threshold
    }
    /// Host suffix whose pages are counted per domain.
    pub fn tracked_domain_suffix(&self) -> &str {
        &self.tracked_domain_suffix
    }
    /// How many words the end-of-crawl report lists.
    pub fn top_words(&self) -> usize {
        self.top_words
    }
}

fn parse_var<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            field,
            reason: format!("'{}': {}", raw, e),
        })
}

/// Errors that can occur while building a configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// A value was present but unusable.
    InvalidValue { field: &'static str, reason: String },
    /// The policy file could not be read.
    Io { path: String, reason: String },
    /// The policy file is not valid JSON for this schema.
    Parse(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
            ConfigError::Io { path, reason } => {
                write!(f, "cannot read config file '{}': {}", path, reason)
            }
            ConfigError::Parse(reason) => write!(f, "malformed config file: {}", reason),
        }
    }
}

impl Error for ConfigError {}
