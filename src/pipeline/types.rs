use bytes::Bytes;
use std::collections::HashMap;

/// A fetched page as handed over by the fetcher.
#[derive(Debug, Clone)]
pub struct CrawlResponse {
    pub requested_url: String,
    /// URL after redirects; relative links resolve against it.
    pub resolved_url: String,
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
}

impl CrawlResponse {
    pub fn new(requested_url: impl Into<String>, status: u16) -> Self {
        let requested_url = requested_url.into();
        Self {
            resolved_url: requested_url.clone(),
            requested_url,
            status,
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn with_resolved_url(mut self, resolved_url: impl Into<String>) -> Self {
        self.resolved_url = resolved_url.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Status(u16),
    MissingBody,
    NotHtml(String),
    AlreadyVisited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKind {
    Exact,
    Near { distance: u32 },
}

/// What the pipeline did with one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Filtered out before any dedup or analytics state was touched.
    Skipped(SkipReason),
    /// Dedup state updated; analytics untouched.
    Duplicate(DuplicateKind),
    /// Recorded in analytics. `links` holds the admitted outbound links in
    /// document order, `discovered` the number extracted before admission.
    Admitted { links: Vec<String>, discovered: usize },
}

impl PageOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(self, PageOutcome::Admitted { .. })
    }

    /// Links for the frontier; empty unless the page was admitted.
    pub fn into_links(self) -> Vec<String> {
        match self {
            PageOutcome::Admitted { links, .. } => links,
            _ => Vec::new(),
        }
    }
}
