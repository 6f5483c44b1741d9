use scraper::Html;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::admission::AdmissionFilter;
use crate::analytics::CorpusAnalytics;
use crate::config::Config;
use crate::dedup::{ContentDeduplicator, DedupStats, Fingerprint};
use crate::extractor::{decode_body, extract_links, page_text, tokenize};
use crate::pipeline::errors::PipelineError;
use crate::pipeline::types::{CrawlResponse, DuplicateKind, PageOutcome, SkipReason};

/// Runs one fetched page through dedup, analytics and link admission.
///
/// One instance serves every worker; `process` takes `&self` and is safe to
/// call concurrently.
pub struct PagePipeline {
    filter: AdmissionFilter,
    dedup: ContentDeduplicator,
    analytics: Arc<CorpusAnalytics>,
}

fn is_html(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("text/html") || content_type.contains("application/xhtml")
}

impl PagePipeline {
    pub fn new(config: &Config, analytics: Arc<CorpusAnalytics>) -> Self {
        Self {
            filter: AdmissionFilter::new(config.policy()),
            dedup: ContentDeduplicator::new(config.near_duplicate_threshold()),
            analytics,
        }
    }

    pub fn filter(&self) -> &AdmissionFilter {
        &self.filter
    }

    pub fn analytics(&self) -> &Arc<CorpusAnalytics> {
        &self.analytics
    }

    pub fn dedup_stats(&self) -> DedupStats {
        self.dedup.stats()
    }

    /// Links to hand back to the frontier for `url`; empty for every page
    /// that is not admitted.
    pub fn scrape(&self, url: &str, response: &CrawlResponse) -> Result<Vec<String>, PipelineError> {
        Ok(self.process(url, response)?.into_links())
    }

    #[instrument(skip_all, fields(url = %url, status = response.status))]
    pub fn process(&self, url: &str, response: &CrawlResponse) -> Result<PageOutcome, PipelineError> {
        if response.status != 200 {
            return Ok(PageOutcome::Skipped(SkipReason::Status(response.status)));
        }
        let Some(body) = response.body.as_ref() else {
            return Ok(PageOutcome::Skipped(SkipReason::MissingBody));
        };
        let content_type = response.content_type().unwrap_or_default();
        if !is_html(content_type) {
            return Ok(PageOutcome::Skipped(SkipReason::NotHtml(
                content_type.to_string(),
            )));
        }
        if self.analytics.contains(url) {
            debug!("already recorded");
            return Ok(PageOutcome::Skipped(SkipReason::AlreadyVisited));
        }

        if !self.dedup.insert_content(body) {
            debug!("exact duplicate content");
            return Ok(PageOutcome::Duplicate(DuplicateKind::Exact));
        }

        let decoded = decode_body(content_type, body);
        if decoded.lossy {
            warn!(
                encoding = decoded.encoding.name(),
                "invalid byte sequences replaced while decoding"
            );
        }
        let document = Html::parse_document(&decoded.text);
        let tokens = tokenize(&page_text(&document));

        let fingerprint = Fingerprint::from_tokens(&tokens);
        if let Some(near) = self.dedup.check_fingerprint(fingerprint) {
            debug!(distance = near.distance, "near duplicate of {}", near.matched);
            return Ok(PageOutcome::Duplicate(DuplicateKind::Near {
                distance: near.distance,
            }));
        }

        if !self.analytics.add_url(url, &tokens) {
            debug!("recorded concurrently by another worker");
            return Ok(PageOutcome::Skipped(SkipReason::AlreadyVisited));
        }

        let Some(base) = Url::parse(&response.resolved_url)
            .or_else(|_| Url::parse(url))
            .ok()
        else {
            warn!("no usable base url, links dropped");
            return Ok(PageOutcome::Admitted {
                links: Vec::new(),
                discovered: 0,
            });
        };

        let extracted = extract_links(&document, &base);
        let discovered = extracted.len();
        let links = self.admit_links(extracted)?;

        debug!(
            words = tokens.len(),
            discovered,
            admitted = links.len(),
            "page admitted"
        );
        Ok(PageOutcome::Admitted { links, discovered })
    }

    /// Keep the links the admission filter accepts, in order.
    pub(crate) fn admit_links(&self, extracted: Vec<String>) -> Result<Vec<String>, PipelineError> {
        let mut links = Vec::with_capacity(extracted.len());
        for link in extracted {
            if self.filter.check(&link)? {
                links.push(link);
            }
        }
        Ok(links)
    }
}
