use std::collections::HashMap;
use std::sync::Arc;

use sieve::{
    analytics::CorpusAnalytics,
    config::Config,
    pipeline::{CrawlResponse, PagePipeline},
};

pub fn test_pipeline(config: &Config) -> (PagePipeline, Arc<CorpusAnalytics>) {
    let analytics = Arc::new(CorpusAnalytics::from_config(config));
    (PagePipeline::new(config, analytics.clone()), analytics)
}

/// An in-memory site standing in for the fetcher: known URLs answer with
/// HTML, everything else with a 404.
pub struct FakeSite {
    pages: HashMap<String, String>,
}

impl FakeSite {
    pub fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, body)| (url.to_string(), body.to_string()))
                .collect(),
        }
    }

    pub fn fetch(&self, url: &str) -> CrawlResponse {
        match self.pages.get(url) {
            Some(body) => CrawlResponse::new(url, 200)
                .with_header("Content-Type", "text/html; charset=utf-8")
                .with_body(body.clone()),
            None => CrawlResponse::new(url, 404),
        }
    }
}
