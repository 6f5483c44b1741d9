#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

use sieve::admission::normalize;
use sieve::analytics::CorpusAnalytics;
use sieve::config::Config;
use sieve::pipeline::{CrawlResponse, PagePipeline};

fuzz_target!(|data: &[u8]| {
    let config = Config::default();
    let pipeline = PagePipeline::new(&config, Arc::new(CorpusAnalytics::from_config(&config)));

    // Arbitrary bytes, including invalid UTF-8, must never panic the pipeline.
    let response = CrawlResponse::new("https://www.ics.uci.edu/fuzz", 200)
        .with_header("Content-Type", "text/html")
        .with_body(data.to_vec());

    if let Ok(links) = pipeline.scrape("https://www.ics.uci.edu/fuzz", &response) {
        for link in links {
            assert!(pipeline.filter().is_valid(&link));
            assert_eq!(normalize(&link), normalize(normalize(&link).as_str()));
        }
    }
});
