//! Replays captured fetcher responses through the page pipeline and prints
//! the end-of-crawl report.
//!
//! Usage: `replay <responses.jsonl> [--json]`
//!
//! Each line of the input is one JSON object:
//! `{"url": ..., "resolved_url": ..., "status": 200, "headers": {...}, "body": "..."}`
//! where everything but `url` and `status` is optional.

use anyhow::{Context, Result};
use serde::Deserialize;
use sieve::{
    analytics::CorpusAnalytics,
    config::Config,
    pipeline::{CrawlResponse, PageOutcome, PagePipeline, PipelineError},
};
use std::{collections::HashMap, env, path::Path, sync::Arc};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
    sync::Semaphore,
    task::JoinSet,
};
use tracing::{debug, error, info, warn};

const ENV_WORKER_CONCURRENCY: &str = "WORKER_CONCURRENCY";
const DEFAULT_WORKER_CONCURRENCY: usize = 4;

#[derive(Debug, Deserialize)]
struct CapturedResponse {
    url: String,
    #[serde(default)]
    resolved_url: Option<String>,
    status: u16,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    body: Option<String>,
}

impl CapturedResponse {
    fn into_response(self) -> (String, CrawlResponse) {
        let mut response = CrawlResponse::new(self.url.clone(), self.status);
        if let Some(resolved) = self.resolved_url {
            response = response.with_resolved_url(resolved);
        }
        response.headers = self.headers;
        response.body = self.body.map(Into::into);
        (self.url, response)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ReplaySummary {
    pages: usize,
    admitted: usize,
    duplicates: usize,
    skipped: usize,
    links: usize,
    failed: usize,
    malformed_lines: usize,
}

impl ReplaySummary {
    fn record(&mut self, outcome: &PageOutcome) {
        self.pages += 1;
        match outcome {
            PageOutcome::Admitted { links, .. } => {
                self.admitted += 1;
                self.links += links.len();
            }
            PageOutcome::Duplicate(_) => self.duplicates += 1,
            PageOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}

async fn replay(
    path: &Path,
    pipeline: Arc<PagePipeline>,
    concurrency: usize,
) -> Result<ReplaySummary> {
    let file = File::open(path)
        .await
        .with_context(|| format!("cannot open {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut workers = JoinSet::new();
    let mut summary = ReplaySummary::default();
    let mut line_number = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }
        let captured: CapturedResponse = match serde_json::from_str(&line) {
            Ok(captured) => captured,
            Err(e) => {
                warn!("skipping line {}: {}", line_number, e);
                summary.malformed_lines += 1;
                continue;
            }
        };

        let permit = semaphore.clone().acquire_owned().await?;
        let pipeline = pipeline.clone();
        workers.spawn_blocking(move || {
            let _permit = permit;
            let (url, response) = captured.into_response();
            let outcome = pipeline.process(&url, &response);
            (url, outcome)
        });

        // Drain finished workers so results do not pile up.
        while let Some(joined) = workers.try_join_next() {
            record(&mut summary, joined?);
        }
    }

    while let Some(joined) = workers.join_next().await {
        record(&mut summary, joined?);
    }

    Ok(summary)
}

fn record(
    summary: &mut ReplaySummary,
    (url, outcome): (String, Result<PageOutcome, PipelineError>),
) {
    match outcome {
        Ok(outcome) => {
            debug!(url = %url, ?outcome, "processed");
            summary.record(&outcome);
        }
        Err(e) => {
            error!(url = %url, "pipeline failed: {}", e);
            summary.failed += 1;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let path = args
        .next()
        .context("usage: replay <responses.jsonl> [--json]")?;
    let as_json = args.any(|arg| arg == "--json");

    let config = Config::from_env()?;
    let concurrency = env::var(ENV_WORKER_CONCURRENCY)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_WORKER_CONCURRENCY);

    let analytics = Arc::new(CorpusAnalytics::from_config(&config));
    let pipeline = Arc::new(PagePipeline::new(&config, analytics.clone()));

    info!("Replaying {} with {} workers", path, concurrency);
    let summary = replay(Path::new(&path), pipeline.clone(), concurrency).await?;
    let dedup = pipeline.dedup_stats();
    info!(
        "Replay finished - pages: {}, admitted: {}, duplicates: {}, skipped: {}, failed: {}, links: {}, checksums: {}, fingerprints: {}",
        summary.pages,
        summary.admitted,
        summary.duplicates,
        summary.skipped,
        summary.failed,
        summary.links,
        dedup.checksums,
        dedup.fingerprints
    );

    let report = analytics.report(config.top_words());
    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }

    Ok(())
}
