use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crate::admission::AdmissionError;
use crate::analytics::CorpusAnalytics;
use crate::config::Config;
use crate::dedup::DedupStats;
use crate::pipeline::{
    CrawlResponse, DuplicateKind, PageOutcome, PagePipeline, PipelineError, SkipReason,
};

const FACULTY_URL: &str = "https://www.ics.uci.edu/faculty/index.html";
const NEWS_URL: &str = "https://stat.uci.edu/news/";

fn pipeline() -> PagePipeline {
    let config = Config::default();
    PagePipeline::new(&config, Arc::new(CorpusAnalytics::from_config(&config)))
}

fn html_response(url: &str, body: impl Into<bytes::Bytes>) -> CrawlResponse {
    CrawlResponse::new(url, 200)
        .with_header("Content-Type", "text/html; charset=utf-8")
        .with_body(body)
}

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("src/pipeline/tests/fixtures/{name}"))
        .expect("Failed to read test fixture")
}

fn repeated_page(word: &str, times: usize, extra: &str) -> String {
    format!(
        "<html><body><p>{}{}</p></body></html>",
        format!("{word} ").repeat(times),
        extra
    )
}

#[test]
fn test_faculty_page_links_are_admitted_in_order() {
    let pipeline = pipeline();
    let response = html_response(FACULTY_URL, fixture("faculty.html"));

    let outcome = pipeline.process(FACULTY_URL, &response).unwrap();

    assert_eq!(
        outcome,
        PageOutcome::Admitted {
            links: vec![
                "https://www.ics.uci.edu/about".to_string(),
                "https://www.ics.uci.edu/faculty/index.html".to_string(),
                "https://www.ics.uci.edu/faculty/profiles/jdoe.html".to_string(),
                "https://cs.uci.edu/people".to_string(),
                "https://vision.ics.uci.edu/projects".to_string(),
            ],
            discovered: 12,
        }
    );

    let analytics = pipeline.analytics();
    assert!(analytics.contains(FACULTY_URL));
    assert_eq!(analytics.unique_pages(), 1);
    assert_eq!(analytics.domain_counts().get("www.ics.uci.edu"), Some(&1));
    assert!(
        analytics
            .get_top_words(50)
            .iter()
            .any(|w| w.word == "faculty")
    );
    assert!(analytics.get_top_words(500).iter().all(|w| w.word != "the"));
}

#[test]
fn test_script_and_style_text_is_not_counted() {
    let pipeline = pipeline();
    let url = "https://stat.uci.edu/seminars";
    let response = html_response(url, fixture("scripted.html"));

    let links = pipeline.scrape(url, &response).unwrap();
    assert_eq!(links, vec!["https://stat.uci.edu/seminars/fall"]);

    let analytics = pipeline.analytics();
    // seminar series statistics seminar weekly talks inference sampling fall schedule
    assert_eq!(analytics.page_word_count(url), Some(10));
    let words = analytics.get_top_words(100);
    for hidden in ["tracker", "color", "javascript", "var", "window", "event"] {
        assert!(words.iter().all(|w| w.word != hidden), "{hidden} was counted");
    }
    assert_eq!(words[0].word, "seminar");
    assert_eq!(words[0].count, 2);
}

#[test]
fn test_links_resolve_against_redirect_target() {
    let pipeline = pipeline();
    let response = CrawlResponse::new("https://stat.uci.edu/news", 200)
        .with_resolved_url(NEWS_URL)
        .with_header("content-type", "text/html")
        .with_body(fixture("news.html"));

    let links = pipeline.scrape("https://stat.uci.edu/news", &response).unwrap();

    assert_eq!(
        links,
        vec![
            "https://stat.uci.edu/seminars",
            "https://stat.uci.edu/news/archive/2023.html",
        ]
    );
    // Analytics are keyed by the requested URL.
    assert!(pipeline.analytics().contains("https://stat.uci.edu/news"));
}

#[test]
fn test_identical_content_is_an_exact_duplicate() {
    let pipeline = pipeline();
    let body = fixture("faculty.html");

    let first = pipeline.process(FACULTY_URL, &html_response(FACULTY_URL, body.clone()));
    assert!(first.unwrap().is_admitted());

    let mirror = "https://www.ics.uci.edu/mirror/faculty.html";
    let second = pipeline.process(mirror, &html_response(mirror, body)).unwrap();

    assert_eq!(second, PageOutcome::Duplicate(DuplicateKind::Exact));
    assert!(!pipeline.analytics().contains(mirror));
    assert_eq!(pipeline.analytics().unique_pages(), 1);
    assert_eq!(
        pipeline.dedup_stats(),
        DedupStats {
            checksums: 1,
            fingerprints: 1
        }
    );
}

#[test]
fn test_one_extra_word_is_a_near_duplicate() {
    let pipeline = pipeline();
    let original = "https://www.ics.uci.edu/a";
    let copy = "https://www.ics.uci.edu/b";

    let first = pipeline
        .process(original, &html_response(original, repeated_page("research", 500, "")))
        .unwrap();
    assert!(first.is_admitted());

    let second = pipeline
        .process(copy, &html_response(copy, repeated_page("research", 500, "seminar")))
        .unwrap();

    assert!(matches!(
        second,
        PageOutcome::Duplicate(DuplicateKind::Near { distance }) if distance < 5
    ));
    assert!(!pipeline.analytics().contains(copy));
    assert_eq!(
        pipeline
            .analytics()
            .get_top_words(10)
            .iter()
            .find(|w| w.word == "research")
            .map(|w| w.count),
        Some(500)
    );
    assert_eq!(pipeline.dedup_stats().checksums, 2);
    assert_eq!(pipeline.dedup_stats().fingerprints, 1);
}

#[test]
fn test_unrelated_pages_are_both_admitted() {
    let pipeline = pipeline();
    let faculty = html_response(FACULTY_URL, fixture("faculty.html"));
    let news = CrawlResponse::new(NEWS_URL, 200)
        .with_header("Content-Type", "text/html")
        .with_body(fixture("news.html"));

    assert!(pipeline.process(FACULTY_URL, &faculty).unwrap().is_admitted());
    assert!(pipeline.process(NEWS_URL, &news).unwrap().is_admitted());
    assert_eq!(pipeline.analytics().unique_pages(), 2);
    assert_eq!(pipeline.dedup_stats().fingerprints, 2);
}

#[test]
fn test_filtered_responses_touch_no_state() {
    let pipeline = pipeline();
    let url = "https://www.ics.uci.edu/x";

    let not_found = CrawlResponse::new(url, 404)
        .with_header("Content-Type", "text/html")
        .with_body("<html>missing</html>");
    assert_eq!(
        pipeline.process(url, &not_found).unwrap(),
        PageOutcome::Skipped(SkipReason::Status(404))
    );

    let no_body = CrawlResponse::new(url, 200).with_header("Content-Type", "text/html");
    assert_eq!(
        pipeline.process(url, &no_body).unwrap(),
        PageOutcome::Skipped(SkipReason::MissingBody)
    );

    let pdf = CrawlResponse::new(url, 200)
        .with_header("Content-Type", "application/pdf")
        .with_body(&b"%PDF-1.7"[..]);
    assert_eq!(
        pipeline.process(url, &pdf).unwrap(),
        PageOutcome::Skipped(SkipReason::NotHtml("application/pdf".to_string()))
    );

    let untyped = CrawlResponse::new(url, 200).with_body("<html></html>");
    assert_eq!(
        pipeline.process(url, &untyped).unwrap(),
        PageOutcome::Skipped(SkipReason::NotHtml(String::new()))
    );

    assert_eq!(
        pipeline.dedup_stats(),
        DedupStats {
            checksums: 0,
            fingerprints: 0
        }
    );
    assert_eq!(pipeline.analytics().unique_pages(), 0);
}

#[test]
fn test_revisited_url_is_skipped_before_dedup() {
    let pipeline = pipeline();
    let first = html_response(FACULTY_URL, fixture("faculty.html"));
    assert!(pipeline.process(FACULTY_URL, &first).unwrap().is_admitted());

    let changed = html_response(FACULTY_URL, fixture("news.html"));
    let revisit = "https://www.ics.uci.edu/faculty/index.html#staff";
    assert_eq!(
        pipeline.process(revisit, &changed).unwrap(),
        PageOutcome::Skipped(SkipReason::AlreadyVisited)
    );
    assert_eq!(pipeline.dedup_stats().checksums, 1);
}

#[test]
fn test_stray_bytes_do_not_drop_the_page() {
    let pipeline = pipeline();
    let url = "https://www.ics.uci.edu/menu";
    let response = html_response(
        url,
        &b"<html><body><p>Caf\xe9 menu</p><a href='/next'>next</a></body></html>"[..],
    );

    assert_eq!(
        pipeline.process(url, &response).unwrap(),
        PageOutcome::Admitted {
            links: vec!["https://www.ics.uci.edu/next".to_string()],
            discovered: 1,
        }
    );
    // The invalid byte splits the word instead of hiding the page.
    assert_eq!(pipeline.analytics().page_word_count(url), Some(3));
    assert!(
        pipeline
            .analytics()
            .get_top_words(10)
            .iter()
            .any(|w| w.word == "caf")
    );
}

#[test]
fn test_malformed_markup_still_admits() {
    let pipeline = pipeline();
    let url = "https://www.ics.uci.edu/messy";
    let html = "<html><body><p>Unclosed <div>tags <a href='/ok/'>ok<a href=/also>also";

    let links = pipeline.scrape(url, &html_response(url, html)).unwrap();

    assert_eq!(
        links,
        vec!["https://www.ics.uci.edu/ok", "https://www.ics.uci.edu/also"]
    );
}

#[test]
fn test_concurrent_workers_admit_same_content_once() {
    let pipeline = pipeline();
    let body = fixture("faculty.html");
    let admitted = AtomicUsize::new(0);

    thread::scope(|scope| {
        for worker in 0..8 {
            let pipeline = &pipeline;
            let body = body.clone();
            let admitted = &admitted;
            scope.spawn(move || {
                let url = format!("https://www.ics.uci.edu/copy/{worker}");
                let outcome = pipeline.process(&url, &html_response(&url, body)).unwrap();
                if outcome.is_admitted() {
                    admitted.fetch_add(1, Ordering::SeqCst);
                }
            });
        }
    });

    assert_eq!(admitted.load(Ordering::SeqCst), 1);
    assert_eq!(pipeline.analytics().unique_pages(), 1);
}

#[test]
fn test_malformed_link_is_a_pipeline_error() {
    let pipeline = pipeline();
    let extracted = vec![
        "https://www.ics.uci.edu/ok".to_string(),
        "http://[not-an-ip/".to_string(),
    ];

    let err = pipeline.admit_links(extracted).unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Admission(AdmissionError::MalformedUrl { ref url, .. })
            if url == "http://[not-an-ip/"
    ));
    assert!(err.to_string().contains("http://[not-an-ip/"));
}

#[test]
fn test_admit_links_keeps_order_and_drops_rejected() {
    let pipeline = pipeline();
    let links = pipeline
        .admit_links(vec![
            "https://stat.uci.edu/b".to_string(),
            "https://example.com/".to_string(),
            "https://www.ics.uci.edu/a".to_string(),
            "https://www.ics.uci.edu/events/2024".to_string(),
        ])
        .unwrap();
    assert_eq!(links, vec!["https://stat.uci.edu/b", "https://www.ics.uci.edu/a"]);
}
