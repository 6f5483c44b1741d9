use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use crate::analytics::counter::{LongestPage, WordCount};

/// End-of-crawl summary handed to whoever reports on the crawl.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub generated_at: DateTime<Utc>,
    pub unique_pages: usize,
    pub longest_page: Option<LongestPage>,
    pub top_words: Vec<WordCount>,
    pub domains: BTreeMap<String, usize>,
}

impl CrawlReport {
    pub fn new(
        unique_pages: usize,
        longest_page: Option<LongestPage>,
        top_words: Vec<WordCount>,
        domains: BTreeMap<String, usize>,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            unique_pages,
            longest_page,
            top_words,
            domains,
        }
    }
}

impl Display for CrawlReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Number of unique pages: {}", self.unique_pages)?;
        match &self.longest_page {
            Some(longest) => writeln!(
                f,
                "Longest page: {}, {} words",
                longest.url, longest.word_count
            )?,
            None => writeln!(f, "Longest page: none")?,
        }

        writeln!(f, "{} most common words:", self.top_words.len())?;
        for entry in &self.top_words {
            writeln!(f, "{}: {}", entry.word, entry.count)?;
        }

        writeln!(f, "Subdomains:")?;
        for (domain, count) in &self.domains {
            writeln!(f, "{}, {}", domain, count)?;
        }
        Ok(())
    }
}
