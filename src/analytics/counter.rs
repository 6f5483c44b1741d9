use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use crate::admission::normalize;
use crate::analytics::report::CrawlReport;
use crate::config::Config;
use crate::extractor::is_stopword;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongestPage {
    pub url: String,
    pub word_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

#[derive(Default)]
struct CorpusState {
    // Keys double as the set of visited pages.
    page_word_counts: HashMap<String, usize>,
    word_counts: HashMap<String, u64>,
    domain_counts: HashMap<String, usize>,
    longest: Option<LongestPage>,
}

impl CorpusState {
    fn top_words(&self, n: usize) -> Vec<WordCount> {
        let mut ranked: Vec<(&String, &u64)> = self.word_counts.iter().collect();
        // Highest count first; equal counts in lexicographic order.
        ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        ranked
            .into_iter()
            .take(n)
            .map(|(word, count)| WordCount {
                word: word.clone(),
                count: *count,
            })
            .collect()
    }

    fn domain_counts(&self) -> BTreeMap<String, usize> {
        self.domain_counts
            .iter()
            .map(|(domain, count)| (domain.clone(), *count))
            .collect()
    }
}

/// Corpus statistics shared by every worker of a crawl.
///
/// Created once at crawl start and handed to workers behind an `Arc`. All
/// reads and writes go through one lock, so every read is a consistent
/// snapshot.
pub struct CorpusAnalytics {
    state: Mutex<CorpusState>,
    tracked_domain_suffix: String,
}

impl CorpusAnalytics {
    pub fn new(tracked_domain_suffix: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(CorpusState::default()),
            tracked_domain_suffix: tracked_domain_suffix.into().trim().to_lowercase(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.tracked_domain_suffix())
    }

    fn is_tracked(&self, host: &str) -> bool {
        host.ends_with(&self.tracked_domain_suffix)
    }

    /// Record a page and its tokens. Stopwords are dropped before counting.
    ///
    /// Returns `false`, leaving every table untouched, when the normalized
    /// URL was recorded before.
    pub fn add_url<S: AsRef<str>>(&self, url: &str, tokens: &[S]) -> bool {
        let normalized = normalize(url);

        let mut page_counts: HashMap<&str, u64> = HashMap::new();
        let mut word_count = 0usize;
        for token in tokens.iter().map(AsRef::as_ref) {
            if is_stopword(token) {
                continue;
            }
            *page_counts.entry(token).or_insert(0) += 1;
            word_count += 1;
        }
        let tracked_domain = normalized.host().filter(|host| self.is_tracked(host));

        let mut state = self.state.lock();

        match state.page_word_counts.entry(normalized.as_str().to_string()) {
            Entry::Occupied(_) => return false,
            Entry::Vacant(slot) => {
                slot.insert(word_count);
            }
        }

        for (word, count) in page_counts {
            *state.word_counts.entry(word.to_string()).or_insert(0) += count;
        }

        if let Some(domain) = tracked_domain {
            *state.domain_counts.entry(domain.to_string()).or_insert(0) += 1;
        }

        if state
            .longest
            .as_ref()
            .is_none_or(|longest| word_count > longest.word_count)
        {
            state.longest = Some(LongestPage {
                url: normalized.into_string(),
                word_count,
            });
        }

        true
    }

    pub fn contains(&self, url: &str) -> bool {
        let normalized = normalize(url);
        self.state.lock()
            .page_word_counts
            .contains_key(normalized.as_str())
    }

    pub fn get_longest(&self) -> Option<LongestPage> {
        self.state.lock().longest.clone()
    }

    /// The `n` most frequent words; ties are ordered lexicographically.
    pub fn get_top_words(&self, n: usize) -> Vec<WordCount> {
        self.state.lock().top_words(n)
    }

    pub fn unique_pages(&self) -> usize {
        self.state.lock().page_word_counts.len()
    }

    pub fn page_word_count(&self, url: &str) -> Option<usize> {
        let normalized = normalize(url);
        self.state.lock()
            .page_word_counts
            .get(normalized.as_str())
            .copied()
    }

    /// Page counts of tracked domains, sorted by domain.
    pub fn domain_counts(&self) -> BTreeMap<String, usize> {
        self.state.lock().domain_counts()
    }

    /// End-of-crawl summary taken under a single lock acquisition.
    pub fn report(&self, top_words: usize) -> CrawlReport {
        let state = self.state.lock();
        CrawlReport::new(
            state.page_word_counts.len(),
            state.longest.clone(),
            state.top_words(top_words),
            state.domain_counts(),
        )
    }
}
