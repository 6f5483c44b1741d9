pub mod counter;
pub mod report;

pub use counter::{CorpusAnalytics, LongestPage, WordCount};
pub use report::CrawlReport;
