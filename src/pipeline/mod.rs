pub mod errors;
pub mod page;
pub mod types;

#[cfg(test)]
mod tests;

pub use errors::PipelineError;
pub use page::PagePipeline;
pub use types::{CrawlResponse, DuplicateKind, PageOutcome, SkipReason};
