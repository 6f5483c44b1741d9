pub mod admission;
pub mod analytics;
pub mod config;
pub mod dedup;
pub mod extractor;
pub mod pipeline;
