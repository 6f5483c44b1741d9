pub mod errors;
pub mod filter;
pub mod normalize;

pub use errors::AdmissionError;
pub use filter::AdmissionFilter;
pub use normalize::{NormalizedUrl, normalize};
