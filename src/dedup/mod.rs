pub mod fingerprint;
pub mod store;

pub use fingerprint::{FINGERPRINT_BITS, Fingerprint, token_hash};
pub use store::{ContentChecksum, ContentDeduplicator, DedupStats, NearDuplicate};
