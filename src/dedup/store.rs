use dashmap::DashSet;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use crate::dedup::fingerprint::Fingerprint;

/// MD5 digest of a raw response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentChecksum([u8; 16]);

impl ContentChecksum {
    pub fn of(body: &[u8]) -> Self {
        ContentChecksum(md5::compute(body).0)
    }
}

impl Display for ContentChecksum {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// A stored fingerprint closer to the candidate than the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NearDuplicate {
    pub matched: Fingerprint,
    pub distance: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DedupStats {
    pub checksums: usize,
    pub fingerprints: usize,
}

/// Exact and near-duplicate content detection shared by all workers.
///
/// Both checks insert on a miss inside the same critical section as the
/// lookup, so two workers racing on the same content cannot both see it as
/// new. Near-duplicate lookup compares against every stored fingerprint,
/// which makes it linear in the number of unique pages seen.
pub struct ContentDeduplicator {
    checksums: DashSet<ContentChecksum>,
    fingerprints: Mutex<HashSet<Fingerprint>>,
    threshold: u32,
}

impl ContentDeduplicator {
    /// `threshold` is the Hamming distance strictly below which two pages
    /// count as near-duplicates.
    pub fn new(threshold: u32) -> Self {
        Self {
            checksums: DashSet::new(),
            fingerprints: Mutex::new(HashSet::new()),
            threshold,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Record `checksum`, returning `false` if it had been seen before.
    pub fn insert_checksum(&self, checksum: ContentChecksum) -> bool {
        self.checksums.insert(checksum)
    }

    /// Hash `body` and record it, returning `false` for an exact duplicate.
    pub fn insert_content(&self, body: &[u8]) -> bool {
        self.insert_checksum(ContentChecksum::of(body))
    }

    /// Compare `fingerprint` with every stored one. A near-duplicate is
    /// reported and not stored; anything else is stored.
    pub fn check_fingerprint(&self, fingerprint: Fingerprint) -> Option<NearDuplicate> {
        let mut fingerprints = self.fingerprints.lock();

        let near = fingerprints.iter().find_map(|stored| {
            let distance = fingerprint.hamming_distance(stored);
            (distance < self.threshold).then_some(NearDuplicate {
                matched: *stored,
                distance,
            })
        });

        if near.is_none() {
            fingerprints.insert(fingerprint);
        }
        near
    }

    pub fn stats(&self) -> DedupStats {
        DedupStats {
            checksums: self.checksums.len(),
            fingerprints: self.fingerprints.lock().len(),
        }
    }
}
