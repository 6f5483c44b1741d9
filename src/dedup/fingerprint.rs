//! Bit-vote similarity fingerprints.
//!
//! Every token is hashed to 128 bits; each bit position then votes +1 or -1
//! across the whole token multiset and the fingerprint keeps the bits that
//! did not lose. Pages that share most of their tokens end up a few bits
//! apart, so near-duplicates are found by Hamming distance.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const FINGERPRINT_BITS: u32 = u128::BITS;

const MULTIPLIER: u128 = 1_000_003;
// All bits set is reserved; a hash landing on it is moved one step down.
const RESERVED: u128 = u128::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(pub u128);

impl Fingerprint {
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut votes = [0i64; FINGERPRINT_BITS as usize];

        for token in tokens {
            let hash = token_hash(token.as_ref());
            for (bit, vote) in votes.iter_mut().enumerate() {
                if hash & (1u128 << bit) != 0 {
                    *vote += 1;
                } else {
                    *vote -= 1;
                }
            }
        }

        let bits = votes
            .iter()
            .enumerate()
            .filter(|(_, vote)| **vote >= 0)
            .fold(0u128, |acc, (bit, _)| acc | (1u128 << bit));

        Fingerprint(bits)
    }

    pub fn hamming_distance(&self, other: &Fingerprint) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// 128-bit multiplicative string hash. Arithmetic wraps, which is the same
/// as masking to 128 bits.
pub fn token_hash(token: &str) -> u128 {
    let Some(first) = token.chars().next() else {
        return 0;
    };

    let mut x = (first as u128) << 7;
    let mut length = 0u128;
    for c in token.chars() {
        x = x.wrapping_mul(MULTIPLIER) ^ (c as u128);
        length += 1;
    }
    x ^= length;

    if x == RESERVED { RESERVED - 1 } else { x }
}
