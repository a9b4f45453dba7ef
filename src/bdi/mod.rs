//! Base-Delta-Immediate (BDI) cacheline compression.
//!
//! Searches every lane width in `{2,4,8}` bytes and every lane of that width
//! as a candidate base, picks whichever (width, base) pair yields the
//! smallest encoding, and verifies the winner round-trips byte-exactly before
//! handing its size to the flip accountant.

mod codec;
mod types;
mod verify;

pub use codec::{compressed_size, search};
pub use types::{lanes_of_width, BdiCandidate, BdiResult, BASE_WIDTHS};
pub use verify::{decode, encode, roundtrip_or_bug};

/// Runs [`search`] on `line` and verifies the winning candidate (if any)
/// round-trips exactly, panicking via [`crate::codec_bug`] if it doesn't.
///
/// This is the entry point [`crate::flip`] calls; [`search`] alone is exposed
/// for benchmarking and tests that don't need the verification pass.
pub fn compress_verified(line: &[u8]) -> BdiResult {
    let result = search(line);
    if let Some(candidate) = &result.candidate {
        let original = lanes_of_width(line, candidate.k);
        roundtrip_or_bug(candidate, &original);
    }
    result
}
