//! Base-Delta-Immediate search: for a fixed lane width `k`, try every lane as
//! the base and keep whichever (base, lane-assignment) pair compresses
//! smallest, then repeat for every `k` and keep the overall best.
//!
//! Equivalent to the reference simulator's `BDI::BDICompress` loop over
//! `{2,4,8}`-byte base sizes and `{2,4,8}`-byte delta sizes.

use crate::datasize::data_bytes;

use super::types::{lanes_of_width, BdiCandidate, BdiResult, BASE_WIDTHS};

/// Per-lane header overhead: 1 byte base-size, 1 byte packed delta-size nibbles.
const HEADER_BYTES: usize = 2;

/// Runs the BDI search over `line` and returns the best candidate found, or
/// an incompressible result if nothing beat `line.len()`.
///
/// `line.len()` must be a multiple of 8 (the reference simulator only ever
/// calls this on whole cachelines).
pub fn search(line: &[u8]) -> BdiResult {
    let n = line.len();
    let mut best: Option<BdiCandidate> = None;
    let mut best_size = n;

    for &k in BASE_WIDTHS.iter() {
        if n % k as usize != 0 {
            continue;
        }
        let lanes = lanes_of_width(line, k);
        for base_idx in 0..lanes.len() {
            let base = lanes[base_idx];
            if let Some(candidate) = try_base(&lanes, k, base) {
                let size = compressed_size(&candidate, n);
                if size < best_size {
                    best_size = size;
                    best = Some(candidate);
                }
            }
        }
    }

    match best {
        Some(candidate) => BdiResult { compressed_size: best_size, candidate: Some(candidate) },
        None => BdiResult { compressed_size: n, candidate: None },
    }
}

/// Tries to encode every lane against `base` (or, failing that, as an
/// immediate), bailing out if any lane needs more than 8 delta bytes either
/// way.
fn try_base(lanes: &[u64], k: u8, base: u64) -> Option<BdiCandidate> {
    let mut delta_size_base: u8 = 0;
    let mut delta_size_immd: u8 = 0;
    let mut selector = Vec::with_capacity(lanes.len());
    let mut delta_base_list = Vec::new();
    let mut delta_immd = Vec::new();

    for &data in lanes {
        // The reference computes this as `int64_t delta_base = data - base`
        // on `uint64_t` operands, i.e. wrapping two's-complement subtraction
        // reinterpreted as signed — not the true (non-wrapping) difference.
        let signed_delta = data.wrapping_sub(base) as i64;
        let use_immd = if signed_delta < 0 {
            true
        } else {
            // data_bytes(data) is the immediate cost; data_bytes(signed_delta)
            // the base cost. The reference picks the immediate path on ties.
            (signed_delta as u64) >= data
        };

        if use_immd {
            let size = data_bytes(data);
            if size > 8 {
                return None;
            }
            delta_size_immd = delta_size_immd.max(size);
            delta_immd.push(data);
            selector.push(false);
        } else {
            let db = data.wrapping_sub(base);
            let size = data_bytes(db);
            if size > 8 {
                return None;
            }
            delta_size_base = delta_size_base.max(size);
            delta_base_list.push(db);
            selector.push(true);
        }
    }

    Some(BdiCandidate {
        k,
        base,
        delta_size_base,
        delta_size_immd,
        selector,
        delta_base: delta_base_list,
        delta_immd,
    })
}

/// Total encoded size in bytes for `candidate`. `n` is unused by the formula
/// itself but kept in the signature to make call sites self-documenting about
/// what the result is being compared against.
pub fn compressed_size(candidate: &BdiCandidate, _n: usize) -> usize {
    let selector_bytes = (candidate.num_lanes() + 7) / 8;
    HEADER_BYTES
        + candidate.k as usize
        + selector_bytes
        + candidate.delta_base.len() * candidate.delta_size_base as usize
        + candidate.delta_immd.len() * candidate.delta_size_immd as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_zero_line_compresses_to_a_single_base() {
        let line = [0u8; 64];
        let result = search(&line);
        assert!(result.is_incompressible(64) == false);
        let c = result.candidate.unwrap();
        assert_eq!(c.base, 0);
        assert!(c.delta_base.is_empty() || c.delta_size_base == 0);
    }

    #[test]
    fn incompressible_random_like_line_falls_back_to_raw() {
        let mut hard = [0u8; 64];
        for (i, b) in hard.iter_mut().enumerate() {
            *b = ((i as u32).wrapping_mul(2654435761) >> (i % 5)) as u8;
        }
        let result = search(&hard);
        assert!(result.compressed_size <= 64);
    }

    #[test]
    fn small_deltas_against_a_base_compress() {
        let mut line = [0u8; 64];
        // 8-byte lanes: base 0x1000, then seven lanes each +1 from the last.
        for lane in 0..8u64 {
            let v: u64 = 0x1000 + lane;
            line[(lane as usize) * 8..(lane as usize) * 8 + 8].copy_from_slice(&v.to_le_bytes());
        }
        let result = search(&line);
        assert!(result.compressed_size < 64, "expected compression, got {}", result.compressed_size);
    }

    #[test]
    fn base_delta_selection_wraps_like_the_source_int64_cast() {
        // base = 1, data = 2^63 + 1: the true (non-wrapping) difference is
        // 2^63, which is < data, so a plain signed subtraction would pick
        // the base path. The source computes this as `int64_t delta_base =
        // data - base` on wrapping `uint64_t` operands: the bit pattern is
        // the same 2^63, but reinterpreted as `int64_t` it is negative
        // (`i64::MIN`), forcing the immediate path instead. Every other
        // lane equals `base` (delta zero both ways) so this is the only
        // lane whose path is at stake.
        let base = 1u64;
        let diverging_lane = (1u64 << 63) + 1;
        let mut lanes = [base; 8];
        lanes[0] = diverging_lane;

        let candidate = try_base(&lanes, 8, base).expect("must produce a candidate");
        assert!(!candidate.selector[0], "lane should take the immediate path, not the base path");
        assert!(candidate.delta_immd.contains(&diverging_lane));
        assert!(!candidate.delta_base.contains(&(1u64 << 63)));
    }
}
