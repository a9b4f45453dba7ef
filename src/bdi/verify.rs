//! Byte-exact encode/decode round trip for a winning [`BdiCandidate`].
//!
//! This is the actual wire format used by [`crate::flip`] to size-bucket a
//! compressed line; [`decode`] exists so [`roundtrip_or_bug`] can assert the
//! encoding it chose actually reconstructs the original cacheline.

use super::types::BdiCandidate;

/// Encodes `candidate` into its compressed byte form.
///
/// Layout: `k` (1 byte), packed delta-size nibbles (1 byte, base in the high
/// nibble, immediate in the low nibble), `base` (`k` bytes, little-endian),
/// a selector bitmap (`ceil(lanes/8)` bytes, lane `i`'s bit at bit `i % 8` of
/// byte `i / 8`, set when lane `i` is base-encoded), then the base deltas and
/// immediate deltas, each little-endian at their respective widths, in lane
/// order within their group.
pub fn encode(candidate: &BdiCandidate) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(candidate.k);
    out.push((candidate.delta_size_base << 4) | (candidate.delta_size_immd & 0x0F));
    out.extend_from_slice(&candidate.base.to_le_bytes()[..candidate.k as usize]);

    let selector_bytes = (candidate.num_lanes() + 7) / 8;
    let mut bitmap = vec![0u8; selector_bytes];
    for (i, &is_base) in candidate.selector.iter().enumerate() {
        if is_base {
            bitmap[i / 8] |= 1 << (i % 8);
        }
    }
    out.extend_from_slice(&bitmap);

    for &d in &candidate.delta_base {
        out.extend_from_slice(&d.to_le_bytes()[..candidate.delta_size_base as usize]);
    }
    for &d in &candidate.delta_immd {
        out.extend_from_slice(&d.to_le_bytes()[..candidate.delta_size_immd as usize]);
    }
    out
}

/// Decodes a buffer produced by [`encode`] back into `num_lanes` lane values
/// (zero-extended `u64`s, in original lane order).
pub fn decode(bytes: &[u8], num_lanes: usize) -> Vec<u64> {
    let mut pos = 0usize;
    let k = bytes[pos] as usize;
    pos += 1;
    let nibbles = bytes[pos];
    pos += 1;
    let delta_size_base = (nibbles >> 4) as usize;
    let delta_size_immd = (nibbles & 0x0F) as usize;

    let mut base_bytes = [0u8; 8];
    base_bytes[..k].copy_from_slice(&bytes[pos..pos + k]);
    let base = u64::from_le_bytes(base_bytes);
    pos += k;

    let selector_bytes = (num_lanes + 7) / 8;
    let mut selector = vec![false; num_lanes];
    for i in 0..num_lanes {
        let byte = bytes[pos + i / 8];
        selector[i] = (byte >> (i % 8)) & 1 == 1;
    }
    pos += selector_bytes;

    let num_base = selector.iter().filter(|&&b| b).count();
    let num_immd = num_lanes - num_base;

    let mut base_deltas = Vec::with_capacity(num_base);
    for _ in 0..num_base {
        let mut buf = [0u8; 8];
        buf[..delta_size_base].copy_from_slice(&bytes[pos..pos + delta_size_base]);
        base_deltas.push(u64::from_le_bytes(buf));
        pos += delta_size_base;
    }

    let mut immd_deltas = Vec::with_capacity(num_immd);
    for _ in 0..num_immd {
        let mut buf = [0u8; 8];
        buf[..delta_size_immd].copy_from_slice(&bytes[pos..pos + delta_size_immd]);
        immd_deltas.push(u64::from_le_bytes(buf));
        pos += delta_size_immd;
    }

    let mut base_iter = base_deltas.into_iter();
    let mut immd_iter = immd_deltas.into_iter();
    selector
        .iter()
        .map(|&is_base| {
            if is_base {
                base.wrapping_add(base_iter.next().expect("selector/base-delta count mismatch"))
            } else {
                immd_iter.next().expect("selector/immd-delta count mismatch")
            }
        })
        .collect()
}

/// Encodes `candidate`, decodes the result, and panics via [`crate::codec_bug`]
/// if the round trip doesn't reproduce `original_lanes` exactly.
///
/// Returns the encoded bytes on success, since callers need them anyway.
pub fn roundtrip_or_bug(candidate: &BdiCandidate, original_lanes: &[u64]) -> Vec<u8> {
    let encoded = encode(candidate);
    let decoded = decode(&encoded, candidate.num_lanes());
    if decoded != original_lanes {
        crate::codec_bug!(
            "BDI round-trip mismatch: k={} base={:#x} decoded={:?} expected={:?}",
            candidate.k,
            candidate.base,
            decoded,
            original_lanes
        );
    }
    encoded
}
