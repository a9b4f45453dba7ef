//! Shared constants and value types for the Base-Delta-Immediate codec.

/// Candidate base-lane widths tried during search, narrowest first.
pub const BASE_WIDTHS: [u8; 3] = [2, 4, 8];

/// A single searched-and-kept BDI candidate: the best (k, base) pair found so
/// far, together with everything needed to re-encode it for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BdiCandidate {
    /// Lane width in bytes (2, 4, or 8).
    pub k: u8,
    /// The chosen base value, zero-extended to 64 bits.
    pub base: u64,
    /// Max byte-width of any delta encoded against `base`.
    pub delta_size_base: u8,
    /// Max byte-width of any delta encoded against zero (the "immediate" path).
    pub delta_size_immd: u8,
    /// Per-lane selector: `true` = encoded against `base`, `false` = immediate.
    pub selector: Vec<bool>,
    /// Deltas for lanes where `selector[i] == true`, in lane order.
    pub delta_base: Vec<u64>,
    /// Deltas for lanes where `selector[i] == false`, in lane order.
    pub delta_immd: Vec<u64>,
}

impl BdiCandidate {
    pub fn num_lanes(&self) -> usize {
        self.selector.len()
    }
}

/// Outcome of a BDI search over one cacheline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BdiResult {
    /// Best compressed size found, in bytes. Equals the line length when no
    /// candidate beat the raw size ("incompressible").
    pub compressed_size: usize,
    /// The winning candidate, or `None` when incompressible.
    pub candidate: Option<BdiCandidate>,
}

impl BdiResult {
    pub fn is_incompressible(&self, line_len: usize) -> bool {
        self.compressed_size >= line_len
    }
}

/// Reinterprets `line` as `line.len() / k` little-endian unsigned lanes of
/// width `k` bytes, zero-extended to `u64`.
///
/// Panics if `line.len()` is not a multiple of `k` — callers only ever drive
/// this with `k` chosen from [`BASE_WIDTHS`] against a cacheline-sized input.
pub fn lanes_of_width(line: &[u8], k: u8) -> Vec<u64> {
    let k = k as usize;
    assert_eq!(line.len() % k, 0, "line length not a multiple of lane width");
    line.chunks_exact(k)
        .map(|chunk| {
            let mut v: u64 = 0;
            for (i, byte) in chunk.iter().enumerate() {
                v |= (*byte as u64) << (8 * i);
            }
            v
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lanes_of_width_little_endian() {
        let line = [0x34, 0x12, 0x00, 0x00];
        assert_eq!(lanes_of_width(&line, 2), vec![0x1234, 0x0000]);
        assert_eq!(lanes_of_width(&line, 4), vec![0x0000_1234]);
    }
}
