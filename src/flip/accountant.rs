//! Turns a cacheline's XOR into the column/bit-position tallies the write
//! policy selector attributes flips from.
//!
//! A "column" is 8 consecutive bytes; a line of `N` bytes has `N/8` of them.
//! Within a column, bit `s` (0 = LSB) of local byte `b` is tracked at the
//! flat position `b*8 + s` (0..63) — the same position is shared across all
//! columns, so the per-granularity stripe vectors describe a pattern common
//! to the whole line, not any one column.

/// Per-write flip tallies produced by [`analyze`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlipReport {
    /// Whether each 8-byte column had any flipped byte.
    pub columns_updated: Vec<bool>,
    /// `columns_updated.iter().filter(|c| **c).count()`.
    pub num_columns_updated: usize,
    /// Total set bits across the whole XOR line.
    pub naive_flip_count: u32,
    /// Per-position (0..63) flip counts, summed across all columns. Feeds
    /// the global `updateBit` accumulator directly.
    pub bit_position_counts: [u32; 64],
    /// Per-position (0..63) flip presence, OR'd across all columns. Feeds
    /// the per-granularity stripe vectors.
    pub position_union: [bool; 64],
}

impl FlipReport {
    /// Count of granularity-`g` stripes (each `g` positions wide, 64/g of
    /// them) with at least one flipped position in [`Self::position_union`].
    pub fn stripes_updated(&self, g: usize) -> usize {
        assert_eq!(64 % g, 0, "granularity must divide 64");
        self.position_union.chunks(g).filter(|stripe| stripe.iter().any(|&b| b)).count()
    }

    /// Vectorized flip count at granularity `g`: `columns_updated * g * stripesUpdated(g)`.
    pub fn vectorized(&self, g: usize) -> u32 {
        self.num_columns_updated as u32 * g as u32 * self.stripes_updated(g) as u32
    }

    /// The inline g=4 "first 14 / last 2" split used for `VectorUpdateBit`.
    ///
    /// Splits the 16-entry g=4 stripe vector into its first 14 entries and
    /// last 2, counts updated stripes in the first half but only ORs the
    /// last two (`n_last2` is 0 or 1, never 2 — the source increments
    /// `bitVectorNum_8` once if *either* of the last two stripes updated,
    /// not once per updated stripe), and combines them as
    /// `cols*4*n14 + cols*8*n_last2` — reproduced verbatim because the
    /// reference accumulator this feeds is defined by this exact arithmetic,
    /// not by a cleaner re-derivation of it.
    pub fn inline_vector_update_bit(&self) -> u32 {
        let stripe16: Vec<bool> =
            self.position_union.chunks(4).map(|stripe| stripe.iter().any(|&b| b)).collect();
        let n_first14 = stripe16[..14].iter().filter(|&&b| b).count();
        let n_last2 = (stripe16[14] || stripe16[15]) as u32;
        let cols = self.num_columns_updated as u32;
        cols * 4 * n_first14 as u32 + cols * 8 * n_last2
    }
}

/// Analyzes `xor` (a `xor_line` result) and returns its [`FlipReport`].
///
/// `xor.len()` must be a multiple of 8.
pub fn analyze(xor: &[u8]) -> FlipReport {
    assert_eq!(xor.len() % 8, 0, "line length not a multiple of 8");
    let num_columns = xor.len() / 8;

    let mut columns_updated = Vec::with_capacity(num_columns);
    let mut naive_flip_count: u32 = 0;
    let mut bit_position_counts = [0u32; 64];
    let mut position_union = [false; 64];

    for column in xor.chunks(8) {
        let mut updated = false;
        for (local_byte, &byte) in column.iter().enumerate() {
            if byte != 0 {
                updated = true;
            }
            for s in 0..8 {
                if (byte >> s) & 1 != 0 {
                    let pos = local_byte * 8 + s;
                    bit_position_counts[pos] += 1;
                    position_union[pos] = true;
                    naive_flip_count += 1;
                }
            }
        }
        columns_updated.push(updated);
    }

    let num_columns_updated = columns_updated.iter().filter(|&&c| c).count();

    FlipReport {
        columns_updated,
        num_columns_updated,
        naive_flip_count,
        bit_position_counts,
        position_union,
    }
}
