//! Write policy selector: decides which write-reduction scheme's flip count
//! gets attributed to a write, as a function of BDI compressed-size bucket
//! and how many columns changed.

use crate::flip::FlipReport;

/// Number of compressed-size buckets (`compressByte[0..NUM_BUCKETS-1]`).
pub const NUM_BUCKETS: usize = 5;

/// Raw bit count of a full 64-byte line, used as the bucket-4 attribution.
pub const RAW_LINE_BITS: u32 = 64 * 8;

/// Buckets `compressed_size` into one of [`NUM_BUCKETS`] ranges:
/// `[0,32] -> 0`, `(32,40] -> 1`, `(40,48] -> 2`, `(48,56] -> 3`, `(56,64] -> 4`.
pub fn size_bucket(compressed_size: usize) -> usize {
    match compressed_size {
        0..=32 => 0,
        33..=40 => 1,
        41..=48 => 2,
        49..=56 => 3,
        _ => 4,
    }
}

/// Looks up the flip count to add to `CompressUpdateBit` for a write whose
/// BDI compressed size falls in `bucket` and that touched `columns_updated`
/// columns, using `report` to compute whichever granularity the table cell
/// names.
///
/// Bucket 4 (size > 56) always attributes the full raw line, regardless of
/// `columns_updated` — a poorly-compressing line is assumed written whole.
pub fn compressed_flip_attribution(bucket: usize, columns_updated: usize, report: &FlipReport) -> u32 {
    if bucket == 4 {
        return RAW_LINE_BITS;
    }

    let rmw = report.naive_flip_count;
    let v2 = report.vectorized(2);
    let v4 = report.vectorized(4);
    let v8 = report.vectorized(8);
    let v16 = report.vectorized(16);
    let vinline = report.inline_vector_update_bit();

    match (bucket, columns_updated) {
        (_, 0) => 0,
        (0, 1) | (0, 2) | (0, 3) => rmw,
        (0, 4) | (0, 5) => v2,
        (0, 6) => v4,
        (0, 7) => v8,
        (0, 8) => vinline,

        (1, 1) | (1, 2) => rmw,
        (1, 3) | (1, 4) | (1, 5) => v2,
        (1, 6) => v4,
        (1, 7) => v8,
        (1, 8) => vinline,

        (2, 1) => rmw,
        (2, 2) | (2, 3) => v2,
        (2, 4) | (2, 5) | (2, 6) => v4,
        (2, 7) => v8,
        (2, 8) => vinline,

        (3, 1) | (3, 2) => v2,
        (3, 3) | (3, 4) => v4,
        (3, 5) | (3, 6) => v8,
        (3, 7) => v16,
        (3, 8) => vinline,

        _ => unreachable!("columns_updated out of range 0..=8: {columns_updated}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flip::{analyze, xor_line};

    #[test]
    fn bucket_boundaries() {
        assert_eq!(size_bucket(0), 0);
        assert_eq!(size_bucket(32), 0);
        assert_eq!(size_bucket(33), 1);
        assert_eq!(size_bucket(40), 1);
        assert_eq!(size_bucket(41), 2);
        assert_eq!(size_bucket(48), 2);
        assert_eq!(size_bucket(49), 3);
        assert_eq!(size_bucket(56), 3);
        assert_eq!(size_bucket(57), 4);
        assert_eq!(size_bucket(64), 4);
    }

    #[test]
    fn bucket_four_ignores_columns_updated() {
        let old = [0u8; 64];
        let new = [0xFFu8; 64];
        let xor = xor_line(&old, &new);
        let report = analyze(&xor);
        assert_eq!(compressed_flip_attribution(4, 8, &report), RAW_LINE_BITS);
        assert_eq!(compressed_flip_attribution(4, 0, &report), RAW_LINE_BITS);
    }

    #[test]
    fn zero_columns_updated_attributes_zero_in_every_bucket() {
        let zero = [0u8; 64];
        let report = analyze(&zero);
        for bucket in 0..4 {
            assert_eq!(compressed_flip_attribution(bucket, 0, &report), 0);
        }
    }

    #[test]
    fn full_column_cluster_uses_inline_vector_in_every_compressible_bucket() {
        let old = [0u8; 64];
        let new = [0xFFu8; 64];
        let xor = xor_line(&old, &new);
        let report = analyze(&xor);
        let expected = report.inline_vector_update_bit();
        for bucket in 0..4 {
            assert_eq!(compressed_flip_attribution(bucket, 8, &report), expected);
        }
    }
}
