//! Byte-frequency histogram over an emitted chunk stream, feeding the
//! entropy layer's code construction (see [`crate::entropy`]).

/// Counts occurrences of each byte value in `bytes` into 256 buckets.
pub(crate) fn histogram(bytes: &[u8]) -> [u32; 256] {
    let mut counts = [0u32; 256];
    for &b in bytes {
        counts[b as usize] += 1;
    }
    counts
}
