//! Optional canonical Huffman entropy layer wrapping the chunk-stream format.
//!
//! Applied only when it is estimated to shrink the stream by more than
//! [`MIN_SAVINGS_PERCENT`], and only on streams at or above [`MIN_STREAM_SIZE`]
//! — small images rarely amortize the 256-entry dictionary.

use alloc::vec::Vec;

mod heap;
mod pack;
mod unpack;

use unpack::EntropySource;

/// Width, in bits, of the flat decode table's index (table has `2^W` entries).
pub(crate) const ENTROPY_W: u8 = 11;

/// Codes longer than this are rejected; the caller falls back to the plain stream.
pub(crate) const MAX_CODE_LEN: u8 = 32;

/// Initial capacity hint for the Huffman combine arena (256 leaves + up to 255 internal nodes).
pub(crate) const TREE_ARENA_CAP: usize = 512;

const MIN_STREAM_SIZE: usize = 10 * 1024;
const MIN_SAVINGS_PERCENT: u64 = 3;

/// Attempts to entropy-code `body` (the chunk stream following the 14-byte
/// frame header, as produced by the plain encoder, including its 8-byte end
/// marker). Returns the serialized entropy frame body (dictionary + packed
/// bits, still without the 14-byte header) if it is estimated to save more
/// than [`MIN_SAVINGS_PERCENT`] over `body`'s length; `None` otherwise.
pub(crate) fn try_encode(body: &[u8]) -> Option<Vec<u8>> {
    if body.len() < MIN_STREAM_SIZE {
        return None;
    }

    let histogram = crate::histogram::histogram(body);
    let codes = heap::build_codes(&histogram)?;

    let estimated = pack::estimated_size(&codes, &histogram);
    let threshold = body.len() - (body.len() * MIN_SAVINGS_PERCENT as usize) / 100;
    if estimated >= threshold {
        return None;
    }

    Some(pack::encode_frame(&codes, body))
}

/// Decodes a chunk-stream byte lazily out of an entropy-coded frame body.
/// Returns `None` if `bytes` is too short to contain a dictionary.
pub(crate) fn decode_source(bytes: &[u8]) -> Option<EntropySource<'_>> {
    EntropySource::new(bytes)
}
