//! Entropy-frame serialization: dictionary + word-aligned packed body.

use alloc::vec::Vec;

use crate::bitio::{self, BitSink};

/// Bytes needed to store one dictionary entry: one length byte plus the
/// 16/24/32-bit bit-pattern field sized by that length.
fn entry_bytes(code_len: u8) -> usize {
    1 + bitio::pattern_field_bits(code_len.max(1)) as usize / 8
}

/// Total size (in bytes) of the dictionary for `codes`, before 4-byte alignment.
pub(crate) fn dictionary_size(codes: &[(u32, u8); 256]) -> usize {
    codes.iter().map(|&(_, len)| entry_bytes(len)).sum()
}

/// Estimated total size of an entropy-coded frame (without the 14-byte
/// header, which is identical in either format): dictionary (4-byte aligned)
/// plus packed body plus the one trailing zero word.
pub(crate) fn estimated_size(codes: &[(u32, u8); 256], histogram: &[u32; 256]) -> usize {
    let dict = dictionary_size(codes);
    let dict_aligned = (dict + 3) & !3;

    let total_bits: u64 = histogram
        .iter()
        .zip(codes.iter())
        .map(|(&count, &(_, len))| count as u64 * len as u64)
        .sum();
    let body_words = (total_bits + 31) / 32;
    let body_bytes = (body_words as usize + 1) * 4; // +1 for the trailing zero word

    dict_aligned + body_bytes
}

/// Serializes the dictionary, then the bit-packed `body`, into a freshly
/// allocated buffer (not including the 14-byte frame header).
pub(crate) fn encode_frame(codes: &[(u32, u8); 256], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(estimated_size(codes, &crate::histogram::histogram(body)));

    for &(bits, len) in codes.iter() {
        out.push(len);
        let mut field = [0u8; 4];
        let written = bitio::write_pattern(&mut field, len.max(1), bits);
        out.extend_from_slice(&field[..written]);
    }

    while out.len() % 4 != 0 {
        out.push(0);
    }

    let mut sink = BitSink::new();
    for &byte in body {
        let (bits, len) = codes[byte as usize];
        debug_assert!(len > 0, "byte {} has no assigned code", byte);
        sink.push(&mut out, bits, len);
    }
    sink.finish(&mut out);

    out
}
