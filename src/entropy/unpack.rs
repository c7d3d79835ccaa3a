//! Entropy-frame parsing and the two-tier (flat table + tree arena) decoder.

use alloc::vec;
use alloc::vec::Vec;

use crate::bitio::{self, BitSource};
use crate::decode::ByteSource;

use super::ENTROPY_W;

const TABLE_SIZE: usize = 1 << ENTROPY_W;
const TREE_FLAG: u16 = 1 << 15;

enum TreeNode {
    Leaf { len: u8, byte: u8 },
    Internal { left: i32, right: i32 },
}

/// Pulls chunk-stream bytes out of an entropy-coded frame body, one symbol at
/// a time, using the dictionary parsed at construction.
pub(crate) struct EntropySource<'a> {
    table: Vec<u16>,
    arena: Vec<TreeNode>,
    bits: BitSource<'a>,
}

impl<'a> EntropySource<'a> {
    /// Parses the 256-entry dictionary out of `bytes` (the frame content
    /// following the 14-byte header) and prepares to decode the packed body.
    /// Returns `None` if `bytes` is too short to contain a full dictionary.
    pub(crate) fn new(bytes: &'a [u8]) -> Option<Self> {
        let mut table = vec![0u16; TABLE_SIZE];
        let mut arena: Vec<TreeNode> = Vec::new();

        let mut cursor = 0usize;
        for byte_value in 0..256usize {
            let len = *bytes.get(cursor)?;
            cursor += 1;

            if len == 0 {
                continue;
            }

            let field_bytes = bitio::pattern_field_bits(len) as usize / 8;
            if cursor + field_bytes > bytes.len() {
                return None;
            }
            let (code_bits, consumed) = bitio::read_pattern(&bytes[cursor..], len);
            cursor += consumed;

            insert_code(&mut table, &mut arena, code_bits, len, byte_value as u8);
        }

        let aligned = (cursor + 3) & !3;
        let body = bytes.get(aligned..)?;

        Some(EntropySource {
            table,
            arena,
            bits: BitSource::new(body),
        })
    }
}

fn insert_code(table: &mut [u16], arena: &mut Vec<TreeNode>, bits: u32, len: u8, byte: u8) {
    let len_usize = len as usize;

    if len_usize <= ENTROPY_W as usize {
        let free_bits = ENTROPY_W as usize - len_usize;
        let entry = ((len as u16) << 8) | byte as u16;
        for high in 0..(1usize << free_bits) {
            let index = (high << len_usize) | bits as usize;
            table[index] = entry;
        }
        return;
    }

    let truncated = (bits & ((1u32 << ENTROPY_W) - 1)) as usize;
    let leading = bits >> ENTROPY_W;
    let leading_len = len_usize - ENTROPY_W as usize;

    if table[truncated] & TREE_FLAG == 0 || table[truncated] == 0 {
        let root = arena.len() as i32;
        arena.push(TreeNode::Internal {
            left: -1,
            right: -1,
        });
        table[truncated] = TREE_FLAG | root as u16;
    }

    let mut node = (table[truncated] & !TREE_FLAG) as usize;
    for i in 0..leading_len {
        let bit = (leading >> i) & 1;
        let is_last = i == leading_len - 1;

        let child = match (&arena[node], bit) {
            (TreeNode::Internal { left, .. }, 0) => *left,
            (TreeNode::Internal { right, .. }, _) => *right,
            _ => unreachable!("entropy tree node is not internal"),
        };

        let child = if child < 0 {
            let new_idx = arena.len() as i32;
            arena.push(if is_last {
                TreeNode::Leaf { len, byte }
            } else {
                TreeNode::Internal {
                    left: -1,
                    right: -1,
                }
            });
            match (&mut arena[node], bit) {
                (TreeNode::Internal { left, .. }, 0) => *left = new_idx,
                (TreeNode::Internal { right, .. }, _) => *right = new_idx,
                _ => unreachable!("entropy tree node is not internal"),
            }
            new_idx
        } else {
            child
        };

        node = child as usize;
    }
}

impl<'a> ByteSource for EntropySource<'a> {
    fn next_byte(&mut self) -> Option<u8> {
        if !self.bits.has_words_left() {
            return None;
        }

        let window = self.bits.window();
        let leading_index = (window & (TABLE_SIZE as u64 - 1)) as usize;
        let entry = self.table[leading_index];

        if entry == 0 {
            return None;
        }

        if entry & TREE_FLAG == 0 {
            let len = (entry >> 8) as u8;
            let byte = (entry & 0xFF) as u8;
            self.bits.advance(len);
            return Some(byte);
        }

        let mut node = (entry & !TREE_FLAG) as usize;
        let mut consumed = ENTROPY_W;
        loop {
            let bit = (window >> consumed) & 1;
            match &self.arena[node] {
                TreeNode::Leaf { len, byte } => {
                    self.bits.advance(*len);
                    return Some(*byte);
                }
                TreeNode::Internal { left, right } => {
                    let next = if bit == 0 { *left } else { *right };
                    if next < 0 {
                        return None;
                    }
                    node = next as usize;
                    consumed += 1;
                }
            }
        }
    }
}
