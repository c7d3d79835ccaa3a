//! Canonical Huffman code construction over a 256-entry byte histogram.
//!
//! Every byte value is pushed into the combine heap regardless of its count,
//! so every symbol ends up at depth >= 1 even when only one value actually
//! occurs in the stream (a lone symbol at depth 0 would trivially round-trip
//! as a zero-bit code, which the decoder's flat table can't represent).

use alloc::vec::Vec;
use core::cmp::Reverse;

#[cfg(feature = "std")]
use std::collections::BinaryHeap;

#[cfg(not(feature = "std"))]
use alloc::collections::BinaryHeap;

use super::{MAX_CODE_LEN, TREE_ARENA_CAP};

enum Node {
    Leaf(u8),
    Internal(u16, u16),
}

/// Builds a prefix code (bit pattern, length) per byte value from `histogram`.
///
/// Returns `None` if any code would exceed [`MAX_CODE_LEN`] bits, in which
/// case the caller must fall back to the plain, non entropy-coded stream.
pub(crate) fn build_codes(histogram: &[u32; 256]) -> Option<[(u32, u8); 256]> {
    let mut arena: Vec<Node> = Vec::with_capacity(TREE_ARENA_CAP);
    let mut heap: BinaryHeap<Reverse<(u32, u32, u16)>> = BinaryHeap::with_capacity(256);

    for v in 0..256usize {
        arena.push(Node::Leaf(v as u8));
        heap.push(Reverse((histogram[v], v as u32, v as u16)));
    }

    let mut seq = 256u32;
    while heap.len() > 1 {
        let Reverse((count_a, _, a)) = heap.pop().unwrap();
        let Reverse((count_b, _, b)) = heap.pop().unwrap();

        let node_idx = arena.len() as u16;
        arena.push(Node::Internal(a, b));
        heap.push(Reverse((count_a.saturating_add(count_b), seq, node_idx)));
        seq += 1;
    }

    let Reverse((_, _, root)) = heap.pop().unwrap();

    let mut table = [(0u32, 0u8); 256];
    let mut stack: Vec<(u16, u32, u8)> = Vec::with_capacity(64);
    stack.push((root, 0, 0));

    while let Some((node, bits, len)) = stack.pop() {
        match arena[node as usize] {
            Node::Leaf(byte) => {
                table[byte as usize] = (bits, len);
            }
            Node::Internal(left, right) => {
                if len >= MAX_CODE_LEN {
                    return None;
                }
                stack.push((left, bits, len + 1));
                stack.push((right, bits | (1u32 << len), len + 1));
            }
        }
    }

    Some(table)
}
