//! BlockMix-Salsa20/8 (RFC 7914 §4).
//!
//! A scrypt block is `128 * r` bytes, viewed as `2r` sub-blocks of 64
//! bytes. BlockMix chains Salsa20/8 across the sub-blocks and then
//! deinterleaves the results: outputs produced at even positions land in
//! the first half of the result, odd positions in the second half.

use super::salsa::{SalsaState, salsa20_8};

/// Size of one Salsa20/8 sub-block.
pub(crate) const SUB_BLOCK: usize = 64;

/// Computes `dst = BlockMix(src)`.
///
/// `src` and `dst` must both be `128 * r` bytes and must not overlap.
/// `x` is the 64-byte chaining block and `state` the Salsa word arrays;
/// both are scratch owned by the caller.
pub(crate) fn block_mix(
    src: &[u8],
    dst: &mut [u8],
    x: &mut [u8; SUB_BLOCK],
    state: &mut SalsaState,
    r: usize,
) {
    debug_assert_eq!(src.len(), 128 * r);
    debug_assert_eq!(dst.len(), 128 * r);

    x.copy_from_slice(&src[(2 * r - 1) * SUB_BLOCK..]);

    for (i, sub_block) in src.chunks_exact(SUB_BLOCK).enumerate() {
        xor_in_place(&mut x[..], sub_block);
        salsa20_8(x, state);

        // Y[i] goes to slot i/2 for even i, r + i/2 for odd i
        let slot = (i / 2) + (i % 2) * r;
        dst[slot * SUB_BLOCK..(slot + 1) * SUB_BLOCK].copy_from_slice(&x[..]);
    }
}

/// Reads the table index source from a block: the first 4 bytes of the
/// last 64-byte sub-block, as a little-endian integer.
#[inline]
pub(crate) fn integerify(block: &[u8], r: usize) -> u32 {
    let at = (2 * r - 1) * SUB_BLOCK;
    u32::from_le_bytes([block[at], block[at + 1], block[at + 2], block[at + 3]])
}

/// `dst ^= src`, byte-wise over the shorter of the two.
#[inline]
pub(crate) fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    dst.iter_mut().zip(src.iter()).for_each(|(a, b)| *a ^= b);
}
