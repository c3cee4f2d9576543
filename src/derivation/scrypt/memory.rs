//! ROMix and per-lane memory for scrypt (RFC 7914 §5).
//!
//! ROMix is the memory-hard part of scrypt. Each lane first walks a chain
//! of `N` BlockMix applications and stores every intermediate block in a
//! lookup table `V`, then walks another `N` steps in which each step reads
//! a table entry chosen by the current state. Both passes are strictly
//! sequential within a lane.
//!
//! All buffers a lane touches live in one [`LaneScratch`]:
//! - `v`: the `128 * r * N` byte lookup table
//! - `xy`: two `128 * r` byte halves that alternate as BlockMix input and
//!   output, so no block is ever copied back after mixing
//! - `x` and `salsa`: BlockMix and Salsa20/8 scratch
//!
//! The scratch is wiped by [`Zeroize`] and on drop.

use zeroize::Zeroize;

use super::block::{SUB_BLOCK, block_mix, integerify, xor_in_place};
use super::core::ScryptError;
use super::params::ScryptParams;
use super::salsa::SalsaState;

/// Buffers owned by one ROMix worker. Reused across the lanes it runs.
pub(crate) struct LaneScratch {
    v: Vec<u8>,
    xy: Vec<u8>,
    x: [u8; SUB_BLOCK],
    salsa: SalsaState,
    n: usize,
    r: usize,
}

impl LaneScratch {
    /// Allocates the table and scratch for one lane of `params`.
    ///
    /// Allocation failures are reported instead of aborting the process.
    pub(crate) fn allocate(params: &ScryptParams) -> Result<Self, ScryptError> {
        let r = params.r() as usize;
        let len = params.lane_len();
        let n = usize::try_from(params.n()).map_err(|_| ScryptError::Allocation {
            bytes: usize::MAX,
        })?;
        let table_len = len
            .checked_mul(n)
            .ok_or(ScryptError::Allocation { bytes: usize::MAX })?;

        Ok(Self {
            v: try_alloc(table_len)?,
            xy: try_alloc(2 * len)?,
            x: [0u8; SUB_BLOCK],
            salsa: SalsaState::default(),
            n,
            r,
        })
    }

    /// Replaces `lane` (one `128 * r` byte block) with `ROMix(lane)`.
    pub(crate) fn ro_mix(&mut self, lane: &mut [u8]) {
        let (n, r) = (self.n, self.r);
        let len = 128 * r;
        debug_assert_eq!(lane.len(), len);

        let (mut cur, mut next) = self.xy.split_at_mut(len);
        cur.copy_from_slice(lane);

        for entry in self.v.chunks_exact_mut(len) {
            entry.copy_from_slice(cur);
            block_mix(cur, next, &mut self.x, &mut self.salsa, r);
            std::mem::swap(&mut cur, &mut next);
        }

        for _ in 0..n {
            let j = table_index(cur, r, n);
            xor_in_place(cur, &self.v[j * len..(j + 1) * len]);
            block_mix(cur, next, &mut self.x, &mut self.salsa, r);
            std::mem::swap(&mut cur, &mut next);
        }

        lane.copy_from_slice(cur);
    }

    #[cfg(test)]
    pub(crate) fn is_wiped(&self) -> bool {
        self.v.iter().chain(self.xy.iter()).all(|&b| b == 0)
            && self.x.iter().all(|&b| b == 0)
            && self.salsa.is_zero()
    }
}

impl Zeroize for LaneScratch {
    fn zeroize(&mut self) {
        // Wipe in place; lengths are kept so the scratch stays reusable.
        self.v.as_mut_slice().zeroize();
        self.xy.as_mut_slice().zeroize();
        self.x.zeroize();
        self.salsa.zeroize();
    }
}

impl Drop for LaneScratch {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// `Integerify(X) mod N`, with the modulus taken as a mask since `N` is a
/// power of two.
#[inline]
pub(crate) fn table_index(block: &[u8], r: usize, n: usize) -> usize {
    integerify(block, r) as usize & (n - 1)
}

/// Allocates a zeroed buffer, reporting allocator refusal as an error.
pub(crate) fn try_alloc(len: usize) -> Result<Vec<u8>, ScryptError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| ScryptError::Allocation { bytes: len })?;
    buf.resize(len, 0);
    Ok(buf)
}
