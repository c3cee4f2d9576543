//! The Salsa20/8 core (RFC 7914 §3).
//!
//! Salsa20/8 is used here purely as a fixed permutation over a 64-byte
//! block, not as a stream cipher. The block is read as 16 little-endian
//! 32-bit words, run through 4 double rounds, added back to its input
//! words and written out in place.

use zeroize::Zeroize;

/// Word arrays used by one Salsa20/8 invocation.
///
/// The state is owned by the caller so that it lives in the same wiped
/// workspace as the rest of a lane's buffers instead of on a stack frame
/// that is never cleared.
#[derive(Clone, Default, Zeroize)]
pub(crate) struct SalsaState {
    input: [u32; 16],
    work: [u32; 16],
}

impl SalsaState {
    #[cfg(test)]
    pub(crate) fn is_zero(&self) -> bool {
        self.input.iter().chain(self.work.iter()).all(|&w| w == 0)
    }
}

/// Applies Salsa20/8 to `block` in place.
pub(crate) fn salsa20_8(block: &mut [u8; 64], state: &mut SalsaState) {
    for (word, chunk) in state.input.iter_mut().zip(block.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }

    state.work = state.input;

    for _ in 0..4 {
        double_round(&mut state.work);
    }

    for (word, mixed) in state.input.iter_mut().zip(state.work.iter()) {
        *word = word.wrapping_add(*mixed);
    }

    for (word, chunk) in state.input.iter().zip(block.chunks_exact_mut(4)) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
}

#[inline(always)]
fn quarter(x: &mut [u32; 16], a: usize, b: usize, d: usize, n: u32) {
    x[d] ^= x[a].wrapping_add(x[b]).rotate_left(n);
}

/// One column round followed by one row round.
#[inline(always)]
fn double_round(x: &mut [u32; 16]) {
    // Columns
    quarter(x, 0, 12, 4, 7);
    quarter(x, 4, 0, 8, 9);
    quarter(x, 8, 4, 12, 13);
    quarter(x, 12, 8, 0, 18);

    quarter(x, 5, 1, 9, 7);
    quarter(x, 9, 5, 13, 9);
    quarter(x, 13, 9, 1, 13);
    quarter(x, 1, 13, 5, 18);

    quarter(x, 10, 6, 14, 7);
    quarter(x, 14, 10, 2, 9);
    quarter(x, 2, 14, 6, 13);
    quarter(x, 6, 2, 10, 18);

    quarter(x, 15, 11, 3, 7);
    quarter(x, 3, 15, 7, 9);
    quarter(x, 7, 3, 11, 13);
    quarter(x, 11, 7, 15, 18);

    // Rows
    quarter(x, 0, 3, 1, 7);
    quarter(x, 1, 0, 2, 9);
    quarter(x, 2, 1, 3, 13);
    quarter(x, 3, 2, 0, 18);

    quarter(x, 5, 4, 6, 7);
    quarter(x, 6, 5, 7, 9);
    quarter(x, 7, 6, 4, 13);
    quarter(x, 4, 7, 5, 18);

    quarter(x, 10, 9, 11, 7);
    quarter(x, 11, 10, 8, 9);
    quarter(x, 8, 11, 9, 13);
    quarter(x, 9, 8, 10, 18);

    quarter(x, 15, 14, 12, 7);
    quarter(x, 12, 15, 13, 9);
    quarter(x, 13, 12, 14, 13);
    quarter(x, 14, 13, 15, 18);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(hex_str: &str) -> [u8; 64] {
        hex::decode(hex_str).unwrap().try_into().unwrap()
    }

    /// RFC 7914 §8.
    #[test]
    fn salsa20_8_rfc7914_vector() {
        let mut b = block(
            "7e879a214f3ec9867ca940e641718f26baee555b8c61c1b50df846116dcd3b1d\
             ee24f319df9b3d8514121e4b5ac5aa3276021d2909c74829edebc68db8b8c25e",
        );
        let mut state = SalsaState::default();

        salsa20_8(&mut b, &mut state);

        assert_eq!(
            hex::encode(b),
            "a41f859c6608cc993b81cacb020cef05044b2181a2fd337dfd7b1c6396682f29\
             b4393168e3c9e6bcfe6bc5b7a06d96bae424cc102c91745c24ad673dc7618f81"
        );
    }

    #[test]
    fn salsa20_8_ignores_stale_state() {
        let input = [0x5au8; 64];

        let mut fresh = input;
        salsa20_8(&mut fresh, &mut SalsaState::default());

        let mut reused = input;
        let mut state = SalsaState::default();
        salsa20_8(&mut [0xffu8; 64], &mut state);
        salsa20_8(&mut reused, &mut state);

        assert_eq!(fresh, reused);
    }

    #[test]
    fn zeroize_clears_state() {
        let mut state = SalsaState::default();
        salsa20_8(&mut [1u8; 64], &mut state);
        assert!(!state.is_zero());

        state.zeroize();
        assert!(state.is_zero());
    }
}
