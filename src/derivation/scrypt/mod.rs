//! scrypt password-based key derivation (RFC 7914).
//!
//! scrypt stretches a low-entropy password into a key while deliberately
//! consuming a tunable amount of memory and CPU time, so that brute-force
//! attacks on dedicated hardware stay expensive.
//!
//! # Security Properties
//!
//! - **Memory hardness**: each lane builds a `128 * r * N` byte lookup
//!   table and then reads it at data-dependent positions, so evaluating
//!   scrypt with less memory costs proportionally more computation.
//! - **Tunable cost**: `N` scales memory and time, `r` the block size and
//!   `p` the number of independent lanes.
//! - **Admission control**: the working set is computed up front and
//!   checked against `maxmem` before any buffer is allocated.
//! - **Key hygiene**: every internal buffer is wiped once the key has been
//!   produced, also when the derivation fails.
//!
//! # Algorithm Overview
//!
//! 1. **Expand**: `B = PBKDF2-HMAC-SHA256(P, S, 1, p * 128 * r)`.
//! 2. **Mix**: each `128 * r` byte lane of `B` is replaced by
//!    `ROMix(lane)`, which fills the table with `N` successive BlockMix
//!    outputs and then performs `N` table-dependent BlockMix steps.
//! 3. **Compress**: `DK = PBKDF2-HMAC-SHA256(P, B, 1, dkLen)`.
//!
//! BlockMix chains Salsa20/8 across the `2r` 64-byte sub-blocks of a lane
//! and deinterleaves the results.
//!
//! # Parallelism
//!
//! Lanes share nothing, so they run on a rayon pool. Only as many lane
//! tables as fit under `maxmem` are resident at once; the pool is joined
//! before the final stretch.

pub(crate) mod block;
pub mod boundary;
pub mod core;
pub(crate) mod memory;
pub mod params;
pub mod pool;
pub(crate) mod salsa;
