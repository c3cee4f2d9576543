//! Memory-hard password-based key derivation for Nebula
//!
//! This crate provides the scrypt key derivation function (RFC 7914) used
//! throughout the Nebula ecosystem to turn passwords into keys.
//!
//! The focus is on **clarity, predictability, and auditability**. The
//! mixing core (Salsa20/8, BlockMix, ROMix) is implemented here with fixed
//! 32-bit word arithmetic and exact little-endian packing so outputs are
//! bit-compatible with every other scrypt implementation. The PBKDF2
//! stretching steps are delegated to the audited `pbkdf2` crate.
//!
//! # Module overview
//!
//! - `derivation`
//!   Password-based key derivation functions.
//!
//!   - `derivation::scrypt::params`
//!     Option normalization (defaults, legacy aliases) and admission
//!     control against a memory ceiling.
//!
//!   - `derivation::scrypt::boundary`
//!     The PBKDF2-HMAC-SHA256 stretcher that opens and closes scrypt.
//!
//!   - `derivation::scrypt::core`
//!     The orchestrator: blocking, async and callback entry points, error
//!     types and buffer ownership.
//!
//!   - `derivation::scrypt::pool`
//!     A rayon pool that runs independent lanes in parallel.
//!
//! # Design goals
//!
//! - No per-block heap allocation in the mixing core
//! - Parameters validated before anything large is allocated
//! - Every intermediate buffer wiped before a derivation returns
//! - Explicit error types instead of panics
//!
//! # Example
//!
//! ```rust, ignore
//! use cryptal_scrypt::derivation::{ScryptOptions, derive_key};
//!
//! let options = ScryptOptions::new().with_n(1024).with_r(8).with_p(16);
//! let key = derive_key(b"password", b"NaCl", 64, &options)?;
//! ```

pub mod derivation;
