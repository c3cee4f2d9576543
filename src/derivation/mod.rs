//! Password-based key derivation functions.
//!
//! Currently includes scrypt (RFC 7914).

pub mod scrypt;

pub use scrypt::boundary::{InputError, Pbkdf2Sha256, Stretcher};
pub use scrypt::core::{
    Scrypt, ScryptError, derive_key, derive_key_async, derive_key_with_callback,
};
pub use scrypt::params::{ParamError, ScryptOptions, ScryptParams};
pub use scrypt::pool::LanePool;
