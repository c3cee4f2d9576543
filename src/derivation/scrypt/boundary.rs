//! Entry and exit stretching for scrypt.
//!
//! scrypt opens and closes with a single-iteration PBKDF2-HMAC-SHA256:
//! first to expand the password and salt into the `p * 128 * r` byte
//! working buffer, then to compress the mixed buffer (used as the salt)
//! into the requested key length.
//!
//! The stretcher is abstracted behind [`Stretcher`] so callers can plug in
//! another PBKDF2-HMAC-SHA256 implementation. Its failures propagate to
//! the caller unchanged.

use hmac::Hmac;
use sha2::Sha256;
use thiserror::Error;

/// Output length of HMAC-SHA256.
const H_LEN: u64 = 32;

/// Largest PBKDF2 output: `(2^32 - 1) * hLen` bytes.
pub const MAX_OUTPUT_LEN: u64 = (u32::MAX as u64) * H_LEN;

/// Errors caused by the caller's inputs rather than the cost parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// PBKDF2 needs at least one iteration.
    #[error("PBKDF2 iteration count must be at least 1")]
    ZeroIterations,
    /// A zero-length key was requested.
    #[error("requested output length must be at least 1 byte")]
    EmptyOutput,
    /// The requested output exceeds what PBKDF2-HMAC-SHA256 can produce.
    #[error("requested output of {requested} bytes exceeds the PBKDF2 limit")]
    OutputTooLong { requested: u64 },
    /// The pseudorandom function rejected its key.
    #[error("PBKDF2 pseudorandom function failed: {0}")]
    Prf(String),
}

/// A PBKDF2-HMAC-SHA256 implementation.
///
/// `stretch` fills `out` entirely with
/// `PBKDF2-HMAC-SHA256(password, salt, iterations, out.len())`.
pub trait Stretcher: Send + Sync {
    fn stretch(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        out: &mut [u8],
    ) -> Result<(), InputError>;
}

/// The default stretcher, backed by the `pbkdf2` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct Pbkdf2Sha256;

impl Stretcher for Pbkdf2Sha256 {
    fn stretch(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        out: &mut [u8],
    ) -> Result<(), InputError> {
        check_output_len(out.len())?;

        if iterations == 0 {
            return Err(InputError::ZeroIterations);
        }

        pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, iterations, out)
            .map_err(|e| InputError::Prf(e.to_string()))
    }
}

/// Checks a requested output length against PBKDF2's bounds.
pub(crate) fn check_output_len(len: usize) -> Result<(), InputError> {
    if len == 0 {
        return Err(InputError::EmptyOutput);
    }

    if len as u64 > MAX_OUTPUT_LEN {
        return Err(InputError::OutputTooLong {
            requested: len as u64,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stretch(password: &[u8], salt: &[u8], iterations: u32, len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        Pbkdf2Sha256
            .stretch(password, salt, iterations, &mut out)
            .unwrap();
        out
    }

    // RFC 7914 §11
    #[test]
    fn pbkdf2_sha256_rfc7914_vectors() {
        assert_eq!(
            hex::encode(stretch(b"passwd", b"salt", 1, 64)),
            "55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc\
             49ca9cccf179b645991664b39d77ef317c71b845b1e30bd509112041d3a19783"
        );
        assert_eq!(
            hex::encode(stretch(b"Password", b"NaCl", 80000, 64)),
            "4ddcd8f60b98be21830cee5ef22701f9641a4418d04c0414aeff08876b34ab56\
             a1d425a1225833549adb841b51c9b3176a272bdebba1d078478f62b397f33c8d"
        );
    }

    #[test]
    fn zero_iterations_are_rejected() {
        let mut out = [0u8; 32];
        assert_eq!(
            Pbkdf2Sha256.stretch(b"password", b"salt", 0, &mut out),
            Err(InputError::ZeroIterations)
        );
    }

    #[test]
    fn empty_output_is_rejected() {
        assert_eq!(
            Pbkdf2Sha256.stretch(b"password", b"salt", 1, &mut []),
            Err(InputError::EmptyOutput)
        );
    }

    #[test]
    fn empty_password_and_salt_are_valid() {
        assert_eq!(stretch(b"", b"", 1, 16).len(), 16);
    }
}
