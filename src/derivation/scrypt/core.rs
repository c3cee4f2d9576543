use std::sync::Arc;

use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

use super::boundary::{InputError, Pbkdf2Sha256, Stretcher, check_output_len};
use super::memory::{LaneScratch, try_alloc};
use super::params::{ParamError, ScryptOptions, ScryptParams};
use super::pool::{LanePool, default_pool};

/// scrypt always runs its PBKDF2 steps with a single iteration.
const STRETCH_ITERATIONS: u32 = 1;

/// Errors that can occur during scrypt computation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScryptError {
    /// Cost parameters are invalid or exceed the memory ceiling.
    #[error("invalid scrypt configuration: {0}")]
    Configuration(#[from] ParamError),
    /// Password, salt or key length were rejected.
    #[error("invalid scrypt input: {0}")]
    Input(#[from] InputError),
    /// A working buffer could not be allocated.
    #[error("failed to allocate {bytes} bytes for scrypt")]
    Allocation { bytes: usize },
    /// The worker pool could not be built or lost a job.
    #[error("scrypt worker pool failure: {0}")]
    WorkerPool(String),
}

/// Every buffer one derivation touches.
///
/// `buffer` is the `p * 128 * r` byte working buffer B; `lanes` holds one
/// scratch per worker. Wiped at the end of every derivation and on drop.
pub(crate) struct Workspace {
    buffer: Vec<u8>,
    lanes: Vec<LaneScratch>,
    lane_len: usize,
}

impl Workspace {
    pub(crate) fn allocate(params: &ScryptParams, workers: usize) -> Result<Self, ScryptError> {
        let lane_len = params.lane_len();
        let buffer_len = lane_len
            .checked_mul(params.p() as usize)
            .ok_or(ScryptError::Allocation { bytes: usize::MAX })?;
        let buffer = try_alloc(buffer_len)?;

        let mut lanes = Vec::new();
        lanes
            .try_reserve_exact(workers)
            .map_err(|_| ScryptError::Allocation { bytes: usize::MAX })?;
        for _ in 0..workers {
            lanes.push(LaneScratch::allocate(params)?);
        }

        Ok(Self {
            buffer,
            lanes,
            lane_len,
        })
    }

    #[cfg(test)]
    pub(crate) fn is_wiped(&self) -> bool {
        self.buffer.iter().all(|&b| b == 0) && self.lanes.iter().all(LaneScratch::is_wiped)
    }
}

impl Zeroize for Workspace {
    fn zeroize(&mut self) {
        self.buffer.as_mut_slice().zeroize();
        self.lanes.iter_mut().for_each(Zeroize::zeroize);
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// An scrypt instance: a PBKDF2 stretcher plus the pool its lanes run on.
///
/// # Example
///
/// ```rust, ignore
/// use cryptal_scrypt::derivation::{Scrypt, ScryptOptions};
///
/// let scrypt = Scrypt::new()?;
/// let options = ScryptOptions::new().with_n(1024).with_r(8).with_p(16);
/// let key = scrypt.derive_key(b"password", b"NaCl", 64, &options)?;
/// assert_eq!(key.len(), 64);
/// ```
#[derive(Clone)]
pub struct Scrypt<S = Pbkdf2Sha256> {
    stretcher: S,
    pool: Arc<LanePool>,
}

impl Scrypt<Pbkdf2Sha256> {
    /// PBKDF2-HMAC-SHA256 from the `pbkdf2` crate, on the shared pool.
    pub fn new() -> Result<Self, ScryptError> {
        Self::with_stretcher(Pbkdf2Sha256)
    }
}

impl<S: Stretcher> Scrypt<S> {
    pub fn with_stretcher(stretcher: S) -> Result<Self, ScryptError> {
        Ok(Self {
            stretcher,
            pool: default_pool()?,
        })
    }

    /// Runs lanes and jobs on `pool` instead of the shared pool.
    pub fn with_pool(self, pool: Arc<LanePool>) -> Self {
        Self { pool, ..self }
    }

    /// Derives a `key_len` byte key from `password` and `salt`.
    ///
    /// Options are normalized first; oversized parameters are rejected
    /// before any working buffer is allocated.
    pub fn derive_key(
        &self,
        password: &[u8],
        salt: &[u8],
        key_len: usize,
        options: &ScryptOptions,
    ) -> Result<Zeroizing<Vec<u8>>, ScryptError> {
        let params = options.normalize().inspect_err(|e| {
            log::debug!("Rejecting scrypt options: {e}");
        })?;
        self.derive_key_with_params(password, salt, key_len, &params)
    }

    /// Same as [`Scrypt::derive_key`] with already validated parameters.
    pub fn derive_key_with_params(
        &self,
        password: &[u8],
        salt: &[u8],
        key_len: usize,
        params: &ScryptParams,
    ) -> Result<Zeroizing<Vec<u8>>, ScryptError> {
        check_output_len(key_len)?;

        // At most `resident_lanes` tables are alive at once, so the
        // concurrent working set stays within maxmem.
        let workers = params.resident_lanes().min(self.pool.num_threads()).max(1);

        log::debug!(
            "Deriving {key_len} byte key with scrypt N={}, r={}, p={} on {workers} worker(s)",
            params.n(),
            params.r(),
            params.p(),
        );

        let mut workspace = Workspace::allocate(params, workers)?;
        let mut key = Zeroizing::new(try_alloc(key_len)?);

        self.derive_in(&mut workspace, password, salt, &mut key)?;

        Ok(key)
    }

    /// Fills `key` using the buffers in `workspace`, which is wiped before
    /// returning whether or not the derivation succeeded.
    pub(crate) fn derive_in(
        &self,
        workspace: &mut Workspace,
        password: &[u8],
        salt: &[u8],
        key: &mut [u8],
    ) -> Result<(), ScryptError> {
        let result = self.mix(workspace, password, salt, key);
        workspace.zeroize();
        result
    }

    fn mix(
        &self,
        workspace: &mut Workspace,
        password: &[u8],
        salt: &[u8],
        key: &mut [u8],
    ) -> Result<(), ScryptError> {
        // B = PBKDF2(P, S, 1, p * 128 * r)
        self.stretcher
            .stretch(password, salt, STRETCH_ITERATIONS, &mut workspace.buffer)?;

        self.pool.run_lanes(
            &mut workspace.buffer,
            workspace.lane_len,
            &mut workspace.lanes,
        );

        // DK = PBKDF2(P, B, 1, dkLen)
        self.stretcher
            .stretch(password, &workspace.buffer, STRETCH_ITERATIONS, key)?;

        Ok(())
    }
}

impl<S: Stretcher + Clone + 'static> Scrypt<S> {
    /// Non-blocking [`Scrypt::derive_key`]: the derivation runs on the
    /// pool and the returned future resolves with its result.
    pub async fn derive_key_async(
        &self,
        password: &[u8],
        salt: &[u8],
        key_len: usize,
        options: &ScryptOptions,
    ) -> Result<Zeroizing<Vec<u8>>, ScryptError> {
        let job = self.owned_job(password, salt, key_len, options);
        self.pool.execute_job(job).await?
    }

    /// Callback flavour of [`Scrypt::derive_key`]. Returns immediately;
    /// `callback` is invoked on a pool thread with the key or the error.
    pub fn derive_key_with_callback<F>(
        &self,
        password: &[u8],
        salt: &[u8],
        key_len: usize,
        options: &ScryptOptions,
        callback: F,
    ) where
        F: FnOnce(Result<Zeroizing<Vec<u8>>, ScryptError>) + Send + 'static,
    {
        let job = self.owned_job(password, salt, key_len, options);
        self.pool
            .spawn(job, move |result| callback(result.and_then(|derived| derived)));
    }

    /// Copies the inputs so the derivation can outlive the caller's borrows.
    fn owned_job(
        &self,
        password: &[u8],
        salt: &[u8],
        key_len: usize,
        options: &ScryptOptions,
    ) -> impl FnOnce() -> Result<Zeroizing<Vec<u8>>, ScryptError> + Send + use<S> {
        let scrypt = self.clone();
        let password = Zeroizing::new(password.to_vec());
        let salt = salt.to_vec();
        let options = options.clone();

        move || scrypt.derive_key(&password, &salt, key_len, &options)
    }
}

/// Derives a key with scrypt on the shared pool.
///
/// # Arguments
///
/// * `password` - The password to stretch
/// * `salt` - The salt (may be empty, though a random 16+ byte salt is advised)
/// * `key_len` - Length of the derived key in bytes (at least 1)
/// * `options` - Cost options; unset fields use N=16384, r=8, p=1, maxmem=32 MiB
///
/// # Returns
///
/// The derived key, wiped on drop, or an error if the options or inputs
/// are invalid or memory could not be allocated.
pub fn derive_key(
    password: &[u8],
    salt: &[u8],
    key_len: usize,
    options: &ScryptOptions,
) -> Result<Zeroizing<Vec<u8>>, ScryptError> {
    Scrypt::new()?.derive_key(password, salt, key_len, options)
}

/// Non-blocking [`derive_key`].
pub async fn derive_key_async(
    password: &[u8],
    salt: &[u8],
    key_len: usize,
    options: &ScryptOptions,
) -> Result<Zeroizing<Vec<u8>>, ScryptError> {
    Scrypt::new()?
        .derive_key_async(password, salt, key_len, options)
        .await
}

/// Callback flavour of [`derive_key`]. Errors, including a failure to set
/// up the shared pool, are always delivered through `callback`.
pub fn derive_key_with_callback<F>(
    password: &[u8],
    salt: &[u8],
    key_len: usize,
    options: &ScryptOptions,
    callback: F,
) where
    F: FnOnce(Result<Zeroizing<Vec<u8>>, ScryptError>) + Send + 'static,
{
    match Scrypt::new() {
        Ok(scrypt) => scrypt.derive_key_with_callback(password, salt, key_len, options, callback),
        Err(e) => callback(Err(e)),
    }
}
