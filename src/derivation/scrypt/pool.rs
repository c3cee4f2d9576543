//! Worker pool running scrypt lanes and whole derivations.
//!
//! Lanes are independent: each owns a disjoint `128 * r` byte slice of
//! the working buffer and a private [`LaneScratch`]. A fixed set of
//! workers is formed per derivation, lane `i` going to worker
//! `i % workers`, and the pool joins all of them before returning.

use std::sync::Arc;

use super::core::ScryptError;
use super::memory::LaneScratch;

/// A thread pool for CPU bound scrypt work.
pub struct LanePool {
    pool: rayon::ThreadPool,
}

impl LanePool {
    /// Creates a pool sized to the machine's available parallelism.
    pub fn new(name: &'static str) -> Result<Self, ScryptError> {
        Self::with_threads(name, num_threads())
    }

    pub fn with_threads(name: &'static str, num_threads: usize) -> Result<Self, ScryptError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(move |i| format!("{name} ({i})"))
            .build()
            .map_err(|e| ScryptError::WorkerPool(e.to_string()))?;

        Ok(Self { pool })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs ROMix over every lane of `buffer`, one worker per scratch.
    ///
    /// Blocks until all lanes are done.
    pub(crate) fn run_lanes(
        &self,
        buffer: &mut [u8],
        lane_len: usize,
        scratch: &mut [LaneScratch],
    ) {
        let workers = scratch.len();
        let mut assigned: Vec<Vec<(usize, &mut [u8])>> =
            (0..workers).map(|_| Vec::new()).collect();
        for (i, lane) in buffer.chunks_exact_mut(lane_len).enumerate() {
            assigned[i % workers].push((i, lane));
        }

        self.pool.scope(|s| {
            for (worker, lanes) in scratch.iter_mut().zip(assigned) {
                s.spawn(move |_| {
                    for (i, lane) in lanes {
                        log::trace!("ROMix lane {i}");
                        worker.ro_mix(lane);
                    }
                });
            }
        });
    }

    /// Runs `job` on the pool without blocking the caller and hands its
    /// result, or the reason it produced none, to `deliver`.
    pub(crate) fn spawn<R>(
        &self,
        job: impl FnOnce() -> R + Send + 'static,
        deliver: impl FnOnce(Result<R, ScryptError>) + Send + 'static,
    ) where
        R: Send + 'static,
    {
        self.pool.spawn_fifo(move || deliver(run_caught(job)));
    }

    /// Runs `job` on the pool and waits for its result asynchronously.
    pub(crate) async fn execute_job<R>(
        &self,
        job: impl FnOnce() -> R + Send + 'static,
    ) -> Result<R, ScryptError>
    where
        R: Send + 'static,
    {
        let (sender, receiver) = tokio::sync::oneshot::channel();
        self.spawn(job, move |result| {
            // The receiver is gone if the caller dropped the future.
            let _ = sender.send(result);
        });
        receiver
            .await
            .map_err(|_| ScryptError::WorkerPool("worker exited without a result".into()))?
    }
}

/// The pool shared by the free-standing derivation functions.
pub(crate) fn default_pool() -> Result<Arc<LanePool>, ScryptError> {
    static POOL: std::sync::OnceLock<Arc<LanePool>> = std::sync::OnceLock::new();

    if let Some(pool) = POOL.get() {
        return Ok(Arc::clone(pool));
    }

    let pool = Arc::new(LanePool::new("scrypt")?);
    Ok(Arc::clone(POOL.get_or_init(|| pool)))
}

/// Runs `job`, turning a panic into an error so it can't take the pool down.
fn run_caught<R>(job: impl FnOnce() -> R) -> Result<R, ScryptError> {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(job))
        .map_err(|_| ScryptError::WorkerPool("worker panicked".into()))
}

fn num_threads() -> usize {
    match std::thread::available_parallelism() {
        Ok(nz) => {
            let nz = nz.get();
            log::info!("Using parallelism factor of {nz}");
            nz
        }
        Err(err) => {
            log::warn!(
                "Could not determine number of cpu cores. Falling back to a parallelism factor of 2. Error: {err:?}"
            );
            2
        }
    }
}
