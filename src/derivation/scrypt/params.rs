//! Parameter definitions, defaults and admission control for scrypt.
//!
//! Callers describe a derivation with a loose [`ScryptOptions`] record,
//! which accepts both the canonical option names (`N`, `r`, `p`,
//! `maxmem`) and their legacy aliases (`cost`, `blockSize`,
//! `parallelization`). [`ScryptOptions::normalize`] turns it into a
//! validated [`ScryptParams`], or rejects it before anything large is
//! allocated.

use thiserror::Error;

/// Default CPU/memory cost factor.
pub const DEFAULT_N: u64 = 16_384;
/// Default block size factor.
pub const DEFAULT_R: u32 = 8;
/// Default parallelization factor.
pub const DEFAULT_P: u32 = 1;
/// Default memory ceiling: 32 MiB.
pub const DEFAULT_MAXMEM: u64 = 32 * 1024 * 1024;

/// Largest supported cost factor. Table indices are taken from a 32-bit
/// little-endian read, so `N - 1` must fit in a `u32`.
const MAX_N: u64 = 1 << 32;

/// Errors raised while validating parameters.
///
/// Every variant is detected before the working buffers are allocated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    /// `N` must be greater than 1.
    #[error("cost factor N must be greater than 1 (got {0})")]
    CostTooSmall(u64),
    /// `N` must be a power of two.
    #[error("cost factor N must be a power of two (got {0})")]
    CostNotPowerOfTwo(u64),
    /// `N` must be at most 2^32 and below 2^(16 * r).
    #[error("cost factor N={n} is too large for block size r={r}")]
    CostTooLarge { n: u64, r: u32 },
    /// `r` must be at least 1.
    #[error("block size r must be at least 1")]
    BlockSizeZero,
    /// `p` must be at least 1.
    #[error("parallelization p must be at least 1")]
    ParallelizationZero,
    /// `r * p` must stay below 2^30.
    #[error("r * p must be below 2^30 (r={r}, p={p})")]
    ParallelizationTooLarge { r: u32, p: u32 },
    /// The working set would exceed the configured memory ceiling.
    #[error("scrypt would use {required} bytes of memory, exceeding maxmem={maxmem}")]
    MemoryLimitExceeded { required: u128, maxmem: u64 },
}

/// User-supplied scrypt options.
///
/// All fields are optional; missing values fall back to the defaults.
/// When both a canonical field and its alias are set, the canonical one
/// wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScryptOptions {
    /// CPU/memory cost factor.
    #[cfg_attr(feature = "serde", serde(rename = "N", skip_serializing_if = "Option::is_none"))]
    pub n: Option<u64>,
    /// Legacy alias for `n`.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub cost: Option<u64>,
    /// Block size factor.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub r: Option<u32>,
    /// Legacy alias for `r`.
    #[cfg_attr(
        feature = "serde",
        serde(rename = "blockSize", skip_serializing_if = "Option::is_none")
    )]
    pub block_size: Option<u32>,
    /// Parallelization factor.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub p: Option<u32>,
    /// Legacy alias for `p`.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub parallelization: Option<u32>,
    /// Upper bound on the bytes a derivation may require.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub maxmem: Option<u64>,
}

impl ScryptOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_n(mut self, n: u64) -> Self {
        self.n = Some(n);
        self
    }

    pub fn with_r(mut self, r: u32) -> Self {
        self.r = Some(r);
        self
    }

    pub fn with_p(mut self, p: u32) -> Self {
        self.p = Some(p);
        self
    }

    pub fn with_maxmem(mut self, maxmem: u64) -> Self {
        self.maxmem = Some(maxmem);
        self
    }

    /// Resolves aliases and defaults, then validates the result.
    pub fn normalize(&self) -> Result<ScryptParams, ParamError> {
        let params = ScryptParams {
            n: self.n.or(self.cost).unwrap_or(DEFAULT_N),
            r: self.r.or(self.block_size).unwrap_or(DEFAULT_R),
            p: self.p.or(self.parallelization).unwrap_or(DEFAULT_P),
            maxmem: self.maxmem.unwrap_or(DEFAULT_MAXMEM),
        };
        params.validate()?;
        Ok(params)
    }
}

/// Validated scrypt cost parameters.
///
/// # Memory usage
///
/// A derivation needs `128 * r * (N + 2)` bytes for one lane's lookup
/// table and scratch space, plus `128 * r * p` bytes for the working
/// buffer. This total is checked against `maxmem` before anything is
/// allocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScryptParams {
    pub(crate) n: u64,
    pub(crate) r: u32,
    pub(crate) p: u32,
    pub(crate) maxmem: u64,
}

impl ScryptParams {
    /// Creates parameters with the default memory ceiling.
    pub fn new(n: u64, r: u32, p: u32) -> Result<Self, ParamError> {
        let params = Self {
            n,
            r,
            p,
            maxmem: DEFAULT_MAXMEM,
        };
        params.validate()?;
        Ok(params)
    }

    /// Creates parameters from `log2(N)`.
    pub fn from_log_n(log_n: u8, r: u32, p: u32) -> Result<Self, ParamError> {
        let n = 1u64
            .checked_shl(log_n as u32)
            .ok_or(ParamError::CostTooLarge { n: u64::MAX, r })?;
        Self::new(n, r, p)
    }

    /// Returns a copy with a different memory ceiling, re-running admission.
    pub fn with_maxmem(self, maxmem: u64) -> Result<Self, ParamError> {
        let params = Self { maxmem, ..self };
        params.validate()?;
        Ok(params)
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn r(&self) -> u32 {
        self.r
    }

    pub fn p(&self) -> u32 {
        self.p
    }

    pub fn maxmem(&self) -> u64 {
        self.maxmem
    }

    /// Size in bytes of one lane's block (`128 * r`).
    pub fn lane_len(&self) -> usize {
        128 * self.r as usize
    }

    /// Bytes required by a derivation: `32*r*(N+2)*4 + p*128*r`.
    pub fn required_memory(&self) -> u128 {
        lane_memory(self.n, self.r) + 128 * self.r as u128 * self.p as u128
    }

    /// How many lanes may hold their lookup tables at the same time
    /// without exceeding `maxmem`. Always at least 1 for admitted params.
    pub(crate) fn resident_lanes(&self) -> usize {
        let working = 128 * self.r as u128 * self.p as u128;
        let budget = (self.maxmem as u128).saturating_sub(working);
        let fit = budget / lane_memory(self.n, self.r);
        fit.clamp(1, self.p as u128) as usize
    }

    pub(crate) fn validate(&self) -> Result<(), ParamError> {
        if self.r < 1 {
            return Err(ParamError::BlockSizeZero);
        }

        if self.p < 1 {
            return Err(ParamError::ParallelizationZero);
        }

        if (self.r as u64) * (self.p as u64) >= 1 << 30 {
            return Err(ParamError::ParallelizationTooLarge {
                r: self.r,
                p: self.p,
            });
        }

        if self.n <= 1 {
            return Err(ParamError::CostTooSmall(self.n));
        }

        if !self.n.is_power_of_two() {
            return Err(ParamError::CostNotPowerOfTwo(self.n));
        }

        // N < 2^(16 * r)
        let log_n = self.n.trailing_zeros();
        if self.n > MAX_N || (log_n as u64) >= 16 * self.r as u64 {
            return Err(ParamError::CostTooLarge {
                n: self.n,
                r: self.r,
            });
        }

        let required = self.required_memory();
        if required > self.maxmem as u128 {
            return Err(ParamError::MemoryLimitExceeded {
                required,
                maxmem: self.maxmem,
            });
        }

        Ok(())
    }
}

impl Default for ScryptParams {
    /// N = 16384, r = 8, p = 1, maxmem = 32 MiB.
    fn default() -> Self {
        Self {
            n: DEFAULT_N,
            r: DEFAULT_R,
            p: DEFAULT_P,
            maxmem: DEFAULT_MAXMEM,
        }
    }
}

/// `V` plus `XY` for one lane: `128 * r * (N + 2)`.
fn lane_memory(n: u64, r: u32) -> u128 {
    32 * r as u128 * (n as u128 + 2) * 4
}
