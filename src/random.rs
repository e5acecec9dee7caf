//! Unbiased bounded random integers.
//!
//! `random() % n` favours small remainders whenever `n` does not divide
//! 2^64. The sampler here rejects draws from the incomplete top bucket and
//! redraws, so every residue in `[0, n)` is equally likely.
//!
//! The entropy source is owned by the sampler rather than pulled from a
//! global, which lets tests substitute a deterministic source.

use thiserror::Error;

/// Failure to obtain randomness from the underlying source.
#[derive(Debug, Error)]
pub enum EntropyError {
    /// The operating system RNG reported an error.
    #[error("OS entropy source failed: {0}")]
    Os(String),

    /// A finite test source ran out of values.
    #[error("Entropy source exhausted")]
    Exhausted,
}

/// A source of uniformly distributed 64-bit values.
///
/// Implementations must be safe to share between threads; the sampler
/// itself keeps no state across calls.
pub trait EntropySource: Send + Sync {
    /// Draw one uniformly random `u64`.
    fn next_u64(&self) -> Result<u64, EntropyError>;
}

/// Cryptographically strong entropy from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn next_u64(&self) -> Result<u64, EntropyError> {
        let mut buf = [0u8; 8];
        getrandom::getrandom(&mut buf).map_err(|e| EntropyError::Os(e.to_string()))?;
        Ok(u64::from_le_bytes(buf))
    }
}

/// Bounded sampler over an owned entropy source.
#[derive(Debug, Clone, Default)]
pub struct RandomSampler<E = OsEntropy> {
    source: E,
}

impl RandomSampler<OsEntropy> {
    /// Sampler backed by the OS RNG.
    pub fn os() -> Self {
        Self { source: OsEntropy }
    }
}

impl<E: EntropySource> RandomSampler<E> {
    /// Create a sampler that draws from `source`.
    pub fn new(source: E) -> Self {
        Self { source }
    }

    /// Borrow the underlying entropy source.
    pub fn source(&self) -> &E {
        &self.source
    }

    /// Return a value uniformly distributed over `[0, upper_bound)`.
    ///
    /// # Panics
    ///
    /// Panics if `upper_bound` is zero. That is a defect in the caller, not
    /// a runtime condition.
    ///
    /// # Errors
    ///
    /// Returns `EntropyError` if the source cannot produce a value. There
    /// is no fallback to a biased method.
    pub fn sample(&self, upper_bound: u64) -> Result<u64, EntropyError> {
        assert!(upper_bound > 0, "sample upper bound must be non-zero");

        let limit = rejection_limit(upper_bound);
        loop {
            let draw = self.source.next_u64()?;
            if draw < limit {
                return Ok(draw % upper_bound);
            }
        }
    }
}

/// First draw value that must be rejected for `upper_bound`.
///
/// Everything below the limit covers each residue the same number of times.
fn rejection_limit(upper_bound: u64) -> u64 {
    u64::MAX - (u64::MAX % upper_bound)
}

/// Sample `[0, upper_bound)` from the OS RNG.
///
/// # Panics
///
/// Panics if `upper_bound` is zero.
pub fn random64(upper_bound: u64) -> Result<u64, EntropyError> {
    RandomSampler::os().sample(upper_bound)
}
