//! Error Metrics — Hamming distance and bit error rate
//!
//! Pairwise comparison of equal-length bit sequences, plus an accumulating
//! [`ErrorCounter`] that pools errors over many trials and reports a
//! normal-approximation confidence interval.
//!
//! ## Example
//!
//! ```rust
//! use trellis_core::metrics::{error_rate, hamming_distance, ErrorCounter};
//!
//! let tx = vec![1, 0, 1, 1, 0, 1, 0, 0, 1, 1];
//! let rx = vec![1, 0, 1, 0, 0, 1, 0, 1, 1, 1];
//! //                     ^           ^  -- 2 errors
//! assert_eq!(hamming_distance(&tx, &rx).unwrap(), 2);
//! assert!((error_rate(&tx, &rx).unwrap() - 0.2).abs() < 1e-12);
//!
//! let mut counter = ErrorCounter::new();
//! counter.update(&tx, &rx).unwrap();
//! assert_eq!(counter.error_bits(), 2);
//! ```

use crate::bits::validate_bits;
use crate::types::{Bit, CodecError, CodecResult};

/// Number of positions at which `a` and `b` differ.
///
/// Fails with [`CodecError::LengthMismatch`] for unequal lengths and with
/// [`CodecError::InvalidInput`] for values other than 0 and 1.
pub fn hamming_distance(a: &[Bit], b: &[Bit]) -> CodecResult<usize> {
    if a.len() != b.len() {
        return Err(CodecError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    validate_bits(a)?;
    validate_bits(b)?;
    Ok(count_differences(a, b))
}

/// Fraction of differing positions, `hamming_distance(a, b) / a.len()`.
///
/// Always within `[0, 1]`. Two empty sequences have an error rate of 0.
pub fn error_rate(a: &[Bit], b: &[Bit]) -> CodecResult<f64> {
    let distance = hamming_distance(a, b)?;
    if a.is_empty() {
        return Ok(0.0);
    }
    Ok(distance as f64 / a.len() as f64)
}

/// Unchecked distance for slices already validated by the caller.
pub(crate) fn count_differences(a: &[Bit], b: &[Bit]) -> usize {
    a.iter().zip(b).filter(|(x, y)| x != y).count()
}

/// Accumulating bit error counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorCounter {
    total_bits: u64,
    error_bits: u64,
}

impl ErrorCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare transmitted and received bits and add the result.
    ///
    /// Returns the number of errors in this update.
    pub fn update(&mut self, tx: &[Bit], rx: &[Bit]) -> CodecResult<usize> {
        let errors = hamming_distance(tx, rx)?;
        self.record(errors as u64, tx.len() as u64);
        Ok(errors)
    }

    /// Add an already-counted result.
    ///
    /// `errors` must not exceed `bits`. Debug builds panic on a violation;
    /// release builds clamp to `bits` so the rate stays within `[0, 1]`.
    pub fn record(&mut self, errors: u64, bits: u64) {
        debug_assert!(
            errors <= bits,
            "recorded {} errors in only {} bits",
            errors,
            bits
        );
        self.error_bits += errors.min(bits);
        self.total_bits += bits;
    }

    /// Fold another counter into this one.
    pub fn merge(&mut self, other: &ErrorCounter) {
        self.error_bits += other.error_bits;
        self.total_bits += other.total_bits;
    }

    /// Pooled error rate. Zero before any bits are recorded.
    pub fn error_rate(&self) -> f64 {
        if self.total_bits == 0 {
            return 0.0;
        }
        self.error_bits as f64 / self.total_bits as f64
    }

    pub fn total_bits(&self) -> u64 {
        self.total_bits
    }

    pub fn error_bits(&self) -> u64 {
        self.error_bits
    }

    /// Normal-approximation confidence interval on the error rate.
    ///
    /// Returns `(lower, upper)` clamped to `[0, 1]`; `(0, 1)` when empty.
    pub fn confidence_interval(&self, confidence: f64) -> (f64, f64) {
        if self.total_bits == 0 {
            return (0.0, 1.0);
        }
        let p = self.error_rate();
        let n = self.total_bits as f64;
        let margin = z_score(confidence) * (p * (1.0 - p) / n).sqrt();
        ((p - margin).max(0.0), (p + margin).min(1.0))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn summary(&self) -> String {
        let (lo, hi) = self.confidence_interval(0.95);
        format!(
            "BER: {:.6} ({} errors / {} bits) [{:.6}, {:.6}] 95% CI",
            self.error_rate(),
            self.error_bits,
            self.total_bits,
            lo,
            hi,
        )
    }
}

/// Two-sided z-score for a confidence level.
fn z_score(confidence: f64) -> f64 {
    match () {
        _ if (confidence - 0.90).abs() < 0.001 => 1.645,
        _ if (confidence - 0.95).abs() < 0.001 => 1.960,
        _ if (confidence - 0.99).abs() < 0.001 => 2.576,
        _ => {
            // Rational approximation of the probit function
            let p = ((1.0 - confidence) / 2.0).clamp(1e-12, 0.5);
            let t = (-2.0 * p.ln()).sqrt();
            t - (2.515517 + 0.802853 * t + 0.010328 * t * t)
                / (1.0 + 1.432788 * t + 0.189269 * t * t + 0.001308 * t * t * t)
        }
    }
}
