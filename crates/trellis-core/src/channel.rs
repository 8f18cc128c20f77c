//! Binary Symmetric Channel
//!
//! Hard-decision channel model: every transmitted bit is flipped
//! independently with probability `p`. This is what a coherent BPSK link
//! looks like after the slicer, and it is the channel the Viterbi decoder's
//! Hamming branch metric is optimal for.
//!
//! The random source is supplied by the caller, so seeding a
//! [`rand::rngs::StdRng`] reproduces the exact error pattern.
//!
//! ## Usage
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use trellis_core::channel::BinarySymmetricChannel;
//!
//! let channel = BinarySymmetricChannel::new(0.1).unwrap();
//! let mut rng = StdRng::seed_from_u64(42);
//!
//! let tx = vec![0u8; 1000];
//! let noisy = channel.transmit(&tx, &mut rng).unwrap();
//! assert_eq!(noisy.received.len(), tx.len());
//! assert_eq!(noisy.flips(), noisy.received.iter().filter(|&&b| b == 1).count());
//! ```

use crate::bits::validate_bits;
use crate::types::{Bit, BitVec, CodecError, CodecResult};
use rand::distributions::{Bernoulli, Distribution};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Received bits together with the positions the channel corrupted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoisyBits {
    pub received: BitVec,
    /// 1 where the channel flipped the bit.
    pub flip_mask: BitVec,
}

impl NoisyBits {
    /// Number of flipped bits.
    pub fn flips(&self) -> usize {
        self.flip_mask.iter().filter(|&&m| m == 1).count()
    }
}

/// Memoryless binary channel with crossover probability `p`.
#[derive(Debug, Clone, Copy)]
pub struct BinarySymmetricChannel {
    flip_probability: f64,
    flip: Bernoulli,
}

impl BinarySymmetricChannel {
    /// Fails with [`CodecError::InvalidParameter`] unless `0 <= p <= 1`.
    pub fn new(flip_probability: f64) -> CodecResult<Self> {
        if !(0.0..=1.0).contains(&flip_probability) {
            return Err(CodecError::InvalidParameter(format!(
                "flip probability {} outside [0, 1]",
                flip_probability
            )));
        }
        let flip = Bernoulli::new(flip_probability)
            .map_err(|e| CodecError::InvalidParameter(e.to_string()))?;
        Ok(Self {
            flip_probability,
            flip,
        })
    }

    pub fn flip_probability(&self) -> f64 {
        self.flip_probability
    }

    /// Send `bits` through the channel.
    pub fn transmit<R: Rng + ?Sized>(&self, bits: &[Bit], rng: &mut R) -> CodecResult<NoisyBits> {
        validate_bits(bits)?;
        let flip_mask: BitVec = bits
            .iter()
            .map(|_| Bit::from(self.flip.sample(rng)))
            .collect();
        let received = bits.iter().zip(&flip_mask).map(|(b, m)| b ^ m).collect();
        Ok(NoisyBits {
            received,
            flip_mask,
        })
    }

    /// Shannon capacity in bits per channel use, `1 - H(p)`.
    pub fn capacity(&self) -> f64 {
        1.0 - binary_entropy(self.flip_probability)
    }
}

/// One-shot helper: corrupt `bits` with crossover probability `p`.
pub fn apply_noise<R: Rng + ?Sized>(
    bits: &[Bit],
    flip_probability: f64,
    rng: &mut R,
) -> CodecResult<NoisyBits> {
    BinarySymmetricChannel::new(flip_probability)?.transmit(bits, rng)
}

fn binary_entropy(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 {
        return 0.0;
    }
    -p * p.log2() - (1.0 - p) * (1.0 - p).log2()
}
