//! # Trellis Core
//!
//! Convolutional codes expressed as explicit finite state machines, encoded
//! and then decoded by a hard-decision Viterbi search over the code trellis.
//!
//! ## Overview
//!
//! - **State machine**: validated code graph, forward and reverse adjacency
//! - **Encoder**: message bits to concatenated output symbols
//! - **Channel**: binary symmetric channel with a caller-seeded RNG
//! - **Decoder**: per-stage path metrics, survivor backtrace
//! - **Metrics**: Hamming distance, bit error rate, pooled error counting
//!
//! ## Signal Flow
//!
//! ```text
//! message ─► Encoder ─► BSC(p) ─► Trellis Decoder ─► decoded
//!    │                                                   │
//!    └──────────────────── error_rate ◄──────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use trellis_core::prelude::*;
//!
//! let machine = MachineSpec::rate_one_third_k3().build().unwrap();
//! let message = parse_bits("1011000").unwrap();
//!
//! let encoded = TrellisEncoder::new(&machine)
//!     .encode(&message, machine.start_state())
//!     .unwrap();
//! let noisy = apply_noise(&encoded, 0.0, &mut StdRng::seed_from_u64(1)).unwrap();
//! let decoded = TrellisDecoder::new(&machine)
//!     .decode(&noisy.received, machine.symbol_width())
//!     .unwrap();
//!
//! assert_eq!(error_rate(&message, &decoded).unwrap(), 0.0);
//! ```

pub mod bits;
pub mod channel;
pub mod fec;
pub mod metrics;
pub mod observe;
pub mod types;

pub use types::{Bit, BitVec, CodecError, CodecResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::bits::{format_bits, parse_bits};
    pub use crate::channel::{apply_noise, BinarySymmetricChannel, NoisyBits};
    pub use crate::fec::{
        free_distance, DecodeOutcome, MachineSpec, StateId, StateMachine, Termination,
        TrellisDecoder, TrellisEncoder,
    };
    pub use crate::metrics::{error_rate, hamming_distance, ErrorCounter};
    pub use crate::types::{Bit, BitVec, CodecError, CodecResult};
}
