//! Forward Error Correction (FEC) Blocks
//!
//! Convolutional codes described as explicit state machines, with a
//! stateless encoder and a hard-decision Viterbi decoder over the same graph.
//!
//! ## Available Blocks
//!
//! - [`StateMachine`] / [`MachineSpec`] - validated code graph and its declarative form
//! - [`TrellisEncoder`] - message bits to codeword
//! - [`TrellisDecoder`] - maximum-likelihood decoding via the [`Trellis`]
//! - [`free_distance`] - error-correcting strength of a machine
//!
//! ## Usage
//!
//! ```rust
//! use trellis_core::fec::{MachineSpec, Termination, TrellisDecoder, TrellisEncoder};
//!
//! // Rate 1/2, K=3 code with generators 7 and 5 (octal)
//! let machine = MachineSpec::from_generators(3, &[0o7, 0o5])
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let data = vec![1, 0, 1, 1, 0, 0, 1, 0];
//! let encoded = TrellisEncoder::new(&machine).encode_terminated(&data, 2).unwrap();
//!
//! let decoded = TrellisDecoder::new(&machine)
//!     .with_termination(Termination::FlushedTo(machine.start_state()))
//!     .decode(&encoded, machine.symbol_width())
//!     .unwrap();
//! assert_eq!(&decoded[..data.len()], &data[..]);
//! ```

pub mod encoder;
pub mod free_distance;
pub mod state_machine;
pub mod trellis;
pub mod viterbi;

pub use encoder::{EncodedFrame, TrellisEncoder};
pub use free_distance::free_distance;
pub use state_machine::{
    MachineSpec, ReverseTransition, StateId, StateMachine, Transition, TransitionSpec,
};
pub use trellis::{PathCost, Survivor, Trellis, TrellisStage};
pub use viterbi::{DecodeOutcome, Termination, TrellisDecoder};
