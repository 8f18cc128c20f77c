//! Trellis Encoder
//!
//! Walks a [`StateMachine`] driven by message bits and concatenates the
//! output symbols of the traversed edges. The encoder borrows the machine
//! and keeps no state between calls, so one machine can serve many encoders
//! concurrently.
//!
//! Terminated blocks append flush bits (zeros for the feed-forward codes in
//! this crate) so the encoder returns to the start state and the decoder can
//! trust the final state of the path.
//!
//! ## Example
//!
//! ```rust
//! use trellis_core::bits::{format_bits, parse_bits};
//! use trellis_core::fec::{MachineSpec, TrellisEncoder};
//!
//! let machine = MachineSpec::rate_one_third_k3().build().unwrap();
//! let encoder = TrellisEncoder::new(&machine);
//!
//! let message = parse_bits("1011000").unwrap();
//! let encoded = encoder.encode(&message, machine.start_state()).unwrap();
//! assert_eq!(format_bits(&encoded), "111101100010110011000");
//! ```

use super::state_machine::{StateId, StateMachine};
use crate::bits::validate_bits;
use crate::types::{Bit, BitVec, CodecResult};

/// Encoded block together with the states the encoder visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    /// Concatenated output symbols.
    pub bits: BitVec,
    /// `message.len() + 1` states, starting with the start state.
    pub path: Vec<StateId>,
}

impl EncodedFrame {
    /// State the encoder stopped in.
    pub fn final_state(&self) -> StateId {
        // path always holds at least the start state
        self.path[self.path.len() - 1]
    }
}

/// Stateless encoder over a borrowed state machine.
#[derive(Debug, Clone, Copy)]
pub struct TrellisEncoder<'a> {
    machine: &'a StateMachine,
}

impl<'a> TrellisEncoder<'a> {
    pub fn new(machine: &'a StateMachine) -> Self {
        Self { machine }
    }

    pub fn machine(&self) -> &'a StateMachine {
        self.machine
    }

    /// Encode `message` starting from `start`.
    ///
    /// The output holds `message.len() * symbol_width` bits.
    pub fn encode(&self, message: &[Bit], start: StateId) -> CodecResult<BitVec> {
        self.machine.ensure_state(start)?;
        validate_bits(message)?;

        let mut output = Vec::with_capacity(message.len() * self.machine.symbol_width());
        let mut state = start;
        for &bit in message {
            let edge = self.machine.transition(state, bit)?;
            output.extend_from_slice(edge.output());
            state = edge.next();
        }
        Ok(output)
    }

    /// Encode and also record the state path.
    pub fn encode_with_path(&self, message: &[Bit], start: StateId) -> CodecResult<EncodedFrame> {
        self.machine.ensure_state(start)?;
        validate_bits(message)?;

        let mut bits = Vec::with_capacity(message.len() * self.machine.symbol_width());
        let mut path = Vec::with_capacity(message.len() + 1);
        path.push(start);

        let mut state = start;
        for &bit in message {
            let edge = self.machine.transition(state, bit)?;
            bits.extend_from_slice(edge.output());
            state = edge.next();
            path.push(state);
        }
        Ok(EncodedFrame { bits, path })
    }

    /// Append `flush_bits` zeros to `message` and encode from the start
    /// state, as a terminated block.
    pub fn encode_terminated(&self, message: &[Bit], flush_bits: usize) -> CodecResult<BitVec> {
        let mut block = Vec::with_capacity(message.len() + flush_bits);
        block.extend_from_slice(message);
        block.resize(message.len() + flush_bits, 0);
        self.encode(&block, self.machine.start_state())
    }
}
