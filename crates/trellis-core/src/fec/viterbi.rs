//! Trellis (Viterbi) Decoder — hard-decision maximum-likelihood decoding
//!
//! Decodes a received bitstream against any [`StateMachine`] by building the
//! full [`Trellis`] of path metrics and walking the survivors back from the
//! terminal state. The branch metric is the Hamming distance between the
//! edge's output symbol and the received symbol, so the surviving path is
//! the codeword closest to what arrived over a binary symmetric channel.
//!
//! Termination defaults to the cheapest state at the last stage. Blocks that
//! were flushed back to a known state can pin the terminal state with
//! [`Termination::FlushedTo`]; the decoder then refuses to decode if that
//! state cannot be reached.
//!
//! ## Example
//!
//! ```rust
//! use trellis_core::bits::parse_bits;
//! use trellis_core::fec::{MachineSpec, TrellisDecoder, TrellisEncoder};
//!
//! let machine = MachineSpec::rate_one_third_k3().build().unwrap();
//! let message = parse_bits("1011000").unwrap();
//! let mut received = TrellisEncoder::new(&machine)
//!     .encode(&message, machine.start_state())
//!     .unwrap();
//! received[4] ^= 1; // one channel error
//!
//! let decoder = TrellisDecoder::new(&machine);
//! let outcome = decoder.decode_detailed(&received, 3).unwrap();
//! assert_eq!(outcome.message, message);
//! assert_eq!(outcome.path_metric, 1);
//! ```

use super::state_machine::{StateId, StateMachine};
use super::trellis::Trellis;
use crate::bits::validate_bits;
use crate::types::{Bit, BitVec, CodecError, CodecResult};
use tracing::{debug, trace};

/// How the decoder picks the state the survivor path ends in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Termination {
    /// Minimum-cost state at the last stage, lowest index on ties.
    #[default]
    MinimumCost,
    /// The encoder was flushed to this state.
    FlushedTo(StateId),
}

/// Decoded message with the survivor path that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// One bit per received symbol, flush bits included.
    pub message: BitVec,
    pub terminal_state: StateId,
    /// Hamming distance between the received bits and the re-encoded path,
    /// i.e. the number of channel errors the decoder assumes it corrected.
    pub path_metric: u64,
    /// `message.len() + 1` states, from the start state to `terminal_state`.
    pub state_path: Vec<StateId>,
}

/// Hard-decision Viterbi decoder over a borrowed state machine.
#[derive(Debug, Clone, Copy)]
pub struct TrellisDecoder<'a> {
    machine: &'a StateMachine,
    start: StateId,
    termination: Termination,
}

impl<'a> TrellisDecoder<'a> {
    /// Decoder starting from the machine's start state with minimum-cost
    /// termination.
    pub fn new(machine: &'a StateMachine) -> Self {
        Self {
            machine,
            start: machine.start_state(),
            termination: Termination::MinimumCost,
        }
    }

    /// Start from a different state.
    pub fn with_start(mut self, start: StateId) -> Self {
        self.start = start;
        self
    }

    pub fn with_termination(mut self, termination: Termination) -> Self {
        self.termination = termination;
        self
    }

    pub fn machine(&self) -> &'a StateMachine {
        self.machine
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// Validate and segment `received`, then build every trellis stage.
    pub fn build_trellis(&self, received: &[Bit], symbol_width: usize) -> CodecResult<Trellis> {
        self.check_received(received, symbol_width)?;
        self.machine.ensure_state(self.start)?;

        let trellis = Trellis::build(self.machine, self.start, received.chunks(symbol_width))?;
        trace!(
            stages = trellis.num_stages(),
            reachable = trellis.final_stage().reachable_count(),
            "built trellis"
        );
        Ok(trellis)
    }

    /// Decode `received` into one message bit per symbol.
    pub fn decode(&self, received: &[Bit], symbol_width: usize) -> CodecResult<BitVec> {
        self.decode_detailed(received, symbol_width)
            .map(|outcome| outcome.message)
    }

    /// Decode and report the terminal state, path metric and state path.
    pub fn decode_detailed(
        &self,
        received: &[Bit],
        symbol_width: usize,
    ) -> CodecResult<DecodeOutcome> {
        let trellis = self.build_trellis(received, symbol_width)?;
        let (terminal_state, path_metric) = self.select_terminal(&trellis)?;
        let (message, state_path) = trellis.backtrace(self.machine, terminal_state)?;

        debug!(
            symbols = trellis.num_stages(),
            terminal = %terminal_state,
            path_metric,
            "decoded block"
        );

        Ok(DecodeOutcome {
            message,
            terminal_state,
            path_metric,
            state_path,
        })
    }

    fn check_received(&self, received: &[Bit], symbol_width: usize) -> CodecResult<()> {
        if symbol_width == 0 {
            return Err(CodecError::InvalidParameter(
                "symbol width must be at least 1".into(),
            ));
        }
        if symbol_width != self.machine.symbol_width() {
            return Err(CodecError::SymbolWidthMismatch {
                expected: self.machine.symbol_width(),
                actual: symbol_width,
            });
        }
        if received.len() % symbol_width != 0 {
            return Err(CodecError::InvalidLength {
                len: received.len(),
                symbol_width,
            });
        }
        validate_bits(received)
    }

    fn select_terminal(&self, trellis: &Trellis) -> CodecResult<(StateId, u64)> {
        let last = trellis.final_stage();
        match self.termination {
            Termination::MinimumCost => last.best(self.machine).ok_or_else(|| {
                CodecError::Inconsistent(format!(
                    "no reachable state at stage {}",
                    trellis.num_stages()
                ))
            }),
            Termination::FlushedTo(state) => {
                self.machine.ensure_state(state)?;
                match last.cost(state) {
                    Some(cost) => Ok((state, cost)),
                    None => Err(CodecError::UnreachableState {
                        state: self
                            .machine
                            .state_name(state)
                            .unwrap_or_default()
                            .to_string(),
                        stage: trellis.num_stages(),
                    }),
                }
            }
        }
    }
}
