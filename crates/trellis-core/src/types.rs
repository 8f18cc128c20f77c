//! Core types for trellis coding
//!
//! Bits travel through the pipeline as one bit per byte (`0` or `1`), the
//! same unpacked representation used between FEC blocks and modulators.
//! Any other byte value is rejected at the boundary of every operation.
//!
//! ```text
//! message ──► encoder ──► BSC ──► trellis decoder ──► metrics
//!  [Bit]       [Bit]      [Bit]        [Bit]          f64
//! ```

/// A single hard-decision bit, `0` or `1`.
pub type Bit = u8;

/// An owned sequence of unpacked bits.
pub type BitVec = Vec<Bit>;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised by the state machine, encoder, channel, decoder and metrics.
///
/// None of these are retried internally; the call that raised one fails and
/// the error goes back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("Invalid state machine spec: {0}")]
    InvalidSpec(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid input bit {value} at position {position}. Must be 0 or 1")]
    InvalidInput { position: usize, value: u8 },

    #[error("Invalid length: {len} bits is not a multiple of symbol width {symbol_width}")]
    InvalidLength { len: usize, symbol_width: usize },

    #[error("Symbol width mismatch: machine emits {expected}-bit symbols, got {actual}")]
    SymbolWidthMismatch { expected: usize, actual: usize },

    #[error("Length mismatch: {left} vs {right} bits")]
    LengthMismatch { left: usize, right: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("State {state} is unreachable at stage {stage}")]
    UnreachableState { state: String, stage: usize },

    #[error("Inconsistent trellis: {0}")]
    Inconsistent(String),
}

impl CodecError {
    /// True for errors caused by the caller's arguments rather than by the
    /// machine definition or the decoder itself.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CodecError::InvalidInput { .. }
                | CodecError::InvalidLength { .. }
                | CodecError::SymbolWidthMismatch { .. }
                | CodecError::LengthMismatch { .. }
                | CodecError::InvalidParameter(_)
                | CodecError::InvalidState(_)
        )
    }

    /// True for internal invariant violations.
    pub fn is_internal(&self) -> bool {
        matches!(self, CodecError::Inconsistent(_))
    }
}
