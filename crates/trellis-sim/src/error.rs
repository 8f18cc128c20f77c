//! Simulation driver error types

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use trellis_core::CodecError;

/// Result type for simulation runs
pub type SimResult<T> = Result<T, SimError>;

/// Errors that can occur while configuring or running a sweep
#[derive(Error, Debug)]
pub enum SimError {
    /// A codec stage rejected its input
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Reading a config or writing a report failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Config file is not valid JSON for a sweep
    #[error("Failed to parse config {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Report serialization failed
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Config values are out of range
    #[error("Invalid sweep config: {0}")]
    InvalidConfig(String),
}

impl SimError {
    /// Process exit status for the sweep binary: 2 for bad configuration or
    /// arguments, 70 for a decoder invariant violation, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            SimError::Codec(e) if e.is_internal() => 70,
            SimError::Codec(e) if e.is_input_error() => 2,
            SimError::Codec(CodecError::InvalidSpec(_)) => 2,
            SimError::InvalidConfig(_) | SimError::ConfigParse { .. } => 2,
            _ => 1,
        }
    }
}
