//! # Observability
//!
//! Structured logging via `tracing`. The codec emits `debug`/`trace`
//! events (stage counts, chosen terminal state, corrected path metric);
//! the simulation driver adds per-point summaries at `info`.
//!
//! ```rust,ignore
//! use trellis_core::observe::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::default());
//! tracing::info!("Sweep started");
//! ```

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
