//! Bit-error-rate sweep scenarios
//!
//! A [`SweepConfig`] names the code, the message length and the grid of BSC
//! crossover probabilities; the [`MonteCarloEngine`] runs the
//! encode/channel/decode pipeline repeatedly at every grid point and
//! aggregates the error rates into a [`crate::report::SweepReport`].

pub mod config;
pub mod engine;

pub use config::SweepConfig;
pub use engine::{MonteCarloEngine, TrialOutcome};
