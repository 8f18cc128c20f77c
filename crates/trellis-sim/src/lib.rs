//! # Trellis Simulator
//!
//! Monte Carlo bit-error-rate experiments for the codes in `trellis-core`:
//! random messages are encoded, corrupted by a binary symmetric channel at a
//! grid of crossover probabilities, decoded, and scored.
//!
//! ## Example
//!
//! ```rust
//! use trellis_sim::{MonteCarloEngine, SweepConfig};
//!
//! let config = SweepConfig {
//!     message_bits: 32,
//!     trials: 4,
//!     p_stop: 0.1,
//!     p_step: 0.05,
//!     ..Default::default()
//! };
//! let report = MonteCarloEngine::new(config).unwrap().run().unwrap();
//! assert_eq!(report.points.len(), 2);
//! assert_eq!(report.points[0].mean_decoded_error, 0.0);
//! println!("{}", report.to_table());
//! ```

pub mod error;
pub mod report;
pub mod scenario;

pub use error::{SimError, SimResult};
pub use report::{CodeSummary, SweepPoint, SweepReport};
pub use scenario::{MonteCarloEngine, SweepConfig, TrialOutcome};
