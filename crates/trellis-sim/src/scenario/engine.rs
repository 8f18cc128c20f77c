//! Monte Carlo engine: BER sweep over crossover probabilities
//!
//! Each trial runs the whole pipeline once: a random message plus flush
//! zeros is encoded, sent through a binary symmetric channel, decoded, and
//! compared against the transmitted message. Trials of one point run in
//! parallel on the rayon pool; every trial seeds its own RNG from
//! `(seed, point, trial)`, so results do not depend on scheduling.

use super::config::SweepConfig;
use crate::error::SimResult;
use crate::report::{CodeSummary, SweepPoint, SweepReport};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};
use trellis_core::channel::BinarySymmetricChannel;
use trellis_core::fec::{free_distance, StateMachine, Termination, TrellisDecoder, TrellisEncoder};
use trellis_core::metrics::{error_rate, hamming_distance, ErrorCounter};
use trellis_core::BitVec;

/// Error counts of a single trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialOutcome {
    pub channel_errors: usize,
    pub channel_bits: usize,
    pub channel_error_rate: f64,
    pub decoded_errors: usize,
    pub decoded_bits: usize,
    pub decoded_error_rate: f64,
}

/// Runs a [`SweepConfig`] against its state machine.
#[derive(Debug)]
pub struct MonteCarloEngine {
    config: SweepConfig,
    machine: StateMachine,
}

impl MonteCarloEngine {
    /// Validate the config and build its machine.
    pub fn new(config: SweepConfig) -> SimResult<Self> {
        config.validate()?;
        let machine = config.build_machine()?;
        Ok(Self { config, machine })
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// Run every point of the sweep in ascending probability order.
    pub fn run(&self) -> SimResult<SweepReport> {
        let probabilities = self.config.probabilities();
        info!(
            points = probabilities.len(),
            trials = self.config.trials,
            message_bits = self.config.message_bits,
            machine = %self.machine,
            "starting sweep"
        );

        let points = probabilities
            .iter()
            .enumerate()
            .map(|(index, &p)| self.run_point(index, p))
            .collect::<SimResult<Vec<_>>>()?;

        Ok(SweepReport {
            code: CodeSummary {
                num_states: self.machine.num_states(),
                symbol_width: self.machine.symbol_width(),
                free_distance: free_distance(&self.machine).ok(),
            },
            message_bits: self.config.message_bits,
            flush_bits: self.config.flush_bits,
            seed: self.config.seed,
            points,
        })
    }

    /// Run all trials at crossover probability `p`.
    ///
    /// `index` is the point's position in the sweep and only feeds the
    /// per-trial seeds.
    pub fn run_point(&self, index: usize, p: f64) -> SimResult<SweepPoint> {
        let channel = BinarySymmetricChannel::new(p)?;
        let outcomes = (0..self.config.trials)
            .into_par_iter()
            .map(|trial| self.run_trial(&channel, self.trial_seed(index, trial)))
            .collect::<SimResult<Vec<_>>>()?;

        let mut channel_counter = ErrorCounter::new();
        let mut decoded_counter = ErrorCounter::new();
        for o in &outcomes {
            channel_counter.record(o.channel_errors as u64, o.channel_bits as u64);
            decoded_counter.record(o.decoded_errors as u64, o.decoded_bits as u64);
        }
        let trials = outcomes.len() as f64;
        let mean_channel = outcomes.iter().map(|o| o.channel_error_rate).sum::<f64>() / trials;
        let mean_decoded = outcomes.iter().map(|o| o.decoded_error_rate).sum::<f64>() / trials;

        info!(
            p,
            channel_ber = mean_channel,
            decoded_ber = mean_decoded,
            decoded_errors = decoded_counter.error_bits(),
            "sweep point done"
        );

        Ok(SweepPoint::from_counters(
            p,
            outcomes.len(),
            mean_channel,
            mean_decoded,
            &channel_counter,
            &decoded_counter,
        ))
    }

    /// One encode/channel/decode pass with its own seeded RNG.
    pub fn run_trial(&self, channel: &BinarySymmetricChannel, seed: u64) -> SimResult<TrialOutcome> {
        let mut rng = StdRng::seed_from_u64(seed);
        let message: BitVec = (0..self.config.message_bits)
            .map(|_| rng.gen_range(0..=1))
            .collect();

        let encoded = TrellisEncoder::new(&self.machine)
            .encode_terminated(&message, self.config.flush_bits)?;
        let noisy = channel.transmit(&encoded, &mut rng)?;

        let decoded = self
            .decoder()
            .decode(&noisy.received, self.machine.symbol_width())?;
        let decoded_message = &decoded[..message.len()];

        let outcome = TrialOutcome {
            channel_errors: hamming_distance(&encoded, &noisy.received)?,
            channel_bits: encoded.len(),
            channel_error_rate: error_rate(&encoded, &noisy.received)?,
            decoded_errors: hamming_distance(&message, decoded_message)?,
            decoded_bits: message.len(),
            decoded_error_rate: error_rate(&message, decoded_message)?,
        };
        debug!(
            seed,
            p = channel.flip_probability(),
            channel_errors = outcome.channel_errors,
            decoded_errors = outcome.decoded_errors,
            "trial"
        );
        Ok(outcome)
    }

    fn decoder(&self) -> TrellisDecoder<'_> {
        let decoder = TrellisDecoder::new(&self.machine);
        if self.config.terminate_at_start {
            decoder.with_termination(Termination::FlushedTo(self.machine.start_state()))
        } else {
            decoder
        }
    }

    fn trial_seed(&self, point: usize, trial: usize) -> u64 {
        let stream = (point as u64)
            .wrapping_mul(self.config.trials as u64)
            .wrapping_add(trial as u64);
        self.config.seed.wrapping_add(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use trellis_core::fec::MachineSpec;

    fn small_config() -> SweepConfig {
        SweepConfig {
            message_bits: 64,
            trials: 8,
            p_start: 0.0,
            p_stop: 0.3,
            p_step: 0.1,
            ..Default::default()
        }
    }

    #[test]
    fn test_noiseless_point_is_error_free() {
        let engine = MonteCarloEngine::new(small_config()).unwrap();
        let point = engine.run_point(0, 0.0).unwrap();
        assert_eq!(point.trials, 8);
        assert_eq!(point.mean_channel_error, 0.0);
        assert_eq!(point.mean_decoded_error, 0.0);
        assert_eq!(point.decoded_bits, 8 * 64);
        assert_eq!(point.channel_bits, 8 * (64 + 3) * 3);
    }

    #[test]
    fn test_sweep_is_reproducible() {
        let a = MonteCarloEngine::new(small_config()).unwrap().run().unwrap();
        let b = MonteCarloEngine::new(small_config()).unwrap().run().unwrap();
        assert_eq!(a, b);

        let other = MonteCarloEngine::new(SweepConfig {
            seed: 1234,
            ..small_config()
        })
        .unwrap()
        .run()
        .unwrap();
        assert_ne!(a.points[1], other.points[1]);
    }

    #[test]
    fn test_report_shape() {
        let report = MonteCarloEngine::new(small_config()).unwrap().run().unwrap();
        assert_eq!(report.points.len(), 3);
        assert_eq!(report.code.num_states, 4);
        assert_eq!(report.code.symbol_width, 3);
        assert_eq!(report.code.free_distance, Some(7));
        let ps: Vec<_> = report.points.iter().map(|p| p.flip_probability).collect();
        assert!(ps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_coding_helps_at_low_noise() {
        let config = SweepConfig {
            message_bits: 256,
            trials: 20,
            ..Default::default()
        };
        let engine = MonteCarloEngine::new(config).unwrap();
        let point = engine.run_point(0, 0.02).unwrap();
        assert!(point.mean_channel_error > 0.0);
        assert!(
            point.mean_decoded_error < point.mean_channel_error,
            "decoded {} vs channel {}",
            point.mean_decoded_error,
            point.mean_channel_error
        );
    }

    #[test]
    fn test_channel_rate_tracks_p() {
        let engine = MonteCarloEngine::new(small_config()).unwrap();
        let point = engine.run_point(3, 0.2).unwrap();
        // 8 trials x 201 channel bits
        assert!((point.mean_channel_error - 0.2).abs() < 0.05);
    }

    #[test]
    fn test_trial_seeds_distinct() {
        let engine = MonteCarloEngine::new(small_config()).unwrap();
        let mut seeds: Vec<_> = (0..3)
            .flat_map(|p| (0..8).map(move |t| (p, t)))
            .map(|(p, t)| engine.trial_seed(p, t))
            .collect();
        seeds.sort_unstable();
        seeds.dedup();
        assert_eq!(seeds.len(), 24);
    }

    #[test]
    fn test_minimum_cost_termination() {
        let engine = MonteCarloEngine::new(SweepConfig {
            terminate_at_start: false,
            flush_bits: 0,
            ..small_config()
        })
        .unwrap();
        let point = engine.run_point(0, 0.0).unwrap();
        assert_eq!(point.mean_decoded_error, 0.0);
    }

    #[test]
    fn test_unflushed_blocks_cannot_pin_start_state() {
        let err = MonteCarloEngine::new(SweepConfig {
            flush_bits: 0,
            terminate_at_start: true,
            ..small_config()
        })
        .unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(ref m) if m.contains("flush bits")));

        // with enough flush bits the pinned decoder is exact on a clean channel
        let engine = MonteCarloEngine::new(SweepConfig {
            flush_bits: 2,
            terminate_at_start: true,
            ..small_config()
        })
        .unwrap();
        let point = engine.run_point(0, 0.0).unwrap();
        assert_eq!(point.mean_decoded_error, 0.0);
    }

    #[test]
    fn test_generator_machine_sweep() {
        let machine = MachineSpec::from_generators(3, &[0o7, 0o5]).unwrap();
        let engine = MonteCarloEngine::new(SweepConfig {
            machine,
            flush_bits: 2,
            ..small_config()
        })
        .unwrap();
        let report = engine.run().unwrap();
        assert_eq!(report.code.free_distance, Some(5));
        assert_eq!(report.points[0].mean_decoded_error, 0.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = MonteCarloEngine::new(SweepConfig {
            trials: 0,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
    }
}
