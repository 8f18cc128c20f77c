//! Sweep configuration
//!
//! Parameters for a bit-error-rate sweep over BSC crossover probabilities.
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "trials": 20, "p_stop": 0.2, "seed": 7 }
//! ```

use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use trellis_core::fec::{MachineSpec, StateMachine, TrellisEncoder};

/// Configuration for the Monte Carlo engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Random message bits per trial
    pub message_bits: usize,
    /// Zero bits appended to each message to flush the encoder
    pub flush_bits: usize,
    /// Trials per crossover probability
    pub trials: usize,
    /// First crossover probability
    pub p_start: f64,
    /// End of the sweep (exclusive)
    pub p_stop: f64,
    pub p_step: f64,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Code under test
    pub machine: MachineSpec,
    /// Decode flushed blocks as ending in the start state
    pub terminate_at_start: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            message_bits: 1024,
            flush_bits: 3,
            trials: 100,
            p_start: 0.0,
            p_stop: 0.5,
            p_step: 0.01,
            seed: 42,
            machine: MachineSpec::rate_one_third_k3(),
            terminate_at_start: true,
        }
    }
}

impl SweepConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|source| SimError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check ranges, that the machine builds and, when decoding pins the
    /// terminal state, that the flush bits actually reach the start state.
    pub fn validate(&self) -> SimResult<()> {
        if self.trials == 0 {
            return Err(SimError::InvalidConfig("trials must be at least 1".into()));
        }
        if self.message_bits == 0 {
            return Err(SimError::InvalidConfig(
                "message_bits must be at least 1".into(),
            ));
        }
        if !(self.p_step > 0.0) || !self.p_step.is_finite() {
            return Err(SimError::InvalidConfig(format!(
                "p_step must be positive, got {}",
                self.p_step
            )));
        }
        if !(0.0..=1.0).contains(&self.p_start) {
            return Err(SimError::InvalidConfig(format!(
                "p_start {} outside [0, 1]",
                self.p_start
            )));
        }
        if !(self.p_stop > self.p_start) {
            return Err(SimError::InvalidConfig(format!(
                "p_stop {} must be greater than p_start {}",
                self.p_stop, self.p_start
            )));
        }
        let count = self.point_count();
        let last = self.p_start + (count - 1) as f64 * self.p_step;
        if last > 1.0 + GRID_EPSILON {
            return Err(SimError::InvalidConfig(format!(
                "sweep reaches p = {:.4}, beyond 1",
                last
            )));
        }
        let machine = self.build_machine()?;
        if self.terminate_at_start {
            self.check_flush_returns_to_start(&machine)?;
        }
        Ok(())
    }

    /// Every state must reach the start state after `flush_bits` zeros.
    fn check_flush_returns_to_start(&self, machine: &StateMachine) -> SimResult<()> {
        let encoder = TrellisEncoder::new(machine);
        let flush = vec![0; self.flush_bits];
        for state in machine.states() {
            let frame = encoder.encode_with_path(&flush, state)?;
            if frame.final_state() != machine.start_state() {
                return Err(SimError::InvalidConfig(format!(
                    "{} flush bits from state {} end in {}, not the start state {}; \
                     add flush bits or set terminate_at_start = false",
                    self.flush_bits,
                    machine.state_name(state).unwrap_or_default(),
                    machine.state_name(frame.final_state()).unwrap_or_default(),
                    machine.state_name(machine.start_state()).unwrap_or_default(),
                )));
            }
        }
        Ok(())
    }

    /// Crossover probabilities of the sweep, `p_start` up to but excluding
    /// `p_stop`.
    pub fn probabilities(&self) -> Vec<f64> {
        if !(self.p_step > 0.0) || !(self.p_stop > self.p_start) {
            return Vec::new();
        }
        (0..self.point_count())
            .map(|i| (self.p_start + i as f64 * self.p_step).min(1.0))
            .collect()
    }

    pub fn build_machine(&self) -> SimResult<StateMachine> {
        Ok(self.machine.build()?)
    }

    /// Channel bits per trial.
    pub fn block_bits(&self, symbol_width: usize) -> usize {
        (self.message_bits + self.flush_bits) * symbol_width
    }

    fn point_count(&self) -> usize {
        let span = (self.p_stop - self.p_start) / self.p_step;
        (span - GRID_EPSILON).ceil().max(1.0) as usize
    }
}

/// Slack for float steps such as 0.5 / 0.01 landing just above an integer.
const GRID_EPSILON: f64 = 1e-9;

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::CodecError;

    #[test]
    fn test_default_config() {
        let cfg = SweepConfig::default();
        assert!(cfg.validate().is_ok());
        let ps = cfg.probabilities();
        assert_eq!(ps.len(), 50);
        assert_eq!(ps[0], 0.0);
        assert!((ps[49] - 0.49).abs() < 1e-12);
        assert_eq!(cfg.block_bits(3), (1024 + 3) * 3);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: SweepConfig =
            serde_json::from_str(r#"{"trials": 20, "p_stop": 0.2, "seed": 7}"#).unwrap();
        assert_eq!(cfg.trials, 20);
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.message_bits, 1024);
        assert_eq!(cfg.machine, MachineSpec::rate_one_third_k3());
        assert_eq!(cfg.probabilities().len(), 20);
    }

    #[test]
    fn test_machine_from_json() {
        let json = r#"{
            "machine": {
                "states": ["A", "B"],
                "transitions": {
                    "A": [{"next": "A", "output": "00"}, {"next": "B", "output": "11"}],
                    "B": [{"next": "A", "output": "10"}, {"next": "B", "output": "01"}]
                }
            },
            "flush_bits": 1
        }"#;
        let cfg: SweepConfig = serde_json::from_str(json).unwrap();
        let machine = cfg.build_machine().unwrap();
        assert_eq!(machine.num_states(), 2);
        assert_eq!(machine.symbol_width(), 2);
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let bad = [
            SweepConfig { trials: 0, ..Default::default() },
            SweepConfig { message_bits: 0, ..Default::default() },
            SweepConfig { p_step: 0.0, ..Default::default() },
            SweepConfig { p_step: -0.1, ..Default::default() },
            SweepConfig { p_start: -0.1, ..Default::default() },
            SweepConfig { p_start: 0.3, p_stop: 0.2, ..Default::default() },
            SweepConfig { p_start: 0.9, p_stop: 1.5, p_step: 0.05, ..Default::default() },
            SweepConfig { p_step: f64::NAN, ..Default::default() },
        ];
        for cfg in bad {
            assert!(
                matches!(cfg.validate(), Err(SimError::InvalidConfig(_))),
                "{:?} should be rejected",
                cfg
            );
        }
    }

    #[test]
    fn test_validate_rejects_bad_machine() {
        let mut cfg = SweepConfig::default();
        cfg.machine.transitions.remove("S2");
        assert!(matches!(
            cfg.validate(),
            Err(SimError::Codec(CodecError::InvalidSpec(_)))
        ));
    }

    #[test]
    fn test_validate_requires_flush_to_reach_start() {
        let short = SweepConfig {
            flush_bits: 1,
            ..Default::default()
        };
        assert!(matches!(short.validate(), Err(SimError::InvalidConfig(ref m)) if m.contains("flush bits")));

        let none = SweepConfig {
            flush_bits: 0,
            ..Default::default()
        };
        assert!(matches!(none.validate(), Err(SimError::InvalidConfig(_))));

        // the reference machine needs two zeros from S1 or S3
        let enough = SweepConfig {
            flush_bits: 2,
            ..Default::default()
        };
        assert!(enough.validate().is_ok());

        let unpinned = SweepConfig {
            flush_bits: 0,
            terminate_at_start: false,
            ..Default::default()
        };
        assert!(unpinned.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_machine_without_zero_path_home() {
        // zero input from B keeps it in B, so no flush length helps
        let cfg = SweepConfig {
            machine: MachineSpec::from_table(&[
                ("A", [("A", "00"), ("B", "11")]),
                ("B", [("B", "10"), ("A", "01")]),
            ]),
            flush_bits: 8,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_sweep_up_to_one() {
        let cfg = SweepConfig {
            p_start: 0.5,
            p_stop: 1.01,
            p_step: 0.25,
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.probabilities(), vec![0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SweepConfig::load("/nonexistent/sweep.json").unwrap_err();
        assert!(matches!(err, SimError::Io(_)));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("trellis-sweep-{}.json", std::process::id()));
        fs::write(&path, r#"{"trials": 3, "message_bits": 16}"#).unwrap();
        let cfg = SweepConfig::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(cfg.trials, 3);
        assert_eq!(cfg.message_bits, 16);

        let bad = std::env::temp_dir().join(format!("trellis-sweep-bad-{}.json", std::process::id()));
        fs::write(&bad, "{ trials: }").unwrap();
        let err = SweepConfig::load(&bad).unwrap_err();
        fs::remove_file(&bad).unwrap();
        assert!(matches!(err, SimError::ConfigParse { .. }));
    }
}
