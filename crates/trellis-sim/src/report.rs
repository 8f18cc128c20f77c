//! Sweep results and their text, CSV and JSON renderings.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use trellis_core::metrics::ErrorCounter;

/// Aggregated results at one crossover probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub flip_probability: f64,
    pub trials: usize,
    /// Mean over trials of the channel bit error rate (encoded vs received)
    pub mean_channel_error: f64,
    /// Mean over trials of the message bit error rate after decoding,
    /// flush bits excluded
    pub mean_decoded_error: f64,
    pub channel_error_bits: u64,
    pub channel_bits: u64,
    pub decoded_error_bits: u64,
    pub decoded_bits: u64,
    /// 95% confidence interval on the pooled decoded error rate
    pub decoded_ci: (f64, f64),
}

impl SweepPoint {
    pub(crate) fn from_counters(
        flip_probability: f64,
        trials: usize,
        mean_channel_error: f64,
        mean_decoded_error: f64,
        channel: &ErrorCounter,
        decoded: &ErrorCounter,
    ) -> Self {
        Self {
            flip_probability,
            trials,
            mean_channel_error,
            mean_decoded_error,
            channel_error_bits: channel.error_bits(),
            channel_bits: channel.total_bits(),
            decoded_error_bits: decoded.error_bits(),
            decoded_bits: decoded.total_bits(),
            decoded_ci: decoded.confidence_interval(0.95),
        }
    }

    /// Ratio of channel to decoded error rate; `None` when decoding was
    /// error free.
    pub fn coding_gain(&self) -> Option<f64> {
        (self.mean_decoded_error > 0.0).then(|| self.mean_channel_error / self.mean_decoded_error)
    }
}

/// Description of the code that was swept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSummary {
    pub num_states: usize,
    pub symbol_width: usize,
    /// `None` when the machine has no all-zero idle loop
    pub free_distance: Option<u64>,
}

/// Full result of a sweep, points in ascending probability order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub code: CodeSummary,
    pub message_bits: usize,
    pub flush_bits: usize,
    pub seed: u64,
    pub points: Vec<SweepPoint>,
}

impl SweepReport {
    pub fn to_csv(&self) -> String {
        let mut csv = String::from(
            "p,mean_channel_error,mean_decoded_error,channel_errors,channel_bits,decoded_errors,decoded_bits,ci_low,ci_high\n",
        );
        for p in &self.points {
            let _ = writeln!(
                csv,
                "{:.4},{:.10},{:.10},{},{},{},{},{:.10},{:.10}",
                p.flip_probability,
                p.mean_channel_error,
                p.mean_decoded_error,
                p.channel_error_bits,
                p.channel_bits,
                p.decoded_error_bits,
                p.decoded_bits,
                p.decoded_ci.0,
                p.decoded_ci.1,
            );
        }
        csv
    }

    /// Fixed-width table for terminals.
    pub fn to_table(&self) -> String {
        let mut out = String::new();
        let d_free = self
            .code
            .free_distance
            .map_or_else(|| "n/a".to_string(), |d| d.to_string());
        let _ = writeln!(
            out,
            "Code: {} states, rate 1/{}, d_free {} | {} message bits + {} flush, seed {}",
            self.code.num_states,
            self.code.symbol_width,
            d_free,
            self.message_bits,
            self.flush_bits,
            self.seed,
        );
        let _ = writeln!(
            out,
            "{:>8} {:>8} {:>14} {:>14} {:>12} {:>25}",
            "p", "trials", "channel BER", "decoded BER", "errors", "95% CI"
        );
        let _ = writeln!(out, "{}", "-".repeat(86));
        for p in &self.points {
            let _ = writeln!(
                out,
                "{:>8.4} {:>8} {:>14.6e} {:>14.6e} {:>12} [{:>10.3e}, {:>10.3e}]",
                p.flip_probability,
                p.trials,
                p.mean_channel_error,
                p.mean_decoded_error,
                p.decoded_error_bits,
                p.decoded_ci.0,
                p.decoded_ci.1,
            );
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SweepReport {
        let mut channel = ErrorCounter::new();
        channel.record(30, 3000);
        let mut decoded = ErrorCounter::new();
        decoded.record(2, 1000);
        SweepReport {
            code: CodeSummary {
                num_states: 4,
                symbol_width: 3,
                free_distance: Some(7),
            },
            message_bits: 100,
            flush_bits: 3,
            seed: 42,
            points: vec![
                SweepPoint::from_counters(0.0, 10, 0.0, 0.0, &ErrorCounter::new(), &ErrorCounter::new()),
                SweepPoint::from_counters(0.01, 10, 0.01, 0.002, &channel, &decoded),
            ],
        }
    }

    #[test]
    fn test_csv_layout() {
        let csv = sample().to_csv();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("p,mean_channel_error,mean_decoded_error"));
        assert!(lines[2].starts_with("0.0100,0.0100000000,0.0020000000,30,3000,2,1000,"));
    }

    #[test]
    fn test_table_mentions_code() {
        let table = sample().to_table();
        assert!(table.contains("4 states, rate 1/3, d_free 7"));
        assert_eq!(table.lines().count(), 3 + 2);
    }

    #[test]
    fn test_json_round_trip() {
        let report = sample();
        let json = report.to_json().unwrap();
        let back: SweepReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.code, report.code);
        assert_eq!(back.points.len(), 2);
        let (a, b) = (&back.points[1], &report.points[1]);
        assert_eq!(a.decoded_error_bits, b.decoded_error_bits);
        assert!((a.decoded_ci.1 - b.decoded_ci.1).abs() < 1e-12);
    }

    #[test]
    fn test_coding_gain() {
        let report = sample();
        assert_eq!(report.points[0].coding_gain(), None);
        let gain = report.points[1].coding_gain().unwrap();
        assert!((gain - 5.0).abs() < 1e-9);
    }
}
