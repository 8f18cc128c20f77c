//! Trellis — per-stage path metrics and survivors
//!
//! The trellis is the state machine unrolled in time. Stage 0 is virtual:
//! only the start state is reachable, with cost 0. Each later stage is
//! derived from the previous one by add-compare-select over the reverse
//! transitions of every state:
//!
//! ```text
//! cost_t[s] = min over (p, out) into s of  cost_{t-1}[p] + d(out, r_t)
//! ```
//!
//! Unreachable states carry no cost at all (`None`), never zero, so a path
//! can only surface once it genuinely exists. Stages are immutable values;
//! building stage `t` never revisits stages `< t`.
//!
//! Ties between equal-cost candidates go to the first candidate in
//! reverse-transition order: lowest predecessor index, then lowest input bit.

use super::state_machine::{StateId, StateMachine};
use crate::metrics::count_differences;
use crate::types::{Bit, BitVec, CodecError, CodecResult};

/// Accumulated Hamming cost of a survivor path; `None` when unreachable.
pub type PathCost = Option<u64>;

/// Winning incoming edge of a state at one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Survivor {
    /// Predecessor state at the previous stage.
    pub from: StateId,
    /// Input bit on the edge from `from`.
    pub input: Bit,
}

/// Snapshot of all path metrics at one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrellisStage {
    costs: Vec<PathCost>,
    survivors: Vec<Option<Survivor>>,
}

impl TrellisStage {
    /// Virtual stage 0: only `start` is reachable.
    pub(crate) fn initial(machine: &StateMachine, start: StateId) -> Self {
        let mut costs = vec![None; machine.num_states()];
        costs[start.index()] = Some(0);
        Self {
            costs,
            survivors: vec![None; machine.num_states()],
        }
    }

    /// Derive the next stage from this one and one received symbol.
    ///
    /// `symbol` must already be validated and `symbol_width` bits long.
    pub(crate) fn advance(&self, machine: &StateMachine, symbol: &[Bit]) -> CodecResult<Self> {
        let n = machine.num_states();
        let mut costs = Vec::with_capacity(n);
        let mut survivors = Vec::with_capacity(n);

        for state in machine.states() {
            let mut best: Option<(u64, Survivor)> = None;
            for edge in machine.reverse_transitions(state)? {
                let Some(prev) = self.costs[edge.from().index()] else {
                    continue;
                };
                let candidate = prev + count_differences(edge.output(), symbol) as u64;
                // strict comparison keeps the first minimum
                if best.map_or(true, |(cost, _)| candidate < cost) {
                    best = Some((
                        candidate,
                        Survivor {
                            from: edge.from(),
                            input: edge.input(),
                        },
                    ));
                }
            }
            costs.push(best.map(|(cost, _)| cost));
            survivors.push(best.map(|(_, survivor)| survivor));
        }

        Ok(Self { costs, survivors })
    }

    /// Path metric of `state`; `None` if unreachable or not in the machine.
    pub fn cost(&self, state: StateId) -> PathCost {
        self.costs.get(state.index()).copied().flatten()
    }

    pub fn survivor(&self, state: StateId) -> Option<Survivor> {
        self.survivors.get(state.index()).copied().flatten()
    }

    pub fn is_reachable(&self, state: StateId) -> bool {
        self.cost(state).is_some()
    }

    /// Number of states with a finite cost.
    pub fn reachable_count(&self) -> usize {
        self.costs.iter().filter(|c| c.is_some()).count()
    }

    /// Minimum-cost state, lowest index on ties.
    pub fn best(&self, machine: &StateMachine) -> Option<(StateId, u64)> {
        machine
            .states()
            .filter_map(|s| self.cost(s).map(|c| (s, c)))
            .min_by_key(|&(s, c)| (c, s))
    }

    /// All costs in state order.
    pub fn costs(&self) -> &[PathCost] {
        &self.costs
    }
}

/// Full cost/traceback table of one decode call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trellis {
    start: StateId,
    /// stages[0] is the virtual initial stage
    stages: Vec<TrellisStage>,
}

impl Trellis {
    /// Build the trellis for received symbols starting at `start`.
    ///
    /// Every symbol must be validated and exactly `machine.symbol_width()`
    /// bits long.
    pub(crate) fn build<'s>(
        machine: &StateMachine,
        start: StateId,
        symbols: impl ExactSizeIterator<Item = &'s [Bit]>,
    ) -> CodecResult<Self> {
        let mut stages = Vec::with_capacity(symbols.len() + 1);
        stages.push(TrellisStage::initial(machine, start));
        for symbol in symbols {
            let next = stages[stages.len() - 1].advance(machine, symbol)?;
            stages.push(next);
        }
        Ok(Self { start, stages })
    }

    /// Number of received symbols `T` (stage 0 excluded).
    pub fn num_stages(&self) -> usize {
        self.stages.len() - 1
    }

    pub fn start_state(&self) -> StateId {
        self.start
    }

    /// Stage snapshot, `0..=T`.
    pub fn stage(&self, t: usize) -> Option<&TrellisStage> {
        self.stages.get(t)
    }

    /// Last stage (`T`).
    pub fn final_stage(&self) -> &TrellisStage {
        // stages always holds the initial stage
        &self.stages[self.stages.len() - 1]
    }

    /// Cost of `state` at stage `t`; `None` when unreachable or out of range.
    pub fn cost(&self, t: usize, state: StateId) -> PathCost {
        self.stage(t).and_then(|s| s.cost(state))
    }

    /// Predecessor of `state` on its survivor path at stage `t` (`1..=T`).
    pub fn predecessor(&self, t: usize, state: StateId) -> Option<StateId> {
        self.stage(t).and_then(|s| s.survivor(state)).map(|s| s.from)
    }

    /// Minimum-cost state at stage `t`, lowest index on ties.
    pub fn best_state(&self, machine: &StateMachine, t: usize) -> Option<(StateId, u64)> {
        self.stage(t).and_then(|s| s.best(machine))
    }

    /// Walk survivors back from `terminal` at stage `T` to stage 0.
    ///
    /// Returns the input bits in transmission order and the `T + 1` states
    /// of the path. Every step is checked against the machine: the recorded
    /// input bit out of the predecessor must lead to the current state, and
    /// the walk must end in the start state.
    pub fn backtrace(
        &self,
        machine: &StateMachine,
        terminal: StateId,
    ) -> CodecResult<(BitVec, Vec<StateId>)> {
        let t_len = self.num_stages();
        let mut bits = Vec::with_capacity(t_len);
        let mut path = Vec::with_capacity(t_len + 1);

        let mut current = terminal;
        path.push(current);
        for t in (1..=t_len).rev() {
            let survivor = self.stages[t].survivor(current).ok_or_else(|| {
                CodecError::Inconsistent(format!(
                    "no survivor into {} at stage {}",
                    describe(machine, current),
                    t
                ))
            })?;
            let edge = machine.transition(survivor.from, survivor.input)?;
            if edge.next() != current {
                return Err(CodecError::Inconsistent(format!(
                    "{} on bit {} leads to {}, not {} (stage {})",
                    describe(machine, survivor.from),
                    survivor.input,
                    describe(machine, edge.next()),
                    describe(machine, current),
                    t
                )));
            }
            bits.push(survivor.input);
            current = survivor.from;
            path.push(current);
        }

        if current != self.start {
            return Err(CodecError::Inconsistent(format!(
                "backtrace ended in {} instead of the start state {}",
                describe(machine, current),
                describe(machine, self.start)
            )));
        }

        bits.reverse();
        path.reverse();
        Ok((bits, path))
    }
}

fn describe(machine: &StateMachine, state: StateId) -> String {
    machine
        .state_name(state)
        .map(str::to_string)
        .unwrap_or_else(|| state.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::parse_bits;
    use crate::fec::state_machine::MachineSpec;

    fn reference() -> StateMachine {
        MachineSpec::rate_one_third_k3().build().unwrap()
    }

    fn build(machine: &StateMachine, received: &str) -> Trellis {
        let bits = parse_bits(received).unwrap();
        let width = machine.symbol_width();
        Trellis::build(machine, machine.start_state(), bits.chunks(width)).unwrap()
    }

    #[test]
    fn test_initial_stage() {
        let m = reference();
        let t = build(&m, "");
        assert_eq!(t.num_stages(), 0);
        let s0 = m.start_state();
        assert_eq!(t.cost(0, s0), Some(0));
        for s in m.states().filter(|&s| s != s0) {
            assert_eq!(t.cost(0, s), None);
        }
    }

    #[test]
    fn test_first_stages_costs() {
        let m = reference();
        let id = |n: &str| m.state_id(n).unwrap();
        let t = build(&m, "111 101");

        // Stage 1: S0 via "000" (3), S1 via "111" (0), S2/S3 unreachable.
        assert_eq!(t.cost(1, id("S0")), Some(3));
        assert_eq!(t.cost(1, id("S1")), Some(0));
        assert_eq!(t.cost(1, id("S2")), None);
        assert_eq!(t.cost(1, id("S3")), None);

        // Stage 2 received "101": S2 via S1 "101" (0+0), S3 via S1 "010" (0+3),
        // S0 via S0 "000" (3+2), S1 via S0 "111" (3+1).
        assert_eq!(t.cost(2, id("S2")), Some(0));
        assert_eq!(t.cost(2, id("S3")), Some(3));
        assert_eq!(t.cost(2, id("S0")), Some(5));
        assert_eq!(t.cost(2, id("S1")), Some(4));
        assert_eq!(t.predecessor(2, id("S2")), Some(id("S1")));
        assert_eq!(t.predecessor(2, id("S0")), Some(id("S0")));
        assert_eq!(t.best_state(&m, 2), Some((id("S2"), 0)));
    }

    #[test]
    fn test_tie_break_prefers_lowest_predecessor() {
        let m = MachineSpec::from_table(&[
            ("A", [("A", "0"), ("B", "1")]),
            ("B", [("A", "0"), ("B", "1")]),
        ])
        .build()
        .unwrap();
        let a = m.state_id("A").unwrap();
        let b = m.state_id("B").unwrap();

        // Strictly cheaper predecessor wins regardless of order.
        let t = build(&m, "1 1");
        assert_eq!(t.cost(1, a), Some(1));
        assert_eq!(t.cost(1, b), Some(0));
        // into A: from A 1+1=2, from B 0+1=1 -> B
        assert_eq!(t.predecessor(2, a), Some(b));

        let tied = MachineSpec::from_table(&[
            ("A", [("A", "00"), ("B", "11")]),
            ("B", [("A", "11"), ("B", "00")]),
        ])
        .build()
        .unwrap();
        // Stage 1 "01": A cost 1 (via 00), B cost 1 (via 11).
        // Stage 2 "01": into A from A (1+1) and from B (1+1): tie -> A.
        let t = build(&tied, "01 01");
        let ta = tied.state_id("A").unwrap();
        let tb = tied.state_id("B").unwrap();
        assert_eq!(t.cost(2, ta), Some(2));
        assert_eq!(t.predecessor(2, ta), Some(ta));
        assert_eq!(t.predecessor(2, tb), Some(ta));
    }

    #[test]
    fn test_backtrace_recovers_path() {
        let m = reference();
        let t = build(&m, "111 101 100 010 110 011 000");
        let (bits, path) = t.backtrace(&m, m.start_state()).unwrap();
        assert_eq!(bits, parse_bits("1011000").unwrap());
        let names: Vec<_> = path.iter().map(|&s| m.state_name(s).unwrap()).collect();
        assert_eq!(names, vec!["S0", "S1", "S2", "S1", "S3", "S2", "S0", "S0"]);
    }

    #[test]
    fn test_backtrace_from_unreachable_state_fails() {
        let m = reference();
        let t = build(&m, "111");
        let s3 = m.state_id("S3").unwrap();
        assert!(matches!(
            t.backtrace(&m, s3),
            Err(CodecError::Inconsistent(_))
        ));
    }

    #[test]
    fn test_backtrace_rejects_survivor_off_the_graph() {
        let m = reference();
        let id = |n: &str| m.state_id(n).unwrap();
        let clean = build(&m, "111 101");
        assert_eq!(
            clean.stages[2].survivor(id("S2")),
            Some(Survivor { from: id("S1"), input: 0 })
        );

        // S1 on bit 1 goes to S3, not S2
        let mut wrong_input = clean.clone();
        wrong_input.stages[2].survivors[id("S2").index()] = Some(Survivor {
            from: id("S1"),
            input: 1,
        });
        assert!(matches!(
            wrong_input.backtrace(&m, id("S2")),
            Err(CodecError::Inconsistent(ref msg)) if msg.contains("leads to S3, not S2")
        ));

        // S0 never reaches S2 in one step
        let mut wrong_from = clean;
        wrong_from.stages[2].survivors[id("S2").index()] = Some(Survivor {
            from: id("S0"),
            input: 0,
        });
        assert!(matches!(
            wrong_from.backtrace(&m, id("S2")),
            Err(CodecError::Inconsistent(_))
        ));
    }
}
