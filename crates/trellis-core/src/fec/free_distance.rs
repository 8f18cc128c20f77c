//! Free distance of a code graph
//!
//! The free distance is the minimum output weight of any path that leaves
//! the start state and later re-merges with it. A hard-decision decoder
//! corrects every pattern of up to `(d_free - 1) / 2` channel errors within a
//! constraint span.
//!
//! The search is Dijkstra over states with edge weights equal to the output
//! symbol weight, so it works for arbitrary machines, not only shift-register
//! codes.

use super::state_machine::StateMachine;
use crate::bits::weight;
use crate::types::{CodecError, CodecResult};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Minimum output weight over paths diverging from and re-merging with the
/// start state.
///
/// The start state's input-0 edge must be an all-zero self loop, otherwise
/// weight is not a distance to the idle codeword and the call fails with
/// [`CodecError::InvalidParameter`], as it does when no path ever returns.
///
/// ```rust
/// use trellis_core::fec::{free_distance, MachineSpec};
///
/// let machine = MachineSpec::rate_one_third_k3().build().unwrap();
/// assert_eq!(free_distance(&machine).unwrap(), 7);
/// ```
pub fn free_distance(machine: &StateMachine) -> CodecResult<u64> {
    let start = machine.start_state();
    let idle = machine.transition(start, 0)?;
    if idle.next() != start || weight(idle.output()) != 0 {
        return Err(CodecError::InvalidParameter(
            "start state must loop to itself with an all-zero symbol on input 0".into(),
        ));
    }

    let diverge = machine.transition(start, 1)?;
    let first = weight(diverge.output()) as u64;
    if diverge.next() == start {
        return Ok(first);
    }

    let mut dist: Vec<Option<u64>> = vec![None; machine.num_states()];
    let mut heap = BinaryHeap::new();
    dist[diverge.next().index()] = Some(first);
    heap.push(Reverse((first, diverge.next())));

    while let Some(Reverse((cost, state))) = heap.pop() {
        if state == start {
            return Ok(cost);
        }
        if dist[state.index()].is_some_and(|d| cost > d) {
            continue;
        }
        for bit in 0..2 {
            let edge = machine.transition(state, bit)?;
            let next_cost = cost + weight(edge.output()) as u64;
            let slot = &mut dist[edge.next().index()];
            if slot.map_or(true, |d| next_cost < d) {
                *slot = Some(next_cost);
                heap.push(Reverse((next_cost, edge.next())));
            }
        }
    }

    Err(CodecError::InvalidParameter(
        "no path re-merges with the start state".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fec::state_machine::MachineSpec;

    fn generator_code(k: usize, gens: &[u32]) -> StateMachine {
        MachineSpec::from_generators(k, gens).unwrap().build().unwrap()
    }

    #[test]
    fn test_reference_machine() {
        let m = MachineSpec::rate_one_third_k3().build().unwrap();
        assert_eq!(free_distance(&m).unwrap(), 7);
    }

    #[test]
    fn test_free_distance_k3() {
        assert_eq!(free_distance(&generator_code(3, &[0o7, 0o5])).unwrap(), 5);
    }

    #[test]
    fn test_free_distance_nasa_k7() {
        assert_eq!(
            free_distance(&generator_code(7, &[0o171, 0o133])).unwrap(),
            10
        );
    }

    #[test]
    fn test_rejects_non_zero_idle_loop() {
        let m = MachineSpec::from_table(&[
            ("A", [("B", "00"), ("A", "11")]),
            ("B", [("A", "01"), ("B", "10")]),
        ])
        .build()
        .unwrap();
        assert!(matches!(
            free_distance(&m),
            Err(CodecError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_no_remerge() {
        let m = MachineSpec::from_table(&[
            ("A", [("A", "00"), ("B", "11")]),
            ("B", [("B", "01"), ("B", "10")]),
        ])
        .build()
        .unwrap();
        assert!(matches!(
            free_distance(&m),
            Err(CodecError::InvalidParameter(_))
        ));
    }
}
