//! State Machine — the code graph behind the trellis
//!
//! A convolutional code is a finite state machine: every state has exactly
//! two outgoing transitions, one per input bit, and every transition emits a
//! fixed-width output symbol. The same graph drives the encoder forward and,
//! through its reverse adjacency, the decoder's add-compare-select step.
//!
//! ```text
//!   state │ bit 0        │ bit 1
//!   ──────┼──────────────┼─────────────
//!    S0   │ → S0  "000"  │ → S1  "111"
//!    S1   │ → S2  "101"  │ → S3  "010"
//!    S2   │ → S0  "011"  │ → S1  "100"
//!    S3   │ → S2  "110"  │ → S3  "001"
//! ```
//!
//! Machines are described declaratively by a [`MachineSpec`] (which also
//! deserializes from JSON) and validated once by
//! [`StateMachine::from_spec`]. The resulting [`StateMachine`] is immutable
//! and can be shared by reference across any number of encoders and
//! decoders, on any number of threads.
//!
//! ## Example
//!
//! ```rust
//! use trellis_core::fec::{MachineSpec, StateMachine};
//!
//! let machine = MachineSpec::rate_one_third_k3().build().unwrap();
//! let s0 = machine.state_id("S0").unwrap();
//! let t = machine.transition(s0, 1).unwrap();
//! assert_eq!(machine.state_name(t.next()), Some("S1"));
//! assert_eq!(t.output(), &[1, 1, 1]);
//! assert_eq!(machine.symbol_width(), 3);
//! ```

use crate::bits::{format_bits, parse_bits};
use crate::types::{Bit, BitVec, CodecError, CodecResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Index of a state within its [`StateMachine`].
///
/// Identifiers are handed out by the machine and are only meaningful for the
/// machine that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(usize);

impl StateId {
    /// Position of the state in the machine's declaration order.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One forward edge: where an input bit takes the machine and what it emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    next: StateId,
    output: BitVec,
}

impl Transition {
    /// Destination state.
    pub fn next(&self) -> StateId {
        self.next
    }

    /// Output symbol emitted on this edge.
    pub fn output(&self) -> &[Bit] {
        &self.output
    }
}

/// One incoming edge of a state, as seen by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseTransition {
    from: StateId,
    input: Bit,
    output: BitVec,
}

impl ReverseTransition {
    /// State the edge leaves from.
    pub fn from(&self) -> StateId {
        self.from
    }

    /// Input bit that selects this edge.
    pub fn input(&self) -> Bit {
        self.input
    }

    /// Output symbol emitted on this edge.
    pub fn output(&self) -> &[Bit] {
        &self.output
    }
}

/// Declarative transition entry: destination name and output symbol string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionSpec {
    pub next: String,
    pub output: String,
}

impl TransitionSpec {
    pub fn new(next: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            next: next.into(),
            output: output.into(),
        }
    }
}

/// Declarative machine description.
///
/// `transitions[state]` lists the edge for input bit 0 followed by the edge
/// for input bit 1. The first declared state is the start state.
///
/// ```json
/// {
///   "states": ["S0", "S1"],
///   "transitions": {
///     "S0": [{"next": "S0", "output": "00"}, {"next": "S1", "output": "11"}],
///     "S1": [{"next": "S0", "output": "10"}, {"next": "S1", "output": "01"}]
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSpec {
    pub states: Vec<String>,
    pub transitions: BTreeMap<String, Vec<TransitionSpec>>,
}

impl MachineSpec {
    /// Build a spec from `(state, [(next, output) for bit 0, (next, output) for bit 1])`
    /// rows. States are declared in row order.
    pub fn from_table(rows: &[(&str, [(&str, &str); 2])]) -> Self {
        let states = rows.iter().map(|(name, _)| name.to_string()).collect();
        let transitions = rows
            .iter()
            .map(|(name, edges)| {
                let edges = edges
                    .iter()
                    .map(|(next, output)| TransitionSpec::new(*next, *output))
                    .collect();
                (name.to_string(), edges)
            })
            .collect();
        Self { states, transitions }
    }

    /// Four-state, rate-1/3 code used throughout the BER experiments.
    ///
    /// Free distance 7, so any single channel error inside a terminated
    /// block is corrected.
    pub fn rate_one_third_k3() -> Self {
        Self::from_table(&[
            ("S0", [("S0", "000"), ("S1", "111")]),
            ("S1", [("S2", "101"), ("S3", "010")]),
            ("S2", [("S0", "011"), ("S1", "100")]),
            ("S3", [("S2", "110"), ("S3", "001")]),
        ])
    }

    /// Feed-forward shift-register code from octal generator polynomials.
    ///
    /// The register holds the input bit in its MSB followed by the K-1
    /// memory bits; each generator contributes one output bit, the parity of
    /// the tapped register positions. States are named `S0..S{2^(K-1)-1}`
    /// after the memory contents.
    pub fn from_generators(constraint_length: usize, generators: &[u32]) -> CodecResult<Self> {
        if !(2..=16).contains(&constraint_length) {
            return Err(CodecError::InvalidSpec(format!(
                "constraint length {} out of range 2..=16",
                constraint_length
            )));
        }
        if generators.is_empty() {
            return Err(CodecError::InvalidSpec(
                "at least one generator polynomial is required".into(),
            ));
        }

        let num_states = 1usize << (constraint_length - 1);
        let state_mask = (num_states - 1) as u32;
        let name = |s: u32| format!("S{}", s);

        let mut transitions = BTreeMap::new();
        for state in 0..num_states as u32 {
            let edges = (0..2u32)
                .map(|input| {
                    let reg = (input << (constraint_length - 1)) | state;
                    let output: BitVec = generators
                        .iter()
                        .map(|&gen| ((reg & gen).count_ones() & 1) as Bit)
                        .collect();
                    TransitionSpec::new(name((reg >> 1) & state_mask), format_bits(&output))
                })
                .collect();
            transitions.insert(name(state), edges);
        }

        Ok(Self {
            states: (0..num_states as u32).map(name).collect(),
            transitions,
        })
    }

    /// Validate and build the machine.
    pub fn build(&self) -> CodecResult<StateMachine> {
        StateMachine::from_spec(&self.states, &self.transitions)
    }
}

impl Default for MachineSpec {
    fn default() -> Self {
        Self::rate_one_third_k3()
    }
}

/// Immutable, validated code graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMachine {
    names: Vec<String>,
    /// forward[state][input]
    forward: Vec<[Transition; 2]>,
    /// reverse[state], ordered by (from, input)
    reverse: Vec<Vec<ReverseTransition>>,
    symbol_width: usize,
}

impl StateMachine {
    /// Build a machine from a declared state list and a transition table.
    ///
    /// Fails with [`CodecError::InvalidSpec`] when the state list is empty
    /// or has duplicates, when a state has no entry or an entry other than
    /// exactly two transitions, when the table mentions an undeclared state,
    /// when a destination is not declared, or when output symbols are empty,
    /// non-binary or of differing widths.
    pub fn from_spec<S: AsRef<str>>(
        states: &[S],
        table: &BTreeMap<String, Vec<TransitionSpec>>,
    ) -> CodecResult<Self> {
        if states.is_empty() {
            return Err(CodecError::InvalidSpec("no states declared".into()));
        }

        let mut index: HashMap<&str, StateId> = HashMap::with_capacity(states.len());
        for (i, name) in states.iter().enumerate() {
            let name = name.as_ref();
            if name.is_empty() {
                return Err(CodecError::InvalidSpec(format!("state {} has an empty name", i)));
            }
            if index.insert(name, StateId(i)).is_some() {
                return Err(CodecError::InvalidSpec(format!("duplicate state '{}'", name)));
            }
        }

        if let Some(unknown) = table.keys().find(|k| !index.contains_key(k.as_str())) {
            return Err(CodecError::InvalidSpec(format!(
                "transitions given for undeclared state '{}'",
                unknown
            )));
        }

        let mut symbol_width: Option<usize> = None;
        let mut forward = Vec::with_capacity(states.len());

        for name in states {
            let name = name.as_ref();
            let edges = table.get(name).ok_or_else(|| {
                CodecError::InvalidSpec(format!("state '{}' has no transitions", name))
            })?;
            if edges.len() != 2 {
                return Err(CodecError::InvalidSpec(format!(
                    "state '{}' has {} transitions, expected one per input bit",
                    name,
                    edges.len()
                )));
            }

            let mut pair = Vec::with_capacity(2);
            for (bit, edge) in edges.iter().enumerate() {
                let next = *index.get(edge.next.as_str()).ok_or_else(|| {
                    CodecError::InvalidSpec(format!(
                        "state '{}' bit {} leads to undeclared state '{}'",
                        name, bit, edge.next
                    ))
                })?;
                let output = parse_bits(&edge.output).map_err(|_| {
                    CodecError::InvalidSpec(format!(
                        "state '{}' bit {} has non-binary output '{}'",
                        name, bit, edge.output
                    ))
                })?;
                if output.is_empty() {
                    return Err(CodecError::InvalidSpec(format!(
                        "state '{}' bit {} has an empty output symbol",
                        name, bit
                    )));
                }
                match symbol_width {
                    None => symbol_width = Some(output.len()),
                    Some(w) if w != output.len() => {
                        return Err(CodecError::InvalidSpec(format!(
                            "state '{}' bit {} emits {} bits, other transitions emit {}",
                            name,
                            bit,
                            output.len(),
                            w
                        )))
                    }
                    Some(_) => {}
                }
                pair.push(Transition { next, output });
            }
            let pair: [Transition; 2] = pair.try_into().map_err(|_| {
                CodecError::Inconsistent(format!("lost transitions while building state '{}'", name))
            })?;
            forward.push(pair);
        }

        let mut reverse: Vec<Vec<ReverseTransition>> = vec![Vec::new(); states.len()];
        for (from, edges) in forward.iter().enumerate() {
            for (input, edge) in edges.iter().enumerate() {
                reverse[edge.next.0].push(ReverseTransition {
                    from: StateId(from),
                    input: input as Bit,
                    output: edge.output.clone(),
                });
            }
        }

        Ok(Self {
            names: states.iter().map(|s| s.as_ref().to_string()).collect(),
            forward,
            reverse,
            symbol_width: symbol_width.unwrap_or(0),
        })
    }

    /// Look up the edge taken from `state` on input `bit`.
    pub fn transition(&self, state: StateId, bit: Bit) -> CodecResult<&Transition> {
        let edges = self.forward.get(state.0).ok_or_else(|| self.unknown(state))?;
        if bit > 1 {
            return Err(CodecError::InvalidInput {
                position: 0,
                value: bit,
            });
        }
        Ok(&edges[bit as usize])
    }

    /// All edges whose destination is `state`, ordered by ascending source
    /// state and then ascending input bit.
    pub fn reverse_transitions(&self, state: StateId) -> CodecResult<&[ReverseTransition]> {
        self.reverse
            .get(state.0)
            .map(Vec::as_slice)
            .ok_or_else(|| self.unknown(state))
    }

    /// Resolve a state by name.
    pub fn state_id(&self, name: &str) -> CodecResult<StateId> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(StateId)
            .ok_or_else(|| CodecError::InvalidState(format!("'{}' is not defined", name)))
    }

    /// Name of a state, if it belongs to this machine.
    pub fn state_name(&self, state: StateId) -> Option<&str> {
        self.names.get(state.0).map(String::as_str)
    }

    /// Fail with [`CodecError::InvalidState`] unless `state` belongs to this machine.
    pub fn ensure_state(&self, state: StateId) -> CodecResult<()> {
        if self.contains(state) {
            Ok(())
        } else {
            Err(self.unknown(state))
        }
    }

    pub fn contains(&self, state: StateId) -> bool {
        state.0 < self.names.len()
    }

    /// State the encoder and decoder start from: the first declared state.
    pub fn start_state(&self) -> StateId {
        StateId(0)
    }

    pub fn num_states(&self) -> usize {
        self.names.len()
    }

    /// Bits per output symbol (the rate denominator).
    pub fn symbol_width(&self) -> usize {
        self.symbol_width
    }

    /// Code rate, 1/symbol_width.
    pub fn rate(&self) -> f64 {
        1.0 / self.symbol_width as f64
    }

    /// All states in declaration order.
    pub fn states(&self) -> impl Iterator<Item = StateId> + '_ {
        (0..self.names.len()).map(StateId)
    }

    /// Convert back into a declarative spec.
    pub fn to_spec(&self) -> MachineSpec {
        let transitions = self
            .forward
            .iter()
            .enumerate()
            .map(|(i, edges)| {
                let edges = edges
                    .iter()
                    .map(|t| TransitionSpec::new(self.names[t.next.0].clone(), format_bits(&t.output)))
                    .collect();
                (self.names[i].clone(), edges)
            })
            .collect();
        MachineSpec {
            states: self.names.clone(),
            transitions,
        }
    }

    fn unknown(&self, state: StateId) -> CodecError {
        CodecError::InvalidState(format!(
            "{} is not defined (machine has {} states)",
            state,
            self.names.len()
        ))
    }
}

impl fmt::Display for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StateMachine({} states, rate 1/{})",
            self.names.len(),
            self.symbol_width
        )
    }
}
