// src/signal.rs
//
// Live signal state and the hub that owns all of it.
//
// SignalState is one signal's mutable record: current phase plus the
// cooldown counter the action mask drives. SignalHub is the ordered
// collection of every SignalState, the per-signal transition graphs
// (built once at setup), and the adjacency structure used for local
// ranking. A hub is exclusively owned by one running environment
// instance and is never shared.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::graph::{GraphBuildError, TransitionGraph};
use crate::network::{NetworkModel, TopologyError};
use crate::phase::{Phase, PhaseError};
use crate::types::{Position, SignalId};

/// Fatal setup-time error while constructing a [`SignalHub`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubError {
    Graph(GraphBuildError),
    Topology(TopologyError),
}

impl From<GraphBuildError> for HubError {
    fn from(e: GraphBuildError) -> Self {
        HubError::Graph(e)
    }
}

impl From<TopologyError> for HubError {
    fn from(e: TopologyError) -> Self {
        HubError::Topology(e)
    }
}

/// Error restoring a [`HubSnapshot`] into a hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    CountMismatch { expected: usize, found: usize },
    UnknownSignal { id: String },
    InvalidPhase { id: String, phase: String, error: PhaseError },
    LengthMismatch { id: String, expected: usize, phase: String },
}

/// Tie-break strategy for [`SignalState::advance`] when more than one
/// legal next phase exists.
///
/// `candidates` is non-empty and sorted ascending; implementations
/// return one of its elements. The selection policy is deliberately
/// pluggable (the contract is an open question upstream); only the
/// default below is fixed for tests.
pub trait TieBreak {
    fn pick(&mut self, candidates: &[usize]) -> usize;
}

/// Default tie-break: the lowest node index. Candidates are stored in
/// lexicographic phase order, so this is the lexicographically smallest
/// legal next phase.
#[derive(Debug, Default, Clone, Copy)]
pub struct LowestIndex;

impl TieBreak for LowestIndex {
    fn pick(&mut self, candidates: &[usize]) -> usize {
        candidates[0]
    }
}

/// Seeded random tie-break for stochastic rollouts. Deterministic given
/// the seed.
#[derive(Debug, Clone)]
pub struct SeededTieBreak {
    rng: ChaCha8Rng,
}

impl SeededTieBreak {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl TieBreak for SeededTieBreak {
    fn pick(&mut self, candidates: &[usize]) -> usize {
        candidates[self.rng.gen_range(0..candidates.len())]
    }
}

/// Mutable per-signal record.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalState {
    /// Stable identifier from the topology source.
    pub id: SignalId,
    /// Stable enumeration position within the hub.
    pub index: usize,
    /// Junction position from the topology source.
    pub position: Position,
    /// Current phase. Simulator reports are authoritative over this
    /// field; see [`reconcile`](Self::reconcile).
    pub phase: Phase,
    /// Cooldown counter, always in `[-2 * min_delay, 0]`. Switching is
    /// permitted only when it is exactly 0. Starts at `-2 * min_delay`,
    /// the same lockout applied after an honored switch.
    pub cooldown: i32,
}

impl SignalState {
    /// Advance to the next phase along the transition graph.
    ///
    /// Picks among the outgoing neighbors of the current phase,
    /// excluding the self-loop, via the injected tie-break. No-ops
    /// (returns false, phase unchanged) when the current phase has no
    /// non-self successor or is not a node of the graph; the latter
    /// can happen after an external actuation reported by reconcile.
    pub fn advance(&mut self, graph: &TransitionGraph, tie_break: &mut dyn TieBreak) -> bool {
        let Some(current) = graph.phase_index(&self.phase) else {
            return false;
        };
        let candidates = graph.non_self_successors(current);
        if candidates.is_empty() {
            return false;
        }
        let next = tie_break.pick(&candidates);
        self.phase = graph.phase(next).clone();
        true
    }

    /// Overwrite the internal phase with a simulator report.
    ///
    /// The simulator is authoritative over internally predicted state.
    /// `None` means the report was unavailable or errored: the last
    /// known phase is retained and the step continues. Returns whether
    /// the phase was overwritten.
    pub fn reconcile(&mut self, observed: Option<Phase>) -> bool {
        match observed {
            Some(phase) => {
                self.phase = phase;
                true
            }
            None => false,
        }
    }
}

/// Serialized per-signal record: the `(id, phase, cooldown)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    pub id: String,
    pub phase: String,
    pub cooldown: i32,
}

/// Ordered snapshot of every signal in a hub, for mid-episode resume.
/// This is the only persisted state the core defines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubSnapshot {
    pub signals: Vec<SignalSnapshot>,
}

/// The ordered collection of all signal state.
#[derive(Debug)]
pub struct SignalHub {
    signals: Vec<SignalState>,
    graphs: Vec<TransitionGraph>,
    adjacency: Vec<Vec<usize>>,
    index_of: BTreeMap<SignalId, usize>,
    min_delay: u32,
}

impl SignalHub {
    /// Build the hub from the static topology input.
    ///
    /// Graphs are built and validated here, exactly once. Each signal's
    /// initial phase is drawn from the candidates reachable from its
    /// ego node using a ChaCha8 stream seeded with `seed`, so identical
    /// input and seed reproduce an identical hub.
    pub fn new(network: &NetworkModel, cfg: &Config, seed: u64) -> Result<Self, HubError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let min_delay = cfg.min_delay;

        let mut signals = Vec::with_capacity(network.len());
        let mut graphs = Vec::with_capacity(network.len());
        let mut index_of = BTreeMap::new();

        for (index, spec) in network.signals.iter().enumerate() {
            let id: SignalId = spec.id.as_str().into();
            let graph = TransitionGraph::build_from_strings(id.clone(), &spec.phases)?;

            let candidates = graph.ego_candidates();
            let pick = candidates[rng.gen_range(0..candidates.len())];
            let phase = graph.phase(pick).clone();

            index_of.insert(id.clone(), index);
            signals.push(SignalState {
                id,
                index,
                position: spec.position,
                phase,
                cooldown: -2 * min_delay as i32,
            });
            graphs.push(graph);
        }

        let adjacency = network.adjacency(cfg.obs.neighbor_radius)?;

        Ok(Self {
            signals,
            graphs,
            adjacency,
            index_of,
            min_delay,
        })
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn signals(&self) -> &[SignalState] {
        &self.signals
    }

    pub fn signals_mut(&mut self) -> &mut [SignalState] {
        &mut self.signals
    }

    pub fn signal(&self, index: usize) -> &SignalState {
        &self.signals[index]
    }

    /// Transition graph for the signal at `index`.
    pub fn graph(&self, index: usize) -> &TransitionGraph {
        &self.graphs[index]
    }

    /// Transition graph lookup by id, for callers that want to validate
    /// a proposed phase before requesting it.
    pub fn graph_of(&self, id: &str) -> Option<&TransitionGraph> {
        self.index_of.get(id).map(|&i| &self.graphs[i])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_of.get(id).copied()
    }

    /// Adjacency neighbors (hub indices) of the signal at `index`.
    pub fn neighbors(&self, index: usize) -> &[usize] {
        &self.adjacency[index]
    }

    pub fn min_delay(&self) -> u32 {
        self.min_delay
    }

    /// Lower cooldown bound: `-2 * min_delay`.
    pub fn min_cooldown(&self) -> i32 {
        -2 * self.min_delay as i32
    }

    /// Mutable access to one signal plus its graph. The split borrow is
    /// needed by callers that advance a signal along its own graph.
    pub fn signal_and_graph_mut(&mut self, index: usize) -> (&mut SignalState, &TransitionGraph) {
        (&mut self.signals[index], &self.graphs[index])
    }

    /// Serialize every signal as an `(id, phase, cooldown)` triple, in
    /// hub order.
    pub fn snapshot(&self) -> HubSnapshot {
        HubSnapshot {
            signals: self
                .signals
                .iter()
                .map(|s| SignalSnapshot {
                    id: s.id.to_string(),
                    phase: s.phase.to_string(),
                    cooldown: s.cooldown,
                })
                .collect(),
        }
    }

    /// Restore signal state from a snapshot.
    ///
    /// Entries are matched by id, so snapshot order need not match hub
    /// order, but every hub signal must be covered. Phases are
    /// re-validated (alphabet + per-signal length); off-graph phases
    /// are accepted because simulator-authoritative reports can leave a
    /// signal outside its candidate set. Cooldowns are clamped back
    /// into `[-2 * min_delay, 0]`.
    pub fn restore(&mut self, snapshot: &HubSnapshot) -> Result<(), SnapshotError> {
        if snapshot.signals.len() != self.signals.len() {
            return Err(SnapshotError::CountMismatch {
                expected: self.signals.len(),
                found: snapshot.signals.len(),
            });
        }

        let min_cooldown = self.min_cooldown();
        for record in &snapshot.signals {
            let index = self.index_of.get(record.id.as_str()).copied().ok_or_else(|| {
                SnapshotError::UnknownSignal {
                    id: record.id.clone(),
                }
            })?;
            let phase =
                Phase::new(&record.phase).map_err(|error| SnapshotError::InvalidPhase {
                    id: record.id.clone(),
                    phase: record.phase.clone(),
                    error,
                })?;
            let expected = self.graphs[index].phase_len();
            if phase.len() != expected {
                return Err(SnapshotError::LengthMismatch {
                    id: record.id.clone(),
                    expected,
                    phase: record.phase.clone(),
                });
            }
            let state = &mut self.signals[index];
            state.phase = phase;
            state.cooldown = record.cooldown.clamp(min_cooldown, 0);
        }
        Ok(())
    }
}
