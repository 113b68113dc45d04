// src/graph.rs
//
// Per-signal transition legality graph.
//
// The graph is an explicit id-indexed adjacency table (arena of phase
// nodes + edge index lists), not a pointer graph:
//  - node list: the signal's candidate phases, deduplicated and sorted,
//    with the all-red phase force-inserted when the static source omits
//    it (it is the designated absorbing/safe phase),
//  - one ego edge per candidate (the signal's own identity node is the
//    source of edges to every reachable phase),
//  - a phase-to-phase edge for every ordered pair satisfying the
//    per-character rule, self-loops included.
//
// Built once at setup, O(n^2 * L) in candidate count n and phase length
// L, and cached for the lifetime of the owning instance. Identical
// candidate input always yields an identical graph regardless of the
// source ordering.

use std::collections::BTreeSet;

use crate::phase::{legal, Phase, PhaseError};
use crate::types::SignalId;

/// Fatal setup-time error while building a [`TransitionGraph`].
///
/// Topology is static and validated exactly once; any of these aborts
/// construction of the owning hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphBuildError {
    NoCandidates { signal_id: String },
    LengthMismatch { signal_id: String, expected: usize, phase: String },
    InvalidPhase { signal_id: String, phase: String, error: PhaseError },
}

/// Directed graph of legal phase transitions for one signal.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionGraph {
    signal_id: SignalId,
    /// Fixed phase length for this signal (lane-group count).
    phase_len: usize,
    /// Sorted, deduplicated node arena. Always contains the all-red phase.
    phases: Vec<Phase>,
    /// Ego node out-edges: indices of every candidate phase.
    ego_out: Vec<usize>,
    /// Phase-to-phase out-edges per node, self-loops included.
    out: Vec<Vec<usize>>,
}

impl TransitionGraph {
    /// Build the graph from a signal's candidate phase list.
    ///
    /// Candidates are deduplicated and sorted, and the all-red phase is
    /// appended if absent, before edges are enumerated. All candidates
    /// must share one length.
    pub fn build(signal_id: SignalId, candidates: &[Phase]) -> Result<Self, GraphBuildError> {
        let first = candidates.first().ok_or_else(|| GraphBuildError::NoCandidates {
            signal_id: signal_id.to_string(),
        })?;
        let phase_len = first.len();

        let mut set: BTreeSet<Phase> = BTreeSet::new();
        for phase in candidates {
            if phase.len() != phase_len {
                return Err(GraphBuildError::LengthMismatch {
                    signal_id: signal_id.to_string(),
                    expected: phase_len,
                    phase: phase.to_string(),
                });
            }
            set.insert(phase.clone());
        }
        set.insert(Phase::all_red(phase_len));

        let phases: Vec<Phase> = set.into_iter().collect();
        let n = phases.len();

        let ego_out: Vec<usize> = (0..n).collect();
        let mut out: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, p) in phases.iter().enumerate() {
            for (j, q) in phases.iter().enumerate() {
                if legal(p, q) {
                    out[i].push(j);
                }
            }
        }

        Ok(Self {
            signal_id,
            phase_len,
            phases,
            ego_out,
            out,
        })
    }

    /// Parse raw phase strings and build the graph.
    pub fn build_from_strings(
        signal_id: SignalId,
        candidates: &[String],
    ) -> Result<Self, GraphBuildError> {
        let mut phases = Vec::with_capacity(candidates.len());
        for raw in candidates {
            let phase = Phase::new(raw).map_err(|error| GraphBuildError::InvalidPhase {
                signal_id: signal_id.to_string(),
                phase: raw.clone(),
                error,
            })?;
            phases.push(phase);
        }
        Self::build(signal_id, &phases)
    }

    pub fn signal_id(&self) -> &SignalId {
        &self.signal_id
    }

    /// Lane-group count shared by every node.
    pub fn phase_len(&self) -> usize {
        self.phase_len
    }

    /// Number of phase nodes (candidates + synthesized all-red).
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Node arena in deterministic (lexicographic) order.
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn phase(&self, index: usize) -> &Phase {
        &self.phases[index]
    }

    /// Index of a phase in the arena, if it is a node.
    pub fn phase_index(&self, phase: &Phase) -> Option<usize> {
        self.phases.binary_search(phase).ok()
    }

    /// Candidates reachable from the ego node (all of them, by
    /// construction). Initial phase selection draws from this set.
    pub fn ego_candidates(&self) -> &[usize] {
        &self.ego_out
    }

    /// Out-edges of a phase node, self-loop included.
    pub fn successors(&self, index: usize) -> &[usize] {
        &self.out[index]
    }

    /// Out-edges of a phase node excluding the self-loop, in
    /// deterministic index order. This is the candidate set for
    /// [`advance`](crate::signal::SignalState::advance).
    pub fn non_self_successors(&self, index: usize) -> Vec<usize> {
        self.out[index].iter().copied().filter(|&j| j != index).collect()
    }

    /// Is `from -> to` an edge of this graph?
    ///
    /// Both phases must be nodes; a legal transition to a phase outside
    /// the candidate set is still not an edge.
    pub fn contains_edge(&self, from: &Phase, to: &Phase) -> bool {
        match (self.phase_index(from), self.phase_index(to)) {
            (Some(i), Some(j)) => self.out[i].contains(&j),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> SignalId {
        s.into()
    }

    fn phases(raw: &[&str]) -> Vec<Phase> {
        raw.iter().map(|s| Phase::new(s).unwrap()).collect()
    }

    #[test]
    fn all_red_is_synthesized_when_missing() {
        let g = TransitionGraph::build(id("0"), &phases(&["GGrr", "yyrr"])).unwrap();
        let all_red = Phase::all_red(4);
        assert!(g.phase_index(&all_red).is_some());
        assert_eq!(g.len(), 3);
    }

    #[test]
    fn all_red_is_not_duplicated_when_present() {
        let g = TransitionGraph::build(id("0"), &phases(&["rrrr", "GGrr"])).unwrap();
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn candidate_order_does_not_matter() {
        let a = TransitionGraph::build(id("0"), &phases(&["GGrr", "yyrr", "rryy"])).unwrap();
        let b = TransitionGraph::build(id("0"), &phases(&["rryy", "GGrr", "yyrr"])).unwrap();
        let c =
            TransitionGraph::build(id("0"), &phases(&["yyrr", "rryy", "GGrr", "yyrr"])).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn ego_reaches_every_candidate() {
        let g = TransitionGraph::build(id("2"), &phases(&["GGrr", "yyrr", "rryy"])).unwrap();
        assert_eq!(g.ego_candidates(), &[0, 1, 2, 3]);
    }

    #[test]
    fn self_loops_are_present() {
        let g = TransitionGraph::build(id("0"), &phases(&["GGrr", "yyrr"])).unwrap();
        for i in 0..g.len() {
            assert!(g.successors(i).contains(&i), "missing self-loop at {i}");
            assert!(!g.non_self_successors(i).contains(&i));
        }
    }

    #[test]
    fn mixed_lengths_abort_construction() {
        let err = TransitionGraph::build(id("0"), &phases(&["GGrr", "yyr"])).unwrap_err();
        assert_eq!(
            err,
            GraphBuildError::LengthMismatch {
                signal_id: "0".to_string(),
                expected: 4,
                phase: "yyr".to_string(),
            }
        );
    }

    #[test]
    fn empty_candidate_list_is_an_error() {
        let err = TransitionGraph::build(id("7"), &[]).unwrap_err();
        assert_eq!(
            err,
            GraphBuildError::NoCandidates {
                signal_id: "7".to_string()
            }
        );
    }

    #[test]
    fn bad_alphabet_is_an_error() {
        let err =
            TransitionGraph::build_from_strings(id("0"), &["GGrr".into(), "GXrr".into()])
                .unwrap_err();
        assert!(matches!(err, GraphBuildError::InvalidPhase { .. }));
    }

    #[test]
    fn edge_requires_both_endpoints_to_be_nodes() {
        let g = TransitionGraph::build(id("0"), &phases(&["GGrr", "yyrr"])).unwrap();
        // Legal per-character, but "rrGG" is not a candidate here.
        assert!(!g.contains_edge(
            &Phase::new("rrrr").unwrap(),
            &Phase::new("rrGG").unwrap()
        ));
    }
}
