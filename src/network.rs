// src/network.rs
//
// Static road-network topology input.
//
// The core does not parse road-network description files; the outer
// system hands it this read-only model once at setup: one record per
// signal carrying the id, the (x, y) junction position, the candidate
// phase-string list, and optionally an explicit neighbor list. When
// neighbors are not authored explicitly, adjacency is derived from
// positions (signals within `neighbor_radius` of each other).

use serde::{Deserialize, Serialize};

use crate::types::Position;

/// Setup-time topology error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    DuplicateSignal { id: String },
    UnknownNeighbor { id: String, neighbor: String },
}

/// Static description of one controlled signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalSpec {
    pub id: String,
    pub position: Position,
    /// Candidate phase strings as emitted by the static source.
    /// May contain duplicates and need not include the all-red phase;
    /// graph construction normalizes both.
    pub phases: Vec<String>,
    /// Explicit neighbor ids. When `None`, neighbors are derived from
    /// positions at hub construction.
    #[serde(default)]
    pub neighbors: Option<Vec<String>>,
}

/// The full static topology input: an ordered list of signal specs.
///
/// Order is meaningful: it fixes each signal's stable enumeration index
/// for the lifetime of the hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkModel {
    pub signals: Vec<SignalSpec>,
}

impl NetworkModel {
    pub fn new(signals: Vec<SignalSpec>) -> Self {
        Self { signals }
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Resolve the adjacency structure as index lists, in signal order.
    ///
    /// Explicit neighbor lists win when authored; otherwise two distinct
    /// signals are neighbors iff their positions lie within
    /// `neighbor_radius` of each other. Ids are validated here because
    /// topology is checked exactly once, at setup.
    pub fn adjacency(&self, neighbor_radius: f64) -> Result<Vec<Vec<usize>>, TopologyError> {
        let index_of = self.index_map()?;

        let mut adjacency = Vec::with_capacity(self.signals.len());
        for (i, spec) in self.signals.iter().enumerate() {
            let mut neighbors = Vec::new();
            match &spec.neighbors {
                Some(ids) => {
                    for nb in ids {
                        let j = *index_of.get(nb.as_str()).ok_or_else(|| {
                            TopologyError::UnknownNeighbor {
                                id: spec.id.clone(),
                                neighbor: nb.clone(),
                            }
                        })?;
                        if j != i && !neighbors.contains(&j) {
                            neighbors.push(j);
                        }
                    }
                }
                None => {
                    for (j, other) in self.signals.iter().enumerate() {
                        if j != i
                            && spec.position.distance_to(other.position) <= neighbor_radius
                        {
                            neighbors.push(j);
                        }
                    }
                }
            }
            adjacency.push(neighbors);
        }
        Ok(adjacency)
    }

    fn index_map(&self) -> Result<std::collections::BTreeMap<&str, usize>, TopologyError> {
        let mut index_of = std::collections::BTreeMap::new();
        for (i, spec) in self.signals.iter().enumerate() {
            if index_of.insert(spec.id.as_str(), i).is_some() {
                return Err(TopologyError::DuplicateSignal {
                    id: spec.id.clone(),
                });
            }
        }
        Ok(index_of)
    }

    /// Synthetic rows x cols lattice of identical signals, `spacing`
    /// meters apart, ids enumerated row-major from "0". Used by tests
    /// and the episode harness.
    pub fn grid(rows: usize, cols: usize, spacing: f64, phases: &[&str]) -> Self {
        let mut signals = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                signals.push(SignalSpec {
                    id: (r * cols + c).to_string(),
                    position: Position::new(c as f64 * spacing, r as f64 * spacing),
                    phases: phases.iter().map(|s| s.to_string()).collect(),
                    neighbors: None,
                });
            }
        }
        Self { signals }
    }
}
