//! Greenwave core library.
//!
//! This crate is the signal phase-transition validity engine and
//! per-step ranking/action-masking core for RL traffic-signal control.
//! It mediates between a learning policy and a traffic micro-simulator:
//! raw simulator state goes in, legal and temporally-consistent signal
//! actions plus normalized, rankable observations come out.
//!
//! # Architecture
//!
//! - **Phase rule** (`phase`): pure per-character legality of
//!   phase-to-phase transitions over the {G, g, y, r} alphabet.
//!
//! - **Transition graph** (`graph`): per-signal directed graph of legal
//!   transitions plus an ego node, built once at setup as an explicit
//!   id-indexed adjacency table.
//!
//! - **Signals** (`signal`): live per-signal phase + cooldown state,
//!   the injectable advance tie-break, the hub that owns every signal,
//!   and snapshot/restore for mid-episode resume.
//!
//! - **Action mask** (`mask`): per-step cooldown enforcement that turns
//!   proposed switch requests into the honored applied-action map.
//!
//! - **Ranking** (`ranking`): global and local congestion priority
//!   ranks appended to observations for multi-agent coordination.
//!
//! - **Environment** (`env`): the per-step pipeline over one simulator
//!   instance (validate/apply -> actuate -> advance -> reconcile ->
//!   observe/rank), deliberately reward-free.
//!
//! The simulator itself sits behind the `sim::TrafficSim` trait; a
//! deterministic `SyntheticSim` ships for tests and the episode
//! harness. All seeded choices go through ChaCha8 streams, so identical
//! seeds reproduce identical runs.

pub mod config;
pub mod env;
pub mod graph;
pub mod logging;
pub mod mask;
pub mod network;
pub mod obs;
pub mod phase;
pub mod ranking;
pub mod signal;
pub mod sim;
pub mod types;

// --- Re-exports for ergonomic external use ---------------------------------

pub use config::{Config, ObsConfig, SimConfig};

pub use phase::{legal, Phase, PhaseError, NUM_LIGHT_CODES};

pub use graph::{GraphBuildError, TransitionGraph};

pub use signal::{
    HubError, HubSnapshot, LowestIndex, SeededTieBreak, SignalHub, SignalSnapshot, SignalState,
    SnapshotError, TieBreak,
};

pub use mask::{ActionValidator, MaskResult};

pub use ranking::annotate_ranks;

pub use network::{NetworkModel, SignalSpec, TopologyError};

pub use obs::{Observation, OBS_VERSION};

pub use sim::{SimError, SyntheticSim, TrafficSim};

pub use env::{SignalEnv, StepInfo, StepResult, VecSignalEnv};

pub use logging::{EventSink, FileSink, NoopSink};

pub use types::{Position, SignalAction, SignalId, StepIndex, VehicleState};

// --- Cross-module smoke tests ----------------------------------------------
