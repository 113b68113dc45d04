// src/types.rs
//
// Common shared types for the Greenwave signal-control core.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Step counter within one episode.
pub type StepIndex = u64;

/// Stable identifier of a controlled signal (intersection).
///
/// Uses `Arc<str>` for cheap cloning in per-step maps. Serialized
/// records (snapshots, observations) carry plain `String` ids instead.
pub type SignalId = Arc<str>;

/// Binary per-signal control decision for one step.
///
/// - `Hold`   = keep the current phase (0)
/// - `Switch` = request an advance to the next legal phase (1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalAction {
    Hold,
    Switch,
}

impl SignalAction {
    /// Integer encoding used in applied-action maps and telemetry.
    pub fn as_u8(&self) -> u8 {
        match self {
            SignalAction::Hold => 0,
            SignalAction::Switch => 1,
        }
    }

    /// Decode from the binary policy output. Anything non-zero is a
    /// switch request.
    pub fn from_u8(v: u8) -> SignalAction {
        if v == 0 {
            SignalAction::Hold
        } else {
            SignalAction::Switch
        }
    }
}

/// Planar position in simulator coordinates (meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    pub fn distance_to(&self, other: Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Per-vehicle snapshot returned by the simulator each step.
///
/// This is the only vehicle-level data the core consumes: enough to
/// derive congestion, halted-fraction, and average-speed features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub position: Position,
    /// Instantaneous speed (m/s), never negative.
    pub speed: f64,
}
