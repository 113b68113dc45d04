// src/obs.rs
//
// Per-signal observation features for RL policy input.
//
// Built each step from the simulator's vehicle snapshot: vehicles
// within the detection radius of a signal's junction contribute to its
// congestion, halted-fraction, and average-speed features; the current
// phase contributes the light-code mode / standard deviation. Global
// and local congestion ranks are appended by the rank aggregator only
// when ranking is enabled; a disabled run keeps the unranked vector
// length.
//
// Design requirements (mirroring the rest of the core):
// - Versioned (obs_version) for schema evolution
// - Serializable (serde) for logging and replay
// - Deterministic: a pure function of signal state + vehicle snapshot
// - Fixed field order in the flattened vector

use serde::{Deserialize, Serialize};

use crate::config::ObsConfig;
use crate::signal::SignalState;
use crate::types::VehicleState;

/// Current observation schema version.
/// Increment when adding/removing/changing fields.
pub const OBS_VERSION: u32 = 1;

/// One signal's observation for one step.
///
/// `to_vec` flattens the features in the fixed order
/// `[congestion, halted_fraction, avg_speed, phase_mode, phase_std]`,
/// extended with `[global_rank, local_rank]` when ranks were annotated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Schema version for forwards/backwards compatibility.
    pub obs_version: u32,
    /// Stable signal identifier.
    pub signal_id: String,
    /// Stable enumeration index within the hub.
    pub signal_index: usize,

    // ----- Vehicle-derived features -----
    /// Occupancy of the signal's detection zone, in [0, 1]:
    /// vehicle count / capacity, saturated at 1.
    pub congestion: f64,
    /// Fraction of detected vehicles at or below the halt speed, in [0, 1].
    pub halted_fraction: f64,
    /// Mean detected speed normalized by the speed ceiling, in [0, 1].
    pub avg_speed: f64,

    // ----- Phase-derived features -----
    /// Most frequent per-lane-group light code of the current phase
    /// (r=0 < y=1 < g=2 < G=3; ties resolve to the lowest code).
    pub phase_mode: u8,
    /// Population standard deviation of the per-lane-group light codes.
    pub phase_std: f64,

    // ----- Ranking features (when enabled) -----
    /// Congestion priority relative to all signals, in (0, 1].
    pub global_rank: Option<f64>,
    /// Congestion priority relative to adjacency neighbors, in (0, 1].
    pub local_rank: Option<f64>,
}

impl Observation {
    /// Build one signal's observation from the vehicle snapshot.
    ///
    /// Ranks start unset; [`annotate_ranks`](crate::ranking::annotate_ranks)
    /// fills them in when ranking is enabled.
    pub fn from_snapshot(
        signal: &SignalState,
        vehicles: &[VehicleState],
        cfg: &ObsConfig,
    ) -> Observation {
        let mut detected = 0usize;
        let mut halted = 0usize;
        let mut speed_sum = 0.0f64;

        for v in vehicles {
            if v.position.distance_to(signal.position) <= cfg.detection_radius {
                detected += 1;
                speed_sum += v.speed;
                if v.speed <= cfg.halt_speed {
                    halted += 1;
                }
            }
        }

        let congestion = if cfg.capacity == 0 {
            0.0
        } else {
            (detected as f64 / cfg.capacity as f64).min(1.0)
        };
        let halted_fraction = if detected == 0 {
            0.0
        } else {
            halted as f64 / detected as f64
        };
        let avg_speed = if detected == 0 || cfg.max_speed <= 0.0 {
            0.0
        } else {
            (speed_sum / detected as f64 / cfg.max_speed).clamp(0.0, 1.0)
        };

        let (phase_mode, phase_std) = phase_statistics(signal);

        Observation {
            obs_version: OBS_VERSION,
            signal_id: signal.id.to_string(),
            signal_index: signal.index,
            congestion,
            halted_fraction,
            avg_speed,
            phase_mode,
            phase_std,
            global_rank: None,
            local_rank: None,
        }
    }

    /// Flatten to the fixed-order feature vector. Length is 5 unranked,
    /// 7 once both ranks are annotated.
    pub fn to_vec(&self) -> Vec<f64> {
        let mut v = vec![
            self.congestion,
            self.halted_fraction,
            self.avg_speed,
            self.phase_mode as f64,
            self.phase_std,
        ];
        if let (Some(g), Some(l)) = (self.global_rank, self.local_rank) {
            v.push(g);
            v.push(l);
        }
        v
    }

    /// Serialize to JSON bytes for deterministic comparison.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Mode and population standard deviation of the current phase's
/// per-lane-group light codes.
fn phase_statistics(signal: &SignalState) -> (u8, f64) {
    let codes: Vec<u8> = signal.phase.light_codes().collect();
    debug_assert!(!codes.is_empty());

    let mut counts = [0usize; crate::phase::NUM_LIGHT_CODES as usize];
    for &c in &codes {
        counts[c as usize] += 1;
    }
    // Ties resolve to the lowest code.
    let mode = counts
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
        .map(|(code, _)| code as u8)
        .unwrap_or(0);

    let n = codes.len() as f64;
    let mean = codes.iter().map(|&c| c as f64).sum::<f64>() / n;
    let var = codes
        .iter()
        .map(|&c| {
            let d = c as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;

    (mode, var.sqrt())
}
