// src/config.rs
//
// Central configuration for the Greenwave signal-control core.
// Single source of truth for the cooldown dwell constant, the ranking
// toggle, observation-feature normalization, and the synthetic
// simulator parameters used by tests and the episode harness.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Human-readable config / release version.
    pub version: String,
    /// Minimum dwell time in steps between honored switches.
    ///
    /// After a switch is honored, the signal's cooldown counter is set
    /// to `-2 * min_delay` and must climb back to 0 (one increment per
    /// step) before another switch can be honored.
    pub min_delay: u32,
    /// Whether global/local congestion ranks are appended to
    /// observations. When false, observation vectors keep their
    /// unranked length.
    pub ranked: bool,
    /// Observation feature extraction parameters.
    pub obs: ObsConfig,
    /// Synthetic simulator parameters.
    pub sim: SimConfig,
}

/// Observation feature extraction config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObsConfig {
    /// Radius (m) around a signal's junction within which vehicles
    /// count toward its features.
    pub detection_radius: f64,
    /// Vehicle count at which congestion saturates to 1.0.
    pub capacity: usize,
    /// Speed (m/s) at or below which a vehicle counts as halted.
    pub halt_speed: f64,
    /// Normalization ceiling for average speed (m/s).
    pub max_speed: f64,
    /// Radius (m) for deriving signal adjacency when the topology
    /// source does not author explicit neighbor lists.
    pub neighbor_radius: f64,
}

impl Default for ObsConfig {
    fn default() -> Self {
        Self {
            detection_radius: 60.0,
            capacity: 20,
            halt_speed: 0.5,
            max_speed: 29.0,
            neighbor_radius: 150.0,
        }
    }
}

/// Synthetic simulator config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Bounded plane width (m).
    pub width: f64,
    /// Bounded plane height (m).
    pub height: f64,
    /// Number of vehicles seeded into the plane.
    pub num_vehicles: usize,
    /// Episode length; the simulator reports done at this step count.
    pub max_steps: u64,
    /// Per-step probability that a vehicle halts this step.
    pub halt_prob: f64,
    /// Magnitude of the per-step speed random walk (m/s).
    pub speed_noise: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 400.0,
            num_vehicles: 60,
            max_steps: 600,
            halt_prob: 0.15,
            speed_noise: 1.5,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "greenwave-0.1".to_string(),
            min_delay: 3,
            ranked: false,
            obs: ObsConfig::default(),
            sim: SimConfig::default(),
        }
    }
}

impl Config {
    /// Default config with ranking features enabled.
    pub fn ranked() -> Self {
        Self {
            ranked: true,
            ..Self::default()
        }
    }

    /// Small, fast preset for deterministic tests: short episodes and
    /// no spontaneous halting noise.
    pub fn deterministic() -> Self {
        Self {
            sim: SimConfig {
                num_vehicles: 20,
                max_steps: 50,
                halt_prob: 0.0,
                speed_noise: 0.0,
                ..SimConfig::default()
            },
            ..Self::default()
        }
    }
}
