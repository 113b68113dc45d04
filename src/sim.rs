// src/sim.rs
//
// Traffic simulator boundary.
//
// The core talks to the micro-simulator through the narrow TrafficSim
// trait: phase get/set per signal id, a per-vehicle position/speed
// snapshot, a done flag, and the blocking advance-time call. Any
// timeout or cancellation policy belongs to the outer training loop,
// not here.
//
// SyntheticSim is a deterministic, seeded in-process implementation:
// vehicles drift across a bounded plane with a speed random walk and
// occasional halts. It exists so the core can be exercised end-to-end
// in tests and the episode harness without an external simulator
// process; it can also inject phase-read failures to drive the
// reconcile-degradation path.

use std::collections::{BTreeMap, BTreeSet};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::SimConfig;
use crate::phase::Phase;
use crate::types::{Position, VehicleState};

/// Recoverable simulator-boundary error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// The simulator could not be reached for this query.
    ConnectionLost { id: String },
    /// The simulator does not know the signal id.
    UnknownSignal { id: String },
}

/// Abstract traffic micro-simulator.
///
/// `advance` is an opaque, blocking, synchronous call; it is the only
/// suspension point the core relies on.
pub trait TrafficSim {
    /// Current phase of a signal as reported by the simulator.
    fn current_phase(&self, id: &str) -> Result<Phase, SimError>;

    /// Command a signal to the given phase.
    fn set_phase(&mut self, id: &str, phase: &Phase) -> Result<(), SimError>;

    /// Snapshot of every vehicle's position and speed.
    fn vehicles(&self) -> Vec<VehicleState>;

    /// Whether the simulation has run to completion.
    fn done(&self) -> bool;

    /// Advance simulated time by one step.
    fn advance(&mut self);
}

#[derive(Debug, Clone)]
struct Vehicle {
    position: Position,
    heading: (f64, f64),
    speed: f64,
}

/// Deterministic synthetic simulator.
#[derive(Debug)]
pub struct SyntheticSim {
    cfg: SimConfig,
    vehicles: Vec<Vehicle>,
    phases: BTreeMap<String, Phase>,
    failing_reads: BTreeSet<String>,
    rng: ChaCha8Rng,
    step: u64,
}

impl SyntheticSim {
    /// Seed the vehicle field. Identical config + seed reproduce an
    /// identical simulation.
    pub fn new(cfg: SimConfig, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let max_speed = cfg.speed_noise.max(1.0) * 8.0;

        let vehicles = (0..cfg.num_vehicles)
            .map(|_| {
                let angle: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
                Vehicle {
                    position: Position::new(
                        rng.gen_range(0.0..cfg.width),
                        rng.gen_range(0.0..cfg.height),
                    ),
                    heading: (angle.cos(), angle.sin()),
                    speed: rng.gen_range(0.0..max_speed),
                }
            })
            .collect();

        Self {
            cfg,
            vehicles,
            phases: BTreeMap::new(),
            failing_reads: BTreeSet::new(),
            rng,
            step: 0,
        }
    }

    pub fn step_count(&self) -> u64 {
        self.step
    }

    /// Make phase reads for `id` fail until cleared. Test hook for the
    /// reconcile-degradation path.
    pub fn inject_read_failure(&mut self, id: &str) {
        self.failing_reads.insert(id.to_string());
    }

    pub fn clear_read_failures(&mut self) {
        self.failing_reads.clear();
    }
}

impl TrafficSim for SyntheticSim {
    fn current_phase(&self, id: &str) -> Result<Phase, SimError> {
        if self.failing_reads.contains(id) {
            return Err(SimError::ConnectionLost { id: id.to_string() });
        }
        self.phases
            .get(id)
            .cloned()
            .ok_or_else(|| SimError::UnknownSignal { id: id.to_string() })
    }

    fn set_phase(&mut self, id: &str, phase: &Phase) -> Result<(), SimError> {
        self.phases.insert(id.to_string(), phase.clone());
        Ok(())
    }

    fn vehicles(&self) -> Vec<VehicleState> {
        self.vehicles
            .iter()
            .map(|v| VehicleState {
                position: v.position,
                speed: v.speed,
            })
            .collect()
    }

    fn done(&self) -> bool {
        self.step >= self.cfg.max_steps
    }

    fn advance(&mut self) {
        self.step += 1;

        for v in &mut self.vehicles {
            if self.cfg.halt_prob > 0.0 && self.rng.gen_bool(self.cfg.halt_prob) {
                v.speed = 0.0;
            } else if self.cfg.speed_noise > 0.0 {
                let noise = self.rng.gen_range(-self.cfg.speed_noise..self.cfg.speed_noise);
                v.speed = (v.speed + noise).max(0.0);
            }

            v.position.x += v.heading.0 * v.speed;
            v.position.y += v.heading.1 * v.speed;

            // Bounce off the plane bounds.
            if v.position.x < 0.0 || v.position.x > self.cfg.width {
                v.heading.0 = -v.heading.0;
                v.position.x = v.position.x.clamp(0.0, self.cfg.width);
            }
            if v.position.y < 0.0 || v.position.y > self.cfg.height {
                v.heading.1 = -v.heading.1;
                v.position.y = v.position.y.clamp(0.0, self.cfg.height);
            }
        }
    }
}
