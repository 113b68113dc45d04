// src/env.rs
//
// Environment glue around one simulator instance.
//
// SignalEnv owns one SignalHub and one TrafficSim and runs the per-step
// pipeline in a fixed order: validate/apply actions -> write phases to
// the simulator -> advance simulated time -> reconcile against
// simulator-reported phases -> recompute observations and ranks.
// Everything is single-threaded and synchronous; the only blocking
// point is the simulator's advance call.
//
// The env is deliberately reward-free: it returns observations, the
// cooldown-adjusted applied-action map, and the done flag, and leaves
// reward shaping to the training wrapper outside this crate.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::Config;
use crate::graph::TransitionGraph;
use crate::mask::ActionValidator;
use crate::network::NetworkModel;
use crate::obs::Observation;
use crate::ranking::annotate_ranks;
use crate::signal::{HubSnapshot, LowestIndex, SignalHub, SnapshotError, TieBreak};
use crate::sim::TrafficSim;
use crate::types::{SignalAction, SignalId, StepIndex};

/// Per-step bookkeeping returned alongside observations.
#[derive(Debug, Clone, Default)]
pub struct StepInfo {
    /// Step index after this step completed.
    pub step: StepIndex,
    /// Signals whose phase changed this step.
    pub switched: Vec<String>,
    /// Signals whose phase command could not be delivered.
    pub actuation_failures: Vec<String>,
    /// Signals whose post-step phase report was unavailable; their last
    /// known phase was retained.
    pub reconcile_failures: Vec<String>,
}

/// Result of a single environment step.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Per-signal observations after the step, in id order.
    pub observations: BTreeMap<SignalId, Observation>,
    /// Cooldown-adjusted applied action per signal.
    pub applied: BTreeMap<SignalId, SignalAction>,
    /// Whether the simulation has run to completion.
    pub done: bool,
    pub info: StepInfo,
}

/// One environment instance: hub + simulator + step pipeline.
///
/// Exclusively owns its hub; independent instances share nothing and
/// may run concurrently in the outer system.
pub struct SignalEnv<S: TrafficSim> {
    config: Config,
    network: NetworkModel,
    hub: SignalHub,
    sim: S,
    tie_break: Box<dyn TieBreak>,
    step: StepIndex,
    done: bool,
    seed: u64,
    rng: ChaCha8Rng,
}

impl<S: TrafficSim> SignalEnv<S> {
    /// Build an env over a topology and a simulator, with the default
    /// lowest-index tie-break.
    pub fn new(
        config: Config,
        network: NetworkModel,
        sim: S,
    ) -> Result<Self, crate::signal::HubError> {
        Self::with_tie_break(config, network, sim, Box::new(LowestIndex))
    }

    /// Build an env with an injected tie-break strategy.
    pub fn with_tie_break(
        config: Config,
        network: NetworkModel,
        sim: S,
        tie_break: Box<dyn TieBreak>,
    ) -> Result<Self, crate::signal::HubError> {
        let hub = SignalHub::new(&network, &config, 0)?;
        Ok(Self {
            config,
            network,
            hub,
            sim,
            tie_break,
            step: 0,
            done: false,
            seed: 0,
            rng: ChaCha8Rng::seed_from_u64(0),
        })
    }

    /// Reset the episode with an optional seed and return the initial
    /// observations.
    ///
    /// Rebuilds the hub (re-drawing initial phases from the seeded
    /// source) and pushes the initial phases to the simulator. The
    /// simulator itself is reset by its owner; this env only re-anchors
    /// its own state.
    pub fn reset(
        &mut self,
        seed: Option<u64>,
    ) -> Result<BTreeMap<SignalId, Observation>, crate::signal::HubError> {
        let seed = seed.unwrap_or_else(|| self.rng.gen());
        self.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);

        self.hub = SignalHub::new(&self.network, &self.config, seed)?;
        self.step = 0;
        self.done = false;

        let failures = self.write_phases();
        for id in &failures {
            eprintln!("greenwave: initial phase write failed signal={id}");
        }

        let mut observations = self.observe();
        if self.config.ranked {
            annotate_ranks(&mut observations, &self.hub);
        }
        Ok(observations)
    }

    /// Take one step with the proposed per-signal actions.
    ///
    /// Signals missing from `proposed` hold. Once the simulator reports
    /// done, further steps are inert and keep returning the terminal
    /// observation.
    pub fn step(&mut self, proposed: &BTreeMap<SignalId, SignalAction>) -> StepResult {
        if self.done {
            let mut observations = self.observe();
            if self.config.ranked {
                annotate_ranks(&mut observations, &self.hub);
            }
            let applied = self
                .hub
                .signals()
                .iter()
                .map(|s| (s.id.clone(), SignalAction::Hold))
                .collect();
            return StepResult {
                observations,
                applied,
                done: true,
                info: StepInfo {
                    step: self.step,
                    ..StepInfo::default()
                },
            };
        }

        // 1) Cooldown mask + graph-validated phase advancement.
        let mask = ActionValidator::apply(&mut self.hub, proposed, self.tie_break.as_mut());

        // 2) Actuate: every signal's current phase is (re)written, held
        //    or switched alike.
        let actuation_failures = self.write_phases();

        // 3) Advance simulated time (blocking).
        self.sim.advance();

        // 4) Reconcile: the simulator is authoritative; unavailable
        //    reports keep the last known phase and are surfaced, never
        //    fatal.
        let reconcile_failures = self.reconcile();

        // 5) Observations + ranks.
        let mut observations = self.observe();
        if self.config.ranked {
            annotate_ranks(&mut observations, &self.hub);
        }

        self.step += 1;
        self.done = self.sim.done();

        StepResult {
            observations,
            applied: mask.applied,
            done: self.done,
            info: StepInfo {
                step: self.step,
                switched: mask.switched.iter().map(|id| id.to_string()).collect(),
                actuation_failures,
                reconcile_failures,
            },
        }
    }

    /// Query access to a signal's transition graph, for callers that
    /// validate a proposed phase before requesting it.
    pub fn graph_of(&self, id: &str) -> Option<&TransitionGraph> {
        self.hub.graph_of(id)
    }

    pub fn hub(&self) -> &SignalHub {
        &self.hub
    }

    pub fn sim(&self) -> &S {
        &self.sim
    }

    pub fn sim_mut(&mut self) -> &mut S {
        &mut self.sim
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn step_index(&self) -> StepIndex {
        self.step
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Snapshot the hub for mid-episode resume.
    pub fn snapshot(&self) -> HubSnapshot {
        self.hub.snapshot()
    }

    /// Restore hub state from a snapshot and re-actuate the restored
    /// phases.
    pub fn restore(&mut self, snapshot: &HubSnapshot) -> Result<(), SnapshotError> {
        self.hub.restore(snapshot)?;
        let failures = self.write_phases();
        for id in &failures {
            eprintln!("greenwave: restored phase write failed signal={id}");
        }
        Ok(())
    }

    fn write_phases(&mut self) -> Vec<String> {
        let mut failures = Vec::new();
        for state in self.hub.signals() {
            if self.sim.set_phase(&state.id, &state.phase).is_err() {
                failures.push(state.id.to_string());
            }
        }
        failures
    }

    fn reconcile(&mut self) -> Vec<String> {
        let mut failures = Vec::new();
        for state in self.hub.signals_mut() {
            let observed = self.sim.current_phase(&state.id).ok();
            if !state.reconcile(observed) {
                failures.push(state.id.to_string());
            }
        }
        failures
    }

    fn observe(&self) -> BTreeMap<SignalId, Observation> {
        let vehicles = self.sim.vehicles();
        self.hub
            .signals()
            .iter()
            .map(|s| {
                (
                    s.id.clone(),
                    Observation::from_snapshot(s, &vehicles, &self.config.obs),
                )
            })
            .collect()
    }
}

/// N independent environments for vectorised rollouts.
///
/// Each env owns its own hub and simulator; nothing is shared across
/// instances.
pub struct VecSignalEnv<S: TrafficSim> {
    envs: Vec<SignalEnv<S>>,
}

impl<S: TrafficSim> VecSignalEnv<S> {
    pub fn new(envs: Vec<SignalEnv<S>>) -> Self {
        Self { envs }
    }

    pub fn num_envs(&self) -> usize {
        self.envs.len()
    }

    pub fn envs(&self) -> &[SignalEnv<S>] {
        &self.envs
    }

    /// Reset all environments with optional per-env seeds; missing
    /// seeds are drawn from each env's own stream.
    pub fn reset_all(
        &mut self,
        seeds: Option<&[u64]>,
    ) -> Result<Vec<BTreeMap<SignalId, Observation>>, crate::signal::HubError> {
        self.envs
            .iter_mut()
            .enumerate()
            .map(|(i, env)| env.reset(seeds.and_then(|s| s.get(i).copied())))
            .collect()
    }

    /// Step every environment with its own action map. `actions` must
    /// have one entry per env.
    pub fn step_all(
        &mut self,
        actions: &[BTreeMap<SignalId, SignalAction>],
    ) -> Vec<StepResult> {
        assert_eq!(
            actions.len(),
            self.envs.len(),
            "actions length must match number of environments"
        );
        self.envs
            .iter_mut()
            .zip(actions.iter())
            .map(|(env, a)| env.step(a))
            .collect()
    }

    pub fn dones(&self) -> Vec<bool> {
        self.envs.iter().map(|e| e.is_done()).collect()
    }
}
