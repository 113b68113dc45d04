// src/bin/episode.rs
//
// Research harness: run one seeded episode of the synthetic simulator
// under a simple baseline policy and emit per-step JSONL telemetry.
//
// Run examples:
//   cargo run --bin episode -- --rows 3 --cols 3 --seed 42
//   cargo run --bin episode -- --policy random --ranked --out episode.jsonl
//   cargo run --bin episode -- --policy cycle --steps 200 --min-delay 2

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use greenwave::{
    Config, EventSink, FileSink, NetworkModel, NoopSink, SignalAction, SignalEnv, SignalId,
    SyntheticSim,
};

const GRID_PHASES: &[&str] = &["GGrr", "yyrr", "rrGG", "rryy"];

/// Baseline action policies for the harness.
///
/// Resolved once at startup; the step loop never dispatches on strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyKind {
    /// Every signal holds its phase forever.
    Hold,
    /// Seeded coin flip per signal per step.
    Random,
    /// Every signal requests a switch on every step; the cooldown mask
    /// turns this into a fixed cadence.
    Cycle,
}

#[derive(Debug, Parser)]
#[command(name = "episode", about = "Run one Greenwave episode on the synthetic simulator")]
struct Args {
    /// Signal grid rows.
    #[arg(long, default_value_t = 2)]
    rows: usize,

    /// Signal grid columns.
    #[arg(long, default_value_t = 2)]
    cols: usize,

    /// Grid spacing in meters.
    #[arg(long, default_value_t = 100.0)]
    spacing: f64,

    /// Episode length in steps.
    #[arg(long, default_value_t = 300)]
    steps: u64,

    /// Master seed for hub construction, the simulator, and the random
    /// policy.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Minimum dwell steps between honored switches.
    #[arg(long, default_value_t = 3)]
    min_delay: u32,

    /// Append global/local congestion ranks to observations.
    #[arg(long)]
    ranked: bool,

    /// Baseline policy.
    #[arg(long, value_enum, default_value = "cycle")]
    policy: PolicyKind,

    /// JSONL telemetry output path. Telemetry is discarded when absent.
    #[arg(long)]
    out: Option<String>,

    /// Print a progress line every N steps (0 = quiet).
    #[arg(long, default_value_t = 50)]
    print_every: u64,
}

struct Policy {
    kind: PolicyKind,
    rng: ChaCha8Rng,
}

impl Policy {
    fn new(kind: PolicyKind, seed: u64) -> Self {
        Self {
            kind,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn propose(&mut self, ids: &[SignalId]) -> BTreeMap<SignalId, SignalAction> {
        ids.iter()
            .map(|id| {
                let action = match self.kind {
                    PolicyKind::Hold => SignalAction::Hold,
                    PolicyKind::Cycle => SignalAction::Switch,
                    PolicyKind::Random => {
                        if self.rng.gen_bool(0.5) {
                            SignalAction::Switch
                        } else {
                            SignalAction::Hold
                        }
                    }
                };
                (id.clone(), action)
            })
            .collect()
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::default();
    config.min_delay = args.min_delay;
    config.ranked = args.ranked;
    config.sim.max_steps = args.steps;

    let network = NetworkModel::grid(args.rows, args.cols, args.spacing, GRID_PHASES);
    let sim = SyntheticSim::new(config.sim.clone(), args.seed);

    let mut env = SignalEnv::new(config.clone(), network, sim)
        .map_err(|e| anyhow::anyhow!("hub construction failed: {e:?}"))?;
    env.reset(Some(args.seed))
        .map_err(|e| anyhow::anyhow!("reset failed: {e:?}"))?;

    let mut sink: Box<dyn EventSink> = match &args.out {
        Some(path) => Box::new(
            FileSink::create(path).with_context(|| format!("creating sink at {path}"))?,
        ),
        None => Box::new(NoopSink),
    };

    let ids: Vec<SignalId> = env.hub().signals().iter().map(|s| s.id.clone()).collect();
    let mut policy = Policy::new(args.policy, args.seed.wrapping_add(1));

    let mut total_switches: u64 = 0;
    let mut final_mean_congestion = 0.0;

    loop {
        let proposed = policy.propose(&ids);
        let result = env.step(&proposed);

        total_switches += result.info.switched.len() as u64;
        let n = result.observations.len().max(1) as f64;
        final_mean_congestion =
            result.observations.values().map(|o| o.congestion).sum::<f64>() / n;

        sink.log_step(result.info.step, env.config(), &result);

        if args.print_every > 0 && result.info.step % args.print_every == 0 {
            println!(
                "[step {:>5}] switches={} mean_congestion={:.3}",
                result.info.step,
                result.info.switched.len(),
                final_mean_congestion,
            );
        }

        if result.done {
            break;
        }
    }

    println!(
        "episode finished: steps={} signals={} total_switches={} mean_congestion={:.3} seed={}",
        env.step_index(),
        ids.len(),
        total_switches,
        final_mean_congestion,
        args.seed,
    );

    Ok(())
}
