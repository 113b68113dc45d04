// tests/ranking_tests.rs
//
// Rank-aggregation contract: global rank positions, deterministic
// tie-breaks, local ranks against adjacency neighbors, and the
// degree-zero convention.

use std::collections::BTreeMap;

use greenwave::{
    annotate_ranks, Config, NetworkModel, Observation, Position, SignalHub, SignalId,
    SignalSpec,
};

const PHASES: &[&str] = &["GGrr", "yyrr", "rrGG", "rryy"];

fn spec(id: &str, x: f64, neighbors: &[&str]) -> SignalSpec {
    SignalSpec {
        id: id.to_string(),
        position: Position::new(x, 0.0),
        phases: PHASES.iter().map(|s| s.to_string()).collect(),
        neighbors: Some(neighbors.iter().map(|s| s.to_string()).collect()),
    }
}

fn observations_with_congestion(
    hub: &SignalHub,
    congestion: &[(&str, f64)],
) -> BTreeMap<SignalId, Observation> {
    let cfg = Config::default();
    let mut obs: BTreeMap<SignalId, Observation> = hub
        .signals()
        .iter()
        .map(|s| {
            (
                s.id.clone(),
                Observation::from_snapshot(s, &[], &cfg.obs),
            )
        })
        .collect();
    for (id, c) in congestion {
        obs.get_mut(*id).expect("unknown id in fixture").congestion = *c;
    }
    obs
}

/// Congestion {A: 0.9, B: 0.5, C: 0.1} with no ties must produce global
/// ranks A = 1.0, B = 0.667, C = 0.333 (1 - position / 3).
#[test]
fn global_ranks_match_position_formula() {
    let net = NetworkModel::new(vec![
        spec("A", 0.0, &[]),
        spec("B", 100.0, &[]),
        spec("C", 200.0, &[]),
    ]);
    let hub = SignalHub::new(&net, &Config::default(), 0).unwrap();
    let mut obs =
        observations_with_congestion(&hub, &[("A", 0.9), ("B", 0.5), ("C", 0.1)]);

    annotate_ranks(&mut obs, &hub);

    let rank = |id: &str| obs[id].global_rank.unwrap();
    assert!((rank("A") - 1.0).abs() < 1e-6);
    assert!((rank("B") - 0.667).abs() < 1e-3);
    assert!((rank("C") - 0.333).abs() < 1e-3);
}

/// A signal with zero adjacency neighbors has local rank 1.0 regardless
/// of its global rank.
#[test]
fn degree_zero_signal_gets_local_rank_one() {
    let net = NetworkModel::new(vec![
        spec("A", 0.0, &["B"]),
        spec("B", 100.0, &["A"]),
        spec("lone", 1000.0, &[]),
    ]);
    let hub = SignalHub::new(&net, &Config::default(), 0).unwrap();
    // "lone" is the least congested signal in the network.
    let mut obs =
        observations_with_congestion(&hub, &[("A", 0.8), ("B", 0.6), ("lone", 0.01)]);

    annotate_ranks(&mut obs, &hub);

    assert!(obs["lone"].global_rank.unwrap() < obs["B"].global_rank.unwrap());
    assert_eq!(obs["lone"].local_rank, Some(1.0));
}

#[test]
fn local_rank_uses_only_neighbors() {
    // Chain A - B - C: B sees both, A and C see only B.
    let net = NetworkModel::new(vec![
        spec("A", 0.0, &["B"]),
        spec("B", 100.0, &["A", "C"]),
        spec("C", 200.0, &["B"]),
    ]);
    let hub = SignalHub::new(&net, &Config::default(), 0).unwrap();
    let mut obs =
        observations_with_congestion(&hub, &[("A", 0.9), ("B", 0.5), ("C", 0.1)]);

    annotate_ranks(&mut obs, &hub);

    let local = |id: &str| obs[id].local_rank.unwrap();
    // A's single neighbor B ranks lower: nothing exceeds A.
    assert!((local("A") - 1.0).abs() < 1e-9);
    // B: A exceeds, C does not -> 1 - 1/2.
    assert!((local("B") - 0.5).abs() < 1e-9);
    // C: its single neighbor B exceeds it -> 0.
    assert!(local("C").abs() < 1e-9);
}

#[test]
fn equal_congestion_is_ordered_by_id() {
    let net = NetworkModel::new(vec![
        spec("10", 0.0, &[]),
        spec("2", 100.0, &[]),
        spec("7", 200.0, &[]),
    ]);
    let hub = SignalHub::new(&net, &Config::default(), 0).unwrap();
    let mut obs = observations_with_congestion(
        &hub,
        &[("10", 0.5), ("2", 0.5), ("7", 0.5)],
    );

    annotate_ranks(&mut obs, &hub);

    // Ids sort lexicographically: "10" < "2" < "7".
    let rank = |id: &str| obs[id].global_rank.unwrap();
    assert!(rank("10") > rank("2"));
    assert!(rank("2") > rank("7"));
}

/// Ranks never leave (0, 1], and every signal receives both ranks.
#[test]
fn ranks_are_normalized() {
    let net = NetworkModel::grid(3, 3, 100.0, PHASES);
    let hub = SignalHub::new(&net, &Config::default(), 0).unwrap();
    let congestion: Vec<(String, f64)> = hub
        .signals()
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id.to_string(), i as f64 / 10.0))
        .collect();
    let pairs: Vec<(&str, f64)> =
        congestion.iter().map(|(id, c)| (id.as_str(), *c)).collect();
    let mut obs = observations_with_congestion(&hub, &pairs);

    annotate_ranks(&mut obs, &hub);

    for o in obs.values() {
        let g = o.global_rank.expect("global rank missing");
        let l = o.local_rank.expect("local rank missing");
        assert!(g > 0.0 && g <= 1.0, "global rank {g} out of range");
        assert!(l >= 0.0 && l <= 1.0, "local rank {l} out of range");
    }
}
