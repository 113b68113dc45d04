// src/ranking.rs
//
// Global and local congestion priority ranks.
//
// Global rank orders all signals by congestion descending and assigns
// `1 - position / total`, so the most congested signal ranks 1.0 and
// ranks decay toward 0 down the order. Equal congestion is broken by
// signal id ascending, which keeps the order total and reproducible.
//
// Local rank compares a signal only against its adjacency neighbors:
// `1 - exceed / degree`, where exceed counts neighbors with a strictly
// greater global rank. A signal with no neighbors ranks 1.0, since
// nothing can exceed it.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::obs::Observation;
use crate::signal::SignalHub;
use crate::types::SignalId;

/// Annotate every observation with global and local ranks, in place.
///
/// The observation map must cover every hub signal. Callers gate this
/// on the ranking toggle; when disabled the observations keep their
/// unranked vector length.
pub fn annotate_ranks(observations: &mut BTreeMap<SignalId, Observation>, hub: &SignalHub) {
    let total = hub.len();
    if total == 0 {
        return;
    }

    // Global: congestion descending, ties by id ascending.
    let mut order: Vec<(SignalId, f64)> = observations
        .iter()
        .map(|(id, obs)| (id.clone(), obs.congestion))
        .collect();
    order.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    for (position, (id, _)) in order.iter().enumerate() {
        if let Some(obs) = observations.get_mut(id) {
            obs.global_rank = Some(1.0 - position as f64 / total as f64);
        }
    }

    // Local: compare each signal's global rank against its neighbors'.
    for index in 0..total {
        let id = &hub.signal(index).id;
        let own = observations
            .get(id)
            .and_then(|o| o.global_rank)
            .unwrap_or(0.0);

        let neighbors = hub.neighbors(index);
        let local = if neighbors.is_empty() {
            1.0
        } else {
            let exceed = neighbors
                .iter()
                .filter(|&&j| {
                    observations
                        .get(&hub.signal(j).id)
                        .and_then(|o| o.global_rank)
                        .map(|r| r > own)
                        .unwrap_or(false)
                })
                .count();
            1.0 - exceed as f64 / neighbors.len() as f64
        };

        if let Some(obs) = observations.get_mut(id) {
            obs.local_rank = Some(local);
        }
    }
}
