// src/mask.rs
//
// Per-step cooldown mask over proposed switch requests.
//
// The validator is the only writer of the cooldown counters. Decision
// rule, per signal:
//  - a switch is honored iff the proposed action is Switch AND the
//    signal's cooldown counter is exactly 0; honoring advances the
//    phase along the transition graph and resets the counter to
//    `-2 * min_delay`;
//  - otherwise the applied action is forced to Hold and the counter is
//    incremented by 1, clamped to never exceed 0.
// An honored request whose advance no-ops (no legal non-self successor)
// is converted to a Hold as well: illegal transitions are expected
// control flow, never faults.

use std::collections::BTreeMap;

use crate::signal::{SignalHub, TieBreak};
use crate::types::{SignalAction, SignalId};

/// Outcome of applying one step's proposed actions.
#[derive(Debug, Clone)]
pub struct MaskResult {
    /// Cooldown-adjusted applied action per signal, in id order.
    /// Returned to the caller as auditable info and used for actuation.
    pub applied: BTreeMap<SignalId, SignalAction>,
    /// Ids whose phase actually changed this step.
    pub switched: Vec<SignalId>,
}

/// Stateless validator over a hub's cooldown counters.
pub struct ActionValidator;

impl ActionValidator {
    /// Apply one step of proposed actions to the hub.
    ///
    /// Signals missing from `proposed` are treated as Hold. Signals are
    /// processed in hub order; the map and mutation are deterministic.
    pub fn apply(
        hub: &mut SignalHub,
        proposed: &BTreeMap<SignalId, SignalAction>,
        tie_break: &mut dyn TieBreak,
    ) -> MaskResult {
        let min_cooldown = hub.min_cooldown();
        let mut applied = BTreeMap::new();
        let mut switched = Vec::new();

        for index in 0..hub.len() {
            let id = hub.signal(index).id.clone();
            let request = proposed
                .get(&id)
                .copied()
                .unwrap_or(SignalAction::Hold);

            let (state, graph) = hub.signal_and_graph_mut(index);

            let honored = request == SignalAction::Switch
                && state.cooldown == 0
                && state.advance(graph, tie_break);

            if honored {
                state.cooldown = min_cooldown;
                switched.push(id.clone());
                applied.insert(id, SignalAction::Switch);
            } else {
                state.cooldown = (state.cooldown + 1).min(0);
                applied.insert(id, SignalAction::Hold);
            }

            debug_assert!(
                (min_cooldown..=0).contains(&state.cooldown),
                "cooldown out of range for {}",
                state.id
            );
        }

        MaskResult { applied, switched }
    }
}
