// src/phase.rs
//
// Phase strings and the per-character transition legality rule.
//
// A phase is a fixed-length string over the alphabet {G, g, y, r}, one
// character per controlled lane-group of a signal. Whether one phase may
// follow another is decided independently per character position:
//
//   G, g -> {G, g, y}
//   y    -> {y, r}
//   r    -> {G, g, r}
//
// A transition is legal iff every position satisfies the rule. The
// identity transition is always legal; strings of unequal length never
// are. The rule has no memory beyond the two strings being compared.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of distinct light codes (r, y, g, G).
pub const NUM_LIGHT_CODES: u8 = 4;

/// Error constructing a [`Phase`] from raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseError {
    Empty,
    InvalidLight { ch: char, index: usize },
}

/// A validated phase string.
///
/// Construction checks the alphabet once; everywhere else the bytes can
/// be trusted. Ordering is lexicographic byte order, which is what the
/// transition graph uses for its deterministic node ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Phase(Box<str>);

impl Phase {
    /// Parse and validate a phase string.
    pub fn new(s: &str) -> Result<Phase, PhaseError> {
        if s.is_empty() {
            return Err(PhaseError::Empty);
        }
        for (index, ch) in s.chars().enumerate() {
            if !matches!(ch, 'G' | 'g' | 'y' | 'r') {
                return Err(PhaseError::InvalidLight { ch, index });
            }
        }
        Ok(Phase(s.into()))
    }

    /// The designated absorbing/safe phase: every lane-group red.
    pub fn all_red(len: usize) -> Phase {
        debug_assert!(len > 0);
        Phase("r".repeat(len).into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of controlled lane-groups.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_all_red(&self) -> bool {
        self.0.bytes().all(|b| b == b'r')
    }

    /// Per-lane-group light codes, ordered r < y < g < G.
    ///
    /// Used by the observation builder for the phase-statistics
    /// features (mode / standard deviation).
    pub fn light_codes(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.bytes().map(light_code)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Integer code for a single light character (r=0, y=1, g=2, G=3).
fn light_code(b: u8) -> u8 {
    match b {
        b'r' => 0,
        b'y' => 1,
        b'g' => 2,
        _ => 3,
    }
}

/// Legal successor characters for one light character.
fn successors(b: u8) -> &'static [u8] {
    match b {
        b'G' | b'g' => b"Ggy",
        b'y' => b"yr",
        b'r' => b"Ggr",
        _ => &[],
    }
}

/// Is `next` a legal successor phase of `state`?
///
/// Equal phases are always legal. Unequal lengths never are. Otherwise
/// every character position must individually satisfy the successor
/// table above.
pub fn legal(state: &Phase, next: &Phase) -> bool {
    if state == next {
        return true;
    }
    if state.len() != next.len() {
        return false;
    }
    state
        .as_str()
        .bytes()
        .zip(next.as_str().bytes())
        .all(|(a, b)| successors(a).contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Phase {
        Phase::new(s).unwrap()
    }

    #[test]
    fn identity_is_always_legal() {
        for s in ["GGrr", "yyrr", "rryy", "rrrr", "g", "Gy"] {
            assert!(legal(&p(s), &p(s)), "identity must be legal for {s}");
        }
    }

    #[test]
    fn legality_is_not_symmetric() {
        assert!(legal(&p("rr"), &p("GG")));
        assert!(!legal(&p("GG"), &p("rr")));
    }

    #[test]
    fn unequal_lengths_are_illegal() {
        assert!(!legal(&p("rr"), &p("rrr")));
        assert!(!legal(&p("GGrr"), &p("GGr")));
    }

    #[test]
    fn per_character_rule_composes_with_and() {
        // One bad position poisons the whole transition.
        assert!(legal(&p("GGrr"), &p("yyrr")));
        assert!(!legal(&p("GGrr"), &p("yyry")));
    }

    #[test]
    fn green_cannot_jump_to_red() {
        assert!(!legal(&p("G"), &p("r")));
        assert!(legal(&p("G"), &p("y")));
        assert!(legal(&p("y"), &p("r")));
    }

    #[test]
    fn construction_rejects_bad_alphabet() {
        assert_eq!(Phase::new(""), Err(PhaseError::Empty));
        assert_eq!(
            Phase::new("GxRr"),
            Err(PhaseError::InvalidLight { ch: 'x', index: 1 })
        );
    }

    #[test]
    fn all_red_is_all_red() {
        let ar = Phase::all_red(4);
        assert_eq!(ar.as_str(), "rrrr");
        assert!(ar.is_all_red());
        assert!(!p("rGrr").is_all_red());
    }

    #[test]
    fn light_codes_are_ordered() {
        let codes: Vec<u8> = p("ryGg").light_codes().collect();
        assert_eq!(codes, vec![0, 1, 3, 2]);
    }
}
