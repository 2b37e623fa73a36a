//! Reputation tiers derived from accumulated experience.
//!
//! One ladder is shared by the server ledger and the client session store.
//! A tier is the highest entry whose threshold does not exceed the current XP.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered reputation tiers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Reputation {
    #[default]
    #[serde(rename = "스타터")]
    Starter,
    #[serde(rename = "루키")]
    Rookie,
    #[serde(rename = "미들")]
    Middle,
    #[serde(rename = "리더")]
    Leader,
    #[serde(rename = "프로")]
    Pro,
    #[serde(rename = "마스터")]
    Master,
}

/// Experience threshold for each tier, ascending.
pub const TIER_LADDER: [(u64, Reputation); 6] = [
    (0, Reputation::Starter),
    (50, Reputation::Rookie),
    (250, Reputation::Middle),
    (500, Reputation::Leader),
    (1000, Reputation::Pro),
    (2500, Reputation::Master),
];

impl Reputation {
    /// Tier for the given experience total.
    pub fn for_xp(xp: u64) -> Self {
        TIER_LADDER
            .iter()
            .rev()
            .find(|(threshold, _)| xp >= *threshold)
            .map(|(_, tier)| *tier)
            .unwrap_or_default()
    }

    /// Korean display label, also used on the wire.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Starter => "스타터",
            Self::Rookie => "루키",
            Self::Middle => "미들",
            Self::Leader => "리더",
            Self::Pro => "프로",
            Self::Master => "마스터",
        }
    }

    /// XP needed to enter this tier.
    pub fn threshold(&self) -> u64 {
        TIER_LADDER
            .iter()
            .find(|(_, tier)| tier == self)
            .map(|(threshold, _)| *threshold)
            .unwrap_or(0)
    }

    /// The next tier up and its threshold, if any.
    pub fn next(&self) -> Option<(u64, Reputation)> {
        TIER_LADDER.iter().copied().find(|(_, tier)| tier > self)
    }
}

impl fmt::Display for Reputation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Reputation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TIER_LADDER
            .iter()
            .map(|(_, tier)| *tier)
            .find(|tier| tier.label() == s)
            .ok_or_else(|| format!("unknown reputation tier: {}", s))
    }
}

/// Result of re-deriving a tier after an experience change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierChange {
    pub before: Reputation,
    pub after: Reputation,
}

impl TierChange {
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

/// Recompute the tier for `xp`, reporting whether it moved away from `current`.
pub fn reassess(current: Reputation, xp: u64) -> TierChange {
    TierChange {
        before: current,
        after: Reputation::for_xp(xp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_lowest_tier() {
        assert_eq!(Reputation::for_xp(0), Reputation::Starter);
        assert_eq!(Reputation::for_xp(0), TIER_LADDER[0].1);
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(Reputation::for_xp(49), Reputation::Starter);
        assert_eq!(Reputation::for_xp(50), Reputation::Rookie);
        assert_eq!(Reputation::for_xp(249), Reputation::Rookie);
        assert_eq!(Reputation::for_xp(250), Reputation::Middle);
        assert_eq!(Reputation::for_xp(500), Reputation::Leader);
        assert_eq!(Reputation::for_xp(1000), Reputation::Pro);
        assert_eq!(Reputation::for_xp(2500), Reputation::Master);
        assert_eq!(Reputation::for_xp(u64::MAX), Reputation::Master);
    }

    #[test]
    fn test_monotonic_over_range() {
        let mut previous = Reputation::for_xp(0);
        for xp in 0..3000 {
            let tier = Reputation::for_xp(xp);
            assert!(tier >= previous, "tier dropped at xp={}", xp);
            previous = tier;
        }
    }

    #[test]
    fn test_ladder_is_sorted() {
        for pair in TIER_LADDER.windows(2) {
            assert!(pair[0].0 < pair[1].0);
            assert!(pair[0].1 < pair[1].1);
        }
    }

    #[test]
    fn test_reassess_reports_change() {
        let change = reassess(Reputation::Starter, 50);
        assert!(change.changed());
        assert_eq!(change.after, Reputation::Rookie);

        let same = reassess(Reputation::Rookie, 60);
        assert!(!same.changed());
    }

    #[test]
    fn test_label_roundtrip() {
        for (_, tier) in TIER_LADDER {
            assert_eq!(tier.label().parse::<Reputation>().unwrap(), tier);
            assert_eq!(tier.threshold(), Reputation::for_xp(tier.threshold()).threshold());
        }
        assert!("없음".parse::<Reputation>().is_err());
    }

    #[test]
    fn test_serializes_as_label() {
        let json = serde_json::to_string(&Reputation::Middle).unwrap();
        assert_eq!(json, "\"미들\"");
        let back: Reputation = serde_json::from_str("\"마스터\"").unwrap();
        assert_eq!(back, Reputation::Master);
    }

    #[test]
    fn test_next_tier() {
        assert_eq!(Reputation::Starter.next(), Some((50, Reputation::Rookie)));
        assert_eq!(Reputation::Master.next(), None);
    }
}
