//! Experience, levels and stat points.
//!
//! Experience is always kept settled: any surplus over the current level's
//! threshold is converted into levels before the call returns, so a stored
//! `ProgressionState` never holds `experience >= threshold(level)`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProgressError;

/// Character stats that can receive points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stat {
    Str,
    End,
    Rec,
    Disc,
}

impl Stat {
    pub const ALL: [Stat; 4] = [Stat::Str, Stat::End, Stat::Rec, Stat::Disc];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stat::Str => "STR",
            Stat::End => "END",
            Stat::Rec => "REC",
            Stat::Disc => "DISC",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STR" => Ok(Stat::Str),
            "END" => Ok(Stat::End),
            "REC" => Ok(Stat::Rec),
            "DISC" => Ok(Stat::Disc),
            other => Err(format!("unknown stat: {other}")),
        }
    }
}

/// Level curve: `base + (level - 1) * step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCurve {
    pub base: u64,
    pub step: u64,
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self { base: 120, step: 40 }
    }
}

impl LevelCurve {
    /// Experience needed to go from `level` to `level + 1`. Never zero.
    pub fn exp_required_for_next(&self, level: u32) -> u64 {
        let level = u64::from(level.max(1));
        self.base
            .saturating_add((level - 1).saturating_mul(self.step))
            .max(1)
    }
}

/// Rank letter shown next to the level.
pub fn rank(level: u32) -> &'static str {
    match level {
        0..=10 => "E",
        11..=20 => "D",
        21..=30 => "C",
        31..=40 => "B",
        41..=50 => "A",
        _ => "S",
    }
}

/// Result of a single experience award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpAward {
    pub gained: u64,
    pub levels_gained: u32,
    pub level: u32,
}

impl ExpAward {
    pub fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionState {
    pub level: u32,
    pub experience: u64,
    pub stat_points: u32,
    pub stats: BTreeMap<Stat, u32>,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0,
            stat_points: 0,
            stats: Stat::ALL.iter().map(|s| (*s, 0)).collect(),
        }
    }
}

impl ProgressionState {
    pub fn stat(&self, stat: Stat) -> u32 {
        self.stats.get(&stat).copied().unwrap_or(0)
    }

    /// Multiplier a stat contributes to experience tagged with it (+1% per point).
    pub fn affinity(&self, stat: Stat) -> f64 {
        1.0 + f64::from(self.stat(stat)) * 0.01
    }

    /// Add `amount × multiplier` experience (floored) and settle levels.
    ///
    /// Negative, NaN or infinite inputs award nothing.
    pub fn award_experience(&mut self, amount: f64, multiplier: f64, curve: &LevelCurve) -> ExpAward {
        let scaled = amount * multiplier;
        let gained = if scaled.is_finite() && scaled > 0.0 {
            scaled.floor() as u64
        } else {
            0
        };
        self.experience = self.experience.saturating_add(gained);
        let levels_gained = self.settle(curve);
        ExpAward {
            gained,
            levels_gained,
            level: self.level,
        }
    }

    /// Convert any surplus experience into levels. Returns levels gained.
    pub fn settle(&mut self, curve: &LevelCurve) -> u32 {
        self.level = self.level.max(1);
        let mut gained = 0;
        loop {
            let need = curve.exp_required_for_next(self.level);
            if self.experience < need {
                break;
            }
            self.experience -= need;
            self.level += 1;
            self.stat_points += 1;
            gained += 1;
        }
        gained
    }

    pub fn spend_stat_point(&mut self, stat: Stat) -> Result<u32, ProgressError> {
        if self.stat_points == 0 {
            return Err(ProgressError::InsufficientPoints);
        }
        self.stat_points -= 1;
        let value = self.stats.entry(stat).or_insert(0);
        *value += 1;
        Ok(*value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn level_up_carries_surplus() {
        let curve = LevelCurve::default();
        let mut p = ProgressionState {
            experience: 90,
            ..Default::default()
        };
        let award = p.award_experience(50.0, 1.0, &curve);
        assert_eq!(award.gained, 50);
        assert!(award.leveled_up());
        assert_eq!(p.level, 2);
        assert_eq!(p.experience, 20);
        assert_eq!(p.stat_points, 1);
    }

    #[test]
    fn large_award_crosses_several_levels() {
        let curve = LevelCurve::default();
        let mut p = ProgressionState::default();
        // 120 + 160 + 200 = 480 reaches level 4 exactly.
        let award = p.award_experience(480.0, 1.0, &curve);
        assert_eq!(award.levels_gained, 3);
        assert_eq!(p.level, 4);
        assert_eq!(p.experience, 0);
        assert_eq!(p.stat_points, 3);
    }

    #[test]
    fn invalid_amounts_award_nothing() {
        let curve = LevelCurve::default();
        let mut p = ProgressionState::default();
        for amount in [-10.0, f64::NAN, f64::INFINITY] {
            let award = p.award_experience(amount, 1.0, &curve);
            assert_eq!(award.gained, 0);
        }
        assert_eq!(p.experience, 0);
    }

    #[test]
    fn multiplier_is_floored() {
        let curve = LevelCurve::default();
        let mut p = ProgressionState::default();
        let award = p.award_experience(10.0, 1.15, &curve);
        assert_eq!(award.gained, 11);
    }

    #[test]
    fn spend_requires_points() {
        let mut p = ProgressionState::default();
        assert_eq!(
            p.spend_stat_point(Stat::Str),
            Err(ProgressError::InsufficientPoints)
        );
        p.stat_points = 1;
        assert_eq!(p.spend_stat_point(Stat::Str), Ok(1));
        assert_eq!(p.stat_points, 0);
        assert_eq!(p.stat(Stat::Str), 1);
    }

    #[test]
    fn ranks_by_level_band() {
        assert_eq!(rank(1), "E");
        assert_eq!(rank(11), "D");
        assert_eq!(rank(30), "C");
        assert_eq!(rank(40), "B");
        assert_eq!(rank(50), "A");
        assert_eq!(rank(51), "S");
    }

    #[test]
    fn stat_parses_case_insensitively() {
        assert_eq!("disc".parse::<Stat>(), Ok(Stat::Disc));
        assert!("luck".parse::<Stat>().is_err());
    }

    proptest! {
        #[test]
        fn threshold_positive_and_non_decreasing(level in 1u32..10_000) {
            let curve = LevelCurve::default();
            let here = curve.exp_required_for_next(level);
            prop_assert!(here > 0);
            prop_assert!(curve.exp_required_for_next(level + 1) >= here);
        }

        #[test]
        fn experience_always_settled(start in 0u64..500, awards in proptest::collection::vec(0.0f64..2_000.0, 1..20)) {
            let curve = LevelCurve::default();
            let mut p = ProgressionState { experience: start, ..Default::default() };
            p.settle(&curve);
            for amount in awards {
                p.award_experience(amount, 1.0, &curve);
                prop_assert!(p.experience < curve.exp_required_for_next(p.level));
            }
        }
    }
}
