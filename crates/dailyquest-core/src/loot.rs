//! Crates, badges and rarity-weighted draws.

use chrono::{DateTime, Utc};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::ProgressError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub const ALL: [Rarity; 4] = [Rarity::Common, Rarity::Rare, Rarity::Epic, Rarity::Legendary];

    /// Fixed name pool for the tier.
    pub fn badge_pool(&self) -> &'static [&'static str] {
        match self {
            Rarity::Common => &["Rookie", "Early Riser", "Step Counter", "Clean Plate", "Night Owl"],
            Rarity::Rare => &["Iron Will", "Night Shift", "Dungeon Clear", "Tidy Hunter"],
            Rarity::Epic => &["Streak Master", "Gate Breaker", "Abyss Walker"],
            Rarity::Legendary => &["Shadow Monarch", "System Architect"],
        }
    }
}

/// Relative draw weights per tier. Negative weights count as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RarityWeights {
    pub common: f64,
    pub rare: f64,
    pub epic: f64,
    pub legendary: f64,
}

impl RarityWeights {
    /// Crate openings.
    pub const BASELINE: RarityWeights = RarityWeights {
        common: 70.0,
        rare: 22.0,
        epic: 7.0,
        legendary: 1.0,
    };

    /// Penalty resolution.
    pub const PENALTY: RarityWeights = RarityWeights {
        common: 55.0,
        rare: 30.0,
        epic: 12.0,
        legendary: 3.0,
    };

    /// Boss defeat, boosted odds.
    pub const BOSS: RarityWeights = RarityWeights {
        common: 35.0,
        rare: 35.0,
        epic: 22.0,
        legendary: 8.0,
    };

    pub fn weight(&self, rarity: Rarity) -> f64 {
        let w = match rarity {
            Rarity::Common => self.common,
            Rarity::Rare => self.rare,
            Rarity::Epic => self.epic,
            Rarity::Legendary => self.legendary,
        };
        if w.is_finite() && w > 0.0 {
            w
        } else {
            0.0
        }
    }
}

/// Weighted pick over the four tiers; all-zero weights fall back to Common.
pub fn draw_rarity(weights: &RarityWeights, rng: &mut dyn RngCore) -> Rarity {
    let mut tiers = Rarity::ALL.map(|r| (r, weights.weight(r)));
    let mut total: f64 = tiers.iter().map(|(_, w)| w).sum();
    if !total.is_finite() {
        // Huge finite weights can still overflow the sum; rescale to the largest.
        let max = tiers.iter().map(|(_, w)| *w).fold(0.0, f64::max);
        for (_, w) in tiers.iter_mut() {
            *w /= max;
        }
        total = tiers.iter().map(|(_, w)| w).sum();
    }
    if total <= 0.0 {
        return Rarity::Common;
    }
    let roll = rng.gen_range(0.0..total);
    let mut acc = 0.0;
    for (rarity, weight) in tiers {
        acc += weight;
        if roll < acc {
            return rarity;
        }
    }
    // Float rounding can leave roll == total; give it to the last non-zero tier.
    tiers
        .into_iter()
        .rev()
        .find(|(_, w)| *w > 0.0)
        .map_or(Rarity::Common, |(r, _)| r)
}

/// Uniform pick from the tier's name pool.
pub fn draw_badge_name(rarity: Rarity, rng: &mut dyn RngCore) -> &'static str {
    let pool = rarity.badge_pool();
    pool[rng.gen_range(0..pool.len())]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub name: String,
    pub rarity: Rarity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantOutcome {
    Granted,
    Duplicate,
}

/// One resolved loot draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootDraw {
    pub rarity: Rarity,
    pub name: String,
    pub outcome: GrantOutcome,
}

impl LootDraw {
    pub fn is_duplicate(&self) -> bool {
        self.outcome == GrantOutcome::Duplicate
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Inventory {
    pub badges: Vec<Badge>,
    pub crates: u32,
    pub crates_opened: u32,
    pub last_free_crate_at: Option<DateTime<Utc>>,
    pub titles: Vec<String>,
    pub equipped_title: Option<String>,
}

impl Inventory {
    pub fn has_badge(&self, name: &str) -> bool {
        self.badges.iter().any(|b| b.name == name)
    }

    /// Add a badge unless one with the same name is already owned.
    pub fn grant_badge(&mut self, name: &str, rarity: Rarity) -> GrantOutcome {
        if self.has_badge(name) {
            return GrantOutcome::Duplicate;
        }
        self.badges.push(Badge {
            name: name.to_string(),
            rarity,
        });
        GrantOutcome::Granted
    }

    /// Draw a rarity and a name, then try to grant it.
    pub fn roll(&mut self, weights: &RarityWeights, rng: &mut dyn RngCore) -> LootDraw {
        let rarity = draw_rarity(weights, rng);
        let name = draw_badge_name(rarity, rng);
        let outcome = self.grant_badge(name, rarity);
        LootDraw {
            rarity,
            name: name.to_string(),
            outcome,
        }
    }

    /// Consume one crate and roll the baseline table.
    pub fn open_crate(&mut self, rng: &mut dyn RngCore) -> Result<LootDraw, ProgressError> {
        if self.crates == 0 {
            return Err(ProgressError::NoCratesAvailable);
        }
        self.crates -= 1;
        self.crates_opened += 1;
        Ok(self.roll(&RarityWeights::BASELINE, rng))
    }

    /// Returns true when the title was new.
    pub fn unlock_title(&mut self, title: &str) -> bool {
        if self.titles.iter().any(|t| t == title) {
            return false;
        }
        self.titles.push(title.to_string());
        true
    }

    pub fn equip_title(&mut self, title: &str) -> Result<(), ProgressError> {
        if !self.titles.iter().any(|t| t == title) {
            return Err(ProgressError::UnknownTitle(title.to_string()));
        }
        self.equipped_title = Some(title.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Mcg128Xsl64;

    fn only(rarity: Rarity) -> RarityWeights {
        let mut w = RarityWeights {
            common: 0.0,
            rare: 0.0,
            epic: 0.0,
            legendary: 0.0,
        };
        match rarity {
            Rarity::Common => w.common = 1.0,
            Rarity::Rare => w.rare = 1.0,
            Rarity::Epic => w.epic = 1.0,
            Rarity::Legendary => w.legendary = 1.0,
        }
        w
    }

    #[test]
    fn zero_weights_default_to_common() {
        let mut rng = Mcg128Xsl64::seed_from_u64(1);
        let zero = RarityWeights {
            common: 0.0,
            rare: -3.0,
            epic: 0.0,
            legendary: f64::NAN,
        };
        assert_eq!(draw_rarity(&zero, &mut rng), Rarity::Common);
    }

    #[test]
    fn overflowing_weights_still_draw() {
        let mut rng = Mcg128Xsl64::seed_from_u64(3);
        let huge = RarityWeights {
            common: f64::MAX,
            rare: f64::MAX,
            epic: 0.0,
            legendary: 0.0,
        };
        for _ in 0..50 {
            let rarity = draw_rarity(&huge, &mut rng);
            assert!(matches!(rarity, Rarity::Common | Rarity::Rare));
        }
    }

    #[test]
    fn single_tier_always_wins() {
        let mut rng = Mcg128Xsl64::seed_from_u64(7);
        for rarity in Rarity::ALL {
            for _ in 0..20 {
                assert_eq!(draw_rarity(&only(rarity), &mut rng), rarity);
            }
        }
    }

    #[test]
    fn baseline_distribution_favours_common() {
        let mut rng = Mcg128Xsl64::seed_from_u64(42);
        let commons = (0..2_000)
            .filter(|_| draw_rarity(&RarityWeights::BASELINE, &mut rng) == Rarity::Common)
            .count();
        assert!(commons > 1_200 && commons < 1_600, "commons = {commons}");
    }

    #[test]
    fn duplicate_grant_is_reported() {
        let mut inv = Inventory::default();
        assert_eq!(inv.grant_badge("Iron Will", Rarity::Rare), GrantOutcome::Granted);
        assert_eq!(inv.grant_badge("Iron Will", Rarity::Epic), GrantOutcome::Duplicate);
        assert_eq!(inv.badges.len(), 1);
        assert_eq!(inv.badges[0].rarity, Rarity::Rare);
    }

    #[test]
    fn open_crate_without_crates_fails_cleanly() {
        let mut rng = Mcg128Xsl64::seed_from_u64(3);
        let mut inv = Inventory::default();
        let before = inv.clone();
        assert_eq!(inv.open_crate(&mut rng), Err(ProgressError::NoCratesAvailable));
        assert_eq!(inv, before);
    }

    #[test]
    fn open_crate_consumes_one() {
        let mut rng = Mcg128Xsl64::seed_from_u64(3);
        let mut inv = Inventory {
            crates: 2,
            ..Default::default()
        };
        let draw = inv.open_crate(&mut rng).unwrap();
        assert_eq!(inv.crates, 1);
        assert_eq!(inv.crates_opened, 1);
        assert!(draw.rarity.badge_pool().contains(&draw.name.as_str()));
        assert!(inv.has_badge(&draw.name));
    }

    #[test]
    fn titles_must_be_owned_to_equip() {
        let mut inv = Inventory::default();
        assert!(inv.equip_title("Boss Slayer").is_err());
        assert!(inv.unlock_title("Boss Slayer"));
        assert!(!inv.unlock_title("Boss Slayer"));
        inv.equip_title("Boss Slayer").unwrap();
        assert_eq!(inv.equipped_title.as_deref(), Some("Boss Slayer"));
    }

    proptest! {
        #[test]
        fn badge_names_stay_unique(seed in any::<u64>(), draws in 1usize..60) {
            let mut rng = Mcg128Xsl64::seed_from_u64(seed);
            let mut inv = Inventory::default();
            for _ in 0..draws {
                inv.roll(&RarityWeights::BOSS, &mut rng);
            }
            let mut names: Vec<_> = inv.badges.iter().map(|b| b.name.clone()).collect();
            names.sort();
            names.dedup();
            prop_assert_eq!(names.len(), inv.badges.len());
        }
    }
}
