//! Resolved perk flags.
//!
//! How perks are earned is decided outside the core; the engine only applies
//! them. The neutral value changes nothing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Perks {
    /// Multiplier on every experience award from quest checks.
    pub exp_multiplier: f64,
    /// Multiplier on the daily clear bonus.
    pub daily_clear_bonus: f64,
    /// Tokens added to the weekly allowance.
    pub extra_weekly_tokens: u32,
    /// Multiplier on the weekly challenge experience.
    pub weekly_reward_bonus: f64,
    /// Crates added to the weekly challenge reward.
    pub weekly_extra_crates: u32,
    /// Multiplier on the boss experience.
    pub boss_reward_bonus: f64,
}

impl Default for Perks {
    fn default() -> Self {
        Self {
            exp_multiplier: 1.0,
            daily_clear_bonus: 1.0,
            extra_weekly_tokens: 0,
            weekly_reward_bonus: 1.0,
            weekly_extra_crates: 0,
            boss_reward_bonus: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_neutral_defaults() {
        let perks: Perks = toml::from_str("extra_weekly_tokens = 1").unwrap();
        assert_eq!(perks.extra_weekly_tokens, 1);
        assert_eq!(perks.exp_multiplier, 1.0);
        assert_eq!(perks.weekly_extra_crates, 0);
    }
}
