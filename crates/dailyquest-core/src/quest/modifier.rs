//! Deterministic daily modifiers.

use serde::{Deserialize, Serialize};

use crate::keyhash::KeyHasher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DailyModifier {
    BossDay,
    LowMana,
    Discipline,
    Shadow,
    Normal,
}

impl DailyModifier {
    /// Modifier for a date; fixed for the key, independent of when it is asked.
    pub fn for_date(date: &str, hasher: &dyn KeyHasher) -> Self {
        match hasher.hash_key(&format!("mod:{date}")) % 100 {
            0..=14 => DailyModifier::BossDay,
            15..=29 => DailyModifier::LowMana,
            30..=44 => DailyModifier::Discipline,
            45..=59 => DailyModifier::Shadow,
            _ => DailyModifier::Normal,
        }
    }

    /// Multiplier applied to quest-check experience on that day.
    pub fn exp_multiplier(&self) -> f64 {
        match self {
            DailyModifier::BossDay => 1.15,
            DailyModifier::LowMana => 0.9,
            DailyModifier::Discipline => 1.05,
            DailyModifier::Shadow => 1.1,
            DailyModifier::Normal => 1.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DailyModifier::BossDay => "Boss Day",
            DailyModifier::LowMana => "Low Mana Day",
            DailyModifier::Discipline => "Discipline Day",
            DailyModifier::Shadow => "Shadow Day",
            DailyModifier::Normal => "Normal Day",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyhash::Fnv1a;

    struct Constant(u32);

    impl KeyHasher for Constant {
        fn hash_key(&self, _key: &str) -> u32 {
            self.0
        }
    }

    #[test]
    fn bands_map_to_modifiers() {
        assert_eq!(DailyModifier::for_date("x", &Constant(3)), DailyModifier::BossDay);
        assert_eq!(DailyModifier::for_date("x", &Constant(120)), DailyModifier::LowMana);
        assert_eq!(DailyModifier::for_date("x", &Constant(44)), DailyModifier::Discipline);
        assert_eq!(DailyModifier::for_date("x", &Constant(59)), DailyModifier::Shadow);
        assert_eq!(DailyModifier::for_date("x", &Constant(99)), DailyModifier::Normal);
    }

    #[test]
    fn same_date_same_modifier() {
        let h = Fnv1a::default();
        assert_eq!(
            DailyModifier::for_date("2026-03-01", &h),
            DailyModifier::for_date("2026-03-01", &h)
        );
    }
}
