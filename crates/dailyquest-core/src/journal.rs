//! Per-day records and the manual-edit audit trail.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-text numeric inputs on a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Steps,
    SleepHours,
    WeightKg,
}

impl std::str::FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "steps" => Ok(Metric::Steps),
            "sleep" | "sleep_hours" => Ok(Metric::SleepHours),
            "weight" | "weight_kg" => Ok(Metric::WeightKg),
            other => Err(format!("unknown metric: {other}")),
        }
    }
}

/// One calendar day of logged activity. Created lazily on first touch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayRecord {
    pub closed: bool,
    pub checks: BTreeMap<String, bool>,
    pub steps: Option<String>,
    pub sleep_hours: Option<String>,
    pub weight_kg: Option<String>,
    pub manual_edited: bool,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Lenient numeric read of a text field: blank or garbage counts as zero.
pub fn parse_metric(raw: Option<&str>) -> f64 {
    raw.map(|s| s.trim().replace(',', "."))
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn has_text(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

impl DayRecord {
    pub fn is_checked(&self, quest_id: &str) -> bool {
        self.checks.get(quest_id).copied().unwrap_or(false)
    }

    pub fn metric(&self, metric: Metric) -> Option<&str> {
        match metric {
            Metric::Steps => self.steps.as_deref(),
            Metric::SleepHours => self.sleep_hours.as_deref(),
            Metric::WeightKg => self.weight_kg.as_deref(),
        }
    }

    pub fn set_metric(&mut self, metric: Metric, value: Option<String>) {
        let value = value.filter(|v| !v.trim().is_empty());
        match metric {
            Metric::Steps => self.steps = value,
            Metric::SleepHours => self.sleep_hours = value,
            Metric::WeightKg => self.weight_kg = value,
        }
    }

    /// Add `amount` to a metric, keeping one decimal for fractional fields.
    pub fn quick_add(&mut self, metric: Metric, amount: f64) {
        let current = parse_metric(self.metric(metric));
        let next = current + amount;
        let text = match metric {
            Metric::Steps => format!("{}", next.round().max(0.0) as u64),
            Metric::SleepHours | Metric::WeightKg => {
                let rounded = (next * 10.0).round() / 10.0;
                format!("{rounded}")
            }
        };
        self.set_metric(metric, Some(text));
    }

    pub fn steps(&self) -> f64 {
        parse_metric(self.steps.as_deref())
    }

    pub fn sleep_hours(&self) -> f64 {
        parse_metric(self.sleep_hours.as_deref())
    }

    /// Anything logged at all: a close, a metric, or a checked quest.
    pub fn has_activity(&self) -> bool {
        self.closed
            || has_text(&self.steps)
            || has_text(&self.sleep_hours)
            || has_text(&self.weight_kg)
            || self.checks.values().any(|checked| *checked)
    }
}

/// Audit entry written when a closed day is reopened under anti-cheat mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualEdit {
    pub id: String,
    pub date: String,
    pub at: DateTime<Utc>,
    pub reason: String,
}

impl ManualEdit {
    pub fn new(date: &str, at: DateTime<Utc>, reason: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date: date.to_string(),
            at,
            reason: reason.trim().to_string(),
        }
    }
}
