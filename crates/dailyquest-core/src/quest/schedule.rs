//! External schedule rows.
//!
//! Rows arrive as loosely typed JSON objects exported from a spreadsheet, so
//! every column is looked up through a list of accepted header aliases and
//! every cell is read as text.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::calendar::date_key;

pub const DATE_COLUMNS: &[&str] = &["date", "Date", "Dátum", "Datum"];
pub const WORKOUT_COLUMNS: &[&str] = &[
    "workout",
    "Workout",
    "Edzés javaslat",
    "Edzes javaslat",
    "Edzés",
    "Edzes",
];
pub const SHIFT_COLUMNS: &[&str] = &["shift", "Shift", "Műszak", "Muszak"];

/// Cell values that mean "not today".
const NEGATIVE_TOKENS: &[&str] = &["0", "no", "n", "nem", "-", "false", "off"];

/// Whether a schedule cell asks for the activity.
pub fn truthy_cell(raw: Option<&str>) -> bool {
    match raw.map(|s| s.trim().to_lowercase()) {
        None => false,
        Some(s) if s.is_empty() => false,
        Some(s) => !NEGATIVE_TOKENS.contains(&s.as_str()),
    }
}

/// Shift codes that mean a night shift.
pub fn is_night_shift(shift: &str) -> bool {
    let s = shift.to_lowercase();
    s.contains("éj") || s.contains("ej") || s.contains("night")
}

/// One day of the external schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleRow {
    pub cells: BTreeMap<String, Value>,
}

impl ScheduleRow {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            cells: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                .collect(),
        }
    }

    /// First present, non-null cell among `aliases`, as text.
    pub fn cell(&self, aliases: &[&str]) -> Option<String> {
        aliases.iter().find_map(|key| match self.cells.get(*key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            other => Some(other.to_string()),
        })
    }

    pub fn workout(&self) -> Option<String> {
        self.cell(WORKOUT_COLUMNS)
    }

    pub fn shift(&self) -> Option<String> {
        self.cell(SHIFT_COLUMNS)
    }

    /// Normalized `YYYY-MM-DD` key of this row, if it carries a usable date.
    pub fn date_key(&self) -> Option<String> {
        let raw = self.cell(DATE_COLUMNS)?;
        normalize_date(raw.trim())
    }
}

/// Accepts `2026-01-05`, `2026.01.05.`, `2026/1/5`, `2026 1 5` and
/// spreadsheet serial numbers (days since 1899-12-30).
pub fn normalize_date(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }

    let parts: Vec<&str> = raw
        .split(|c: char| matches!(c, '.' | '-' | '/' | ' '))
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() >= 3 && parts[0].len() == 4 {
        let y = parts[0].parse::<i32>().ok();
        let m = parts[1].parse::<u32>().ok();
        let d = parts[2].parse::<u32>().ok();
        if let (Some(y), Some(m), Some(d)) = (y, m, d) {
            return NaiveDate::from_ymd_opt(y, m, d).map(date_key);
        }
    }

    let serial = raw.parse::<f64>().ok()?;
    if serial > 40_000.0 && serial < 60_000.0 {
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
        return Some(date_key(epoch + Duration::days(serial.floor() as i64)));
    }
    None
}

/// Supplies the schedule row for a date, if any.
pub trait ScheduleProvider {
    fn row(&self, date: &str) -> Option<&ScheduleRow>;
}

/// In-memory schedule indexed by date key.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    rows: BTreeMap<String, ScheduleRow>,
}

impl Schedule {
    /// Index rows by their date; rows without a usable date are dropped.
    pub fn from_rows(rows: impl IntoIterator<Item = ScheduleRow>) -> Self {
        let mut indexed = BTreeMap::new();
        for row in rows {
            match row.date_key() {
                Some(key) => {
                    indexed.insert(key, row);
                }
                None => log::debug!("skipping schedule row without a date"),
            }
        }
        Self { rows: indexed }
    }

    /// Parse a JSON array of row objects. Malformed input yields an empty schedule.
    pub fn from_json_str(json: &str) -> Self {
        match serde_json::from_str::<Vec<ScheduleRow>>(json) {
            Ok(rows) => Self::from_rows(rows),
            Err(e) => {
                log::warn!("ignoring malformed schedule data: {e}");
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl ScheduleProvider for Schedule {
    fn row(&self, date: &str) -> Option<&ScheduleRow> {
        self.rows.get(date)
    }
}
