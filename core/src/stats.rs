//! Aggregation over the joined ledger view.
//!
//! Every function here is pure and stateless: callers pass a freshly read
//! slice of [`Entry`] values, so derived caffeine totals always reflect the
//! current catalog (retroactive caffeine edits change historical views).

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::Entry;

/// Daily caffeine above this is worth a heads-up.
pub const WARNING_DAILY_MG: i64 = 300;
/// Recommended daily maximum; anything above is flagged.
pub const DANGER_DAILY_MG: i64 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaffeineLevel {
    Normal,
    Warning,
    Danger,
}

impl CaffeineLevel {
    /// Comparisons are strict: exactly 300 or 400 mg is not flagged.
    #[must_use]
    pub const fn for_daily_mg(mg: i64) -> Self {
        if mg > DANGER_DAILY_MG {
            Self::Danger
        } else if mg > WARNING_DAILY_MG {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub cups: i64,
    pub caffeine_mg: i64,
}

/// Sum cups and caffeine over entries whose date satisfies the predicate.
pub fn totals_where<F>(entries: &[Entry], pred: F) -> Totals
where
    F: Fn(NaiveDate) -> bool,
{
    let mut totals = Totals::default();
    for entry in entries.iter().filter(|e| pred(e.date)) {
        totals.cups += entry.cups;
        totals.caffeine_mg += entry.total_caffeine();
    }
    totals
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub cups: i64,
    pub caffeine_mg: i64,
}

/// Per-date totals ordered by date, one row per distinct date present.
/// Dates with no entries are absent, not zero.
#[must_use]
pub fn daily_series(entries: &[Entry]) -> Vec<DailyTotal> {
    let mut days: BTreeMap<NaiveDate, Totals> = BTreeMap::new();
    for entry in entries {
        let totals = days.entry(entry.date).or_default();
        totals.cups += entry.cups;
        totals.caffeine_mg += entry.total_caffeine();
    }
    days.into_iter()
        .map(|(date, totals)| DailyTotal {
            date,
            cups: totals.cups,
            caffeine_mg: totals.caffeine_mg,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VarietyTotal {
    pub variety: String,
    pub cups: i64,
    pub caffeine_mg: i64,
    pub caffeine_per_cup: i64,
}

/// Per-variety totals sorted by caffeine descending (name breaks ties).
#[must_use]
pub fn by_variety(entries: &[Entry]) -> Vec<VarietyTotal> {
    let mut varieties: BTreeMap<String, VarietyTotal> = BTreeMap::new();
    for entry in entries {
        let total = varieties
            .entry(entry.variety.clone())
            .or_insert_with(|| VarietyTotal {
                variety: entry.variety.clone(),
                cups: 0,
                caffeine_mg: 0,
                caffeine_per_cup: entry.caffeine_mg,
            });
        total.cups += entry.cups;
        total.caffeine_mg += entry.total_caffeine();
    }
    let mut sorted: Vec<VarietyTotal> = varieties.into_values().collect();
    sorted.sort_by(|a, b| {
        b.caffeine_mg
            .cmp(&a.caffeine_mg)
            .then_with(|| a.variety.cmp(&b.variety))
    });
    sorted
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCaffeineStats {
    pub average_mg: f64,
    pub max_mg: i64,
    /// Days strictly over [`DANGER_DAILY_MG`].
    pub high_days: usize,
}

/// Average and maximum daily caffeine over distinct dates with at least one
/// entry; days with no entries are excluded, not treated as zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn daily_caffeine_stats(entries: &[Entry]) -> Option<DailyCaffeineStats> {
    let series = daily_series(entries);
    if series.is_empty() {
        return None;
    }
    let total: i64 = series.iter().map(|d| d.caffeine_mg).sum();
    let max_mg = series.iter().map(|d| d.caffeine_mg).max().unwrap_or(0);
    let high_days = series
        .iter()
        .filter(|d| d.caffeine_mg > DANGER_DAILY_MG)
        .count();
    Some(DailyCaffeineStats {
        average_mg: total as f64 / series.len() as f64,
        max_mg,
        high_days,
    })
}

/// Entries dated on or after `cutoff`.
#[must_use]
pub fn entries_since(entries: &[Entry], cutoff: NaiveDate) -> Vec<Entry> {
    entries
        .iter()
        .filter(|e| e.date >= cutoff)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, date: &str, cups: i64, variety: &str, caffeine_mg: i64) -> Entry {
        Entry {
            id,
            date: date.parse().unwrap(),
            cups,
            variety_id: 1,
            created_at: String::new(),
            variety: variety.to_string(),
            caffeine_mg,
        }
    }

    #[test]
    fn test_caffeine_level_thresholds() {
        assert_eq!(CaffeineLevel::for_daily_mg(0), CaffeineLevel::Normal);
        assert_eq!(CaffeineLevel::for_daily_mg(300), CaffeineLevel::Normal);
        assert_eq!(CaffeineLevel::for_daily_mg(301), CaffeineLevel::Warning);
        assert_eq!(CaffeineLevel::for_daily_mg(400), CaffeineLevel::Warning);
        assert_eq!(CaffeineLevel::for_daily_mg(401), CaffeineLevel::Danger);
    }

    #[test]
    fn test_totals_where() {
        let cutoff: NaiveDate = "2024-06-15".parse().unwrap();
        let entries = vec![
            entry(1, "2024-06-14", 2, "Arabica", 95),
            entry(2, "2024-06-15", 1, "Arabica", 95),
            entry(3, "2024-06-16", 3, "Robusta", 150),
        ];
        let totals = totals_where(&entries, |d| d >= cutoff);
        assert_eq!(totals.cups, 4);
        assert_eq!(totals.caffeine_mg, 95 + 450);

        let one_day = totals_where(&entries, |d| d == cutoff);
        assert_eq!(one_day.cups, 1);
        assert_eq!(one_day.caffeine_mg, 95);
    }

    #[test]
    fn test_daily_series_ordered_with_gaps_unfilled() {
        let entries = vec![
            entry(1, "2024-06-16", 1, "Arabica", 100),
            entry(2, "2024-06-14", 2, "Arabica", 100),
            entry(3, "2024-06-14", 1, "Robusta", 150),
        ];
        let series = daily_series(&entries);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, "2024-06-14".parse::<NaiveDate>().unwrap());
        assert_eq!(series[0].cups, 3);
        assert_eq!(series[0].caffeine_mg, 350);
        assert_eq!(series[1].date, "2024-06-16".parse::<NaiveDate>().unwrap());
        assert_eq!(series[1].cups, 1);
    }

    #[test]
    fn test_by_variety_sorted_by_caffeine_desc() {
        let entries = vec![
            entry(1, "2024-06-14", 4, "Decaf", 5),
            entry(2, "2024-06-14", 1, "Robusta", 150),
            entry(3, "2024-06-15", 2, "Arabica", 95),
        ];
        let breakdown = by_variety(&entries);
        assert_eq!(breakdown.len(), 3);
        assert_eq!(breakdown[0].variety, "Arabica");
        assert_eq!(breakdown[0].cups, 2);
        assert_eq!(breakdown[0].caffeine_mg, 190);
        assert_eq!(breakdown[0].caffeine_per_cup, 95);
        assert_eq!(breakdown[1].variety, "Robusta");
        assert_eq!(breakdown[2].variety, "Decaf");
        assert_eq!(breakdown[2].caffeine_mg, 20);
    }

    #[test]
    fn test_daily_caffeine_stats() {
        // day1: 350mg, day2: 450mg → avg 400, max 450, one day over 400
        let entries = vec![
            entry(1, "2024-06-14", 7, "Filter", 50),
            entry(2, "2024-06-15", 3, "Robusta", 150),
        ];
        let stats = daily_caffeine_stats(&entries).unwrap();
        assert!((stats.average_mg - 400.0).abs() < f64::EPSILON);
        assert_eq!(stats.max_mg, 450);
        assert_eq!(stats.high_days, 1);
    }

    #[test]
    fn test_daily_caffeine_stats_excludes_empty_days() {
        // Two dated entries a week apart — the empty days in between must
        // not drag the average down.
        let entries = vec![
            entry(1, "2024-06-01", 2, "Arabica", 100),
            entry(2, "2024-06-08", 2, "Arabica", 100),
        ];
        let stats = daily_caffeine_stats(&entries).unwrap();
        assert!((stats.average_mg - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_daily_caffeine_stats_empty() {
        assert!(daily_caffeine_stats(&[]).is_none());
    }

    #[test]
    fn test_exactly_400_is_not_a_high_day() {
        let entries = vec![entry(1, "2024-06-14", 4, "Robusta", 100)];
        let stats = daily_caffeine_stats(&entries).unwrap();
        assert_eq!(stats.high_days, 0);
    }

    #[test]
    fn test_entries_since() {
        let entries = vec![
            entry(1, "2024-06-10", 1, "Arabica", 95),
            entry(2, "2024-06-15", 1, "Arabica", 95),
        ];
        let cutoff = "2024-06-12".parse().unwrap();
        let recent = entries_since(&entries, cutoff);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, 2);
    }
}
