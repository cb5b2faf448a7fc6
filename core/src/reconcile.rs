//! Bulk-edit reconciliation: diff a user-edited snapshot of the ledger
//! against the stored original and plan the deletes, updates, and inserts
//! needed to make the store match the edit.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Entry;

/// One row of the editable ledger snapshot.
///
/// The variety is referenced by name (the human key); it is resolved to a
/// catalog id when the plan is applied. `id == 0` marks a row with no stored
/// counterpart yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub id: i64,
    pub date: NaiveDate,
    pub cups: i64,
    pub variety: String,
}

impl From<&Entry> for SnapshotRow {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id,
            date: entry.date,
            cups: entry.cups,
            variety: entry.variety.clone(),
        }
    }
}

/// Planned changes, in apply order: deletes, then updates, then inserts.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub remove: Vec<i64>,
    pub update: Vec<SnapshotRow>,
    pub insert: Vec<SnapshotRow>,
    pub unchanged: usize,
}

/// Compute the reconciliation plan for an edited snapshot.
///
/// - ids present in `original` but not in `edited` are removed;
/// - ids present in both are updated only if any field differs;
/// - rows in `edited` with an id of 0 or an id unknown to `original` are
///   new entries to insert (their snapshot id is not reused).
#[must_use]
pub fn diff(original: &[SnapshotRow], edited: &[SnapshotRow]) -> ReconcilePlan {
    let stored: BTreeMap<i64, &SnapshotRow> =
        original.iter().map(|row| (row.id, row)).collect();

    let mut plan = ReconcilePlan::default();
    let mut kept: Vec<i64> = Vec::new();

    for row in edited {
        match stored.get(&row.id) {
            Some(orig) if row.id > 0 => {
                kept.push(row.id);
                if *orig == row {
                    plan.unchanged += 1;
                } else {
                    plan.update.push(row.clone());
                }
            }
            _ => plan.insert.push(row.clone()),
        }
    }

    plan.remove = stored
        .keys()
        .copied()
        .filter(|id| !kept.contains(id))
        .collect();

    plan
}
