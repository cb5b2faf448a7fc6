//! CSV import and export.
//!
//! External files reference varieties by name (the human key); imports
//! resolve names against the current catalog, exports carry the name next
//! to the foreign key. Import rows are processed independently: a bad row
//! is recorded and reported, never allowed to abort the rest of the batch.

use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};

use chrono::{Local, NaiveDate};

use crate::db::Database;
use crate::models::{
    Entry, ImportOutcome, NewEntry, NewVariety, RowFailure, StoreError, Variety,
    validate_caffeine_mg, validate_cups, validate_entry_date, validate_variety_name,
};
use crate::reconcile::SnapshotRow;

/// A variety row parsed from an import file (`name,caffeine_mg`).
/// Any `id` column in the input is ignored; ids are assigned fresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarietyRecord {
    pub name: String,
    pub caffeine_mg: i64,
}

/// A consumption row parsed from an import file (`date,cups,variety`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    pub date: NaiveDate,
    pub cups: i64,
    pub variety: String,
}

/// Parse result: usable rows tagged with their 1-based file line, plus the
/// rows that could not be parsed.
#[derive(Debug)]
pub struct ParsedRows<T> {
    pub rows: Vec<(usize, T)>,
    pub failures: Vec<RowFailure>,
}

impl<T> Default for ParsedRows<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            failures: Vec::new(),
        }
    }
}

fn header_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

fn require_column(headers: &csv::StringRecord, name: &str) -> Result<usize, StoreError> {
    header_index(headers, name)
        .ok_or_else(|| StoreError::InvalidValue(format!("missing required column: {name}")))
}

fn is_blank(record: &csv::StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

/// Parse a varieties CSV. Expected header: `name,caffeine_mg`
/// (`caffeine_mg` may be omitted and defaults to 0).
///
/// A missing required header fails the whole file; malformed individual
/// rows are collected as per-line failures.
pub fn parse_variety_csv<R: Read>(reader: R) -> Result<ParsedRows<VarietyRecord>, StoreError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let idx_name = require_column(&headers, "name")?;
    let idx_caffeine = header_index(&headers, "caffeine_mg");

    let mut parsed = ParsedRows::default();
    for (i, result) in rdr.records().enumerate() {
        let line = i + 2;
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                parsed
                    .failures
                    .push(RowFailure::new(format!("line {line}"), &err.into()));
                continue;
            }
        };
        if is_blank(&record) {
            continue;
        }

        let name = record.get(idx_name).unwrap_or("").trim().to_string();
        let raw_caffeine = idx_caffeine
            .and_then(|idx| record.get(idx))
            .map(str::trim)
            .unwrap_or("");
        let caffeine_mg = if raw_caffeine.is_empty() {
            0
        } else {
            match raw_caffeine.parse::<i64>() {
                Ok(value) => value,
                Err(_) => {
                    parsed.failures.push(RowFailure::new(
                        format!("line {line}"),
                        &StoreError::InvalidValue(format!("invalid caffeine_mg '{raw_caffeine}'")),
                    ));
                    continue;
                }
            }
        };
        parsed.rows.push((line, VarietyRecord { name, caffeine_mg }));
    }
    Ok(parsed)
}

/// Parse a consumption CSV. Expected header: `date,cups,variety`.
pub fn parse_entry_csv<R: Read>(reader: R) -> Result<ParsedRows<EntryRecord>, StoreError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let idx_date = require_column(&headers, "date")?;
    let idx_cups = require_column(&headers, "cups")?;
    let idx_variety = require_column(&headers, "variety")?;

    let mut parsed = ParsedRows::default();
    for (i, result) in rdr.records().enumerate() {
        let line = i + 2;
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                parsed
                    .failures
                    .push(RowFailure::new(format!("line {line}"), &err.into()));
                continue;
            }
        };
        if is_blank(&record) {
            continue;
        }

        match parse_entry_record(&record, idx_date, idx_cups, idx_variety) {
            Ok(entry) => parsed.rows.push((line, entry)),
            Err(err) => parsed
                .failures
                .push(RowFailure::new(format!("line {line}"), &err)),
        }
    }
    Ok(parsed)
}

fn parse_entry_record(
    record: &csv::StringRecord,
    idx_date: usize,
    idx_cups: usize,
    idx_variety: usize,
) -> Result<EntryRecord, StoreError> {
    let raw_date = record.get(idx_date).unwrap_or("").trim();
    let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
        .map_err(|_| StoreError::InvalidValue(format!("invalid date '{raw_date}'")))?;
    let raw_cups = record.get(idx_cups).unwrap_or("").trim();
    let cups = raw_cups
        .parse::<i64>()
        .map_err(|_| StoreError::InvalidValue(format!("invalid cups '{raw_cups}'")))?;
    let variety = record.get(idx_variety).unwrap_or("").trim().to_string();
    if variety.is_empty() {
        return Err(StoreError::InvalidValue("missing variety".to_string()));
    }
    Ok(EntryRecord { date, cups, variety })
}

/// Parse an edited ledger snapshot (`id,date,cups,variety`; a blank id
/// marks a new row). Unlike imports, a malformed row fails the whole file:
/// applying a half-parsed snapshot would silently drop the user's edits.
pub fn parse_snapshot_csv<R: Read>(reader: R) -> Result<Vec<SnapshotRow>, StoreError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let idx_id = require_column(&headers, "id")?;
    let idx_date = require_column(&headers, "date")?;
    let idx_cups = require_column(&headers, "cups")?;
    let idx_variety = require_column(&headers, "variety")?;

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let line = i + 2;
        let record = result?;
        if is_blank(&record) {
            continue;
        }

        let raw_id = record.get(idx_id).unwrap_or("").trim();
        let id = if raw_id.is_empty() {
            0
        } else {
            raw_id.parse::<i64>().map_err(|_| {
                StoreError::InvalidValue(format!("line {line}: invalid id '{raw_id}'"))
            })?
        };
        let entry = parse_entry_record(&record, idx_date, idx_cups, idx_variety)
            .map_err(|err| StoreError::InvalidValue(format!("line {line}: {err}")))?;
        rows.push(SnapshotRow {
            id,
            date: entry.date,
            cups: entry.cups,
            variety: entry.variety,
        });
    }
    Ok(rows)
}

/// Import parsed variety rows. Name collisions (with the catalog or within
/// the file) are reported per row; the rest of the batch proceeds.
pub fn import_varieties(
    db: &Database,
    parsed: ParsedRows<VarietyRecord>,
    dry_run: bool,
) -> Result<ImportOutcome, StoreError> {
    let mut outcome = ImportOutcome {
        imported: 0,
        failures: parsed.failures,
    };
    let mut seen: HashSet<String> = HashSet::new();

    for (line, record) in parsed.rows {
        match import_one_variety(db, &record, &mut seen, dry_run) {
            Ok(()) => outcome.imported += 1,
            Err(err) => outcome
                .failures
                .push(RowFailure::new(format!("line {line}"), &err)),
        }
    }
    tracing::debug!(
        imported = outcome.imported,
        failed = outcome.failures.len(),
        dry_run,
        "variety import finished"
    );
    Ok(outcome)
}

fn import_one_variety(
    db: &Database,
    record: &VarietyRecord,
    seen: &mut HashSet<String>,
    dry_run: bool,
) -> Result<(), StoreError> {
    let name = validate_variety_name(&record.name)?;
    validate_caffeine_mg(record.caffeine_mg)?;
    if seen.contains(&name) || db.get_variety_by_name(&name)?.is_some() {
        return Err(StoreError::DuplicateName(name));
    }
    if !dry_run {
        db.insert_variety(&NewVariety {
            name: name.clone(),
            caffeine_mg: record.caffeine_mg,
        })?;
    }
    seen.insert(name);
    Ok(())
}

/// Import parsed consumption rows, resolving variety names against the
/// current catalog. An unmatched name records `NotFound` for that row and
/// does not block the rest of the file.
pub fn import_entries(
    db: &Database,
    parsed: ParsedRows<EntryRecord>,
    dry_run: bool,
) -> Result<ImportOutcome, StoreError> {
    import_entries_at(db, parsed, dry_run, Local::now().date_naive())
}

pub fn import_entries_at(
    db: &Database,
    parsed: ParsedRows<EntryRecord>,
    dry_run: bool,
    today: NaiveDate,
) -> Result<ImportOutcome, StoreError> {
    let mut outcome = ImportOutcome {
        imported: 0,
        failures: parsed.failures,
    };
    // variety name → id, to avoid a lookup per row
    let mut cache: HashMap<String, i64> = HashMap::new();

    for (line, record) in parsed.rows {
        match import_one_entry(db, &record, &mut cache, dry_run, today) {
            Ok(()) => outcome.imported += 1,
            Err(err) => outcome
                .failures
                .push(RowFailure::new(format!("line {line}"), &err)),
        }
    }
    tracing::debug!(
        imported = outcome.imported,
        failed = outcome.failures.len(),
        dry_run,
        "consumption import finished"
    );
    Ok(outcome)
}

fn import_one_entry(
    db: &Database,
    record: &EntryRecord,
    cache: &mut HashMap<String, i64>,
    dry_run: bool,
    today: NaiveDate,
) -> Result<(), StoreError> {
    validate_cups(record.cups)?;
    validate_entry_date(record.date, today)?;

    let variety_id = if let Some(&id) = cache.get(&record.variety) {
        id
    } else {
        let variety = db
            .get_variety_by_name(&record.variety)?
            .ok_or_else(|| StoreError::NotFound(format!("variety '{}'", record.variety)))?;
        cache.insert(record.variety.clone(), variety.id);
        variety.id
    };

    if !dry_run {
        db.insert_entry_at(
            &NewEntry {
                date: record.date,
                cups: record.cups,
                variety_id,
            },
            today,
        )?;
    }
    Ok(())
}

/// Write the variety catalog as `id,name,caffeine_mg`.
pub fn write_varieties_csv<W: Write>(writer: W, varieties: &[Variety]) -> Result<(), StoreError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["id", "name", "caffeine_mg"])?;
    for variety in varieties {
        wtr.write_record(&[
            variety.id.to_string(),
            variety.name.clone(),
            variety.caffeine_mg.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the joined ledger as `id,date,cups,variety_id,variety` — the
/// variety name rides along with the foreign key for human readability.
pub fn write_entries_csv<W: Write>(writer: W, entries: &[Entry]) -> Result<(), StoreError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["id", "date", "cups", "variety_id", "variety"])?;
    for entry in entries {
        wtr.write_record(&[
            entry.id.to_string(),
            entry.date.format("%Y-%m-%d").to_string(),
            entry.cups.to_string(),
            entry.variety_id.to_string(),
            entry.variety.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
