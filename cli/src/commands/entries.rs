use anyhow::{Context, Result};
use std::path::Path;
use std::process;

use cuppa_core::csv_io::parse_snapshot_csv;
use cuppa_core::db::Database;
use cuppa_core::models::ErrorKind;

use super::helpers::json_error;

pub(crate) fn cmd_delete(db: &Database, entry_id: i64, json: bool) -> Result<()> {
    match db.delete_entry(entry_id) {
        Ok(()) => {
            if json {
                println!("{}", serde_json::json!({ "deleted": entry_id }));
            } else {
                println!("Deleted entry {entry_id}");
            }
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            if json {
                println!("{}", json_error(&format!("Entry {entry_id} not found")));
            } else {
                eprintln!("Entry {entry_id} not found");
            }
            process::exit(2);
        }
        Err(err) => Err(err.into()),
    }
}

/// Reconcile a user-edited snapshot of the ledger, read from `path`.
///
/// The stored ledger is the original; the file is the edit. Row failures
/// are reported individually — the rest of the edit still lands.
pub(crate) fn cmd_edit(db: &Database, path: &Path, json: bool) -> Result<()> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    let edited = parse_snapshot_csv(file)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let outcome = db.reconcile(&edited)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!("Applied edits from {}:", path.display());
    println!("  Deleted:   {}", outcome.deleted);
    println!("  Updated:   {}", outcome.updated);
    println!("  Inserted:  {}", outcome.inserted);
    println!("  Unchanged: {}", outcome.unchanged);
    if !outcome.failures.is_empty() {
        eprintln!("  Failed:    {}", outcome.failures.len());
        for failure in &outcome.failures {
            let row = &failure.row;
            let error = &failure.error;
            eprintln!("    {row}: {error}");
        }
    }

    Ok(())
}
