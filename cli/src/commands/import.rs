use std::path::Path;

use anyhow::{Context, Result};

use cuppa_core::csv_io::{import_entries, import_varieties, parse_entry_csv, parse_variety_csv};
use cuppa_core::db::Database;
use cuppa_core::models::ImportOutcome;

pub(crate) fn cmd_import_varieties(
    db: &Database,
    path: &Path,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    let parsed = parse_variety_csv(file)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let outcome = import_varieties(db, parsed, dry_run)?;
    report(&outcome, dry_run, json, "varieties")
}

pub(crate) fn cmd_import_consumption(
    db: &Database,
    path: &Path,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    let parsed = parse_entry_csv(file)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let outcome = import_entries(db, parsed, dry_run)?;
    report(&outcome, dry_run, json, "entries")
}

fn report(outcome: &ImportOutcome, dry_run: bool, json: bool, what: &str) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "dry_run": dry_run,
                "imported": outcome.imported,
                "failures": outcome.failures,
            }))?
        );
        return Ok(());
    }

    if dry_run {
        println!("Dry run — no changes made.\n");
        println!("  {what} to import: {}", outcome.imported);
    } else {
        println!("Import complete.\n");
        println!("  {what} imported: {}", outcome.imported);
    }
    if !outcome.failures.is_empty() {
        eprintln!("  Failed rows:  {}", outcome.failures.len());
        for failure in &outcome.failures {
            let row = &failure.row;
            let error = &failure.error;
            eprintln!("    {row}: {error}");
        }
    }

    Ok(())
}
