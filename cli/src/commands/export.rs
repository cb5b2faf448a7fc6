use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use cuppa_core::csv_io::{write_entries_csv, write_varieties_csv};
use cuppa_core::db::Database;

pub(crate) fn cmd_export_varieties(db: &Database, output: Option<&Path>) -> Result<()> {
    let varieties = db.list_varieties()?;
    match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create file: {}", path.display()))?;
            write_varieties_csv(file, &varieties)?;
            let count = varieties.len();
            println!("Exported {count} varieties to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            write_varieties_csv(&mut handle, &varieties)?;
            handle.flush()?;
        }
    }
    Ok(())
}

pub(crate) fn cmd_export_consumption(db: &Database, output: Option<&Path>) -> Result<()> {
    let entries = db.list_entries()?;
    match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create file: {}", path.display()))?;
            write_entries_csv(file, &entries)?;
            let count = entries.len();
            println!("Exported {count} entries to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            write_entries_csv(&mut handle, &entries)?;
            handle.flush()?;
        }
    }
    Ok(())
}
