use anyhow::Result;
use chrono::Local;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use cuppa_core::db::Database;
use cuppa_core::models::Entry;
use cuppa_core::stats::{CaffeineLevel, DANGER_DAILY_MG, WARNING_DAILY_MG, daily_series, entries_since};

use super::helpers::{json_error, parse_date, window_start};

pub(crate) fn cmd_summary(db: &Database, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let entries = db.entries_for_date(date)?;

    if entries.is_empty() {
        if json {
            println!("{}", json_error(&format!("No entries for {date}")));
        } else {
            eprintln!("No entries for {date}");
        }
        process::exit(2);
    }

    let cups: i64 = entries.iter().map(|e| e.cups).sum();
    let caffeine_mg: i64 = entries.iter().map(Entry::total_caffeine).sum();
    let level = CaffeineLevel::for_daily_mg(caffeine_mg);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "date": date,
                "entries": entries,
                "cups": cups,
                "caffeine_mg": caffeine_mg,
                "level": level,
            }))?
        );
        return Ok(());
    }

    println!("=== {date} ===\n");
    for e in &entries {
        let id = e.id;
        let cups = e.cups;
        let variety = &e.variety;
        let per_cup = e.caffeine_mg;
        let total = e.total_caffeine();
        println!("  [{id}] {cups} cups {variety} ({per_cup}mg/cup) — {total}mg");
    }
    println!("\n  TOTAL: {cups} cups | {caffeine_mg}mg caffeine");

    match level {
        CaffeineLevel::Danger => eprintln!(
            "\n  Warning: over the recommended {DANGER_DAILY_MG}mg daily maximum"
        ),
        CaffeineLevel::Warning => eprintln!(
            "\n  Note: above {WARNING_DAILY_MG}mg, approaching the {DANGER_DAILY_MG}mg daily maximum"
        ),
        CaffeineLevel::Normal => {}
    }

    Ok(())
}

pub(crate) fn cmd_history(db: &Database, days: u32, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct HistoryRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Cups")]
        cups: i64,
        #[tabled(rename = "Caffeine")]
        caffeine: String,
    }

    let today = Local::now().date_naive();
    let cutoff = window_start(today, days);
    let entries = entries_since(&db.list_entries()?, cutoff);
    let series = daily_series(&entries);

    if json {
        println!("{}", serde_json::to_string_pretty(&series)?);
        return Ok(());
    }

    if series.is_empty() {
        eprintln!("No entries in the last {days} days");
        process::exit(2);
    }

    let rows: Vec<HistoryRow> = series
        .iter()
        .map(|d| HistoryRow {
            date: d.date.format("%Y-%m-%d").to_string(),
            cups: d.cups,
            caffeine: format!("{}mg", d.caffeine_mg),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
