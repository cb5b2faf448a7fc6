use anyhow::Result;
use chrono::Local;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use cuppa_core::db::Database;
use cuppa_core::stats::{
    DANGER_DAILY_MG, by_variety, daily_caffeine_stats, entries_since, totals_where,
};

use super::helpers::window_start;

pub(crate) fn cmd_stats(db: &Database, days: Option<u32>, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct VarietyRow {
        #[tabled(rename = "Variety")]
        variety: String,
        #[tabled(rename = "Cups")]
        cups: i64,
        #[tabled(rename = "Caffeine")]
        caffeine: String,
        #[tabled(rename = "Per cup")]
        per_cup: String,
    }

    let all = db.list_entries()?;
    let entries = match days {
        Some(days) => entries_since(&all, window_start(Local::now().date_naive(), days)),
        None => all,
    };

    let totals = totals_where(&entries, |_| true);
    let stats = daily_caffeine_stats(&entries);
    let breakdown = by_variety(&entries);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "days": days,
                "totals": totals,
                "daily_caffeine": stats,
                "by_variety": breakdown,
            }))?
        );
        return Ok(());
    }

    let Some(stats) = stats else {
        match days {
            Some(days) => eprintln!("No entries in the last {days} days"),
            None => eprintln!("No entries recorded"),
        }
        process::exit(2);
    };

    match days {
        Some(days) => println!("=== Last {days} days ===\n"),
        None => println!("=== All time ===\n"),
    }
    let cups = totals.cups;
    let caffeine = totals.caffeine_mg;
    let average = stats.average_mg;
    let max = stats.max_mg;
    let high_days = stats.high_days;
    println!("  Cups:              {cups}");
    println!("  Caffeine:          {caffeine}mg");
    println!("  Avg caffeine/day:  {average:.0}mg");
    println!("  Max caffeine/day:  {max}mg");
    println!("  Days >{DANGER_DAILY_MG}mg:      {high_days}");
    println!();

    let rows: Vec<VarietyRow> = breakdown
        .iter()
        .map(|v| VarietyRow {
            variety: v.variety.clone(),
            cups: v.cups,
            caffeine: format!("{}mg", v.caffeine_mg),
            per_cup: format!("{}mg", v.caffeine_per_cup),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
