use anyhow::Result;
use std::process;

use cuppa_core::db::Database;
use cuppa_core::models::NewEntry;
use cuppa_core::stats::{CaffeineLevel, DANGER_DAILY_MG, WARNING_DAILY_MG};

use super::helpers::{json_error, parse_date};

pub(crate) fn cmd_log(
    db: &Database,
    cups: i64,
    variety_name: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;

    let Some(variety) = db.get_variety_by_name(variety_name)? else {
        if json {
            println!(
                "{}",
                json_error(&format!("No variety named '{variety_name}'"))
            );
        } else {
            eprintln!(
                "No variety named '{variety_name}'. Add it with 'cuppa variety add {variety_name} --caffeine <mg>'."
            );
        }
        process::exit(2);
    };

    let entry = db.insert_entry(&NewEntry {
        date,
        cups,
        variety_id: variety.id,
    })?;

    let day_caffeine: i64 = db
        .entries_for_date(date)?
        .iter()
        .map(cuppa_core::models::Entry::total_caffeine)
        .sum();
    let level = CaffeineLevel::for_daily_mg(day_caffeine);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "entry": entry,
                "day_caffeine_mg": day_caffeine,
                "level": level,
            }))?
        );
    } else {
        let name = &entry.variety;
        let added = entry.total_caffeine();
        println!("Logged: {cups} cups of {name} on {date} — +{added}mg caffeine");
        match level {
            CaffeineLevel::Danger => eprintln!(
                "Warning: {day_caffeine}mg on {date} exceeds the recommended {DANGER_DAILY_MG}mg daily maximum"
            ),
            CaffeineLevel::Warning => eprintln!(
                "Note: {day_caffeine}mg on {date} is above {WARNING_DAILY_MG}mg, approaching the {DANGER_DAILY_MG}mg daily maximum"
            ),
            CaffeineLevel::Normal => {}
        }
    }

    Ok(())
}
