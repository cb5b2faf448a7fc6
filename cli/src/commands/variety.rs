use anyhow::Result;
use std::process;

use cuppa_core::db::Database;
use cuppa_core::models::NewVariety;

use super::helpers::{json_error, print_variety_table};

pub(crate) fn cmd_variety_add(db: &Database, name: &str, caffeine: i64, json: bool) -> Result<()> {
    let variety = db.insert_variety(&NewVariety {
        name: name.to_string(),
        caffeine_mg: caffeine,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&variety)?);
    } else {
        let name = &variety.name;
        let id = variety.id;
        let mg = variety.caffeine_mg;
        println!("Added variety: {name} (id: {id}, {mg}mg/cup)");
    }

    Ok(())
}

pub(crate) fn cmd_variety_list(db: &Database, json: bool) -> Result<()> {
    let varieties = db.list_varieties()?;

    if varieties.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No varieties yet. Add one with 'cuppa variety add <name> --caffeine <mg>'.");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&varieties)?);
    } else {
        print_variety_table(&varieties);
    }

    Ok(())
}

pub(crate) fn cmd_variety_set_caffeine(
    db: &Database,
    name: &str,
    caffeine_mg: i64,
    json: bool,
) -> Result<()> {
    let Some(variety) = db.get_variety_by_name(name)? else {
        if json {
            println!("{}", json_error(&format!("No variety named '{name}'")));
        } else {
            eprintln!("No variety named '{name}'");
        }
        process::exit(2);
    };

    let updated = db.update_caffeine(variety.id, caffeine_mg)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        let name = &updated.name;
        let mg = updated.caffeine_mg;
        println!("Updated {name}: {mg}mg/cup");
    }

    Ok(())
}

pub(crate) fn cmd_variety_delete(db: &Database, names: &[String], json: bool) -> Result<()> {
    let outcome = db.delete_varieties(names)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        if outcome.deleted.is_empty() {
            process::exit(2);
        }
        return Ok(());
    }

    if !outcome.deleted.is_empty() {
        println!("Deleted: {}", outcome.deleted.join(", "));
    }
    for failure in &outcome.failures {
        let row = &failure.row;
        let error = &failure.error;
        eprintln!("Skipped {row}: {error}");
    }
    if outcome.deleted.is_empty() {
        process::exit(2);
    }

    Ok(())
}
