//! End-to-end tests for the cuppa binary: catalog management, logging,
//! bulk edit, and CSV import/export against an isolated home directory.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn cuppa_binary() -> String {
    env!("CARGO_BIN_EXE_cuppa").to_string()
}

/// Run cuppa with HOME pointed at the temp directory so the database lands
/// in an isolated data dir.
fn run(home: &Path, args: &[&str]) -> Output {
    Command::new(cuppa_binary())
        .env("HOME", home)
        .env_remove("XDG_DATA_HOME")
        .args(args)
        .output()
        .expect("failed to run cuppa")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_log_and_summary_flow() {
    let temp = TempDir::new().unwrap();

    let output = run(
        temp.path(),
        &["variety", "add", "Arabica", "--caffeine", "95"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Arabica"));

    let output = run(temp.path(), &["log", "2", "Arabica"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(
        stdout(&output).contains("+190mg"),
        "expected caffeine total in: {}",
        stdout(&output)
    );

    let output = run(temp.path(), &["summary"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("2 cups Arabica"));
    assert!(text.contains("190mg"));
}

#[test]
fn test_log_unknown_variety_exits_2() {
    let temp = TempDir::new().unwrap();
    let output = run(temp.path(), &["log", "1", "Liberica"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Liberica"));
}

#[test]
fn test_log_future_date_fails() {
    let temp = TempDir::new().unwrap();
    run(
        temp.path(),
        &["variety", "add", "Arabica", "--caffeine", "95"],
    );

    let output = run(temp.path(), &["log", "1", "Arabica", "--date", "2999-01-01"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("future"), "{}", stderr(&output));

    // Nothing was written
    let output = run(temp.path(), &["summary", "2999-01-01"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_delete_in_use_variety_is_refused() {
    let temp = TempDir::new().unwrap();
    run(
        temp.path(),
        &["variety", "add", "Arabica", "--caffeine", "95"],
    );
    run(temp.path(), &["log", "1", "Arabica"]);

    let output = run(temp.path(), &["variety", "delete", "Arabica"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("referenced"), "{}", stderr(&output));

    // Still listed
    let output = run(temp.path(), &["variety", "list"]);
    assert!(stdout(&output).contains("Arabica"));

    // Once the entry is gone the deletion goes through
    let output = run(temp.path(), &["summary", "--json"]);
    let summary: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let entry_id = summary["entries"][0]["id"].as_i64().unwrap();
    let output = run(temp.path(), &["delete", &entry_id.to_string()]);
    assert!(output.status.success(), "{}", stderr(&output));

    let output = run(temp.path(), &["variety", "delete", "Arabica"]);
    assert!(output.status.success(), "{}", stderr(&output));
}

#[test]
fn test_import_reports_bad_rows_without_aborting() {
    let temp = TempDir::new().unwrap();
    run(
        temp.path(),
        &["variety", "add", "Arabica", "--caffeine", "95"],
    );

    let csv_path = temp.path().join("consumption.csv");
    std::fs::write(
        &csv_path,
        "date,cups,variety\n2024-06-14,2,Kopi Luwak\n2024-06-15,1,Arabica\n",
    )
    .unwrap();

    let output = run(
        temp.path(),
        &["import", "consumption", csv_path.to_str().unwrap()],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("imported: 1"), "{}", stdout(&output));
    assert!(stderr(&output).contains("Kopi Luwak"), "{}", stderr(&output));

    let output = run(temp.path(), &["summary", "2024-06-15"]);
    assert!(stdout(&output).contains("Arabica"));
}

#[test]
fn test_export_import_round_trip() {
    let temp = TempDir::new().unwrap();
    run(
        temp.path(),
        &["variety", "add", "Arabica", "--caffeine", "95"],
    );
    run(
        temp.path(),
        &["variety", "add", "Robusta", "--caffeine", "150"],
    );
    run(temp.path(), &["log", "2", "Arabica", "--date", "2024-06-14"]);
    run(temp.path(), &["log", "1", "Robusta", "--date", "2024-06-15"]);

    let varieties_csv = temp.path().join("varieties.csv");
    let consumption_csv = temp.path().join("consumption.csv");
    let output = run(
        temp.path(),
        &[
            "export",
            "varieties",
            "--output",
            varieties_csv.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let output = run(
        temp.path(),
        &[
            "export",
            "consumption",
            "--output",
            consumption_csv.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "{}", stderr(&output));

    let text = std::fs::read_to_string(&consumption_csv).unwrap();
    assert!(text.starts_with("id,date,cups,variety_id,variety\n"));

    // Import into a fresh home
    let fresh = TempDir::new().unwrap();
    let output = run(
        fresh.path(),
        &[
            "import",
            "varieties",
            varieties_csv.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let output = run(
        fresh.path(),
        &[
            "import",
            "consumption",
            consumption_csv.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "{}", stderr(&output));

    let output = run(fresh.path(), &["stats", "--json"]);
    let stats: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(stats["totals"]["cups"], 3);
    assert_eq!(stats["totals"]["caffeine_mg"], 190 + 150);
}

#[test]
fn test_edit_applies_deletes_updates_and_inserts() {
    let temp = TempDir::new().unwrap();
    run(
        temp.path(),
        &["variety", "add", "Arabica", "--caffeine", "95"],
    );
    run(
        temp.path(),
        &["variety", "add", "Robusta", "--caffeine", "150"],
    );
    run(temp.path(), &["log", "2", "Arabica", "--date", "2024-06-14"]);
    run(temp.path(), &["log", "1", "Arabica", "--date", "2024-06-15"]);

    let output = run(temp.path(), &["summary", "2024-06-14", "--json"]);
    let summary: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let keep_id = summary["entries"][0]["id"].as_i64().unwrap();

    // Bump the kept row to 3 cups, drop the other, add a new Robusta row
    let edited = temp.path().join("edited.csv");
    std::fs::write(
        &edited,
        format!(
            "id,date,cups,variety\n{keep_id},2024-06-14,3,Arabica\n,2024-06-16,1,Robusta\n"
        ),
    )
    .unwrap();

    let output = run(temp.path(), &["edit", edited.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Deleted:   1"), "{text}");
    assert!(text.contains("Updated:   1"), "{text}");
    assert!(text.contains("Inserted:  1"), "{text}");

    let output = run(temp.path(), &["summary", "2024-06-14"]);
    assert!(stdout(&output).contains("3 cups Arabica"));
    let output = run(temp.path(), &["summary", "2024-06-15"]);
    assert_eq!(output.status.code(), Some(2));
    let output = run(temp.path(), &["summary", "2024-06-16"]);
    assert!(stdout(&output).contains("Robusta"));
}
