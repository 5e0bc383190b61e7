use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn rcpt(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rcpt").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .arg("--db")
        .arg(dir.join("receipts.db"));
    cmd
}

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("amazon.txt"), "Amazon\n2024-01-01\n123.45\n").unwrap();
    fs::write(
        dir.path().join("walmart.txt"),
        "WALMART SUPERCENTER\n05/01/2024\nTOTAL $54.20\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("airtel.txt"),
        "Airtel\nBill for December 2023\nAmount Due: ₹499.00\n",
    )
    .unwrap();
    dir
}

fn ingest_bills(dir: &Path) {
    rcpt(dir)
        .args(["ingest", "walmart.txt", "airtel.txt", "--upload-dir", "uploads"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 stored, 0 duplicates, 0 failed"));
}

#[test]
fn test_parse_json() {
    let dir = workspace();
    rcpt(dir.path())
        .args(["parse", "amazon.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""vendor": "Amazon""#))
        .stdout(predicate::str::contains(r#""date": "2024-01-01""#))
        .stdout(predicate::str::contains(r#""category": "Shopping""#))
        .stdout(predicate::str::contains(r#""currency": "Unknown""#));

    assert!(!dir.path().join("receipts.db").exists());
}

#[test]
fn test_parse_text_and_csv() {
    let dir = workspace();
    rcpt(dir.path())
        .args(["parse", "walmart.txt", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Vendor:   Walmart"))
        .stdout(predicate::str::contains("Date:     2024-01-05"))
        .stdout(predicate::str::contains("Amount:   54.20"))
        .stdout(predicate::str::contains("Currency: USD"));

    rcpt(dir.path())
        .args(["parse", "airtel.txt", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vendor,date,amount,category,currency"))
        .stdout(predicate::str::contains("Airtel,2023-12-01,499.00,Telecom,INR"));
}

#[test]
fn test_parse_missing_file() {
    let dir = workspace();
    rcpt(dir.path())
        .args(["parse", "nope.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_ingest_is_deduplicated() {
    let dir = workspace();
    ingest_bills(dir.path());
    assert!(dir.path().join("uploads/walmart.txt").exists());

    rcpt(dir.path())
        .args(["ingest", "*.txt", "--upload-dir", "uploads"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 stored, 2 duplicates, 0 failed"));
}

#[test]
fn test_ingest_without_matches() {
    let dir = workspace();
    rcpt(dir.path())
        .args(["ingest", "*.docx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files found"));
}

#[test]
fn test_list_filters_and_paging() {
    let dir = workspace();
    ingest_bills(dir.path());

    rcpt(dir.path())
        .args(["list", "--currency", "INR"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Airtel"))
        .stdout(predicate::str::contains("Walmart").not())
        .stdout(predicate::str::contains("Page 1 of 1 (1 receipts)"));

    rcpt(dir.path())
        .args([
            "list", "--sort-by", "amount", "--order", "desc", "--page-size", "1", "--format",
            "json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""total": 2"#))
        .stdout(predicate::str::contains(r#""vendor": "Airtel""#))
        .stdout(predicate::str::contains("Walmart").not());
}

#[test]
fn test_export_csv() {
    let dir = workspace();
    ingest_bills(dir.path());

    rcpt(dir.path())
        .args(["export", "--min-amount", "50", "--max-amount", "100", "-o", "out.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 receipts"));

    let csv = fs::read_to_string(dir.path().join("out.csv")).unwrap();
    assert!(csv.starts_with("id,vendor,date,amount,category,currency,filename\n"));
    assert!(csv.contains(",Walmart,2024-01-05,54.20,Groceries,USD,walmart.txt"));
    assert!(!csv.contains("Airtel"));
}

#[test]
fn test_stats() {
    let dir = workspace();
    ingest_bills(dir.path());

    rcpt(dir.path())
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""count": 2"#))
        .stdout(predicate::str::contains(r#""2023-12": "499.00""#));
}

#[test]
fn test_edit() {
    let dir = workspace();
    ingest_bills(dir.path());

    let output = rcpt(dir.path())
        .args(["list", "--vendor", "Walmart", "--format", "json"])
        .output()
        .unwrap();
    let page: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let id = page["receipts"][0]["id"].as_i64().unwrap();

    rcpt(dir.path())
        .args(["edit", &id.to_string(), "--category", "Household", "--amount", "60"])
        .assert()
        .success()
        .stdout(predicate::str::contains("amount, category"));

    rcpt(dir.path())
        .args(["export", "--category", "Household"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Walmart,2024-01-05,60.00,Household,USD"));

    rcpt(dir.path())
        .args(["edit", &id.to_string(), "--date", "2024-13-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value for date"));

    rcpt(dir.path())
        .args(["edit", "999", "--vendor", "Nobody"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("receipt 999 not found"));

    rcpt(dir.path())
        .args(["edit", &id.to_string()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no valid fields to update"));
}

#[test]
fn test_config_commands() {
    let dir = workspace();
    let config = dir.path().join("conf/config.json");
    let config_arg = config.to_str().unwrap();

    rcpt(dir.path())
        .args(["--config", config_arg, "config", "init"])
        .assert()
        .success();
    assert!(config.exists());

    rcpt(dir.path())
        .args(["--config", config_arg, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    rcpt(dir.path())
        .args(["--config", config_arg, "config", "set", "pdf.max_pages", "2"])
        .assert()
        .success();

    rcpt(dir.path())
        .args(["--config", config_arg, "config", "get", "pdf.max_pages"])
        .assert()
        .success()
        .stdout(predicate::str::diff("2\n"));

    rcpt(dir.path())
        .args(["--config", config_arg, "config", "get", "extraction.vendors.0.name"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Amazon"));

    rcpt(dir.path())
        .args(["--config", config_arg, "config", "set", "pdf.max_pages", "many"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value for pdf.max_pages"));
}

#[test]
fn test_config_tables_drive_parsing() {
    let dir = workspace();
    let config = dir.path().join("config.json");
    fs::write(
        &config,
        r#"{ "extraction": { "vendors": [ { "name": "Walmart", "category": "Warehouse" } ] } }"#,
    )
    .unwrap();

    rcpt(dir.path())
        .args(["--config", config.to_str().unwrap(), "parse", "walmart.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""category": "Warehouse""#));
}
