//! CLI integration tests.
//!
//! Uses `assert_cmd` to spawn the `dentbooks` binary against fixture files
//! written to a temporary directory.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn dentbooks() -> Command {
    cargo_bin_cmd!("dentbooks")
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn write_json(dir: &TempDir, name: &str, value: &Value) -> PathBuf {
    write(dir, name, &serde_json::to_string_pretty(value).unwrap())
}

fn form() -> Value {
    json!({
        "id": "form-1",
        "name": "Practitioner Takings",
        "calculationMethod": "gross",
        "formType": "both",
        "serviceFacilityFeePercent": 25,
        "fields": [
            {"id": "fees", "name": "Patient Fees", "type": "currency", "section": "income",
             "includeInTotal": true, "gstConfig": {"enabled": true, "rate": 10, "type": "inclusive"}},
            {"id": "lab", "name": "Lab Fees", "type": "currency", "section": "expense",
             "includeInTotal": true, "paymentResponsibility": "clinic",
             "gstConfig": {"enabled": true, "rate": 10, "type": "exclusive"}}
        ]
    })
}

fn values() -> Value {
    json!([
        {"fieldId": "fees", "fieldName": "Patient Fees", "value": 1100},
        {"fieldId": "lab", "fieldName": "Lab Fees", "value": 100}
    ])
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

fn number(value: &Value, key: &str) -> f64 {
    value[key]
        .as_f64()
        .unwrap_or_else(|| panic!("{} is not a number in {}", key, value))
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    dentbooks()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("entry calculation and normalization"));
}

#[test]
fn version_exits_0() {
    dentbooks()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dentbooks"));
}

// ──────────────────────────────────────────────
// 2. Calculate
// ──────────────────────────────────────────────

#[test]
fn calculate_json_output() {
    let dir = TempDir::new().unwrap();
    let form = write_json(&dir, "form.json", &form());
    let values = write_json(&dir, "values.json", &values());

    let output = dentbooks()
        .args(["--output", "json", "calculate", "--form"])
        .arg(&form)
        .arg("--values")
        .arg(&values)
        .output()
        .unwrap();
    assert!(output.status.success());

    let result = stdout_json(&output);
    assert_eq!(result["calculationMethod"], "gross");
    // 1000 income base less 100 lab base
    assert_eq!(number(&result, "totalBaseAmount"), 900.0);
    assert_eq!(number(&result, "totalGSTAmount"), 90.0);
    assert_eq!(number(&result["basMapping"], "gstOnSales1A"), 100.0);
    assert_eq!(number(&result["basMapping"], "gstCredit1B"), 10.0);
    // 900 * 25% = 225 + 22.50 gst
    assert_eq!(number(&result, "totalServiceFee"), 247.5);
    assert!(result.get("grossDetails").is_some());
}

#[test]
fn calculate_text_output() {
    let dir = TempDir::new().unwrap();
    let form = write_json(&dir, "form.json", &form());
    let values = write_json(&dir, "values.json", &values());

    dentbooks()
        .args(["calculate", "--form"])
        .arg(&form)
        .arg("--values")
        .arg(&values)
        .assert()
        .success()
        .stdout(predicate::str::contains("Method: gross"))
        .stdout(predicate::str::contains("Patient Fees"))
        .stdout(predicate::str::contains("Remitted:"));
}

#[test]
fn calculate_with_deductions_file() {
    let dir = TempDir::new().unwrap();
    let form = write_json(&dir, "form.json", &form());
    let values = write_json(&dir, "values.json", &values());
    let deductions = write_json(
        &dir,
        "deductions.json",
        &json!({"serviceFeeOverride": 100, "additionalReductions": [{"description": "Parking", "amount": 20}]}),
    );

    let output = dentbooks()
        .args(["--output", "json", "calculate", "--form"])
        .arg(&form)
        .arg("--values")
        .arg(&values)
        .arg("--deductions")
        .arg(&deductions)
        .output()
        .unwrap();
    assert!(output.status.success());

    let result = stdout_json(&output);
    assert_eq!(number(&result, "serviceFeeBase"), 100.0);
    assert_eq!(number(&result["grossDetails"], "totalAdditionalReductions"), 20.0);
}

#[test]
fn calculate_uses_config_file() {
    let dir = TempDir::new().unwrap();
    let form = write_json(&dir, "form.json", &form());
    let values = write_json(&dir, "values.json", &values());
    let config = write(&dir, "engine.toml", "service_fee_gst_rate = 0\n");

    let output = dentbooks()
        .args(["--output", "json", "--config"])
        .arg(&config)
        .args(["calculate", "--form"])
        .arg(&form)
        .arg("--values")
        .arg(&values)
        .output()
        .unwrap();
    assert!(output.status.success());

    let result = stdout_json(&output);
    assert_eq!(number(&result, "gstOnServiceFee"), 0.0);
    assert_eq!(number(&result, "totalServiceFee"), 225.0);
}

#[test]
fn calculate_quiet_prints_nothing() {
    let dir = TempDir::new().unwrap();
    let form = write_json(&dir, "form.json", &form());
    let values = write_json(&dir, "values.json", &values());

    dentbooks()
        .args(["--quiet", "calculate", "--form"])
        .arg(&form)
        .arg("--values")
        .arg(&values)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

// ──────────────────────────────────────────────
// 3. Errors
// ──────────────────────────────────────────────

#[test]
fn invalid_config_exits_1() {
    let dir = TempDir::new().unwrap();
    let form = write_json(&dir, "form.json", &form());
    let values = write_json(&dir, "values.json", &values());
    let config = write(&dir, "engine.toml", "default_super_percent = -5\n");

    dentbooks()
        .arg("--config")
        .arg(&config)
        .args(["calculate", "--form"])
        .arg(&form)
        .arg("--values")
        .arg(&values)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("default_super_percent"));
}

#[test]
fn missing_file_reports_json_error() {
    let dir = TempDir::new().unwrap();
    let values = write_json(&dir, "values.json", &values());

    let output = dentbooks()
        .args(["--output", "json", "calculate", "--form", "does-not-exist.json", "--values"])
        .arg(&values)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let err: Value = serde_json::from_slice(&output.stderr).unwrap();
    assert!(err["error"].as_str().unwrap().contains("does-not-exist.json"));
}

#[test]
fn form_without_fields_exits_1() {
    let dir = TempDir::new().unwrap();
    let form = write_json(&dir, "form.json", &json!({"id": "form-1"}));
    let values = write_json(&dir, "values.json", &values());

    dentbooks()
        .args(["calculate", "--form"])
        .arg(&form)
        .arg("--values")
        .arg(&values)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error"));
}

// ──────────────────────────────────────────────
// 4. Normalize and flatten
// ──────────────────────────────────────────────

#[test]
fn normalize_then_flatten_restores_entry() {
    let dir = TempDir::new().unwrap();
    let form_path = write_json(&dir, "form.json", &form());
    let values_path = write_json(&dir, "values.json", &values());

    let calc = dentbooks()
        .args(["--output", "json", "calculate", "--form"])
        .arg(&form_path)
        .arg("--values")
        .arg(&values_path)
        .output()
        .unwrap();
    assert!(calc.status.success());

    let entry = json!({
        "id": "entry-1",
        "formId": "form-1",
        "clinicId": "clinic-1",
        "values": values(),
        "calculations": stdout_json(&calc),
        "deductions": null,
        "createdAt": "2025-04-01T00:00:00Z",
        "updatedAt": "2025-04-01T00:00:00Z"
    });
    let entry_path = write_json(&dir, "entry.json", &entry);

    let normalized = dentbooks()
        .args(["--output", "json", "normalize", "--form"])
        .arg(&form_path)
        .arg("--entry")
        .arg(&entry_path)
        .output()
        .unwrap();
    assert!(normalized.status.success());
    let normalized_json = stdout_json(&normalized);
    assert_eq!(normalized_json["method_details"]["method"], "gross");
    assert_eq!(normalized_json["gross_reductions"].as_array().unwrap().len(), 1);
    let normalized_path = write_json(&dir, "normalized.json", &normalized_json);

    let flat = dentbooks()
        .args(["flatten", "--normalized"])
        .arg(&normalized_path)
        .output()
        .unwrap();
    assert!(flat.status.success());
    let flat = stdout_json(&flat);
    assert_eq!(flat["id"], "entry-1");
    assert_eq!(flat["clinicId"], "clinic-1");
    assert_eq!(flat["values"].as_array().unwrap().len(), 2);
    assert_eq!(
        number(&flat["calculations"], "remittedAmount"),
        number(&entry["calculations"], "remittedAmount")
    );
}

#[test]
fn normalize_text_lists_tables() {
    let dir = TempDir::new().unwrap();
    let form_path = write_json(&dir, "form.json", &form());
    let entry_path = write_json(
        &dir,
        "entry.json",
        &json!({"id": "entry-1", "formId": "form-1", "values": values()}),
    );

    dentbooks()
        .args(["normalize", "--form"])
        .arg(&form_path)
        .arg("--entry")
        .arg(&entry_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("field values:       2"))
        .stdout(predicate::str::contains("summary:            no"));
}

#[test]
fn normalize_rejects_method_mismatch() {
    let dir = TempDir::new().unwrap();
    let mut net_form = form();
    net_form["calculationMethod"] = json!("net");
    let form_path = write_json(&dir, "form.json", &net_form);
    let entry_path = write_json(
        &dir,
        "entry.json",
        &json!({
            "id": "entry-1",
            "formId": "form-1",
            "values": [],
            "calculations": {
                "calculationMethod": "gross", "formType": "both", "fieldTotals": [],
                "totalBaseAmount": 0, "totalGSTAmount": 0, "totalAmount": 0, "basMapping": {}
            }
        }),
    );

    dentbooks()
        .args(["normalize", "--form"])
        .arg(&form_path)
        .arg("--entry")
        .arg(&entry_path)
        .assert()
        .failure()
        .code(1);
}
