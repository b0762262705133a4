//! Flat → normalized → flat round trips for engine-produced entries.
//!
//! Rows are reversed before reconstruction to stand in for a backend that
//! returns them in arbitrary order.

use dentbooks_engine::{calculate, CalculationResult, EngineConfig};
use dentbooks_forms::{parse_deductions, parse_form, parse_values, FormDefinition};
use dentbooks_storage::{to_flat, to_normalized, FlatEntry, MethodDetails, NormalizedEntry};
use serde_json::json;

fn form(method: &str, form_type: &str) -> FormDefinition {
    parse_form(&json!({
        "id": "form-1",
        "name": "Practitioner Takings",
        "calculationMethod": method,
        "formType": form_type,
        "serviceFacilityFeePercent": 25,
        "commissionPercent": 40,
        "superHoldingEnabled": true,
        "fields": [
            {"id": "fees", "name": "Patient Fees", "type": "currency", "section": "income",
             "includeInTotal": true, "gstConfig": {"enabled": true, "rate": 10, "type": "inclusive"}},
            {"id": "other", "name": "Other Income", "type": "number", "section": "income",
             "includeInTotal": true},
            {"id": "lab", "name": "Lab Fees", "type": "currency", "section": "expense",
             "includeInTotal": true, "paymentResponsibility": "clinic",
             "gstConfig": {"enabled": true, "rate": 10, "type": "exclusive"}},
            {"id": "materials", "name": "Materials", "type": "currency", "section": "expense",
             "includeInTotal": true},
            {"id": "notes", "name": "Notes", "type": "text", "section": "income"}
        ]
    }))
    .unwrap()
}

fn values() -> serde_json::Value {
    json!([
        {"fieldId": "fees", "fieldName": "Patient Fees", "value": 1100},
        {"fieldId": "other", "fieldName": "Other Income", "value": "45.5"},
        {"fieldId": "lab", "fieldName": "Lab Fees", "value": 90, "manualGstAmount": 8.5},
        {"fieldId": "materials", "fieldName": "Materials", "value": 20},
        {"fieldId": "notes", "fieldName": "Notes", "value": "crown re-fit"},
        {"fieldId": "orphan", "value": null}
    ])
}

fn flat_entry(form: &FormDefinition, deductions: serde_json::Value) -> (FlatEntry, CalculationResult) {
    let parsed_values = parse_values(&values()).unwrap();
    let parsed_deductions = if deductions.is_null() {
        None
    } else {
        Some(parse_deductions(&deductions).unwrap())
    };
    let calc = calculate(
        form,
        &parsed_values,
        parsed_deductions.as_ref(),
        &EngineConfig::default(),
    );
    let entry = FlatEntry {
        id: "entry-1".to_string(),
        form_id: form.id.clone(),
        clinic_id: Some("clinic-1".to_string()),
        user_id: Some("user-1".to_string()),
        quarter_id: Some("2025-Q1".to_string()),
        entry_date: Some("2025-03-31".to_string()),
        description: Some("March takings".to_string()),
        values: values(),
        calculations: calc.to_json(),
        deductions,
        created_at: "2025-04-01T00:00:00Z".to_string(),
        updated_at: "2025-04-02T00:00:00Z".to_string(),
        deleted_at: None,
    };
    (entry, calc)
}

fn shuffled(mut entry: NormalizedEntry) -> NormalizedEntry {
    entry.field_values.reverse();
    entry.field_calculations.reverse();
    entry.gross_reductions.reverse();
    entry.gross_reimbursements.reverse();
    if let Some(deductions) = &mut entry.deductions {
        deductions.additional_reductions.reverse();
    }
    if let MethodDetails::Gross {
        additional_reductions,
        ..
    } = &mut entry.method_details
    {
        additional_reductions.reverse();
    }
    entry
}

fn assert_round_trip(form: &FormDefinition, deductions: serde_json::Value) -> NormalizedEntry {
    let (entry, calc) = flat_entry(form, deductions);
    let normalized = to_normalized(&entry, form).unwrap();
    let back = to_flat(&shuffled(normalized.clone())).unwrap();

    assert_eq!(
        parse_values(&back.values).unwrap(),
        parse_values(&entry.values).unwrap()
    );
    assert_eq!(CalculationResult::from_json(&back.calculations).unwrap(), calc);
    if entry.deductions.is_null() {
        assert!(back.deductions.is_null());
    } else {
        assert_eq!(
            parse_deductions(&back.deductions).unwrap(),
            parse_deductions(&entry.deductions).unwrap()
        );
    }
    assert_eq!(back.id, entry.id);
    assert_eq!(back.description, entry.description);
    assert_eq!(back.updated_at, entry.updated_at);
    normalized
}

#[test]
fn net_entry_with_super_split_round_trips() {
    let normalized = assert_round_trip(&form("net", "both"), json!(null));
    assert_eq!(normalized.gross_reductions.len(), 1);
    assert_eq!(normalized.gross_reimbursements.len(), 1);
    match &normalized.method_details {
        MethodDetails::Net(row) => {
            assert!(row.commission.is_some());
            assert!(row.commission_component.is_some());
            assert!(row.super_component.is_some());
        }
        other => panic!("expected net row, got {:?}", other),
    }
}

#[test]
fn net_entry_with_overrides_round_trips() {
    assert_round_trip(
        &form("net", "income"),
        json!({"commissionPercent": 35, "superHoldingEnabled": false, "serviceFacilityFeePercent": 30}),
    );
}

#[test]
fn gross_entry_with_every_table_round_trips() {
    let normalized = assert_round_trip(
        &form("gross", "both"),
        json!({
            "serviceFacilityFeePercent": 20,
            "entryPaymentResponsibility": "owner",
            "outwork": {"enabled": true, "amount": 300, "ratePercent": 12.5},
            "additionalReductions": [
                {"description": "Parking", "amount": 10.5},
                {"description": "Uniform", "amount": 5}
            ]
        }),
    );
    assert!(normalized.summary.is_some());
    assert!(normalized.deductions.is_some());
    assert_eq!(normalized.gross_reductions.len(), 1);
    assert_eq!(normalized.gross_reimbursements.len(), 1);
    match &normalized.method_details {
        MethodDetails::Gross {
            additional_reductions,
            reductions_summary,
            outwork,
            ..
        } => {
            assert_eq!(additional_reductions.len(), 2);
            assert!(reductions_summary.is_some());
            assert!(outwork.is_some());
        }
        other => panic!("expected gross rows, got {:?}", other),
    }
}

#[test]
fn additional_reductions_round_trip_unrounded_for_every_method() {
    let deductions = json!({
        "additionalReductions": [
            {"description": "Parking", "amount": 1.005},
            {"description": "Uniform", "amount": 5}
        ]
    });
    for method in ["net", "gross"] {
        let f = form(method, "both");
        let normalized = assert_round_trip(&f, deductions.clone());
        let stored = &normalized.deductions.as_ref().unwrap().additional_reductions;
        assert_eq!(stored.len(), 2, "{method}");
        assert_eq!(stored[0].description, "Parking");
    }
}

#[test]
fn gross_entry_with_disabled_outwork_round_trips() {
    assert_round_trip(
        &form("gross", "income"),
        json!({"outwork": {"enabled": false, "amount": 120}}),
    );
}

#[test]
fn expense_form_round_trips() {
    assert_round_trip(&form("gross", "expense"), json!(null));
}

#[test]
fn unknown_method_round_trips_without_details() {
    let normalized = assert_round_trip(&form("legacy", "income"), json!(null));
    assert_eq!(normalized.method_details, MethodDetails::None);
}

#[test]
fn calculations_stored_as_string_are_accepted() {
    let f = form("net", "income");
    let (mut entry, calc) = flat_entry(&f, json!(null));
    entry.calculations = serde_json::Value::String(entry.calculations.to_string());
    let back = to_flat(&to_normalized(&entry, &f).unwrap()).unwrap();
    assert_eq!(CalculationResult::from_json(&back.calculations).unwrap(), calc);
}
