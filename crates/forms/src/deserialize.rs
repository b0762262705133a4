//! Parsing of form definitions, entry values and deduction inputs from JSON.
//!
//! The entry points are [`parse_form`], [`parse_values`] and
//! [`parse_deductions`]. Each takes a `&serde_json::Value` that the caller
//! has already read from a request body or a stored column.

use rust_decimal::Decimal;

use crate::types::*;

/// Errors raised while reading form or entry JSON.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    /// A required top-level member is absent.
    #[error("missing required field: '{field}'")]
    MissingField { field: String },
    /// A form field definition is structurally invalid.
    #[error("form field '{id}': {message}")]
    FieldError { id: String, message: String },
    /// A value has the wrong JSON shape or is out of range.
    #[error("invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
    /// An embedded JSON document could not be parsed.
    #[error("invalid JSON in {context}: {message}")]
    InvalidJson { context: String, message: String },
}

/// Parse a form definition.
///
/// `fields` may be a JSON array or a string holding one (the stored column
/// form). Unknown calculation methods and form types are accepted and
/// logged; the engine treats them leniently.
pub fn parse_form(obj: &serde_json::Value) -> Result<FormDefinition, FormError> {
    if !obj.is_object() {
        return Err(FormError::InvalidJson {
            context: "form".to_string(),
            message: "expected a JSON object".to_string(),
        });
    }

    let id = required_id(obj, "id")?;
    let name = optional_str(obj, "name").unwrap_or_default();

    let method_raw = optional_str(obj, "calculationMethod").unwrap_or_default();
    let calculation_method = CalculationMethod::parse(&method_raw);
    if !calculation_method.is_known() {
        tracing::warn!(form_id = %id, method = %method_raw, "unrecognized calculation method");
    }

    let type_raw = optional_str(obj, "formType").unwrap_or_default();
    let form_type = FormType::parse(&type_raw);
    if form_type == FormType::Unknown {
        tracing::warn!(form_id = %id, form_type = %type_raw, "unrecognized form type, using income bucket");
    }

    let fields_json = embedded_array(obj, "fields", "form fields")?.ok_or_else(|| {
        FormError::MissingField {
            field: "fields".to_string(),
        }
    })?;
    let fields = fields_json
        .iter()
        .map(parse_field)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FormDefinition {
        id,
        name,
        calculation_method,
        form_type,
        fields,
        service_facility_fee_percent: optional_percent(obj, "serviceFacilityFeePercent")?,
        commission_percent: optional_percent(obj, "commissionPercent")?,
        super_holding_enabled: optional_bool(obj, "superHoldingEnabled")?.unwrap_or(false),
        super_percent: optional_percent(obj, "superPercent")?,
    })
}

/// Parse the caller's entry values.
///
/// Accepts an array, a string holding an array, or `null` (no values).
/// Order and duplicates are preserved; lookups are last-write-wins.
pub fn parse_values(values: &serde_json::Value) -> Result<Vec<EntryValue>, FormError> {
    let holder = serde_json::json!({ "values": values });
    let Some(items) = embedded_array(&holder, "values", "entry values")? else {
        return Ok(Vec::new());
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_entry_value(i, item))
        .collect()
}

/// Parse the optional deduction overrides. `null` yields the defaults.
pub fn parse_deductions(obj: &serde_json::Value) -> Result<DeductionsInput, FormError> {
    if obj.is_null() {
        return Ok(DeductionsInput::default());
    }
    if !obj.is_object() {
        return Err(FormError::InvalidJson {
            context: "deductions".to_string(),
            message: "expected a JSON object".to_string(),
        });
    }

    let entry_payment_responsibility = optional_str(obj, "entryPaymentResponsibility")
        .filter(|s| !s.trim().is_empty())
        .map(|s| PaymentResponsibility::parse(&s));

    let outwork = match obj.get("outwork") {
        None | Some(serde_json::Value::Null) => None,
        Some(o) if o.is_object() => Some(OutworkInput {
            enabled: optional_bool(o, "enabled")?.unwrap_or(false),
            amount: optional_decimal(o, "amount")?.unwrap_or(Decimal::ZERO),
            rate_percent: optional_percent(o, "ratePercent")?,
        }),
        Some(_) => {
            return Err(FormError::InvalidValue {
                field: "outwork".to_string(),
                message: "expected an object".to_string(),
            })
        }
    };

    let additional_reductions = match obj.get("additionalReductions") {
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(serde_json::Value::Array(arr)) => arr
            .iter()
            .map(|r| -> Result<AdditionalReductionInput, FormError> {
                let amount = optional_decimal(r, "amount")?.ok_or_else(|| {
                    FormError::InvalidValue {
                        field: "additionalReductions".to_string(),
                        message: "each reduction needs an 'amount'".to_string(),
                    }
                })?;
                Ok(AdditionalReductionInput {
                    description: optional_str(r, "description").unwrap_or_default(),
                    amount,
                })
            })
            .collect::<Result<Vec<_>, FormError>>()?,
        Some(_) => {
            return Err(FormError::InvalidValue {
                field: "additionalReductions".to_string(),
                message: "expected an array".to_string(),
            })
        }
    };

    Ok(DeductionsInput {
        service_facility_fee_percent: optional_percent(obj, "serviceFacilityFeePercent")?,
        service_fee_override: optional_decimal(obj, "serviceFeeOverride")?,
        entry_payment_responsibility,
        commission_percent: optional_percent(obj, "commissionPercent")?,
        super_holding_enabled: optional_bool(obj, "superHoldingEnabled")?,
        super_percent: optional_percent(obj, "superPercent")?,
        outwork,
        additional_reductions,
    })
}

// ── Parsing helpers ─────────────────────────────────────────────────

fn parse_field(obj: &serde_json::Value) -> Result<FormField, FormError> {
    let id = required_id(obj, "id").map_err(|_| FormError::FieldError {
        id: String::new(),
        message: "missing 'id'".to_string(),
    })?;

    let field_type = optional_str(obj, "type")
        .map(|t| FieldType::parse(&t))
        .ok_or_else(|| FormError::FieldError {
            id: id.clone(),
            message: "missing 'type'".to_string(),
        })?;

    let payment_responsibility = optional_str(obj, "paymentResponsibility")
        .filter(|s| !s.trim().is_empty())
        .map(|s| PaymentResponsibility::parse(&s));

    let gst_config = match obj.get("gstConfig") {
        None | Some(serde_json::Value::Null) => None,
        Some(cfg) => parse_gst_config(&id, cfg)?,
    };

    Ok(FormField {
        name: optional_str(obj, "name").unwrap_or_default(),
        section: optional_str(obj, "section").unwrap_or_default(),
        include_in_total: optional_bool(obj, "includeInTotal")?.unwrap_or(false),
        id,
        field_type,
        payment_responsibility,
        gst_config,
    })
}

fn parse_gst_config(field_id: &str, cfg: &serde_json::Value) -> Result<Option<GstConfig>, FormError> {
    if !cfg.is_object() {
        return Err(FormError::FieldError {
            id: field_id.to_string(),
            message: "'gstConfig' must be an object".to_string(),
        });
    }
    let type_raw = optional_str(cfg, "type").unwrap_or_default();
    let Some(gst_type) = GstType::parse(&type_raw) else {
        tracing::warn!(field_id, gst_type = %type_raw, "unrecognized GST type, treating field as zero-rated");
        return Ok(None);
    };
    Ok(Some(GstConfig {
        enabled: optional_bool(cfg, "enabled")?.unwrap_or(false),
        rate: optional_percent(cfg, "rate")?.unwrap_or(Decimal::ZERO),
        gst_type,
    }))
}

fn parse_entry_value(index: usize, item: &serde_json::Value) -> Result<EntryValue, FormError> {
    if !item.is_object() {
        return Err(FormError::InvalidValue {
            field: format!("values[{}]", index),
            message: "expected an object".to_string(),
        });
    }
    let field_id = required_id(item, "fieldId").map_err(|_| FormError::InvalidValue {
        field: format!("values[{}]", index),
        message: "missing 'fieldId'".to_string(),
    })?;

    let value = item.get("value").cloned().unwrap_or(serde_json::Value::Null);
    if let Some(amount) = decimal_from_json(&value) {
        check_range(&field_id, amount)?;
    }

    Ok(EntryValue {
        field_name: optional_str(item, "fieldName").unwrap_or_default(),
        manual_gst_amount: optional_decimal(item, "manualGstAmount")?,
        field_id,
        value,
    })
}

/// Ids are strings upstream but some exports carry them as numbers.
fn required_id(obj: &serde_json::Value, field: &str) -> Result<String, FormError> {
    match obj.get(field) {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        _ => Err(FormError::MissingField {
            field: field.to_string(),
        }),
    }
}

fn optional_str(obj: &serde_json::Value, field: &str) -> Option<String> {
    obj.get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn optional_bool(obj: &serde_json::Value, field: &str) -> Result<Option<bool>, FormError> {
    match obj.get(field) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(FormError::InvalidValue {
            field: field.to_string(),
            message: format!("expected a boolean, got {}", other),
        }),
    }
}

/// A number or numeric string. `null` and `""` read as absent.
fn optional_decimal(obj: &serde_json::Value, field: &str) -> Result<Option<Decimal>, FormError> {
    let raw = match obj.get(field) {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(v) => v,
    };
    let d = decimal_from_json(raw).ok_or_else(|| FormError::InvalidValue {
        field: field.to_string(),
        message: format!("expected a number, got {}", raw),
    })?;
    check_range(field, d)?;
    Ok(Some(d))
}

fn optional_percent(obj: &serde_json::Value, field: &str) -> Result<Option<Decimal>, FormError> {
    let percent = optional_decimal(obj, field)?;
    if let Some(p) = percent {
        if p.abs() > MAX_PERCENT {
            return Err(FormError::InvalidValue {
                field: field.to_string(),
                message: format!("{} is not a usable percentage", p),
            });
        }
    }
    Ok(percent)
}

fn check_range(field: &str, amount: Decimal) -> Result<(), FormError> {
    if amount.abs() > MAX_AMOUNT {
        return Err(FormError::InvalidValue {
            field: field.to_string(),
            message: format!("{} exceeds the supported magnitude", amount),
        });
    }
    Ok(())
}

/// Read an array member that may also arrive as a string holding JSON.
/// Absent and `null` members read as `None`.
fn embedded_array(
    obj: &serde_json::Value,
    field: &str,
    context: &str,
) -> Result<Option<Vec<serde_json::Value>>, FormError> {
    match obj.get(field) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Array(arr)) => Ok(Some(arr.clone())),
        Some(serde_json::Value::String(s)) => {
            let parsed: serde_json::Value =
                serde_json::from_str(s).map_err(|e| FormError::InvalidJson {
                    context: context.to_string(),
                    message: e.to_string(),
                })?;
            match parsed {
                serde_json::Value::Array(arr) => Ok(Some(arr)),
                serde_json::Value::Null => Ok(None),
                _ => Err(FormError::InvalidJson {
                    context: context.to_string(),
                    message: "expected an array".to_string(),
                }),
            }
        }
        Some(_) => Err(FormError::InvalidJson {
            context: context.to_string(),
            message: "expected an array".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn make_form(fields: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "form-1",
            "name": "Monthly takings",
            "calculationMethod": "gross",
            "formType": "income",
            "serviceFacilityFeePercent": 40,
            "fields": fields
        })
    }

    #[test]
    fn test_parse_form_basic() {
        let form = make_form(json!([
            {
                "id": "f1",
                "name": "Patient fees",
                "type": "currency",
                "section": "income",
                "includeInTotal": true,
                "gstConfig": {"enabled": true, "rate": 10, "type": "inclusive"}
            },
            {
                "id": "f2",
                "name": "Lab fees",
                "type": "number",
                "section": "expense",
                "includeInTotal": true,
                "paymentResponsibility": "clinic"
            }
        ]));

        let result = parse_form(&form).unwrap();
        assert_eq!(result.id, "form-1");
        assert_eq!(result.calculation_method, CalculationMethod::Gross);
        assert_eq!(result.form_type, FormType::Income);
        assert_eq!(result.service_facility_fee_percent, Some(dec("40")));
        assert_eq!(result.fields.len(), 2);

        let f1 = &result.fields[0];
        assert_eq!(f1.field_type, FieldType::Currency);
        assert_eq!(
            f1.gst_config,
            Some(GstConfig {
                enabled: true,
                rate: dec("10"),
                gst_type: GstType::Inclusive
            })
        );
        assert_eq!(f1.payment_responsibility, None);

        let f2 = &result.fields[1];
        assert!(f2.is_expense());
        assert_eq!(f2.payment_responsibility, Some(PaymentResponsibility::Clinic));
        assert!(f2.gst_config.is_none());
    }

    #[test]
    fn test_fields_as_embedded_string() {
        let form = make_form(json!(
            r#"[{"id":"f1","name":"Fees","type":"currency","includeInTotal":true}]"#
        ));
        let result = parse_form(&form).unwrap();
        assert_eq!(result.fields.len(), 1);
        assert!(result.fields[0].include_in_total);
        assert_eq!(result.fields[0].section, "");
    }

    #[test]
    fn test_malformed_fields_string_fails_fast() {
        let form = make_form(json!("[{not json"));
        match parse_form(&form).unwrap_err() {
            FormError::InvalidJson { context, .. } => assert_eq!(context, "form fields"),
            other => panic!("expected InvalidJson, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_fields_member() {
        let form = json!({"id": "form-1", "calculationMethod": "net", "formType": "income"});
        match parse_form(&form).unwrap_err() {
            FormError::MissingField { field } => assert_eq!(field, "fields"),
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_field_without_type_is_rejected() {
        let form = make_form(json!([{"id": "f1", "name": "Fees"}]));
        match parse_form(&form).unwrap_err() {
            FormError::FieldError { id, message } => {
                assert_eq!(id, "f1");
                assert!(message.contains("type"));
            }
            other => panic!("expected FieldError, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_method_and_type_are_lenient() {
        let form = json!({
            "id": 7,
            "calculationMethod": "hybrid",
            "formType": "mixed",
            "fields": []
        });
        let result = parse_form(&form).unwrap();
        assert_eq!(result.id, "7");
        assert_eq!(result.calculation_method, CalculationMethod::Unknown);
        assert_eq!(result.form_type, FormType::Unknown);
    }

    #[test]
    fn test_unknown_gst_type_drops_config() {
        let form = make_form(json!([{
            "id": "f1",
            "type": "currency",
            "includeInTotal": true,
            "gstConfig": {"enabled": true, "rate": 10, "type": "reverse-charge"}
        }]));
        let result = parse_form(&form).unwrap();
        assert!(result.fields[0].gst_config.is_none());
    }

    #[test]
    fn test_parse_values() {
        let values = json!([
            {"fieldId": "f1", "fieldName": "Fees", "value": 110},
            {"fieldId": "f2", "fieldName": "Lab", "value": "99.00", "manualGstAmount": "9"},
            {"fieldId": "f3", "fieldName": "Notes", "value": "see attached"}
        ]);
        let result = parse_values(&values).unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].amount(), Some(dec("110")));
        assert_eq!(result[1].manual_gst_amount, Some(dec("9")));
        assert_eq!(result[1].amount(), Some(dec("99.00")));
        assert_eq!(result[2].amount(), None);
    }

    #[test]
    fn test_parse_values_null_and_string() {
        assert!(parse_values(&json!(null)).unwrap().is_empty());
        let embedded = json!(r#"[{"fieldId":"f1","value":5}]"#);
        assert_eq!(parse_values(&embedded).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_values_rejects_non_array() {
        assert!(matches!(
            parse_values(&json!({"fieldId": "f1"})),
            Err(FormError::InvalidJson { .. })
        ));
    }

    #[test]
    fn test_parse_values_rejects_missing_field_id() {
        match parse_values(&json!([{"value": 5}])).unwrap_err() {
            FormError::InvalidValue { field, .. } => assert_eq!(field, "values[0]"),
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_values_rejects_huge_amount() {
        let values = json!([{"fieldId": "f1", "value": "5000000000000000"}]);
        assert!(matches!(
            parse_values(&values),
            Err(FormError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_parse_deductions() {
        let d = json!({
            "serviceFacilityFeePercent": "35",
            "serviceFeeOverride": 1200.5,
            "entryPaymentResponsibility": "clinic",
            "superHoldingEnabled": true,
            "outwork": {"enabled": true, "amount": 300},
            "additionalReductions": [{"description": "Equipment hire", "amount": 45}]
        });
        let result = parse_deductions(&d).unwrap();
        assert_eq!(result.service_facility_fee_percent, Some(dec("35")));
        assert_eq!(result.service_fee_override, Some(dec("1200.5")));
        assert_eq!(
            result.entry_payment_responsibility,
            Some(PaymentResponsibility::Clinic)
        );
        assert_eq!(result.super_holding_enabled, Some(true));
        let outwork = result.outwork.unwrap();
        assert!(outwork.enabled);
        assert_eq!(outwork.amount, dec("300"));
        assert_eq!(outwork.rate_percent, None);
        assert_eq!(result.additional_reductions.len(), 1);
        assert_eq!(result.additional_reductions[0].description, "Equipment hire");
    }

    #[test]
    fn test_percentages_are_bounded() {
        let d = json!({"commissionPercent": 5000});
        match parse_deductions(&d).unwrap_err() {
            FormError::InvalidValue { field, .. } => assert_eq!(field, "commissionPercent"),
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_deductions_null_is_default() {
        assert_eq!(
            parse_deductions(&json!(null)).unwrap(),
            DeductionsInput::default()
        );
    }

    #[test]
    fn test_parse_deductions_rejects_bad_percent() {
        let d = json!({"serviceFacilityFeePercent": "forty"});
        match parse_deductions(&d).unwrap_err() {
            FormError::InvalidValue { field, .. } => {
                assert_eq!(field, "serviceFacilityFeePercent")
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }
}
