//! Normalization bridge between the flat entry JSON and the normalized
//! tables.
//!
//! [`to_normalized`] splits a [`FlatEntry`] into rows; [`to_flat`] puts them
//! back together. For every entry the engine produces, the round trip
//! returns the same values and calculations, whatever order the rows come
//! back from storage in.

mod flatten;
mod normalize;

use dentbooks_engine::EngineConfig;
use dentbooks_forms::FormDefinition;

use crate::error::BridgeError;
use crate::record::{FlatEntry, NormalizedEntry};

/// Normalize with the default engine configuration.
pub fn to_normalized(entry: &FlatEntry, form: &FormDefinition) -> Result<NormalizedEntry, BridgeError> {
    to_normalized_with(entry, form, &EngineConfig::default())
}

/// Normalize a flat entry against its form.
///
/// Fails fast on malformed `values`, `calculations` or `deductions`, and on
/// a calculation produced under a different method than the form's.
pub fn to_normalized_with(
    entry: &FlatEntry,
    form: &FormDefinition,
    config: &EngineConfig,
) -> Result<NormalizedEntry, BridgeError> {
    let id = entry.id.as_str();
    let values = dentbooks_forms::parse_values(&entry.values)?;
    let calculation = normalize::parse_calculations(id, &entry.calculations)?;
    let deductions = normalize::parse_deductions(id, &entry.deductions)?;

    if let Some(calc) = &calculation {
        if calc.calculation_method != form.calculation_method {
            return Err(BridgeError::MethodMismatch {
                entry_id: id.to_string(),
                expected: form.calculation_method,
                found: calc.calculation_method,
            });
        }
    }

    let (gross_reductions, gross_reimbursements) =
        match calculation.as_ref().and_then(|c| c.deductions.as_ref()) {
            Some(block) => (
                normalize::breakdown_rows(id, &block.reduction_breakdown),
                normalize::breakdown_rows(id, &block.reimbursement_breakdown),
            ),
            None => (Vec::new(), Vec::new()),
        };

    let normalized = NormalizedEntry {
        header: normalize::header_row(entry, form, calculation.as_ref()),
        field_values: normalize::field_value_rows(id, &values),
        field_calculations: calculation
            .as_ref()
            .map(|c| normalize::field_calculation_rows(id, c, form))
            .unwrap_or_default(),
        summary: calculation.as_ref().map(|c| normalize::summary_row(id, c)),
        method_details: normalize::method_detail_rows(
            id,
            form.calculation_method,
            calculation.as_ref(),
            config,
        ),
        gross_reductions,
        gross_reimbursements,
        deductions: deductions.as_ref().map(|d| normalize::deductions_row(id, d)),
    };

    tracing::debug!(
        entry_id = id,
        values = normalized.field_values.len(),
        calculations = normalized.field_calculations.len(),
        method = %normalized.method_details.method(),
        "entry normalized"
    );
    Ok(normalized)
}

/// Reassemble the flat entry from its rows.
///
/// `calculations` is `null` when there is no summary row; `deductions` is
/// `null` when there is no deductions row.
pub fn to_flat(entry: &NormalizedEntry) -> Result<FlatEntry, BridgeError> {
    let id = entry.entry_id();
    let values = flatten::flat_values(id, &entry.field_values)?;

    let calculations = match &entry.summary {
        Some(summary) => flatten::flat_calculation(entry, summary).to_json(),
        None => serde_json::Value::Null,
    };
    let deductions = match &entry.deductions {
        Some(row) => serde_json::to_value(flatten::flat_deductions(row, &entry.method_details))
            .map_err(|e| serialize_err(id, "deductions", e))?,
        None => serde_json::Value::Null,
    };

    let header = &entry.header;
    Ok(FlatEntry {
        id: header.entry_id.clone(),
        form_id: header.form_id.clone(),
        clinic_id: header.clinic_id.clone(),
        user_id: header.user_id.clone(),
        quarter_id: header.quarter_id.clone(),
        entry_date: header.entry_date.clone(),
        description: header.description.clone(),
        values: serde_json::to_value(values).map_err(|e| serialize_err(id, "values", e))?,
        calculations,
        deductions,
        created_at: header.created_at.clone(),
        updated_at: header.updated_at.clone(),
        deleted_at: header.deleted_at.clone(),
    })
}

fn serialize_err(entry_id: &str, context: &str, e: serde_json::Error) -> BridgeError {
    BridgeError::Serialize {
        entry_id: entry_id.to_string(),
        context: context.to_string(),
        message: e.to_string(),
    }
}
