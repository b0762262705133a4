//! Flat → normalized: one row-building function per table.

use dentbooks_engine::method::split_super;
use dentbooks_engine::{
    AdditionalReduction, BreakdownLine, CalculationResult, EngineConfig, GrossBreakdown,
    NetBreakdown, OutworkCharge, Totals,
};
use dentbooks_forms::{CalculationMethod, DeductionsInput, EntryValue, FormDefinition};

use crate::error::BridgeError;
use crate::record::*;

/// Read the stored `calculations` document. `null`, `{}` and the empty
/// string mean the entry has not been calculated.
pub(super) fn parse_calculations(
    entry_id: &str,
    value: &serde_json::Value,
) -> Result<Option<CalculationResult>, BridgeError> {
    let invalid = |message: String| BridgeError::InvalidCalculations {
        entry_id: entry_id.to_string(),
        message,
    };
    let Some(doc) = embedded_document(value).map_err(|e| invalid(e.to_string()))? else {
        return Ok(None);
    };
    match &doc {
        serde_json::Value::Object(map) if map.is_empty() => Ok(None),
        serde_json::Value::Object(_) => CalculationResult::from_json(&doc)
            .map(Some)
            .map_err(|e| invalid(e.to_string())),
        _ => Err(invalid("expected a JSON object".to_string())),
    }
}

/// Read the stored `deductions` document. `null` and the empty string mean
/// no overrides were supplied.
pub(super) fn parse_deductions(
    entry_id: &str,
    value: &serde_json::Value,
) -> Result<Option<DeductionsInput>, BridgeError> {
    let doc = embedded_document(value).map_err(|e| {
        BridgeError::Form(dentbooks_forms::FormError::InvalidJson {
            context: format!("deductions of entry {}", entry_id),
            message: e.to_string(),
        })
    })?;
    match doc {
        None => Ok(None),
        Some(doc) => Ok(Some(dentbooks_forms::parse_deductions(&doc)?)),
    }
}

/// Unwrap a document stored either inline or as a JSON string.
fn embedded_document(
    value: &serde_json::Value,
) -> Result<Option<serde_json::Value>, serde_json::Error> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(None),
        serde_json::Value::String(s) => {
            let doc: serde_json::Value = serde_json::from_str(s)?;
            Ok((!doc.is_null()).then_some(doc))
        }
        other => Ok(Some(other.clone())),
    }
}

pub(super) fn header_row(
    entry: &FlatEntry,
    form: &FormDefinition,
    calculation: Option<&CalculationResult>,
) -> EntryHeader {
    EntryHeader {
        entry_id: entry.id.clone(),
        form_id: entry.form_id.clone(),
        clinic_id: entry.clinic_id.clone(),
        user_id: entry.user_id.clone(),
        quarter_id: entry.quarter_id.clone(),
        entry_date: entry.entry_date.clone(),
        description: entry.description.clone(),
        calculation_method: form.calculation_method,
        form_type: calculation.map_or(form.form_type, |c| c.form_type),
        created_at: entry.created_at.clone(),
        updated_at: entry.updated_at.clone(),
        deleted_at: entry.deleted_at.clone(),
    }
}

pub(super) fn field_value_rows(entry_id: &str, values: &[EntryValue]) -> Vec<FieldValueRow> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| FieldValueRow {
            entry_id: entry_id.to_string(),
            field_id: v.field_id.clone(),
            field_name: v.field_name.clone(),
            value_kind: ValueKind::of(&v.value),
            value_json: v.value.to_string(),
            numeric_value: v.amount(),
            manual_gst_amount: v.manual_gst_amount,
            display_order: i as i64,
        })
        .collect()
}

pub(super) fn field_calculation_rows(
    entry_id: &str,
    calculation: &CalculationResult,
    form: &FormDefinition,
) -> Vec<FieldCalculationRow> {
    calculation
        .field_totals
        .iter()
        .enumerate()
        .map(|(i, c)| FieldCalculationRow {
            entry_id: entry_id.to_string(),
            field_id: c.field_id.clone(),
            field_name: c.field_name.clone(),
            base_amount: c.base_amount,
            gst_amount: c.gst_amount,
            total_amount: c.total_amount,
            gst_rate: c.gst_rate,
            gst_type: c.gst_type,
            section: form
                .field(&c.field_id)
                .map(|f| f.section.clone())
                .unwrap_or_default(),
            display_order: i as i64,
        })
        .collect()
}

pub(super) fn summary_row(entry_id: &str, c: &CalculationResult) -> SummaryRow {
    let income = c.income_totals;
    let expense = c.expense_totals;
    let block = c.deductions.as_ref();
    SummaryRow {
        entry_id: entry_id.to_string(),
        total_base_amount: c.total_base_amount,
        total_gst_amount: c.total_gst_amount,
        total_amount: c.total_amount,
        income_base_amount: income.map(|t| t.base_amount),
        income_gst_amount: income.map(|t| t.gst_amount),
        income_total_amount: income.map(|t| t.total_amount),
        expense_base_amount: expense.map(|t| t.base_amount),
        expense_gst_amount: expense.map(|t| t.gst_amount),
        expense_total_amount: expense.map(|t| t.total_amount),
        net_payable: c.net_payable,
        net_receivable: c.net_receivable,
        net_fee: c.net_fee,
        bas_gst_on_sales_1a: c.bas_mapping.gst_on_sales_1a,
        bas_gst_credit_1b: c.bas_mapping.gst_credit_1b,
        bas_total_sales_g1: c.bas_mapping.total_sales_g1,
        bas_expenses_g11: c.bas_mapping.expenses_g11,
        service_facility_fee_percent: block.map(|d| d.service_facility_fee_percent),
        service_fee_base: block.map(|d| d.service_fee_base),
        gst_on_service_fee: block.map(|d| d.gst_on_service_fee),
        total_service_fee: block.map(|d| d.total_service_fee),
        total_reductions: block.map(|d| d.total_reductions),
        total_reimbursements: block.map(|d| d.total_reimbursements),
        subtotal_after_deductions: block.map(|d| d.subtotal_after_deductions),
        remitted_amount: block.map(|d| d.remitted_amount),
    }
}

/// Method rows keyed by the form's method. A known method always gets its
/// detail row, empty when the entry has no calculation yet.
pub(super) fn method_detail_rows(
    entry_id: &str,
    method: CalculationMethod,
    calculation: Option<&CalculationResult>,
    config: &EngineConfig,
) -> MethodDetails {
    match method {
        CalculationMethod::Net => MethodDetails::Net(net_details_row(
            entry_id,
            calculation.and_then(|c| c.net_details()),
            config,
        )),
        CalculationMethod::Gross => {
            gross_detail_rows(entry_id, calculation.and_then(|c| c.gross_details()))
        }
        CalculationMethod::Unknown => MethodDetails::None,
    }
}

pub(super) fn net_details_row(
    entry_id: &str,
    net: Option<&NetBreakdown>,
    config: &EngineConfig,
) -> NetDetailsRow {
    let Some(net) = net else {
        return NetDetailsRow {
            entry_id: entry_id.to_string(),
            ..NetDetailsRow::default()
        };
    };
    let mut row = NetDetailsRow {
        entry_id: entry_id.to_string(),
        commission_percent: net.commission_percent,
        commission: net.commission,
        super_holding_enabled: net.super_holding_enabled,
        super_percent: net.super_percent,
        commission_component: net.commission_component,
        super_component: net.super_component,
    };

    // Older entries stored only the commission.
    let components_missing = row.commission_component.is_none() || row.super_component.is_none();
    if let (true, true, Some(commission)) =
        (row.super_holding_enabled, components_missing, row.commission)
    {
        let super_percent = row.super_percent.unwrap_or(config.default_super_percent);
        if let Some((commission_component, super_component)) =
            split_super(commission, super_percent)
        {
            tracing::debug!(entry_id, %super_percent, "recomputed super split for net details");
            row.super_percent = Some(super_percent);
            row.commission_component = Some(commission_component);
            row.super_component = Some(super_component);
        }
    }
    row
}

fn gross_detail_rows(entry_id: &str, gross: Option<&GrossBreakdown>) -> MethodDetails {
    let empty = GrossBreakdown::default();
    let gross = gross.unwrap_or(&empty);
    MethodDetails::Gross {
        details: GrossDetailsRow {
            entry_id: entry_id.to_string(),
            total_additional_reductions: gross.total_additional_reductions,
            final_remittance: gross.final_remittance,
        },
        additional_reductions: additional_reduction_rows(entry_id, &gross.additional_reductions),
        reductions_summary: gross
            .reductions_summary
            .map(|t| reductions_summary_row(entry_id, &t)),
        outwork: gross.outwork.as_ref().map(|o| outwork_row(entry_id, o)),
    }
}

fn additional_reduction_rows(
    entry_id: &str,
    reductions: &[AdditionalReduction],
) -> Vec<GrossAdditionalReductionRow> {
    reductions
        .iter()
        .enumerate()
        .map(|(i, r)| GrossAdditionalReductionRow {
            entry_id: entry_id.to_string(),
            description: r.description.clone(),
            amount: r.amount,
            display_order: i as i64,
        })
        .collect()
}

fn reductions_summary_row(entry_id: &str, totals: &Totals) -> GrossReductionsSummaryRow {
    GrossReductionsSummaryRow {
        entry_id: entry_id.to_string(),
        base_amount: totals.base_amount,
        gst_amount: totals.gst_amount,
        total_amount: totals.total_amount,
    }
}

fn outwork_row(entry_id: &str, outwork: &OutworkCharge) -> GrossOutworkRow {
    GrossOutworkRow {
        entry_id: entry_id.to_string(),
        amount: outwork.amount,
        rate_percent: outwork.rate_percent,
        charge_amount: outwork.charge_amount,
        gst_amount: outwork.gst_amount,
        total_charge: outwork.total_charge,
    }
}

/// Rows for the reduction or the reimbursement table.
pub(super) fn breakdown_rows(entry_id: &str, lines: &[BreakdownLine]) -> Vec<BreakdownLineRow> {
    lines
        .iter()
        .enumerate()
        .map(|(i, l)| BreakdownLineRow {
            entry_id: entry_id.to_string(),
            field_id: l.field_id.clone(),
            field_name: l.field_name.clone(),
            base_amount: l.base_amount,
            gst_amount: l.gst_amount,
            total_amount: l.total_amount,
            display_order: i as i64,
        })
        .collect()
}

pub(super) fn deductions_row(entry_id: &str, d: &DeductionsInput) -> DeductionsRow {
    let outwork = d.outwork.as_ref();
    DeductionsRow {
        entry_id: entry_id.to_string(),
        service_facility_fee_percent: d.service_facility_fee_percent,
        service_fee_override: d.service_fee_override,
        entry_payment_responsibility: d.entry_payment_responsibility,
        commission_percent: d.commission_percent,
        super_holding_enabled: d.super_holding_enabled,
        super_percent: d.super_percent,
        outwork_enabled: outwork.map(|o| o.enabled),
        outwork_amount: outwork.map(|o| o.amount),
        outwork_rate_percent: outwork.and_then(|o| o.rate_percent),
        additional_reductions: d
            .additional_reductions
            .iter()
            .enumerate()
            .map(|(i, r)| DeductionReductionRow {
                entry_id: entry_id.to_string(),
                description: r.description.clone(),
                amount: r.amount,
                display_order: i as i64,
            })
            .collect(),
    }
}
