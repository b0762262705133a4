//! Normalized → flat: one reassembly function per table.

use rust_decimal::Decimal;

use dentbooks_engine::{
    AdditionalReduction, BasMapping, BreakdownLine, CalculationResult, DeductionBreakdown,
    FieldCalculation, GrossBreakdown, MethodBreakdown, NetBreakdown, OutworkCharge, Totals,
};
use dentbooks_forms::{AdditionalReductionInput, DeductionsInput, EntryValue, OutworkInput};

use crate::error::BridgeError;
use crate::record::*;

/// Rows sorted by `display_order`, whatever order they arrived in.
fn ordered<T: Clone>(rows: &[T], key: impl Fn(&T) -> i64) -> Vec<T> {
    let mut rows = rows.to_vec();
    rows.sort_by_key(|r| key(r));
    rows
}

pub(super) fn flat_values(
    entry_id: &str,
    rows: &[FieldValueRow],
) -> Result<Vec<EntryValue>, BridgeError> {
    ordered(rows, |r| r.display_order)
        .into_iter()
        .map(|row| -> Result<EntryValue, BridgeError> {
            let value: serde_json::Value = serde_json::from_str(&row.value_json).map_err(|e| {
                BridgeError::InvalidStoredValue {
                    entry_id: entry_id.to_string(),
                    field_id: row.field_id.clone(),
                    message: e.to_string(),
                }
            })?;
            Ok(EntryValue {
                field_id: row.field_id,
                field_name: row.field_name,
                value,
                manual_gst_amount: row.manual_gst_amount,
            })
        })
        .collect()
}

pub(super) fn flat_calculation(entry: &NormalizedEntry, summary: &SummaryRow) -> CalculationResult {
    CalculationResult {
        calculation_method: entry.header.calculation_method,
        form_type: entry.header.form_type,
        field_totals: flat_field_calculations(&entry.field_calculations),
        total_base_amount: summary.total_base_amount,
        total_gst_amount: summary.total_gst_amount,
        total_amount: summary.total_amount,
        income_totals: totals_from(
            summary.income_base_amount,
            summary.income_gst_amount,
            summary.income_total_amount,
        ),
        expense_totals: totals_from(
            summary.expense_base_amount,
            summary.expense_gst_amount,
            summary.expense_total_amount,
        ),
        net_payable: summary.net_payable,
        net_receivable: summary.net_receivable,
        net_fee: summary.net_fee,
        bas_mapping: flat_bas_mapping(summary),
        deductions: flat_deduction_block(
            summary,
            &entry.gross_reductions,
            &entry.gross_reimbursements,
        ),
        method_details: flat_method_details(&entry.method_details),
    }
}

fn flat_field_calculations(rows: &[FieldCalculationRow]) -> Vec<FieldCalculation> {
    ordered(rows, |r| r.display_order)
        .into_iter()
        .map(|row| FieldCalculation {
            field_id: row.field_id,
            field_name: row.field_name,
            base_amount: row.base_amount,
            gst_amount: row.gst_amount,
            total_amount: row.total_amount,
            gst_rate: row.gst_rate,
            gst_type: row.gst_type,
        })
        .collect()
}

fn totals_from(
    base: Option<Decimal>,
    gst: Option<Decimal>,
    total: Option<Decimal>,
) -> Option<Totals> {
    Some(Totals {
        base_amount: base?,
        gst_amount: gst?,
        total_amount: total?,
    })
}

fn flat_bas_mapping(summary: &SummaryRow) -> BasMapping {
    BasMapping {
        gst_on_sales_1a: summary.bas_gst_on_sales_1a,
        gst_credit_1b: summary.bas_gst_credit_1b,
        total_sales_g1: summary.bas_total_sales_g1,
        expenses_g11: summary.bas_expenses_g11,
    }
}

/// The deduction block exists only when every scalar column is set.
fn flat_deduction_block(
    summary: &SummaryRow,
    reductions: &[GrossReductionRow],
    reimbursements: &[GrossReimbursementRow],
) -> Option<DeductionBreakdown> {
    Some(DeductionBreakdown {
        service_facility_fee_percent: summary.service_facility_fee_percent?,
        service_fee_base: summary.service_fee_base?,
        gst_on_service_fee: summary.gst_on_service_fee?,
        total_service_fee: summary.total_service_fee?,
        total_reductions: summary.total_reductions?,
        total_reimbursements: summary.total_reimbursements?,
        reduction_breakdown: flat_breakdown_lines(reductions),
        reimbursement_breakdown: flat_breakdown_lines(reimbursements),
        subtotal_after_deductions: summary.subtotal_after_deductions?,
        remitted_amount: summary.remitted_amount?,
    })
}

fn flat_breakdown_lines(rows: &[BreakdownLineRow]) -> Vec<BreakdownLine> {
    ordered(rows, |r| r.display_order)
        .into_iter()
        .map(|row| BreakdownLine {
            field_id: row.field_id,
            field_name: row.field_name,
            base_amount: row.base_amount,
            gst_amount: row.gst_amount,
            total_amount: row.total_amount,
        })
        .collect()
}

fn flat_method_details(details: &MethodDetails) -> Option<MethodBreakdown> {
    match details {
        MethodDetails::Net(row) => Some(MethodBreakdown::Net(flat_net_details(row))),
        MethodDetails::Gross {
            details,
            additional_reductions,
            reductions_summary,
            outwork,
        } => Some(MethodBreakdown::Gross(GrossBreakdown {
            outwork: outwork.as_ref().map(flat_outwork),
            additional_reductions: flat_additional_reductions(additional_reductions),
            total_additional_reductions: details.total_additional_reductions,
            reductions_summary: reductions_summary.as_ref().map(|s| Totals {
                base_amount: s.base_amount,
                gst_amount: s.gst_amount,
                total_amount: s.total_amount,
            }),
            final_remittance: details.final_remittance,
        })),
        MethodDetails::None => None,
    }
}

fn flat_net_details(row: &NetDetailsRow) -> NetBreakdown {
    NetBreakdown {
        commission_percent: row.commission_percent,
        commission: row.commission,
        super_holding_enabled: row.super_holding_enabled,
        super_percent: row.super_percent,
        commission_component: row.commission_component,
        super_component: row.super_component,
    }
}

fn flat_outwork(row: &GrossOutworkRow) -> OutworkCharge {
    OutworkCharge {
        amount: row.amount,
        rate_percent: row.rate_percent,
        charge_amount: row.charge_amount,
        gst_amount: row.gst_amount,
        total_charge: row.total_charge,
    }
}

fn flat_additional_reductions(rows: &[GrossAdditionalReductionRow]) -> Vec<AdditionalReduction> {
    ordered(rows, |r| r.display_order)
        .into_iter()
        .map(|row| AdditionalReduction {
            description: row.description,
            amount: row.amount,
        })
        .collect()
}

/// Rebuild the caller's overrides.
pub(super) fn flat_deductions(row: &DeductionsRow, method_details: &MethodDetails) -> DeductionsInput {
    let outwork = (row.outwork_enabled.is_some() || row.outwork_amount.is_some()).then(|| {
        OutworkInput {
            enabled: row.outwork_enabled.unwrap_or(false),
            amount: row.outwork_amount.unwrap_or(Decimal::ZERO),
            rate_percent: row.outwork_rate_percent,
        }
    });
    let additional_reductions = match method_details {
        // Older gross entries kept only the rounded calculated lines.
        MethodDetails::Gross {
            additional_reductions,
            ..
        } if row.additional_reductions.is_empty() => {
            ordered(additional_reductions, |r| r.display_order)
                .into_iter()
                .map(|r| AdditionalReductionInput {
                    description: r.description,
                    amount: r.amount,
                })
                .collect()
        }
        _ => ordered(&row.additional_reductions, |r| r.display_order)
            .into_iter()
            .map(|r| AdditionalReductionInput {
                description: r.description,
                amount: r.amount,
            })
            .collect(),
    };
    DeductionsInput {
        service_facility_fee_percent: row.service_facility_fee_percent,
        service_fee_override: row.service_fee_override,
        entry_payment_responsibility: row.entry_payment_responsibility,
        commission_percent: row.commission_percent,
        super_holding_enabled: row.super_holding_enabled,
        super_percent: row.super_percent,
        outwork,
        additional_reductions,
    }
}
