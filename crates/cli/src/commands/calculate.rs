use std::path::Path;

use dentbooks_engine::{CalculationResult, EngineConfig, MethodBreakdown};
use rust_decimal::Decimal;

use crate::{print_json, read_json, OutputFormat};

pub(crate) fn cmd_calculate(
    form_path: &Path,
    values_path: &Path,
    deductions_path: Option<&Path>,
    config: &EngineConfig,
    output: OutputFormat,
    quiet: bool,
) -> Result<(), String> {
    let form = read_json(form_path)?;
    let values = read_json(values_path)?;
    let deductions = match deductions_path {
        Some(path) => read_json(path)?,
        None => serde_json::Value::Null,
    };

    let result = dentbooks_engine::calculate_json(&form, &values, &deductions, config)
        .map_err(|e| e.to_string())?;

    if quiet {
        return Ok(());
    }
    match output {
        OutputFormat::Json => print_json(&result.to_json()),
        OutputFormat::Text => {
            print_text(&result);
            Ok(())
        }
    }
}

fn money(amount: Option<Decimal>) -> String {
    amount.map_or_else(|| "-".to_string(), |a| a.to_string())
}

fn print_text(result: &CalculationResult) {
    println!(
        "Method: {}  Form type: {}",
        result.calculation_method, result.form_type
    );
    if !result.field_totals.is_empty() {
        println!("Fields:");
        for f in &result.field_totals {
            println!(
                "  {:<24} base {:>12}  gst {:>10}  total {:>12}",
                f.field_name, f.base_amount, f.gst_amount, f.total_amount
            );
        }
    }
    println!(
        "Totals: base {}  gst {}  total {}",
        result.total_base_amount, result.total_gst_amount, result.total_amount
    );
    if let (Some(income), Some(expense)) = (&result.income_totals, &result.expense_totals) {
        println!("  income total {}  expense total {}", income.total_amount, expense.total_amount);
    }
    if let Some(fee) = result.net_fee {
        println!("Net fee: {}", fee);
    }
    if let Some(payable) = result.net_payable {
        println!("Net payable: {}", payable);
    }
    if let Some(receivable) = result.net_receivable {
        println!("Net receivable: {}", receivable);
    }

    let bas = &result.bas_mapping;
    println!(
        "BAS: 1A {}  1B {}  G1 {}  G11 {}",
        money(bas.gst_on_sales_1a),
        money(bas.gst_credit_1b),
        money(bas.total_sales_g1),
        money(bas.expenses_g11)
    );

    if let Some(d) = &result.deductions {
        println!(
            "Service fee ({}%): {} + gst {} = {}",
            d.service_facility_fee_percent, d.service_fee_base, d.gst_on_service_fee, d.total_service_fee
        );
        println!(
            "Reductions {} ({} line(s))  Reimbursements {} ({} line(s))",
            d.total_reductions,
            d.reduction_breakdown.len(),
            d.total_reimbursements,
            d.reimbursement_breakdown.len()
        );
        println!("Remitted: {}", d.remitted_amount);
    }

    match &result.method_details {
        Some(MethodBreakdown::Net(n)) => {
            println!("Commission: {}", money(n.commission));
            if n.super_holding_enabled {
                println!(
                    "  commission {}  super {}",
                    money(n.commission_component),
                    money(n.super_component)
                );
            }
        }
        Some(MethodBreakdown::Gross(g)) => {
            if let Some(o) = &g.outwork {
                println!("Outwork charge: {}", o.total_charge);
            }
            if !g.additional_reductions.is_empty() {
                println!("Additional reductions: {}", g.total_additional_reductions);
            }
            if let Some(remittance) = g.final_remittance {
                println!("Final remittance: {}", remittance);
            }
        }
        None => {}
    }
}
