//! dentbooks calculation engine -- accepts a form definition, entry values
//! and optional deduction overrides, produces a GST-aware calculation result.
//!
//! The passes run in a fixed order:
//! 1. [`fields::compute`] resolves GST per included field and sums totals
//! 2. [`aggregate::aggregate`] rounds totals and builds the deduction chain
//! 3. [`bas::map_bas`] maps totals onto BAS labels
//! 4. [`method::method_details`] adds the net or gross details
//!
//! Every pass is pure. Nothing here touches storage.

pub mod aggregate;
pub mod bas;
pub mod config;
pub mod error;
pub mod fields;
pub mod gst;
pub mod method;
pub mod numeric;
pub mod result;

pub use config::EngineConfig;
pub use error::EngineError;
pub use result::{
    AdditionalReduction, BasMapping, BreakdownLine, CalculationResult, DeductionBreakdown,
    FieldCalculation, GrossBreakdown, MethodBreakdown, NetBreakdown, OutworkCharge, Totals,
};

use dentbooks_forms::{DeductionsInput, EntryValue, FormDefinition, FormType};

/// Calculate an entry against its form.
pub fn calculate(
    form: &FormDefinition,
    values: &[EntryValue],
    deductions: Option<&DeductionsInput>,
    config: &EngineConfig,
) -> CalculationResult {
    let pass = fields::compute(&form.fields, values, form.form_type);
    let agg = aggregate::aggregate(&pass.combined, form, deductions, &pass.calculations, config);
    let bas_mapping = bas::map_bas(form.form_type, &agg.totals, &pass.income, &pass.expense);
    let method_details = method::method_details(form, &agg, deductions, config);

    let (income_totals, expense_totals) = if form.form_type == FormType::Both {
        (Some(pass.income.rounded()), Some(pass.expense.rounded()))
    } else {
        (None, None)
    };

    tracing::debug!(
        form_id = %form.id,
        method = %form.calculation_method,
        fields = pass.calculations.len(),
        total = %agg.totals.total_amount,
        deductions = agg.deductions.is_some(),
        "entry calculated"
    );

    CalculationResult {
        calculation_method: form.calculation_method,
        form_type: form.form_type,
        field_totals: pass.calculations,
        total_base_amount: agg.totals.base_amount,
        total_gst_amount: agg.totals.gst_amount,
        total_amount: agg.totals.total_amount,
        income_totals,
        expense_totals,
        net_payable: agg.net_payable,
        net_receivable: agg.net_receivable,
        net_fee: agg.net_fee,
        bas_mapping,
        deductions: agg.deductions,
        method_details,
    }
}

/// Calculate from raw JSON.
///
/// # Arguments
/// * `form` - Form definition object
/// * `values` - Entry values array (or a string holding one, or `null`)
/// * `deductions` - Deduction overrides object, or `null`
pub fn calculate_json(
    form: &serde_json::Value,
    values: &serde_json::Value,
    deductions: &serde_json::Value,
    config: &EngineConfig,
) -> Result<CalculationResult, EngineError> {
    let form = dentbooks_forms::parse_form(form)?;
    let values = dentbooks_forms::parse_values(values)?;
    let deductions = if deductions.is_null() {
        None
    } else {
        Some(dentbooks_forms::parse_deductions(deductions)?)
    };
    Ok(calculate(&form, &values, deductions.as_ref(), config))
}
