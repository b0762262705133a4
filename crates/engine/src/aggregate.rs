//! Aggregation and the service-facility deduction chain.

use rust_decimal::Decimal;

use dentbooks_forms::{DeductionsInput, FormDefinition, FormType, PaymentResponsibility};

use crate::config::EngineConfig;
use crate::numeric::{percent_of, positive, round2};
use crate::result::{BreakdownLine, DeductionBreakdown, FieldCalculation, Totals};

/// Rounded entry totals plus the deduction block, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub totals: Totals,
    pub net_payable: Option<Decimal>,
    pub net_receivable: Option<Decimal>,
    pub net_fee: Option<Decimal>,
    pub deductions: Option<DeductionBreakdown>,
}

pub fn aggregate(
    combined: &Totals,
    form: &FormDefinition,
    deductions: Option<&DeductionsInput>,
    calculations: &[FieldCalculation],
    config: &EngineConfig,
) -> Aggregate {
    let totals = combined.rounded();

    let net_payable = (form.form_type == FormType::Expense).then_some(totals.total_amount);
    let net_receivable = matches!(form.form_type, FormType::Income | FormType::Unknown)
        .then_some(totals.total_amount);
    let net_fee = form
        .form_type
        .is_income_bearing()
        .then_some(totals.base_amount);

    let deductions = net_fee.and_then(|fee| {
        let percent = effective_service_fee_percent(form, deductions)?;
        Some(deduction_chain(fee, percent, form, deductions, calculations, config))
    });

    Aggregate {
        totals,
        net_payable,
        net_receivable,
        net_fee,
        deductions,
    }
}

/// The entry's own fee percentage if positive, else the form's if positive.
pub fn effective_service_fee_percent(
    form: &FormDefinition,
    deductions: Option<&DeductionsInput>,
) -> Option<Decimal> {
    positive(deductions.and_then(|d| d.service_facility_fee_percent))
        .or_else(|| positive(form.service_facility_fee_percent))
}

fn deduction_chain(
    net_fee: Decimal,
    percent: Decimal,
    form: &FormDefinition,
    deductions: Option<&DeductionsInput>,
    calculations: &[FieldCalculation],
    config: &EngineConfig,
) -> DeductionBreakdown {
    let service_fee_base = match deductions.and_then(|d| d.service_fee_override) {
        Some(fee) => round2(fee),
        None => round2(percent_of(net_fee, percent)),
    };
    let gst_on_service_fee = round2(percent_of(service_fee_base, config.service_fee_gst_rate));
    let total_service_fee = round2(service_fee_base + gst_on_service_fee);

    let (reduction_breakdown, reimbursement_breakdown) = split_expenses(form, deductions, calculations);
    let total_reductions = round2(reduction_breakdown.iter().map(|l| l.total_amount).sum());
    let total_reimbursements = round2(reimbursement_breakdown.iter().map(|l| l.total_amount).sum());

    // Clinic-paid lines only give back their GST.
    let reduction_gst: Decimal = reduction_breakdown.iter().map(|l| l.gst_amount).sum();
    let remitted_amount =
        round2(net_fee - total_service_fee + total_reimbursements - reduction_gst);

    tracing::debug!(
        form_id = %form.id,
        %percent,
        %total_service_fee,
        reductions = reduction_breakdown.len(),
        reimbursements = reimbursement_breakdown.len(),
        %remitted_amount,
        "deduction chain computed"
    );

    DeductionBreakdown {
        service_facility_fee_percent: percent,
        service_fee_base,
        gst_on_service_fee,
        total_service_fee,
        total_reductions,
        total_reimbursements,
        reduction_breakdown,
        reimbursement_breakdown,
        subtotal_after_deductions: round2(net_fee - service_fee_base),
        remitted_amount,
    }
}

/// Route each calculated expense-section field to reductions (clinic pays)
/// or reimbursements (owner pays), in form order.
fn split_expenses(
    form: &FormDefinition,
    deductions: Option<&DeductionsInput>,
    calculations: &[FieldCalculation],
) -> (Vec<BreakdownLine>, Vec<BreakdownLine>) {
    let entry_responsibility = deductions.and_then(|d| d.entry_payment_responsibility);
    let mut reductions = Vec::new();
    let mut reimbursements = Vec::new();

    for field in form.fields.iter().filter(|f| f.is_expense()) {
        let Some(calc) = calculations.iter().find(|c| c.field_id == field.id) else {
            continue;
        };
        let responsibility = field
            .payment_responsibility
            .or(entry_responsibility)
            .unwrap_or_default();
        match responsibility {
            PaymentResponsibility::Clinic => reductions.push(BreakdownLine::from(calc)),
            PaymentResponsibility::Owner => reimbursements.push(BreakdownLine::from(calc)),
        }
    }
    (reductions, reimbursements)
}
