//! Method detail pass: commission and super for `net` forms, outwork and
//! additional reductions for `gross` forms.

use rust_decimal::Decimal;

use dentbooks_forms::{CalculationMethod, DeductionsInput, FormDefinition, OutworkInput};

use crate::aggregate::Aggregate;
use crate::config::EngineConfig;
use crate::numeric::{checked_percent_of, percent_of, positive, remove_markup, round2};
use crate::result::{
    AdditionalReduction, GrossBreakdown, MethodBreakdown, NetBreakdown, OutworkCharge, Totals,
};

pub fn method_details(
    form: &FormDefinition,
    aggregate: &Aggregate,
    deductions: Option<&DeductionsInput>,
    config: &EngineConfig,
) -> Option<MethodBreakdown> {
    match form.calculation_method {
        CalculationMethod::Net => Some(MethodBreakdown::Net(net_details(
            form, aggregate, deductions, config,
        ))),
        CalculationMethod::Gross => Some(MethodBreakdown::Gross(gross_details(
            aggregate, deductions, config,
        ))),
        CalculationMethod::Unknown => None,
    }
}

/// Split a super-inclusive commission into its commission and super parts.
///
/// Returns `None` for a -100% super rate, or when either part overflows.
pub fn split_super(commission: Decimal, super_percent: Decimal) -> Option<(Decimal, Decimal)> {
    let component = round2(remove_markup(commission, super_percent)?);
    Some((component, round2(checked_percent_of(component, super_percent)?)))
}

fn net_details(
    form: &FormDefinition,
    aggregate: &Aggregate,
    deductions: Option<&DeductionsInput>,
    config: &EngineConfig,
) -> NetBreakdown {
    let commission_percent = positive(deductions.and_then(|d| d.commission_percent))
        .or_else(|| positive(form.commission_percent));
    let commission = match (aggregate.net_fee, commission_percent) {
        (Some(fee), Some(pct)) => Some(round2(percent_of(fee, pct))),
        _ => None,
    };
    let super_holding_enabled = deductions
        .and_then(|d| d.super_holding_enabled)
        .unwrap_or(form.super_holding_enabled);

    let mut details = NetBreakdown {
        commission_percent,
        commission,
        super_holding_enabled,
        ..NetBreakdown::default()
    };

    if let (true, Some(commission)) = (super_holding_enabled, commission) {
        let super_percent = deductions
            .and_then(|d| d.super_percent)
            .or(form.super_percent)
            .unwrap_or(config.default_super_percent);
        details.super_percent = Some(super_percent);
        if let Some((commission_component, super_component)) = split_super(commission, super_percent) {
            details.commission_component = Some(commission_component);
            details.super_component = Some(super_component);
        }
    }
    details
}

fn gross_details(
    aggregate: &Aggregate,
    deductions: Option<&DeductionsInput>,
    config: &EngineConfig,
) -> GrossBreakdown {
    let outwork = deductions
        .and_then(|d| d.outwork.as_ref())
        .and_then(|o| outwork_charge(o, config));

    let additional_reductions: Vec<AdditionalReduction> = deductions
        .map(|d| {
            d.additional_reductions
                .iter()
                .map(|r| AdditionalReduction {
                    description: r.description.clone(),
                    amount: round2(r.amount),
                })
                .collect()
        })
        .unwrap_or_default();
    let total_additional_reductions = round2(additional_reductions.iter().map(|r| r.amount).sum());

    let mut details = GrossBreakdown {
        outwork,
        additional_reductions,
        total_additional_reductions,
        reductions_summary: None,
        final_remittance: None,
    };

    if let Some(block) = &aggregate.deductions {
        let mut summary = Totals::default();
        for line in &block.reduction_breakdown {
            summary.base_amount += line.base_amount;
            summary.gst_amount += line.gst_amount;
            summary.total_amount += line.total_amount;
        }
        details.reductions_summary = Some(summary.rounded());

        let outwork_total = details
            .outwork
            .as_ref()
            .map_or(Decimal::ZERO, |o| o.total_charge);
        details.final_remittance = Some(round2(
            block.remitted_amount - outwork_total - details.total_additional_reductions,
        ));
    }
    details
}

fn outwork_charge(input: &OutworkInput, config: &EngineConfig) -> Option<OutworkCharge> {
    if !input.enabled || input.amount <= Decimal::ZERO {
        return None;
    }
    let rate_percent = input
        .rate_percent
        .unwrap_or(config.default_outwork_rate_percent);
    let charge_amount = round2(percent_of(input.amount, rate_percent));
    let gst_amount = round2(percent_of(charge_amount, config.outwork_gst_rate));
    Some(OutworkCharge {
        amount: round2(input.amount),
        rate_percent,
        charge_amount,
        gst_amount,
        total_charge: round2(charge_amount + gst_amount),
    })
}
