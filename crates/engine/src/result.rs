//! The flat calculation result and its parts.
//!
//! `CalculationResult` serializes to the single camelCase JSON object that
//! API responses and the stored `calculations` column carry. Groups of keys
//! that are present or absent together (the deduction block, the method
//! details) are flattened optional structs, so a missing group reads back as
//! `None` rather than as zeroes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dentbooks_forms::{CalculationMethod, FormType, GstType};

use crate::gst::GstSplit;
use crate::numeric::round2;

/// A base/GST/total triple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub base_amount: Decimal,
    pub gst_amount: Decimal,
    pub total_amount: Decimal,
}

impl Totals {
    pub fn add(&mut self, split: &GstSplit) {
        self.base_amount += split.base;
        self.gst_amount += split.gst;
        self.total_amount += split.total;
    }

    /// Component-wise `self − other`.
    pub fn minus(self, other: Totals) -> Totals {
        Totals {
            base_amount: self.base_amount - other.base_amount,
            gst_amount: self.gst_amount - other.gst_amount,
            total_amount: self.total_amount - other.total_amount,
        }
    }

    pub fn rounded(self) -> Totals {
        Totals {
            base_amount: round2(self.base_amount),
            gst_amount: round2(self.gst_amount),
            total_amount: round2(self.total_amount),
        }
    }
}

/// Per-field GST breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCalculation {
    pub field_id: String,
    pub field_name: String,
    pub base_amount: Decimal,
    pub gst_amount: Decimal,
    pub total_amount: Decimal,
    pub gst_rate: Decimal,
    /// Absent when the field has no enabled GST configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst_type: Option<GstType>,
}

/// One expense line in the reduction or reimbursement breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownLine {
    pub field_id: String,
    pub field_name: String,
    pub base_amount: Decimal,
    pub gst_amount: Decimal,
    pub total_amount: Decimal,
}

impl From<&FieldCalculation> for BreakdownLine {
    fn from(calc: &FieldCalculation) -> Self {
        BreakdownLine {
            field_id: calc.field_id.clone(),
            field_name: calc.field_name.clone(),
            base_amount: calc.base_amount,
            gst_amount: calc.gst_amount,
            total_amount: calc.total_amount,
        }
    }
}

/// BAS label amounts. Labels that do not apply to the form type are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasMapping {
    #[serde(rename = "gstOnSales1A", default, skip_serializing_if = "Option::is_none")]
    pub gst_on_sales_1a: Option<Decimal>,
    #[serde(rename = "gstCredit1B", default, skip_serializing_if = "Option::is_none")]
    pub gst_credit_1b: Option<Decimal>,
    #[serde(rename = "totalSalesG1", default, skip_serializing_if = "Option::is_none")]
    pub total_sales_g1: Option<Decimal>,
    #[serde(rename = "expensesG11", default, skip_serializing_if = "Option::is_none")]
    pub expenses_g11: Option<Decimal>,
}

/// Service-facility fee chain. Present only on income-bearing forms with a
/// positive effective fee percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionBreakdown {
    pub service_facility_fee_percent: Decimal,
    pub service_fee_base: Decimal,
    pub gst_on_service_fee: Decimal,
    pub total_service_fee: Decimal,
    pub total_reductions: Decimal,
    pub total_reimbursements: Decimal,
    pub reduction_breakdown: Vec<BreakdownLine>,
    pub reimbursement_breakdown: Vec<BreakdownLine>,
    pub subtotal_after_deductions: Decimal,
    pub remitted_amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetBreakdown {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_percent: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission: Option<Decimal>,
    #[serde(default)]
    pub super_holding_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_percent: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_component: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_component: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutworkCharge {
    pub amount: Decimal,
    pub rate_percent: Decimal,
    pub charge_amount: Decimal,
    pub gst_amount: Decimal,
    pub total_charge: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalReduction {
    #[serde(default)]
    pub description: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrossBreakdown {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outwork: Option<OutworkCharge>,
    #[serde(default)]
    pub additional_reductions: Vec<AdditionalReduction>,
    #[serde(default)]
    pub total_additional_reductions: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reductions_summary: Option<Totals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_remittance: Option<Decimal>,
}

/// Method-specific details, serialized under `netDetails` or `grossDetails`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodBreakdown {
    #[serde(rename = "netDetails")]
    Net(NetBreakdown),
    #[serde(rename = "grossDetails")]
    Gross(GrossBreakdown),
}

impl MethodBreakdown {
    pub fn method(&self) -> CalculationMethod {
        match self {
            MethodBreakdown::Net(_) => CalculationMethod::Net,
            MethodBreakdown::Gross(_) => CalculationMethod::Gross,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub calculation_method: CalculationMethod,
    pub form_type: FormType,
    #[serde(default)]
    pub field_totals: Vec<FieldCalculation>,
    pub total_base_amount: Decimal,
    #[serde(rename = "totalGSTAmount")]
    pub total_gst_amount: Decimal,
    pub total_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_totals: Option<Totals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expense_totals: Option<Totals>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_payable: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_receivable: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_fee: Option<Decimal>,
    #[serde(default)]
    pub bas_mapping: BasMapping,
    #[serde(flatten)]
    pub deductions: Option<DeductionBreakdown>,
    #[serde(flatten)]
    pub method_details: Option<MethodBreakdown>,
}

impl CalculationResult {
    pub fn net_details(&self) -> Option<&NetBreakdown> {
        match &self.method_details {
            Some(MethodBreakdown::Net(net)) => Some(net),
            _ => None,
        }
    }

    pub fn gross_details(&self) -> Option<&GrossBreakdown> {
        match &self.method_details {
            Some(MethodBreakdown::Gross(gross)) => Some(gross),
            _ => None,
        }
    }

    /// Serialize to the flat JSON shape.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Read a flat JSON calculation back into the typed result.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        CalculationResult::deserialize(value)
    }
}
