//! Normalized record types: one struct per table, plus the flat entry shape
//! they are derived from.
//!
//! Every row carries `entry_id`. Rows that come from a list carry a
//! `display_order` used to restore the list on reconstruction.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dentbooks_forms::{CalculationMethod, FormType, GstType, PaymentResponsibility};

/// An entry as the API and the live preview see it: values, calculations
/// and deduction overrides as JSON documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatEntry {
    pub id: String,
    pub form_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinic_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarter_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub values: serde_json::Value,
    #[serde(default)]
    pub calculations: serde_json::Value,
    #[serde(default)]
    pub deductions: serde_json::Value,
    /// ISO 8601 / RFC 3339 timestamp string.
    #[serde(default)]
    pub created_at: String,
    /// ISO 8601 / RFC 3339 timestamp string.
    #[serde(default)]
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
}

/// Entry identity and lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryHeader {
    pub entry_id: String,
    pub form_id: String,
    pub clinic_id: Option<String>,
    pub user_id: Option<String>,
    pub quarter_id: Option<String>,
    pub entry_date: Option<String>,
    pub description: Option<String>,
    pub calculation_method: CalculationMethod,
    pub form_type: FormType,
    /// ISO 8601 / RFC 3339 timestamp string.
    pub created_at: String,
    /// ISO 8601 / RFC 3339 timestamp string.
    pub updated_at: String,
    /// Set by soft delete. Nothing else about the entry changes.
    pub deleted_at: Option<String>,
}

/// JSON kind of a stored field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Number,
    Text,
    Boolean,
    Null,
    Json,
}

impl ValueKind {
    pub fn of(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(_) => ValueKind::Number,
            serde_json::Value::String(_) => ValueKind::Text,
            serde_json::Value::Bool(_) => ValueKind::Boolean,
            serde_json::Value::Null => ValueKind::Null,
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => ValueKind::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValueRow {
    pub entry_id: String,
    pub field_id: String,
    pub field_name: String,
    pub value_kind: ValueKind,
    /// The value's exact JSON text; the source of truth on reconstruction.
    pub value_json: String,
    /// Numeric projection for reporting joins.
    pub numeric_value: Option<Decimal>,
    pub manual_gst_amount: Option<Decimal>,
    pub display_order: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCalculationRow {
    pub entry_id: String,
    pub field_id: String,
    pub field_name: String,
    pub base_amount: Decimal,
    pub gst_amount: Decimal,
    pub total_amount: Decimal,
    pub gst_rate: Decimal,
    pub gst_type: Option<GstType>,
    /// Copied from the form for reporting; not part of the flat result.
    pub section: String,
    pub display_order: i64,
}

/// Entry totals, BAS labels and the deduction-block scalars.
///
/// The deduction columns are all set or all unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub entry_id: String,
    pub total_base_amount: Decimal,
    pub total_gst_amount: Decimal,
    pub total_amount: Decimal,
    pub income_base_amount: Option<Decimal>,
    pub income_gst_amount: Option<Decimal>,
    pub income_total_amount: Option<Decimal>,
    pub expense_base_amount: Option<Decimal>,
    pub expense_gst_amount: Option<Decimal>,
    pub expense_total_amount: Option<Decimal>,
    pub net_payable: Option<Decimal>,
    pub net_receivable: Option<Decimal>,
    pub net_fee: Option<Decimal>,
    pub bas_gst_on_sales_1a: Option<Decimal>,
    pub bas_gst_credit_1b: Option<Decimal>,
    pub bas_total_sales_g1: Option<Decimal>,
    pub bas_expenses_g11: Option<Decimal>,
    pub service_facility_fee_percent: Option<Decimal>,
    pub service_fee_base: Option<Decimal>,
    pub gst_on_service_fee: Option<Decimal>,
    pub total_service_fee: Option<Decimal>,
    pub total_reductions: Option<Decimal>,
    pub total_reimbursements: Option<Decimal>,
    pub subtotal_after_deductions: Option<Decimal>,
    pub remitted_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetDetailsRow {
    pub entry_id: String,
    pub commission_percent: Option<Decimal>,
    pub commission: Option<Decimal>,
    pub super_holding_enabled: bool,
    pub super_percent: Option<Decimal>,
    pub commission_component: Option<Decimal>,
    pub super_component: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrossDetailsRow {
    pub entry_id: String,
    pub total_additional_reductions: Decimal,
    pub final_remittance: Option<Decimal>,
}

/// A reduction or reimbursement line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownLineRow {
    pub entry_id: String,
    pub field_id: String,
    pub field_name: String,
    pub base_amount: Decimal,
    pub gst_amount: Decimal,
    pub total_amount: Decimal,
    pub display_order: i64,
}

pub type GrossReductionRow = BreakdownLineRow;
pub type GrossReimbursementRow = BreakdownLineRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrossAdditionalReductionRow {
    pub entry_id: String,
    pub description: String,
    pub amount: Decimal,
    pub display_order: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrossReductionsSummaryRow {
    pub entry_id: String,
    pub base_amount: Decimal,
    pub gst_amount: Decimal,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrossOutworkRow {
    pub entry_id: String,
    pub amount: Decimal,
    pub rate_percent: Decimal,
    pub charge_amount: Decimal,
    pub gst_amount: Decimal,
    pub total_charge: Decimal,
}

/// The caller's deduction overrides, as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionsRow {
    pub entry_id: String,
    pub service_facility_fee_percent: Option<Decimal>,
    pub service_fee_override: Option<Decimal>,
    pub entry_payment_responsibility: Option<PaymentResponsibility>,
    pub commission_percent: Option<Decimal>,
    pub super_holding_enabled: Option<bool>,
    pub super_percent: Option<Decimal>,
    pub outwork_enabled: Option<bool>,
    pub outwork_amount: Option<Decimal>,
    pub outwork_rate_percent: Option<Decimal>,
    #[serde(default)]
    pub additional_reductions: Vec<DeductionReductionRow>,
}

/// An additional reduction as the caller entered it, unrounded and kept for
/// every method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionReductionRow {
    pub entry_id: String,
    pub description: String,
    pub amount: Decimal,
    pub display_order: i64,
}

/// Method-specific tables. Net and gross rows never coexist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum MethodDetails {
    Net(NetDetailsRow),
    Gross {
        details: GrossDetailsRow,
        additional_reductions: Vec<GrossAdditionalReductionRow>,
        reductions_summary: Option<GrossReductionsSummaryRow>,
        outwork: Option<GrossOutworkRow>,
    },
    None,
}

impl MethodDetails {
    pub fn method(&self) -> CalculationMethod {
        match self {
            MethodDetails::Net(_) => CalculationMethod::Net,
            MethodDetails::Gross { .. } => CalculationMethod::Gross,
            MethodDetails::None => CalculationMethod::Unknown,
        }
    }
}

/// Every row belonging to one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEntry {
    pub header: EntryHeader,
    pub field_values: Vec<FieldValueRow>,
    pub field_calculations: Vec<FieldCalculationRow>,
    pub summary: Option<SummaryRow>,
    pub method_details: MethodDetails,
    /// Written whenever the calculation has a deduction block, whatever the
    /// method, so flattening restores the block for net entries too.
    pub gross_reductions: Vec<GrossReductionRow>,
    pub gross_reimbursements: Vec<GrossReimbursementRow>,
    pub deductions: Option<DeductionsRow>,
}

impl NormalizedEntry {
    pub fn entry_id(&self) -> &str {
        &self.header.entry_id
    }

    pub fn is_deleted(&self) -> bool {
        self.header.deleted_at.is_some()
    }
}
