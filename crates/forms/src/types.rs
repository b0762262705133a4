//! Typed structs for form definitions and entry inputs.
//!
//! Enumerations that arrive as free-form strings upstream (field type,
//! calculation method, form type, payment responsibility) carry a lenient
//! fallback variant instead of failing, since the calling services have
//! already validated them.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Largest absolute amount accepted for any monetary input.
///
/// Keeping inputs below `10^15` leaves every product and quotient the engine
/// forms well inside `Decimal`'s 28-digit range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Largest absolute percentage accepted for rates and fee percentages.
pub const MAX_PERCENT: Decimal = Decimal::ONE_THOUSAND;

// ── Enumerations ────────────────────────────────────────────────────

/// Input widget type of a form field. Only `number` and `currency`
/// participate in calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Dropdown,
    Checkbox,
    Textarea,
    Currency,
    #[serde(other)]
    Other,
}

impl FieldType {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "text" => FieldType::Text,
            "number" => FieldType::Number,
            "date" => FieldType::Date,
            "dropdown" => FieldType::Dropdown,
            "checkbox" => FieldType::Checkbox,
            "textarea" => FieldType::Textarea,
            "currency" => FieldType::Currency,
            _ => FieldType::Other,
        }
    }

    /// Whether values of this field type are summed into totals.
    pub fn is_monetary(self) -> bool {
        matches!(self, FieldType::Number | FieldType::Currency)
    }
}

/// How a field's entered amount relates to GST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GstType {
    /// The entered amount already includes GST.
    Inclusive,
    /// GST is added on top of the entered amount.
    Exclusive,
    /// GST is supplied by the user alongside the amount.
    Manual,
}

impl GstType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "inclusive" => Some(GstType::Inclusive),
            "exclusive" => Some(GstType::Exclusive),
            "manual" => Some(GstType::Manual),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GstType::Inclusive => "inclusive",
            GstType::Exclusive => "exclusive",
            GstType::Manual => "manual",
        }
    }
}

impl fmt::Display for GstType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who pays for an expense line: the practice owner (reimbursed to the
/// practitioner) or the clinic (reduces the remittance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentResponsibility {
    Clinic,
    #[default]
    #[serde(other)]
    Owner,
}

impl PaymentResponsibility {
    /// Parse leniently: anything other than `clinic` is the owner.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("clinic") {
            PaymentResponsibility::Clinic
        } else {
            PaymentResponsibility::Owner
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentResponsibility::Owner => "owner",
            PaymentResponsibility::Clinic => "clinic",
        }
    }
}

/// Calculation variant configured on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationMethod {
    /// Commission on net revenue, optionally with superannuation holding.
    Net,
    /// Service-facility fee deducted from gross revenue.
    Gross,
    #[serde(other)]
    Unknown,
}

impl CalculationMethod {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "net" => CalculationMethod::Net,
            "gross" => CalculationMethod::Gross,
            _ => CalculationMethod::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CalculationMethod::Net => "net",
            CalculationMethod::Gross => "gross",
            CalculationMethod::Unknown => "unknown",
        }
    }

    pub fn is_known(self) -> bool {
        !matches!(self, CalculationMethod::Unknown)
    }
}

impl fmt::Display for CalculationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the form records income, expenses, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormType {
    Income,
    Expense,
    Both,
    #[serde(other)]
    Unknown,
}

impl FormType {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => FormType::Income,
            "expense" => FormType::Expense,
            "both" => FormType::Both,
            _ => FormType::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FormType::Income => "income",
            FormType::Expense => "expense",
            FormType::Both => "both",
            FormType::Unknown => "unknown",
        }
    }

    /// Income-bearing forms get a net fee and may carry deductions.
    /// Unknown types fall into the income bucket.
    pub fn is_income_bearing(self) -> bool {
        matches!(self, FormType::Income | FormType::Both | FormType::Unknown)
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true for any section string starting with "exp", ignoring case.
///
/// Section values are free-form upstream ("expense", "Expenses",
/// "expenditure", ...), so this stays a prefix check rather than an enum.
pub fn is_expense_section(section: &str) -> bool {
    section
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("exp"))
}

// ── Form definition ─────────────────────────────────────────────────

/// GST settings attached to a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GstConfig {
    pub enabled: bool,
    /// Percentage, e.g. `10` for 10%.
    pub rate: Decimal,
    #[serde(rename = "type")]
    pub gst_type: GstType,
}

/// A single field of a form definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub include_in_total: bool,
    /// Unset means "defer to the entry, then the owner".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_responsibility: Option<PaymentResponsibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst_config: Option<GstConfig>,
}

impl FormField {
    pub fn is_expense(&self) -> bool {
        is_expense_section(&self.section)
    }

    /// The GST rate and treatment in effect, or `None` for a zero-rated field.
    pub fn active_gst(&self) -> Option<(Decimal, GstType)> {
        self.gst_config
            .as_ref()
            .filter(|c| c.enabled)
            .map(|c| (c.rate, c.gst_type))
    }
}

/// A form definition as looked up by the calling use case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub calculation_method: CalculationMethod,
    pub form_type: FormType,
    pub fields: Vec<FormField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_facility_fee_percent: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_percent: Option<Decimal>,
    #[serde(default)]
    pub super_holding_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_percent: Option<Decimal>,
}

impl FormDefinition {
    pub fn field(&self, id: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.id == id)
    }
}

// ── Entry values ────────────────────────────────────────────────────

/// One user-entered value, keyed by field id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryValue {
    pub field_id: String,
    #[serde(default)]
    pub field_name: String,
    /// Kept as raw JSON: a number, a numeric string, or anything a
    /// non-monetary widget produces.
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_gst_amount: Option<Decimal>,
}

impl EntryValue {
    /// The numeric reading of `value`, if it has one within range.
    pub fn amount(&self) -> Option<Decimal> {
        decimal_from_json(&self.value).filter(|d| d.abs() <= MAX_AMOUNT)
    }
}

/// Index values by field id. Later entries win over earlier ones.
pub fn index_values(values: &[EntryValue]) -> HashMap<&str, &EntryValue> {
    let mut index = HashMap::with_capacity(values.len());
    for v in values {
        index.insert(v.field_id.as_str(), v);
    }
    index
}

/// Read a decimal from a JSON number or numeric string.
///
/// Numbers go through their textual form so `0.1` stays exactly `0.1`.
/// Empty strings, `null`, booleans, arrays and objects have no reading.
pub fn decimal_from_json(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => parse_decimal_str(&n.to_string()),
        serde_json::Value::String(s) => parse_decimal_str(s.trim()),
        _ => None,
    }
}

fn parse_decimal_str(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

// ── Deductions ──────────────────────────────────────────────────────

/// Outsourced lab work charged back on a gross-method entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutworkInput {
    pub enabled: bool,
    pub amount: Decimal,
    /// Falls back to the configured default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_percent: Option<Decimal>,
}

/// A free-text reduction line entered against a gross-method entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalReductionInput {
    pub description: String,
    pub amount: Decimal,
}

/// Per-entry overrides supplied next to the values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionsInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_facility_fee_percent: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_fee_override: Option<Decimal>,
    /// Injected by update paths; applies to fields without their own
    /// payment responsibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_payment_responsibility: Option<PaymentResponsibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_percent: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_holding_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_percent: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outwork: Option<OutworkInput>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_reductions: Vec<AdditionalReductionInput>,
}
