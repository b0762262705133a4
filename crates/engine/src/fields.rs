//! Field calculation pass.
//!
//! Walks the form's fields in order, resolves GST for every included
//! monetary field that has a usable value, and accumulates running totals.

use rust_decimal::Decimal;

use dentbooks_forms::{index_values, EntryValue, FormField, FormType};

use crate::gst::{self, GstSplit};
use crate::result::{FieldCalculation, Totals};

/// Output of [`compute`]. Totals are unrounded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPass {
    pub calculations: Vec<FieldCalculation>,
    /// Income-section totals; only tracked for `both` forms.
    pub income: Totals,
    /// Expense-section totals; only tracked for `both` forms.
    pub expense: Totals,
    /// For `both` forms, `income − expense`; otherwise the sum of every
    /// included field regardless of section.
    pub combined: Totals,
}

pub fn compute(fields: &[FormField], values: &[EntryValue], form_type: FormType) -> FieldPass {
    let index = index_values(values);
    let mut pass = FieldPass::default();

    for field in fields {
        if !field.field_type.is_monetary() || !field.include_in_total {
            continue;
        }
        let Some(entry) = index.get(field.id.as_str()) else {
            continue;
        };
        let Some(amount) = entry.amount() else {
            tracing::debug!(field_id = %field.id, value = %entry.value, "skipping non-numeric value");
            continue;
        };

        let (rate, gst_type) = match field.active_gst() {
            Some((rate, gst_type)) => (rate, Some(gst_type)),
            None => (Decimal::ZERO, None),
        };
        let split = gst::resolve(amount, rate, gst_type, entry.manual_gst_amount);

        if form_type == FormType::Both {
            if field.is_expense() {
                pass.expense.add(&split);
            } else {
                pass.income.add(&split);
            }
        } else {
            pass.combined.add(&split);
        }

        pass.calculations
            .push(field_calculation(field, entry, rate, gst_type, &split));
    }

    if form_type == FormType::Both {
        pass.combined = pass.income.minus(pass.expense);
    }

    tracing::debug!(
        form_type = %form_type,
        included = pass.calculations.len(),
        total = %pass.combined.total_amount,
        "field pass complete"
    );
    pass
}

fn field_calculation(
    field: &FormField,
    entry: &EntryValue,
    rate: Decimal,
    gst_type: Option<dentbooks_forms::GstType>,
    split: &GstSplit,
) -> FieldCalculation {
    let field_name = if field.name.is_empty() {
        entry.field_name.clone()
    } else {
        field.name.clone()
    };
    FieldCalculation {
        field_id: field.id.clone(),
        field_name,
        base_amount: split.base,
        gst_amount: split.gst,
        total_amount: split.total,
        gst_rate: rate,
        gst_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dentbooks_forms::{FieldType, GstConfig, GstType};
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn field(id: &str, section: &str) -> FormField {
        FormField {
            id: id.to_string(),
            name: id.to_uppercase(),
            field_type: FieldType::Currency,
            section: section.to_string(),
            include_in_total: true,
            payment_responsibility: None,
            gst_config: None,
        }
    }

    fn value(id: &str, v: serde_json::Value) -> EntryValue {
        EntryValue {
            field_id: id.to_string(),
            field_name: String::new(),
            value: v,
            manual_gst_amount: None,
        }
    }

    #[test]
    fn test_only_included_monetary_fields_participate() {
        let mut text = field("notes", "income");
        text.field_type = FieldType::Text;
        let mut excluded = field("tips", "income");
        excluded.include_in_total = false;
        let fields = vec![field("fees", "income"), text, excluded];
        let values = vec![
            value("fees", json!(100)),
            value("notes", json!("123")),
            value("tips", json!(50)),
        ];

        let pass = compute(&fields, &values, FormType::Income);
        assert_eq!(pass.calculations.len(), 1);
        assert_eq!(pass.calculations[0].field_id, "fees");
        assert_eq!(pass.calculations[0].field_name, "FEES");
        assert_eq!(pass.combined.total_amount, dec("100"));
    }

    #[test]
    fn test_missing_and_unusable_values_are_skipped() {
        let fields = vec![
            field("a", "income"),
            field("b", "income"),
            field("c", "income"),
            field("d", "income"),
        ];
        let values = vec![
            value("b", json!("")),
            value("c", json!(null)),
            value("d", json!("abc")),
        ];
        let pass = compute(&fields, &values, FormType::Income);
        assert!(pass.calculations.is_empty());
        assert_eq!(pass.combined, Totals::default());
    }

    #[test]
    fn test_last_duplicate_value_wins() {
        let fields = vec![field("fees", "income")];
        let values = vec![value("fees", json!(10)), value("fees", json!("25.50"))];
        let pass = compute(&fields, &values, FormType::Income);
        assert_eq!(pass.calculations[0].total_amount, dec("25.50"));
    }

    #[test]
    fn test_both_nets_expense_from_income() {
        let fields = vec![field("fees", "income"), field("lab", "Expenses")];
        let values = vec![value("fees", json!(500)), value("lab", json!(200))];
        let pass = compute(&fields, &values, FormType::Both);
        assert_eq!(pass.income.total_amount, dec("500"));
        assert_eq!(pass.expense.total_amount, dec("200"));
        assert_eq!(pass.combined.total_amount, dec("300"));
    }

    #[test]
    fn test_non_both_ignores_section() {
        let fields = vec![field("fees", "income"), field("lab", "expense")];
        let values = vec![value("fees", json!(500)), value("lab", json!(200))];
        let pass = compute(&fields, &values, FormType::Income);
        assert_eq!(pass.combined.total_amount, dec("700"));
        assert_eq!(pass.income, Totals::default());
    }

    #[test]
    fn test_gst_config_applied_only_when_enabled() {
        let mut taxed = field("fees", "income");
        taxed.gst_config = Some(GstConfig {
            enabled: true,
            rate: dec("10"),
            gst_type: GstType::Inclusive,
        });
        let mut disabled = field("other", "income");
        disabled.gst_config = Some(GstConfig {
            enabled: false,
            rate: dec("10"),
            gst_type: GstType::Exclusive,
        });
        let fields = vec![taxed, disabled];
        let values = vec![value("fees", json!(110)), value("other", json!(40))];
        let pass = compute(&fields, &values, FormType::Income);

        let fees = &pass.calculations[0];
        assert_eq!(fees.gst_type, Some(GstType::Inclusive));
        assert_eq!(fees.gst_rate, dec("10"));
        assert_eq!(fees.gst_amount, dec("10.00"));

        let other = &pass.calculations[1];
        assert_eq!(other.gst_type, None);
        assert_eq!(other.gst_rate, Decimal::ZERO);
        assert_eq!(other.total_amount, dec("40"));
    }
}
