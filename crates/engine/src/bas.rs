//! BAS label mapping.

use dentbooks_forms::FormType;

use crate::result::{BasMapping, Totals};

/// Map entry totals onto BAS labels.
///
/// `totals` are the rounded combined totals. For `both` forms the labels
/// come from the separate income and expense sub-totals, never from the
/// netted combination.
pub fn map_bas(form_type: FormType, totals: &Totals, income: &Totals, expense: &Totals) -> BasMapping {
    match form_type {
        FormType::Income | FormType::Unknown => BasMapping {
            gst_on_sales_1a: Some(totals.gst_amount),
            total_sales_g1: Some(totals.total_amount),
            ..BasMapping::default()
        },
        FormType::Expense => BasMapping {
            gst_credit_1b: Some(totals.gst_amount),
            expenses_g11: Some(totals.base_amount),
            ..BasMapping::default()
        },
        FormType::Both => {
            let income = income.rounded();
            let expense = expense.rounded();
            BasMapping {
                gst_on_sales_1a: Some(income.gst_amount),
                gst_credit_1b: Some(expense.gst_amount),
                total_sales_g1: Some(income.total_amount),
                expenses_g11: Some(expense.base_amount),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn totals(base: &str, gst: &str, total: &str) -> Totals {
        Totals {
            base_amount: dec(base),
            gst_amount: dec(gst),
            total_amount: dec(total),
        }
    }

    #[test]
    fn test_income_labels() {
        let t = totals("100", "10", "110");
        let bas = map_bas(FormType::Income, &t, &Totals::default(), &Totals::default());
        assert_eq!(bas.gst_on_sales_1a, Some(dec("10")));
        assert_eq!(bas.total_sales_g1, Some(dec("110")));
        assert_eq!(bas.gst_credit_1b, None);
        assert_eq!(bas.expenses_g11, None);
    }

    #[test]
    fn test_unknown_form_type_maps_as_income() {
        let t = totals("100", "10", "110");
        let bas = map_bas(FormType::Unknown, &t, &Totals::default(), &Totals::default());
        assert_eq!(bas.gst_on_sales_1a, Some(dec("10")));
        assert_eq!(bas.gst_credit_1b, None);
    }

    #[test]
    fn test_expense_labels() {
        let t = totals("100", "10", "110");
        let bas = map_bas(FormType::Expense, &t, &Totals::default(), &Totals::default());
        assert_eq!(bas.gst_credit_1b, Some(dec("10")));
        assert_eq!(bas.expenses_g11, Some(dec("100")));
        assert_eq!(bas.gst_on_sales_1a, None);
    }

    #[test]
    fn test_both_uses_sub_totals() {
        let income = totals("500", "50.004", "550.004");
        let expense = totals("200", "20", "220");
        let combined = income.minus(expense).rounded();
        let bas = map_bas(FormType::Both, &combined, &income, &expense);
        assert_eq!(bas.gst_on_sales_1a, Some(dec("50.00")));
        assert_eq!(bas.total_sales_g1, Some(dec("550.00")));
        assert_eq!(bas.gst_credit_1b, Some(dec("20")));
        assert_eq!(bas.expenses_g11, Some(dec("200")));
    }
}
