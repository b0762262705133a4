//! Conformance test suite for `EntryStorage` implementations.
//!
//! This module provides a backend-agnostic test suite that any `EntryStorage`
//! implementation can run to verify correctness. The suite covers:
//!
//! - **Insert**: entry creation, duplicate detection, every table stored
//! - **Snapshot isolation**: uncommitted writes invisible, aborted writes discarded
//! - **Replace**: full replacement of every table
//! - **Soft delete**: header-only timestamping that survives concurrent replaces
//! - **Listing**: form and deletion filters
//! - **Error handling**: correct error variants for invalid operations
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory function that
//! creates a fresh, empty storage instance for each test:
//!
//! ```ignore
//! use dentbooks_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn postgres_conformance() {
//!     let report = run_conformance_suite(|| async {
//!         create_test_postgres_storage().await
//!     }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod delete;
mod error;
mod insert;
mod list;
mod replace;
mod snapshot;

use std::fmt;
use std::future::Future;

use dentbooks_forms::{CalculationMethod, FormType};
use rust_decimal::Decimal;

use crate::record::*;
use crate::EntryStorage;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "insert", "snapshot", "replace").
    pub category: String,
    /// Test name (e.g. "insert_then_commit_is_visible").
    pub name: String,
    /// Whether the test passed.
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn pass(category: &str, name: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: true,
            message: None,
        }
    }

    fn fail(category: &str, name: &str, msg: String) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: false,
            message: Some(msg),
        }
    }

    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::pass(category, name),
            Err(msg) => Self::fail(category, name, msg),
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a storage backend.
///
/// The `factory` function is called once per test to create a fresh, empty
/// storage instance, ensuring test isolation.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(insert::run_insert_tests(&factory).await);
    results.extend(error::run_error_tests(&factory).await);
    results.extend(snapshot::run_snapshot_tests(&factory).await);
    results.extend(replace::run_replace_tests(&factory).await);
    results.extend(delete::run_delete_tests(&factory).await);
    results.extend(list::run_list_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers: record constructors with sensible defaults ──────────────────────

/// A gross-method entry with one row in every table.
fn make_entry(entry_id: &str, form_id: &str) -> NormalizedEntry {
    let id = entry_id.to_string();
    let line = |field_id: &str, order: i64| BreakdownLineRow {
        entry_id: id.clone(),
        field_id: field_id.to_string(),
        field_name: field_id.to_string(),
        base_amount: Decimal::from(90),
        gst_amount: Decimal::from(9),
        total_amount: Decimal::from(99),
        display_order: order,
    };
    NormalizedEntry {
        header: EntryHeader {
            entry_id: id.clone(),
            form_id: form_id.to_string(),
            clinic_id: Some("clinic-1".to_string()),
            user_id: Some("user-1".to_string()),
            quarter_id: Some("2025-Q1".to_string()),
            entry_date: Some("2025-03-31".to_string()),
            description: None,
            calculation_method: CalculationMethod::Gross,
            form_type: FormType::Both,
            created_at: "2025-04-01T00:00:00Z".to_string(),
            updated_at: "2025-04-01T00:00:00Z".to_string(),
            deleted_at: None,
        },
        field_values: vec![FieldValueRow {
            entry_id: id.clone(),
            field_id: "fees".to_string(),
            field_name: "Fees".to_string(),
            value_kind: ValueKind::Number,
            value_json: "290".to_string(),
            numeric_value: Some(Decimal::from(290)),
            manual_gst_amount: None,
            display_order: 0,
        }],
        field_calculations: vec![FieldCalculationRow {
            entry_id: id.clone(),
            field_id: "fees".to_string(),
            field_name: "Fees".to_string(),
            base_amount: Decimal::from(290),
            gst_amount: Decimal::ZERO,
            total_amount: Decimal::from(290),
            gst_rate: Decimal::ZERO,
            gst_type: None,
            section: "income".to_string(),
            display_order: 0,
        }],
        summary: Some(SummaryRow {
            entry_id: id.clone(),
            total_base_amount: Decimal::from(200),
            total_gst_amount: Decimal::from(-9),
            total_amount: Decimal::from(191),
            income_base_amount: Some(Decimal::from(290)),
            income_gst_amount: Some(Decimal::ZERO),
            income_total_amount: Some(Decimal::from(290)),
            expense_base_amount: Some(Decimal::from(90)),
            expense_gst_amount: Some(Decimal::from(9)),
            expense_total_amount: Some(Decimal::from(99)),
            net_payable: None,
            net_receivable: None,
            net_fee: Some(Decimal::from(200)),
            bas_gst_on_sales_1a: Some(Decimal::ZERO),
            bas_gst_credit_1b: Some(Decimal::from(9)),
            bas_total_sales_g1: Some(Decimal::from(290)),
            bas_expenses_g11: Some(Decimal::from(90)),
            service_facility_fee_percent: Some(Decimal::from(25)),
            service_fee_base: Some(Decimal::from(50)),
            gst_on_service_fee: Some(Decimal::from(5)),
            total_service_fee: Some(Decimal::from(55)),
            total_reductions: Some(Decimal::from(99)),
            total_reimbursements: Some(Decimal::ZERO),
            subtotal_after_deductions: Some(Decimal::from(150)),
            remitted_amount: Some(Decimal::from(136)),
        }),
        method_details: MethodDetails::Gross {
            details: GrossDetailsRow {
                entry_id: id.clone(),
                total_additional_reductions: Decimal::from(15),
                final_remittance: Some(Decimal::from(88)),
            },
            additional_reductions: vec![GrossAdditionalReductionRow {
                entry_id: id.clone(),
                description: "Parking".to_string(),
                amount: Decimal::from(15),
                display_order: 0,
            }],
            reductions_summary: Some(GrossReductionsSummaryRow {
                entry_id: id.clone(),
                base_amount: Decimal::from(90),
                gst_amount: Decimal::from(9),
                total_amount: Decimal::from(99),
            }),
            outwork: Some(GrossOutworkRow {
                entry_id: id.clone(),
                amount: Decimal::from(300),
                rate_percent: Decimal::TEN,
                charge_amount: Decimal::from(30),
                gst_amount: Decimal::from(3),
                total_charge: Decimal::from(33),
            }),
        },
        gross_reductions: vec![line("lab", 0)],
        gross_reimbursements: Vec::new(),
        deductions: Some(DeductionsRow {
            entry_id: id.clone(),
            outwork_enabled: Some(true),
            outwork_amount: Some(Decimal::from(300)),
            ..DeductionsRow::default()
        }),
    }
}
