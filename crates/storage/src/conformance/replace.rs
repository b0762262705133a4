//! Replace conformance tests.
//!
//! `replace_entry` swaps out every table of an entry; nothing from the old
//! version survives.

use std::future::Future;

use dentbooks_forms::CalculationMethod;

use super::{make_entry, TestResult};
use crate::record::{MethodDetails, NetDetailsRow, NormalizedEntry};
use crate::EntryStorage;

pub(super) async fn run_replace_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "replace",
        "replace_swaps_every_table",
        replace_swaps_every_table(factory).await,
    ));
    results.push(TestResult::from_result(
        "replace",
        "replace_in_inserting_snapshot",
        replace_in_inserting_snapshot(factory).await,
    ));
    results.push(TestResult::from_result(
        "replace",
        "replace_leaves_other_entries_alone",
        replace_leaves_other_entries_alone(factory).await,
    ));

    results
}

/// The entry re-saved under the net method with no calculation rows.
fn replacement(entry_id: &str) -> NormalizedEntry {
    let mut entry = make_entry(entry_id, "form-1");
    entry.header.calculation_method = CalculationMethod::Net;
    entry.header.updated_at = "2025-04-02T00:00:00Z".to_string();
    entry.field_values[0].value_json = "310".to_string();
    entry.field_calculations.clear();
    entry.summary = None;
    entry.method_details = MethodDetails::Net(NetDetailsRow {
        entry_id: entry_id.to_string(),
        ..NetDetailsRow::default()
    });
    entry.gross_reductions.clear();
    entry.deductions = None;
    entry
}

// ── 1. replace_swaps_every_table ────────────────────────────────────────────

async fn replace_swaps_every_table<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.insert_entry(&mut snap, make_entry("entry-1", "form-1"))
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let new = replacement("entry-1");
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.replace_entry(&mut snap, new.clone())
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let got = s.get_entry("entry-1").await.map_err(|e| e.to_string())?;
    if got != new {
        return Err(format!("expected the replacement, got {:?}", got));
    }
    Ok(())
}

// ── 2. replace_in_inserting_snapshot ────────────────────────────────────────

async fn replace_in_inserting_snapshot<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let new = replacement("entry-1");
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.insert_entry(&mut snap, make_entry("entry-1", "form-1"))
        .await
        .map_err(|e| e.to_string())?;
    s.replace_entry(&mut snap, new.clone())
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let got = s.get_entry("entry-1").await.map_err(|e| e.to_string())?;
    if got != new {
        return Err(format!("expected the replacement, got {:?}", got));
    }
    Ok(())
}

// ── 3. replace_leaves_other_entries_alone ───────────────────────────────────

async fn replace_leaves_other_entries_alone<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let other = make_entry("entry-2", "form-1");
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.insert_entry(&mut snap, make_entry("entry-1", "form-1"))
        .await
        .map_err(|e| e.to_string())?;
    s.insert_entry(&mut snap, other.clone())
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.replace_entry(&mut snap, replacement("entry-1"))
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let got = s.get_entry("entry-2").await.map_err(|e| e.to_string())?;
    if got != other {
        return Err("replace touched another entry".to_string());
    }
    Ok(())
}
