//! Listing conformance tests.

use std::future::Future;

use super::{make_entry, TestResult};
use crate::EntryStorage;

pub(super) async fn run_list_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "list",
        "list_filters_by_form",
        list_filters_by_form(factory).await,
    ));
    results.push(TestResult::from_result(
        "list",
        "list_excludes_deleted_by_default",
        list_excludes_deleted_by_default(factory).await,
    ));
    results.push(TestResult::from_result(
        "list",
        "list_ordered_by_entry_id",
        list_ordered_by_entry_id(factory).await,
    ));

    results
}

/// Commit entry-a (form-1), entry-b (form-2) and entry-c (form-1, deleted).
async fn seed<S: EntryStorage>(s: &S) -> Result<(), String> {
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    for (id, form) in [("entry-c", "form-1"), ("entry-a", "form-1"), ("entry-b", "form-2")] {
        s.insert_entry(&mut snap, make_entry(id, form))
            .await
            .map_err(|e| e.to_string())?;
    }
    s.soft_delete_entry(&mut snap, "entry-c", "2025-05-01T00:00:00Z")
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())
}

fn ids(headers: &[crate::EntryHeader]) -> Vec<&str> {
    headers.iter().map(|h| h.entry_id.as_str()).collect()
}

// ── 1. list_filters_by_form ─────────────────────────────────────────────────

async fn list_filters_by_form<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(&s).await?;
    let listed = s
        .list_entries(Some("form-2"), true)
        .await
        .map_err(|e| e.to_string())?;
    if ids(&listed) != vec!["entry-b"] {
        return Err(format!("expected [entry-b], got {:?}", ids(&listed)));
    }
    Ok(())
}

// ── 2. list_excludes_deleted_by_default ─────────────────────────────────────

async fn list_excludes_deleted_by_default<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(&s).await?;
    let live = s
        .list_entries(Some("form-1"), false)
        .await
        .map_err(|e| e.to_string())?;
    if ids(&live) != vec!["entry-a"] {
        return Err(format!("expected [entry-a], got {:?}", ids(&live)));
    }
    let all = s
        .list_entries(Some("form-1"), true)
        .await
        .map_err(|e| e.to_string())?;
    if ids(&all) != vec!["entry-a", "entry-c"] {
        return Err(format!("expected [entry-a, entry-c], got {:?}", ids(&all)));
    }
    Ok(())
}

// ── 3. list_ordered_by_entry_id ─────────────────────────────────────────────

async fn list_ordered_by_entry_id<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(&s).await?;
    let listed = s.list_entries(None, true).await.map_err(|e| e.to_string())?;
    if ids(&listed) != vec!["entry-a", "entry-b", "entry-c"] {
        return Err(format!("expected sorted ids, got {:?}", ids(&listed)));
    }
    Ok(())
}
