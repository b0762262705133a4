//! Snapshot isolation conformance tests.
//!
//! Verifies that uncommitted writes are invisible outside a snapshot,
//! committed writes are visible, and aborted or dropped writes are discarded.

use std::future::Future;

use super::{make_entry, TestResult};
use crate::{EntryStorage, StorageError};

pub(super) async fn run_snapshot_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "snapshot",
        "begin_and_commit_empty_snapshot",
        begin_and_commit_empty_snapshot(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "uncommitted_insert_invisible_to_get",
        uncommitted_insert_invisible_to_get(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "uncommitted_insert_invisible_to_list",
        uncommitted_insert_invisible_to_list(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "snapshot_sees_own_writes",
        snapshot_sees_own_writes(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "abort_discards_insert",
        abort_discards_insert(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "dropped_snapshot_discards_insert",
        dropped_snapshot_discards_insert(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "uncommitted_replace_invisible",
        uncommitted_replace_invisible(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "multiple_entries_in_one_snapshot",
        multiple_entries_in_one_snapshot(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "conflicting_insert_commit_is_all_or_nothing",
        conflicting_insert_commit_is_all_or_nothing(factory).await,
    ));

    results
}

// ── 1. begin_and_commit_empty_snapshot ──────────────────────────────────────

async fn begin_and_commit_empty_snapshot<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;
    let snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;
    Ok(())
}

// ── 2. uncommitted_insert_invisible_to_get ──────────────────────────────────

async fn uncommitted_insert_invisible_to_get<S, F, Fut>(factory: &F) -> Result<(), String>
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
    // Snapshot still open.

    let result = s.get_entry("entry-1").await;
    let _ = s.abort_snapshot(snap).await;
    if !matches!(result, Err(StorageError::EntryNotFound { .. })) {
        return Err(format!(
            "expected EntryNotFound for uncommitted entry, got {:?}",
            result
        ));
    }
    Ok(())
}

// ── 3. uncommitted_insert_invisible_to_list ─────────────────────────────────

async fn uncommitted_insert_invisible_to_list<S, F, Fut>(factory: &F) -> Result<(), String>
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

    let listed = s.list_entries(None, true).await.map_err(|e| e.to_string())?;
    let _ = s.abort_snapshot(snap).await;
    if !listed.is_empty() {
        return Err(format!("expected empty list, got {} entries", listed.len()));
    }
    Ok(())
}

// ── 4. snapshot_sees_own_writes ─────────────────────────────────────────────

async fn snapshot_sees_own_writes<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let entry = make_entry("entry-1", "form-1");
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.insert_entry(&mut snap, entry.clone())
        .await
        .map_err(|e| e.to_string())?;
    let seen = s.get_entry_for_update(&mut snap, "entry-1").await;
    let _ = s.abort_snapshot(snap).await;
    match seen {
        Ok(got) if got == entry => Ok(()),
        other => Err(format!("expected the staged entry, got {:?}", other)),
    }
}

// ── 5. abort_discards_insert ────────────────────────────────────────────────

async fn abort_discards_insert<S, F, Fut>(factory: &F) -> Result<(), String>
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
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    let result = s.get_entry("entry-1").await;
    if !matches!(result, Err(StorageError::EntryNotFound { .. })) {
        return Err(format!("expected EntryNotFound after abort, got {:?}", result));
    }
    Ok(())
}

// ── 6. dropped_snapshot_discards_insert ─────────────────────────────────────

async fn dropped_snapshot_discards_insert<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    {
        let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
        s.insert_entry(&mut snap, make_entry("entry-1", "form-1"))
            .await
            .map_err(|e| e.to_string())?;
        drop(snap);
    }

    let result = s.get_entry("entry-1").await;
    if !matches!(result, Err(StorageError::EntryNotFound { .. })) {
        return Err(format!("expected EntryNotFound after drop, got {:?}", result));
    }
    Ok(())
}

// ── 7. uncommitted_replace_invisible ────────────────────────────────────────

async fn uncommitted_replace_invisible<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let original = make_entry("entry-1", "form-1");
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.insert_entry(&mut snap, original.clone())
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let mut changed = original.clone();
    changed.header.description = Some("changed".to_string());
    changed.field_values.clear();
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.replace_entry(&mut snap, changed)
        .await
        .map_err(|e| e.to_string())?;

    let got = s.get_entry("entry-1").await.map_err(|e| e.to_string())?;
    let _ = s.abort_snapshot(snap).await;
    if got != original {
        return Err("uncommitted replace was visible".to_string());
    }

    let got = s.get_entry("entry-1").await.map_err(|e| e.to_string())?;
    if got != original {
        return Err("aborted replace was applied".to_string());
    }
    Ok(())
}

// ── 8. multiple_entries_in_one_snapshot ─────────────────────────────────────

async fn multiple_entries_in_one_snapshot<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    for id in ["entry-1", "entry-2", "entry-3"] {
        s.insert_entry(&mut snap, make_entry(id, "form-1"))
            .await
            .map_err(|e| e.to_string())?;
    }
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let listed = s.list_entries(None, false).await.map_err(|e| e.to_string())?;
    if listed.len() != 3 {
        return Err(format!("expected 3 entries, got {}", listed.len()));
    }
    Ok(())
}

// ── 9. conflicting_insert_commit_is_all_or_nothing ──────────────────────────

async fn conflicting_insert_commit_is_all_or_nothing<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut first = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let mut second = s.begin_snapshot().await.map_err(|e| e.to_string())?;

    s.insert_entry(&mut first, make_entry("entry-1", "form-1"))
        .await
        .map_err(|e| e.to_string())?;
    s.insert_entry(&mut second, make_entry("entry-1", "form-2"))
        .await
        .map_err(|e| e.to_string())?;
    s.insert_entry(&mut second, make_entry("entry-2", "form-2"))
        .await
        .map_err(|e| e.to_string())?;

    s.commit_snapshot(first).await.map_err(|e| e.to_string())?;
    let result = s.commit_snapshot(second).await;
    if !matches!(result, Err(StorageError::AlreadyExists { .. })) {
        return Err(format!("expected AlreadyExists on second commit, got {:?}", result));
    }

    let got = s.get_entry("entry-1").await.map_err(|e| e.to_string())?;
    if got.header.form_id != "form-1" {
        return Err("second commit overwrote the first".to_string());
    }
    if s.get_entry("entry-2").await.is_ok() {
        return Err("failed commit partially applied".to_string());
    }
    Ok(())
}
