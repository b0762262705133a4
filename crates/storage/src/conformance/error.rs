use std::future::Future;

use super::TestResult;
use crate::{EntryStorage, StorageError};

pub(super) async fn run_error_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "error",
        "get_entry_nonexistent",
        get_entry_nonexistent(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "get_entry_for_update_nonexistent",
        get_entry_for_update_nonexistent(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "replace_entry_nonexistent",
        replace_entry_nonexistent(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "soft_delete_entry_nonexistent",
        soft_delete_entry_nonexistent(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "list_entries_empty",
        list_entries_empty(factory).await,
    ));

    results
}

// ── 1. get_entry on empty store returns EntryNotFound ───────────────────────

async fn get_entry_nonexistent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.get_entry("entry-999").await {
        Err(StorageError::EntryNotFound { entry_id }) if entry_id == "entry-999" => Ok(()),
        other => Err(format!("expected EntryNotFound for entry-999, got {:?}", other)),
    }
}

// ── 2. get_entry_for_update on empty store returns EntryNotFound ────────────

async fn get_entry_for_update_nonexistent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s.get_entry_for_update(&mut snap, "entry-999").await;
    let _ = s.abort_snapshot(snap).await;
    match result {
        Err(StorageError::EntryNotFound { .. }) => Ok(()),
        other => Err(format!("expected EntryNotFound, got {:?}", other)),
    }
}

// ── 3. replace_entry without an existing entry returns EntryNotFound ────────

async fn replace_entry_nonexistent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s
        .replace_entry(&mut snap, super::make_entry("entry-999", "form-1"))
        .await;
    let _ = s.abort_snapshot(snap).await;
    match result {
        Err(StorageError::EntryNotFound { .. }) => Ok(()),
        other => Err(format!("expected EntryNotFound, got {:?}", other)),
    }
}

// ── 4. soft_delete_entry without an existing entry returns EntryNotFound ────

async fn soft_delete_entry_nonexistent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s
        .soft_delete_entry(&mut snap, "entry-999", "2025-05-01T00:00:00Z")
        .await;
    let _ = s.abort_snapshot(snap).await;
    match result {
        Err(StorageError::EntryNotFound { .. }) => Ok(()),
        other => Err(format!("expected EntryNotFound, got {:?}", other)),
    }
}

// ── 5. list_entries on empty store is empty ─────────────────────────────────

async fn list_entries_empty<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let listed = s.list_entries(None, true).await.map_err(|e| e.to_string())?;
    if !listed.is_empty() {
        return Err(format!("expected no entries, got {}", listed.len()));
    }
    Ok(())
}
