//! Soft delete conformance tests.

use std::future::Future;

use super::{make_entry, TestResult};
use crate::{EntryStorage, StorageError};

const DELETED_AT: &str = "2025-05-01T00:00:00Z";

pub(super) async fn run_delete_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "delete",
        "soft_delete_only_stamps_header",
        soft_delete_only_stamps_header(factory).await,
    ));
    results.push(TestResult::from_result(
        "delete",
        "soft_delete_keeps_first_timestamp",
        soft_delete_keeps_first_timestamp(factory).await,
    ));
    results.push(TestResult::from_result(
        "delete",
        "uncommitted_soft_delete_invisible",
        uncommitted_soft_delete_invisible(factory).await,
    ));
    results.push(TestResult::from_result(
        "delete",
        "soft_delete_keeps_concurrent_replace",
        soft_delete_keeps_concurrent_replace(factory).await,
    ));
    results.push(TestResult::from_result(
        "delete",
        "stale_replace_cannot_undelete",
        stale_replace_cannot_undelete(factory).await,
    ));
    results.push(TestResult::from_result(
        "delete",
        "replace_deleted_entry_rejected",
        replace_deleted_entry_rejected(factory).await,
    ));

    results
}

async fn insert_committed<S: EntryStorage>(s: &S, entry_id: &str) -> Result<(), String> {
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.insert_entry(&mut snap, make_entry(entry_id, "form-1"))
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())
}

// ── 1. soft_delete_only_stamps_header ───────────────────────────────────────

async fn soft_delete_only_stamps_header<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    insert_committed(&s, "entry-1").await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.soft_delete_entry(&mut snap, "entry-1", DELETED_AT)
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let got = s.get_entry("entry-1").await.map_err(|e| e.to_string())?;
    let mut expected = make_entry("entry-1", "form-1");
    expected.header.deleted_at = Some(DELETED_AT.to_string());
    if got != expected {
        return Err(format!("expected only deleted_at to change, got {:?}", got));
    }
    Ok(())
}

// ── 2. soft_delete_keeps_first_timestamp ────────────────────────────────────

async fn soft_delete_keeps_first_timestamp<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    insert_committed(&s, "entry-1").await?;

    for stamp in [DELETED_AT, "2025-06-01T00:00:00Z"] {
        let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
        s.soft_delete_entry(&mut snap, "entry-1", stamp)
            .await
            .map_err(|e| e.to_string())?;
        s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;
    }

    let got = s.get_entry("entry-1").await.map_err(|e| e.to_string())?;
    if got.header.deleted_at.as_deref() != Some(DELETED_AT) {
        return Err(format!(
            "expected deleted_at {}, got {:?}",
            DELETED_AT, got.header.deleted_at
        ));
    }
    Ok(())
}

// ── 3. uncommitted_soft_delete_invisible ────────────────────────────────────

async fn uncommitted_soft_delete_invisible<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    insert_committed(&s, "entry-1").await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.soft_delete_entry(&mut snap, "entry-1", DELETED_AT)
        .await
        .map_err(|e| e.to_string())?;
    let got = s.get_entry("entry-1").await.map_err(|e| e.to_string())?;
    let _ = s.abort_snapshot(snap).await;
    if got.header.deleted_at.is_some() {
        return Err("uncommitted soft delete was visible".to_string());
    }
    Ok(())
}

fn updated(entry_id: &str) -> crate::NormalizedEntry {
    let mut entry = make_entry(entry_id, "form-1");
    entry.header.description = Some("v2".to_string());
    entry.header.updated_at = "2025-04-02T00:00:00Z".to_string();
    entry
}

// ── 4. soft_delete_keeps_concurrent_replace ─────────────────────────────────

async fn soft_delete_keeps_concurrent_replace<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    insert_committed(&s, "entry-1").await?;

    let mut deleting = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.soft_delete_entry(&mut deleting, "entry-1", DELETED_AT)
        .await
        .map_err(|e| e.to_string())?;

    let mut editing = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.replace_entry(&mut editing, updated("entry-1"))
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(editing).await.map_err(|e| e.to_string())?;

    s.commit_snapshot(deleting)
        .await
        .map_err(|e| e.to_string())?;

    let got = s.get_entry("entry-1").await.map_err(|e| e.to_string())?;
    let mut expected = updated("entry-1");
    expected.header.deleted_at = Some(DELETED_AT.to_string());
    if got != expected {
        return Err(format!(
            "expected the committed replace plus deleted_at, got {:?}",
            got
        ));
    }
    Ok(())
}

// ── 5. stale_replace_cannot_undelete ────────────────────────────────────────

async fn stale_replace_cannot_undelete<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    insert_committed(&s, "entry-1").await?;

    let mut editing = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.replace_entry(&mut editing, updated("entry-1"))
        .await
        .map_err(|e| e.to_string())?;

    let mut deleting = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.soft_delete_entry(&mut deleting, "entry-1", DELETED_AT)
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(deleting)
        .await
        .map_err(|e| e.to_string())?;

    match s.commit_snapshot(editing).await {
        Err(StorageError::EntryDeleted { .. }) => {}
        Ok(()) => return Err("replace over a deleted entry committed".to_string()),
        Err(e) => return Err(format!("expected EntryDeleted, got: {}", e)),
    }

    let got = s.get_entry("entry-1").await.map_err(|e| e.to_string())?;
    let untouched =
        got.header.deleted_at.as_deref() == Some(DELETED_AT) && got.header.description.is_none();
    if !untouched {
        return Err(format!("expected untouched deleted entry, got {:?}", got));
    }
    Ok(())
}

// ── 6. replace_deleted_entry_rejected ───────────────────────────────────────

async fn replace_deleted_entry_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    insert_committed(&s, "entry-1").await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.soft_delete_entry(&mut snap, "entry-1", DELETED_AT)
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s.replace_entry(&mut snap, updated("entry-1")).await;
    let _ = s.abort_snapshot(snap).await;
    match result {
        Err(StorageError::EntryDeleted { entry_id }) if entry_id == "entry-1" => Ok(()),
        Ok(()) => Err("replace of a deleted entry succeeded".to_string()),
        Err(e) => Err(format!("expected EntryDeleted, got: {}", e)),
    }
}
