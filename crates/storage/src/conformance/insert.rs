//! Insert conformance tests.
//!
//! Verifies that inserted entries keep every table intact and that entry
//! ids cannot be reused.

use std::future::Future;

use super::{make_entry, TestResult};
use crate::{EntryStorage, StorageError};

pub(super) async fn run_insert_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: EntryStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "insert",
        "insert_then_commit_is_visible",
        insert_then_commit_is_visible(factory).await,
    ));
    results.push(TestResult::from_result(
        "insert",
        "insert_stores_every_table",
        insert_stores_every_table(factory).await,
    ));
    results.push(TestResult::from_result(
        "insert",
        "duplicate_insert_in_same_snapshot_fails",
        duplicate_insert_in_same_snapshot_fails(factory).await,
    ));
    results.push(TestResult::from_result(
        "insert",
        "duplicate_insert_of_committed_entry_fails",
        duplicate_insert_of_committed_entry_fails(factory).await,
    ));
    results.push(TestResult::from_result(
        "insert",
        "deleted_entry_id_cannot_be_reused",
        deleted_entry_id_cannot_be_reused(factory).await,
    ));

    results
}

// ── 1. insert_then_commit_is_visible ────────────────────────────────────────

async fn insert_then_commit_is_visible<S, F, Fut>(factory: &F) -> Result<(), String>
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

    let got = s.get_entry("entry-1").await.map_err(|e| e.to_string())?;
    if got.header.form_id != "form-1" {
        return Err(format!("expected form 'form-1', got '{}'", got.header.form_id));
    }
    Ok(())
}

// ── 2. insert_stores_every_table ────────────────────────────────────────────

async fn insert_stores_every_table<S, F, Fut>(factory: &F) -> Result<(), String>
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
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let got = s.get_entry("entry-1").await.map_err(|e| e.to_string())?;
    if got != entry {
        return Err(format!("stored entry differs:\n  wrote {:?}\n  read  {:?}", entry, got));
    }
    Ok(())
}

// ── 3. duplicate_insert_in_same_snapshot_fails ──────────────────────────────

async fn duplicate_insert_in_same_snapshot_fails<S, F, Fut>(factory: &F) -> Result<(), String>
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
    let result = s.insert_entry(&mut snap, make_entry("entry-1", "form-2")).await;
    let _ = s.abort_snapshot(snap).await;
    match result {
        Err(StorageError::AlreadyExists { entry_id }) if entry_id == "entry-1" => Ok(()),
        other => Err(format!("expected AlreadyExists for entry-1, got {:?}", other)),
    }
}

// ── 4. duplicate_insert_of_committed_entry_fails ────────────────────────────

async fn duplicate_insert_of_committed_entry_fails<S, F, Fut>(factory: &F) -> Result<(), String>
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

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s.insert_entry(&mut snap, make_entry("entry-1", "form-1")).await;
    let _ = s.abort_snapshot(snap).await;
    match result {
        Err(StorageError::AlreadyExists { .. }) => Ok(()),
        other => Err(format!("expected AlreadyExists, got {:?}", other)),
    }
}

// ── 5. deleted_entry_id_cannot_be_reused ────────────────────────────────────

async fn deleted_entry_id_cannot_be_reused<S, F, Fut>(factory: &F) -> Result<(), String>
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
    s.soft_delete_entry(&mut snap, "entry-1", "2025-05-01T00:00:00Z")
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s.insert_entry(&mut snap, make_entry("entry-1", "form-1")).await;
    let _ = s.abort_snapshot(snap).await;
    match result {
        Err(StorageError::AlreadyExists { .. }) => Ok(()),
        other => Err(format!("expected AlreadyExists for deleted id, got {:?}", other)),
    }
}
