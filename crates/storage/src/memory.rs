//! In-memory `EntryStorage` backend.
//!
//! Snapshots stage their writes locally. `commit_snapshot` replays them over
//! the committed entries under one lock, so a commit is all-or-nothing and a
//! soft delete only ever touches the header of the latest committed entry.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::record::{EntryHeader, NormalizedEntry};
use crate::traits::EntryStorage;

#[derive(Debug, Clone, Default)]
pub struct InMemoryEntryStorage {
    entries: Arc<Mutex<BTreeMap<String, NormalizedEntry>>>,
}

impl InMemoryEntryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Writes staged by one snapshot, keyed by entry id.
#[derive(Debug, Default)]
pub struct MemorySnapshot {
    staged: BTreeMap<String, Staged>,
}

#[derive(Debug)]
struct Staged {
    /// The entry as this snapshot sees it.
    view: NormalizedEntry,
    /// Created by this snapshot; `view` is written whole at commit.
    inserted: bool,
    /// For entries that already existed, replayed over the committed entry
    /// at commit.
    ops: Vec<StagedOp>,
}

#[derive(Debug)]
enum StagedOp {
    Replace(NormalizedEntry),
    SoftDelete(String),
}

impl MemorySnapshot {
    fn stage(&mut self, entry_id: &str, view: NormalizedEntry, op: StagedOp) {
        match self.staged.get_mut(entry_id) {
            Some(staged) => {
                staged.view = view;
                if !staged.inserted {
                    staged.ops.push(op);
                }
            }
            None => {
                self.staged.insert(
                    entry_id.to_string(),
                    Staged {
                        view,
                        inserted: false,
                        ops: vec![op],
                    },
                );
            }
        }
    }
}

impl InMemoryEntryStorage {
    async fn visible(
        &self,
        snapshot: &MemorySnapshot,
        entry_id: &str,
    ) -> Result<NormalizedEntry, StorageError> {
        if let Some(staged) = snapshot.staged.get(entry_id) {
            return Ok(staged.view.clone());
        }
        self.entries
            .lock()
            .await
            .get(entry_id)
            .cloned()
            .ok_or_else(|| StorageError::EntryNotFound {
                entry_id: entry_id.to_string(),
            })
    }
}

/// Replay one entry's staged writes over the committed state.
fn resolve(
    entry_id: &str,
    staged: Staged,
    committed: Option<&NormalizedEntry>,
) -> Result<NormalizedEntry, StorageError> {
    if staged.inserted {
        return match committed {
            Some(_) => Err(StorageError::AlreadyExists {
                entry_id: entry_id.to_string(),
            }),
            None => Ok(staged.view),
        };
    }
    let mut current = committed
        .cloned()
        .ok_or_else(|| StorageError::EntryNotFound {
            entry_id: entry_id.to_string(),
        })?;
    for op in staged.ops {
        match op {
            StagedOp::Replace(entry) => {
                if current.is_deleted() {
                    return Err(StorageError::EntryDeleted {
                        entry_id: entry_id.to_string(),
                    });
                }
                current = entry;
            }
            StagedOp::SoftDelete(deleted_at) => {
                if current.header.deleted_at.is_none() {
                    current.header.deleted_at = Some(deleted_at);
                }
            }
        }
    }
    Ok(current)
}

#[async_trait]
impl EntryStorage for InMemoryEntryStorage {
    type Snapshot = MemorySnapshot;

    async fn begin_snapshot(&self) -> Result<MemorySnapshot, StorageError> {
        Ok(MemorySnapshot::default())
    }

    async fn commit_snapshot(&self, snapshot: MemorySnapshot) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().await;
        let mut resolved = Vec::with_capacity(snapshot.staged.len());
        for (id, staged) in snapshot.staged {
            let entry = resolve(&id, staged, entries.get(&id))?;
            resolved.push((id, entry));
        }
        let count = resolved.len();
        for (id, entry) in resolved {
            entries.insert(id, entry);
        }
        tracing::debug!(entries = count, "snapshot committed");
        Ok(())
    }

    async fn abort_snapshot(&self, snapshot: MemorySnapshot) -> Result<(), StorageError> {
        tracing::debug!(entries = snapshot.staged.len(), "snapshot aborted");
        Ok(())
    }

    async fn insert_entry(
        &self,
        snapshot: &mut MemorySnapshot,
        entry: NormalizedEntry,
    ) -> Result<(), StorageError> {
        let id = entry.entry_id().to_string();
        let taken = snapshot.staged.contains_key(&id)
            || self.entries.lock().await.contains_key(&id);
        if taken {
            return Err(StorageError::AlreadyExists { entry_id: id });
        }
        snapshot.staged.insert(
            id,
            Staged {
                view: entry,
                inserted: true,
                ops: Vec::new(),
            },
        );
        Ok(())
    }

    async fn get_entry_for_update(
        &self,
        snapshot: &mut MemorySnapshot,
        entry_id: &str,
    ) -> Result<NormalizedEntry, StorageError> {
        self.visible(snapshot, entry_id).await
    }

    async fn replace_entry(
        &self,
        snapshot: &mut MemorySnapshot,
        entry: NormalizedEntry,
    ) -> Result<(), StorageError> {
        let id = entry.entry_id().to_string();
        if self.visible(snapshot, &id).await?.is_deleted() {
            return Err(StorageError::EntryDeleted { entry_id: id });
        }
        snapshot.stage(&id, entry.clone(), StagedOp::Replace(entry));
        Ok(())
    }

    async fn soft_delete_entry(
        &self,
        snapshot: &mut MemorySnapshot,
        entry_id: &str,
        deleted_at: &str,
    ) -> Result<(), StorageError> {
        let mut view = self.visible(snapshot, entry_id).await?;
        if view.header.deleted_at.is_none() {
            view.header.deleted_at = Some(deleted_at.to_string());
        }
        snapshot.stage(entry_id, view, StagedOp::SoftDelete(deleted_at.to_string()));
        Ok(())
    }

    async fn get_entry(&self, entry_id: &str) -> Result<NormalizedEntry, StorageError> {
        self.entries
            .lock()
            .await
            .get(entry_id)
            .cloned()
            .ok_or_else(|| StorageError::EntryNotFound {
                entry_id: entry_id.to_string(),
            })
    }

    async fn list_entries(
        &self,
        form_id: Option<&str>,
        include_deleted: bool,
    ) -> Result<Vec<EntryHeader>, StorageError> {
        let entries = self.entries.lock().await;
        Ok(entries
            .values()
            .filter(|e| form_id.map_or(true, |f| e.header.form_id == f))
            .filter(|e| include_deleted || !e.is_deleted())
            .map(|e| e.header.clone())
            .collect())
    }
}
