//! Entry lifecycle helpers.
//!
//! Each helper runs in a single snapshot. Any failure aborts the snapshot,
//! so a failed call leaves storage untouched.

use time::format_description::well_known::Rfc3339;

use crate::error::StorageError;
use crate::record::NormalizedEntry;
use crate::traits::EntryStorage;

/// Current UTC time as an RFC 3339 string.
pub fn now_rfc3339() -> Result<String, StorageError> {
    time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| StorageError::Backend(format!("failed to format timestamp: {}", e)))
}

/// Insert a new entry, stamping `created_at` and `updated_at`.
pub async fn create_entry<S: EntryStorage>(
    storage: &S,
    mut entry: NormalizedEntry,
) -> Result<NormalizedEntry, StorageError> {
    let now = now_rfc3339()?;
    entry.header.created_at = now.clone();
    entry.header.updated_at = now;
    entry.header.deleted_at = None;

    let mut snapshot = storage.begin_snapshot().await?;
    if let Err(e) = storage.insert_entry(&mut snapshot, entry.clone()).await {
        let _ = storage.abort_snapshot(snapshot).await;
        return Err(e);
    }
    storage.commit_snapshot(snapshot).await?;

    tracing::debug!(entry_id = entry.entry_id(), "entry created");
    Ok(entry)
}

/// Replace every row of an existing entry. `created_at` is kept from the
/// stored header and `updated_at` is re-stamped.
///
/// Returns `Err(StorageError::EntryDeleted)` for a soft-deleted entry.
pub async fn update_entry<S: EntryStorage>(
    storage: &S,
    mut entry: NormalizedEntry,
) -> Result<NormalizedEntry, StorageError> {
    let now = now_rfc3339()?;
    let mut snapshot = storage.begin_snapshot().await?;

    let existing = match storage
        .get_entry_for_update(&mut snapshot, entry.entry_id())
        .await
    {
        Ok(existing) => existing,
        Err(e) => {
            let _ = storage.abort_snapshot(snapshot).await;
            return Err(e);
        }
    };
    if existing.is_deleted() {
        let _ = storage.abort_snapshot(snapshot).await;
        return Err(StorageError::EntryDeleted {
            entry_id: entry.entry_id().to_string(),
        });
    }

    entry.header.created_at = existing.header.created_at;
    entry.header.updated_at = now;
    entry.header.deleted_at = None;

    if let Err(e) = storage.replace_entry(&mut snapshot, entry.clone()).await {
        let _ = storage.abort_snapshot(snapshot).await;
        return Err(e);
    }
    storage.commit_snapshot(snapshot).await?;

    tracing::debug!(entry_id = entry.entry_id(), "entry updated");
    Ok(entry)
}

/// Soft-delete an entry. Only the header's `deleted_at` changes.
pub async fn delete_entry<S: EntryStorage>(storage: &S, entry_id: &str) -> Result<(), StorageError> {
    let now = now_rfc3339()?;
    let mut snapshot = storage.begin_snapshot().await?;
    if let Err(e) = storage.soft_delete_entry(&mut snapshot, entry_id, &now).await {
        let _ = storage.abort_snapshot(snapshot).await;
        return Err(e);
    }
    storage.commit_snapshot(snapshot).await?;

    tracing::debug!(entry_id, "entry deleted");
    Ok(())
}

/// Read an entry inside its own snapshot, for callers about to flatten it.
pub async fn load_entry<S: EntryStorage>(
    storage: &S,
    entry_id: &str,
) -> Result<NormalizedEntry, StorageError> {
    let mut snapshot = storage.begin_snapshot().await?;
    let entry = match storage.get_entry_for_update(&mut snapshot, entry_id).await {
        Ok(entry) => entry,
        Err(e) => {
            let _ = storage.abort_snapshot(snapshot).await;
            return Err(e);
        }
    };
    storage.commit_snapshot(snapshot).await?;
    Ok(entry)
}
