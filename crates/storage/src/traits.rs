use async_trait::async_trait;

use crate::error::StorageError;
use crate::record::{EntryHeader, NormalizedEntry};

/// The storage trait for normalized entries.
///
/// An `EntryStorage` implementation provides transactional storage for
/// every table of a [`NormalizedEntry`].
///
/// ## Snapshot Semantics
///
/// All mutating operations take `&mut Self::Snapshot`, a type representing an
/// in-progress transaction. The lifecycle is:
///
/// 1. `begin_snapshot()` starts a transaction and returns a `Snapshot`
/// 2. Call mutating methods with `&mut snapshot`
/// 3. `commit_snapshot(snapshot)` commits and consumes the transaction,
///    or `abort_snapshot(snapshot)` rolls it back and consumes it
///
/// If a `Snapshot` is dropped without committing, the underlying transaction
/// MUST be rolled back. Uncommitted writes are never visible to the query
/// operations.
///
/// ## Lifecycle
///
/// An entry's header is written once by `insert_entry`. `replace_entry`
/// replaces every table of a live entry; `soft_delete_entry` only stamps
/// `deleted_at` on the header. A deleted entry is never replaced.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` so they can be shared
/// across async task boundaries.
#[async_trait]
pub trait EntryStorage: Send + Sync + 'static {
    /// The snapshot (transaction) type used by this storage backend.
    type Snapshot: Send;

    // ── Snapshot lifecycle ────────────────────────────────────────────────────

    /// Begin a new snapshot (transaction).
    async fn begin_snapshot(&self) -> Result<Self::Snapshot, StorageError>;

    /// Commit a snapshot, making all mutations durable.
    ///
    /// Writes are applied to the latest committed state, all or nothing.
    /// Fails with `AlreadyExists` if another snapshot committed an entry this
    /// one inserted, and with `EntryDeleted` if an entry this one replaced was
    /// deleted in the meantime.
    async fn commit_snapshot(&self, snapshot: Self::Snapshot) -> Result<(), StorageError>;

    /// Abort (roll back) a snapshot, discarding all mutations.
    async fn abort_snapshot(&self, snapshot: Self::Snapshot) -> Result<(), StorageError>;

    // ── Entry operations (within snapshot) ───────────────────────────────────

    /// Insert every row of a new entry.
    ///
    /// Returns `Err(StorageError::AlreadyExists)` if the entry id is taken,
    /// including by a soft-deleted entry.
    async fn insert_entry(
        &self,
        snapshot: &mut Self::Snapshot,
        entry: NormalizedEntry,
    ) -> Result<(), StorageError>;

    /// Read an entry as this snapshot sees it, including its own writes.
    ///
    /// Returns `Err(StorageError::EntryNotFound)` if the entry does not exist.
    async fn get_entry_for_update(
        &self,
        snapshot: &mut Self::Snapshot,
        entry_id: &str,
    ) -> Result<NormalizedEntry, StorageError>;

    /// Replace every row of an existing entry.
    ///
    /// Returns `Err(StorageError::EntryNotFound)` if the entry does not exist,
    /// or `Err(StorageError::EntryDeleted)` if it is soft-deleted.
    async fn replace_entry(
        &self,
        snapshot: &mut Self::Snapshot,
        entry: NormalizedEntry,
    ) -> Result<(), StorageError>;

    /// Stamp `deleted_at` on the entry's header. Deleting an already deleted
    /// entry keeps the first timestamp. Only the header changes, so a replace
    /// committed by another snapshot before this one commits is kept.
    ///
    /// Returns `Err(StorageError::EntryNotFound)` if the entry does not exist.
    async fn soft_delete_entry(
        &self,
        snapshot: &mut Self::Snapshot,
        entry_id: &str,
        deleted_at: &str,
    ) -> Result<(), StorageError>;

    // ── Query operations (outside snapshot) ──────────────────────────────────

    /// Read a committed entry, deleted or not.
    ///
    /// Returns `Err(StorageError::EntryNotFound)` if the entry does not exist.
    async fn get_entry(&self, entry_id: &str) -> Result<NormalizedEntry, StorageError>;

    /// List committed entry headers ordered by entry id.
    ///
    /// - `form_id`: filter to a specific form
    /// - `include_deleted`: include soft-deleted entries
    async fn list_entries(
        &self,
        form_id: Option<&str>,
        include_deleted: bool,
    ) -> Result<Vec<EntryHeader>, StorageError>;
}
