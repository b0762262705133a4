//! Normalized storage for dentbooks entries: record types for the eleven
//! entry tables, the flat/normalized bridge, the `EntryStorage` trait with
//! an in-memory backend, and a backend conformance suite.

pub mod bridge;
pub mod conformance;
mod error;
mod memory;
mod persist;
mod record;
mod traits;

pub use bridge::{to_flat, to_normalized, to_normalized_with};
pub use error::{BridgeError, StorageError};
pub use memory::{InMemoryEntryStorage, MemorySnapshot};
pub use persist::{create_entry, delete_entry, load_entry, now_rfc3339, update_entry};
pub use record::{
    BreakdownLineRow, DeductionReductionRow, DeductionsRow, EntryHeader, FieldCalculationRow, FieldValueRow, FlatEntry,
    GrossAdditionalReductionRow, GrossDetailsRow, GrossOutworkRow, GrossReductionRow,
    GrossReductionsSummaryRow, GrossReimbursementRow, MethodDetails, NetDetailsRow,
    NormalizedEntry, SummaryRow, ValueKind,
};
pub use traits::EntryStorage;
