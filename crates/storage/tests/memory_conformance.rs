//! Runs the storage conformance suite against the in-memory backend.

use dentbooks_storage::conformance::run_conformance_suite;
use dentbooks_storage::InMemoryEntryStorage;

#[tokio::test]
async fn in_memory_storage_passes_conformance_suite() {
    let report = run_conformance_suite(|| async { InMemoryEntryStorage::new() }).await;
    assert_eq!(report.failed, 0, "conformance failures:\n{}", report);
    assert!(report.total > 0);
}
