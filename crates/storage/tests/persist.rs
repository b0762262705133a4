//! Entry lifecycle helpers over the in-memory backend.

use dentbooks_forms::parse_form;
use dentbooks_storage::{
    create_entry, delete_entry, load_entry, to_normalized, update_entry, EntryStorage, FlatEntry,
    InMemoryEntryStorage, NormalizedEntry, StorageError,
};
use serde_json::json;

fn entry(id: &str, fee: u32) -> NormalizedEntry {
    let form = parse_form(&json!({
        "id": "form-1",
        "calculationMethod": "net",
        "formType": "income",
        "fields": [
            {"id": "fees", "name": "Fees", "type": "currency", "section": "income", "includeInTotal": true}
        ]
    }))
    .unwrap();
    let flat = FlatEntry {
        id: id.to_string(),
        form_id: "form-1".to_string(),
        clinic_id: None,
        user_id: None,
        quarter_id: None,
        entry_date: None,
        description: None,
        values: json!([{"fieldId": "fees", "value": fee}]),
        calculations: json!(null),
        deductions: json!(null),
        created_at: String::new(),
        updated_at: String::new(),
        deleted_at: None,
    };
    to_normalized(&flat, &form).unwrap()
}

#[tokio::test]
async fn create_stamps_timestamps() {
    let storage = InMemoryEntryStorage::new();
    let created = create_entry(&storage, entry("entry-1", 100)).await.unwrap();
    assert!(!created.header.created_at.is_empty());
    assert_eq!(created.header.created_at, created.header.updated_at);

    let loaded = load_entry(&storage, "entry-1").await.unwrap();
    assert_eq!(loaded, created);
}

#[tokio::test]
async fn create_twice_fails() {
    let storage = InMemoryEntryStorage::new();
    create_entry(&storage, entry("entry-1", 100)).await.unwrap();
    let err = create_entry(&storage, entry("entry-1", 200)).await.unwrap_err();
    assert!(matches!(err, StorageError::AlreadyExists { .. }), "got {:?}", err);
}

#[tokio::test]
async fn update_keeps_created_at_and_replaces_rows() {
    let storage = InMemoryEntryStorage::new();
    let created = create_entry(&storage, entry("entry-1", 100)).await.unwrap();

    let mut changed = entry("entry-1", 250);
    changed.header.created_at = "1999-01-01T00:00:00Z".to_string();
    let updated = update_entry(&storage, changed).await.unwrap();
    assert_eq!(updated.header.created_at, created.header.created_at);

    let loaded = load_entry(&storage, "entry-1").await.unwrap();
    assert_eq!(loaded.field_values[0].value_json, "250");
    assert_eq!(loaded.header.created_at, created.header.created_at);
}

#[tokio::test]
async fn update_missing_entry_fails() {
    let storage = InMemoryEntryStorage::new();
    let err = update_entry(&storage, entry("entry-9", 100)).await.unwrap_err();
    assert!(matches!(err, StorageError::EntryNotFound { .. }), "got {:?}", err);
}

#[tokio::test]
async fn update_after_delete_fails_and_leaves_entry_alone() {
    let storage = InMemoryEntryStorage::new();
    create_entry(&storage, entry("entry-1", 100)).await.unwrap();
    delete_entry(&storage, "entry-1").await.unwrap();

    let err = update_entry(&storage, entry("entry-1", 250)).await.unwrap_err();
    assert!(matches!(err, StorageError::EntryDeleted { .. }), "got {:?}", err);

    let loaded = load_entry(&storage, "entry-1").await.unwrap();
    assert!(loaded.is_deleted());
    assert_eq!(loaded.field_values[0].value_json, "100");
}

#[tokio::test]
async fn delete_hides_entry_from_default_listing() {
    let storage = InMemoryEntryStorage::new();
    create_entry(&storage, entry("entry-1", 100)).await.unwrap();
    create_entry(&storage, entry("entry-2", 100)).await.unwrap();
    delete_entry(&storage, "entry-1").await.unwrap();

    let live = storage.list_entries(Some("form-1"), false).await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].entry_id, "entry-2");
}

#[tokio::test]
async fn delete_missing_entry_fails() {
    let storage = InMemoryEntryStorage::new();
    let err = delete_entry(&storage, "entry-9").await.unwrap_err();
    assert!(matches!(err, StorageError::EntryNotFound { .. }), "got {:?}", err);
}
