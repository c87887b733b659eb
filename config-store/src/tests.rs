use std::sync::Arc;

use config_model::{AuditAction, ConfigCategory, ConfigKey, ConfigValue, ValueSource};

use crate::codec::{Base64Codec, JsonCodec, ValueCodec};
use crate::memory::MemoryStore;
use crate::traits::{ConfigStore, SaveRequest, SortDirection, SortField, VersionSort};
use crate::StoreError;

fn key(raw: &str) -> ConfigKey {
    ConfigKey::new(raw).unwrap()
}

#[tokio::test]
async fn test_save_creates_entry_with_version_and_audit() {
    let store = MemoryStore::new();

    let entry = store
        .save(
            SaveRequest::new(key("app.timezone"), "UTC")
                .category(ConfigCategory::System)
                .user(1),
        )
        .await
        .unwrap();

    assert_eq!(entry.key.as_str(), "app.timezone");
    assert_eq!(entry.value, ConfigValue::from("UTC"));
    assert!(entry.state.is_active());

    let versions = store
        .versions_for(entry.id, VersionSort::default())
        .await
        .unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].version, 1);
    assert_eq!(versions[0].user_id, Some(1));

    let audits = store.audits_for(entry.id).await.unwrap();
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].action, AuditAction::Created);
    assert_eq!(audits[0].old_value, None);
    assert_eq!(audits[0].new_value, Some(ConfigValue::from("UTC")));
}

#[tokio::test]
async fn test_save_forces_old_value_to_none_on_create() {
    let store = MemoryStore::new();

    let entry = store
        .save(SaveRequest::new(key("fresh.key"), 1_i64).old_value(ConfigValue::from("stale")))
        .await
        .unwrap();

    let audits = store.audits_for(entry.id).await.unwrap();
    assert_eq!(audits[0].action, AuditAction::Created);
    assert_eq!(audits[0].old_value, None);
}

#[tokio::test]
async fn test_save_update_records_transition() {
    let store = MemoryStore::new();

    let entry = store
        .save(SaveRequest::new(key("f.flag"), true))
        .await
        .unwrap();
    store
        .save(
            SaveRequest::new(key("f.flag"), false).old_value(ConfigValue::from(true)),
        )
        .await
        .unwrap();

    let versions = store
        .versions_for(
            entry.id,
            VersionSort::new(SortField::Version, SortDirection::Asc),
        )
        .await
        .unwrap();
    assert_eq!(
        versions.iter().map(|v| v.version).collect::<Vec<_>>(),
        vec![1, 2]
    );

    // Most recent first.
    let audits = store.audits_for(entry.id).await.unwrap();
    assert_eq!(audits.len(), 2);
    assert_eq!(audits[0].action, AuditAction::Updated);
    assert_eq!(audits[0].old_value, Some(ConfigValue::from(true)));
    assert_eq!(audits[0].new_value, Some(ConfigValue::from(false)));
}

#[tokio::test]
async fn test_delete_then_save_restores() {
    let store = MemoryStore::new();

    let entry = store
        .save(SaveRequest::new(key("app.name"), "one"))
        .await
        .unwrap();

    assert!(store.delete_by_key("app.name", Some(2), true).await.unwrap());
    assert!(store.get_by_key("app.name").await.unwrap().is_none());

    // Soft-deleted rows are still reachable by id when asked for.
    let trashed = store.get_by_id(entry.id, true).await.unwrap().unwrap();
    assert!(!trashed.state.is_active());
    assert!(store.get_by_id(entry.id, false).await.unwrap().is_none());

    let restored = store
        .save(SaveRequest::new(key("app.name"), "two"))
        .await
        .unwrap();
    assert_eq!(restored.id, entry.id);
    assert!(restored.state.is_active());
    assert_eq!(restored.value, ConfigValue::from("two"));

    // The version sequence continues, it does not reset.
    let versions = store
        .versions_for(
            entry.id,
            VersionSort::new(SortField::Version, SortDirection::Asc),
        )
        .await
        .unwrap();
    assert_eq!(
        versions.iter().map(|v| v.version).collect::<Vec<_>>(),
        vec![1, 2]
    );

    let audits = store.audits_for(entry.id).await.unwrap();
    let actions: Vec<_> = audits.iter().map(|a| a.action).collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::Restored,
            AuditAction::Deleted,
            AuditAction::Created
        ]
    );
}

#[tokio::test]
async fn test_delete_missing_key_is_not_an_error() {
    let store = MemoryStore::new();
    assert!(!store.delete_by_key("no.such.key", None, true).await.unwrap());

    // Double delete: the second call is a no-op.
    store
        .save(SaveRequest::new(key("once"), 1_i64))
        .await
        .unwrap();
    assert!(store.delete_by_key("once", None, true).await.unwrap());
    assert!(!store.delete_by_key("once", None, true).await.unwrap());
}

#[tokio::test]
async fn test_delete_audit_has_old_value_only() {
    let store = MemoryStore::new();
    let entry = store
        .save(SaveRequest::new(key("doomed"), 9_i64))
        .await
        .unwrap();
    store.delete_by_key("doomed", Some(3), true).await.unwrap();

    let audits = store.audits_for(entry.id).await.unwrap();
    assert_eq!(audits[0].action, AuditAction::Deleted);
    assert_eq!(audits[0].old_value, Some(ConfigValue::from(9_i64)));
    assert_eq!(audits[0].new_value, None);
    assert_eq!(audits[0].user_id, Some(3));
}

#[tokio::test]
async fn test_empty_key_lookup_short_circuits() {
    let store = MemoryStore::new();
    assert!(store.get_by_key("").await.unwrap().is_none());
    assert!(!store.delete_by_key("", None, true).await.unwrap());
}

#[tokio::test]
async fn test_version_and_audit_can_be_skipped() {
    let store = MemoryStore::new();
    let entry = store
        .save(
            SaveRequest::new(key("quiet"), 1_i64)
                .versioned(false)
                .audited(false),
        )
        .await
        .unwrap();

    assert!(store
        .versions_for(entry.id, VersionSort::default())
        .await
        .unwrap()
        .is_empty());
    assert!(store.audits_for(entry.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_all_skips_deleted() {
    let store = MemoryStore::new();
    store.save(SaveRequest::new(key("a"), 1_i64)).await.unwrap();
    store.save(SaveRequest::new(key("b"), 2_i64)).await.unwrap();
    store.delete_by_key("a", None, false).await.unwrap();

    let all = store.get_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].key.as_str(), "b");
}

#[tokio::test]
async fn test_version_sort_orders() {
    let store = MemoryStore::new();
    let entry = store
        .save(SaveRequest::new(key("sorted"), 1_i64))
        .await
        .unwrap();
    store
        .save(SaveRequest::new(key("sorted"), 2_i64))
        .await
        .unwrap();
    store
        .save(SaveRequest::new(key("sorted"), 3_i64))
        .await
        .unwrap();

    let desc = store
        .versions_for(entry.id, VersionSort::default())
        .await
        .unwrap();
    assert_eq!(desc.iter().map(|v| v.version).collect::<Vec<_>>(), vec![3, 2, 1]);

    let asc = store
        .versions_for(
            entry.id,
            VersionSort::new(SortField::Version, SortDirection::Asc),
        )
        .await
        .unwrap();
    assert_eq!(asc.iter().map(|v| v.version).collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn test_version_sort_param_fallback() {
    assert_eq!(
        VersionSort::from_params("version", "asc"),
        VersionSort::new(SortField::Version, SortDirection::Asc)
    );
    assert_eq!(
        VersionSort::from_params("created_at", "desc"),
        VersionSort::new(SortField::CreatedAt, SortDirection::Desc)
    );
    // Unknown parameters fall back silently.
    assert_eq!(
        VersionSort::from_params("nonsense", "sideways"),
        VersionSort::default()
    );
}

#[test]
fn test_codec_round_trip() {
    let value = ConfigValue::from_json(serde_json::json!({"a": [1, 2], "b": "x"}));

    for codec in [&JsonCodec as &dyn ValueCodec, &Base64Codec] {
        let encoded = codec.encode(&value).unwrap();
        assert_eq!(codec.decode(&encoded).unwrap(), value);
    }
}

#[test]
fn test_base64_codec_obscures_plaintext() {
    let value = ConfigValue::from("hunter2");
    let encoded = Base64Codec.encode(&value).unwrap();
    assert!(!String::from_utf8_lossy(&encoded).contains("hunter2"));

    let garbage = Base64Codec.decode(b"!!not base64!!");
    assert!(matches!(garbage, Err(StoreError::Codec(_))));
}

#[tokio::test]
async fn test_store_reads_back_through_codec() {
    let store = MemoryStore::with_codec(Arc::new(Base64Codec));
    store
        .save(SaveRequest::new(key("secret"), "hunter2"))
        .await
        .unwrap();

    let entry = store.get_by_key("secret").await.unwrap().unwrap();
    assert_eq!(entry.value, ConfigValue::from("hunter2"));
}

#[tokio::test]
async fn test_source_is_persisted() {
    let store = MemoryStore::new();
    let entry = store
        .save(
            SaveRequest::new(key("seeded"), 1_i64)
                .source(ValueSource::File("seed.json".to_string())),
        )
        .await
        .unwrap();
    assert_eq!(entry.source, ValueSource::File("seed.json".to_string()));

    let audits = store.audits_for(entry.id).await.unwrap();
    assert_eq!(audits[0].source, ValueSource::File("seed.json".to_string()));
}

#[test]
fn test_conflict_errors_are_retryable() {
    // A caller that hits a uniqueness violation can recompute and retry;
    // other failures should not be retried blindly.
    let err = crate::version::check_unique(1, 2, [1, 2]).unwrap_err();
    assert!(err.is_conflict());
    assert!(StoreError::DuplicateKey("app.name".to_string()).is_conflict());

    assert!(!StoreError::NotFound("app.name".to_string()).is_conflict());
    assert!(!StoreError::Codec("bad payload".to_string()).is_conflict());
    assert!(!StoreError::InvalidId(0).is_conflict());
}
