use super::*;
use serde_json::json;

fn users() -> EntityName {
    "users".parse().expect("entity")
}

fn products() -> EntityName {
    "products".parse().expect("entity")
}

fn fields(value: serde_json::Value) -> Fields {
    value.as_object().cloned().expect("object")
}

async fn sqlite_store() -> SqliteStore {
    SqliteStore::new("sqlite::memory:").await.expect("db")
}

async fn exercise_crud(store: &dyn RecordStore) {
    let first = store
        .insert(&users(), fields(json!({ "name": "John Doe" })))
        .await
        .expect("insert");
    let second = store
        .insert(&users(), fields(json!({ "name": "Jane Smith" })))
        .await
        .expect("insert");
    assert_eq!(first.id, RecordId(1));
    assert_eq!(second.id, RecordId(2));

    let found = store
        .find(&users(), first.id)
        .await
        .expect("find")
        .expect("record");
    assert_eq!(found.fields["name"], json!("John Doe"));

    let updated = StoredRecord {
        id: first.id,
        fields: fields(json!({ "name": "John Updated" })),
    };
    assert!(store.replace(&users(), &updated).await.expect("replace"));
    let listed = store.list(&users()).await.expect("list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].fields["name"], json!("John Updated"));
    assert_eq!(listed[1].id, RecordId(2));

    assert!(store.delete(&users(), first.id).await.expect("delete"));
    assert!(!store.delete(&users(), first.id).await.expect("delete twice"));
    assert!(store.find(&users(), first.id).await.expect("find").is_none());
    assert_eq!(store.count(&users()).await.expect("count"), 1);
}

async fn exercise_id_isolation(store: &dyn RecordStore) {
    let user = store
        .insert(&users(), fields(json!({ "name": "a" })))
        .await
        .expect("insert");
    store.delete(&users(), user.id).await.expect("delete");
    let next = store
        .insert(&users(), fields(json!({ "name": "b" })))
        .await
        .expect("insert");
    assert_eq!(next.id, RecordId(2), "ids are not reused after delete");

    let product = store
        .insert(&products(), fields(json!({ "name": "Laptop" })))
        .await
        .expect("insert");
    assert_eq!(product.id, RecordId(1), "each entity has its own sequence");
    assert!(store.list(&products()).await.expect("list").len() == 1);
}

#[tokio::test]
async fn memory_store_supports_crud() {
    exercise_crud(&MemoryStore::new()).await;
}

#[tokio::test]
async fn memory_store_keeps_per_entity_sequences() {
    exercise_id_isolation(&MemoryStore::new()).await;
}

#[tokio::test]
async fn sqlite_store_supports_crud() {
    exercise_crud(&sqlite_store().await).await;
}

#[tokio::test]
async fn sqlite_store_keeps_per_entity_sequences() {
    exercise_id_isolation(&sqlite_store().await).await;
}

#[tokio::test]
async fn replace_of_missing_record_reports_false() {
    let store = MemoryStore::new();
    let ghost = StoredRecord {
        id: RecordId(9),
        fields: Fields::new(),
    };
    assert!(!store.replace(&users(), &ghost).await.expect("replace"));

    let store = sqlite_store().await;
    assert!(!store.replace(&users(), &ghost).await.expect("replace"));
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let store = sqlite_store().await;
    store.health_check().await.expect("health check");
}

#[tokio::test]
async fn sqlite_records_survive_reopen() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("tabula_storage_test_{suffix}"));
    let db_path = temp_root.join("nested").join("records.db");
    let database_url = prepare_database_url(db_path.to_string_lossy().as_ref()).expect("url");

    let store = SqliteStore::new(&database_url).await.expect("db");
    store
        .insert(&users(), fields(json!({ "name": "persisted" })))
        .await
        .expect("insert");
    store.pool().close().await;

    let reopened = SqliteStore::new(&database_url).await.expect("reopen");
    let listed = reopened.list(&users()).await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].fields["name"], json!("persisted"));
    let next = reopened
        .insert(&users(), Fields::new())
        .await
        .expect("insert");
    assert_eq!(next.id, RecordId(2));
    reopened.pool().close().await;

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}

#[tokio::test]
async fn open_store_defaults_to_memory() {
    let store = open_store(None).await.expect("store");
    store.health_check().await.expect("health");
    let store = open_store(Some(MEMORY_URL)).await.expect("store");
    assert_eq!(store.count(&users()).await.expect("count"), 0);
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(
        normalize_database_url("sqlite:data/test.db"),
        "sqlite://data/test.db"
    );
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
}

#[test]
fn memory_url_has_no_parent_directory() {
    assert!(sqlite_path("sqlite::memory:").is_none());
    assert_eq!(
        sqlite_path("sqlite://./data/test.db?mode=rwc"),
        Some(PathBuf::from("./data/test.db"))
    );
}
