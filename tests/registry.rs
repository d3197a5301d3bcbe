//! Application Registry, Access Guard and schema-upgrade tests against an
//! in-memory SQLite store.

use appgate::errors::AppError;
use appgate::middleware::model_access::authorize;
use appgate::models::application::{
    ApplicationPatch, ModelList, NewApplication, DEFAULT_BINDING, DEMO_APP_KEY,
};
use appgate::registry::Registry;
use appgate::store::sqlite::SqliteStore;
use tokio_test::{assert_err, assert_ok};

async fn registry() -> Registry {
    let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
    store.migrate().await.unwrap();
    Registry::new(store)
}

fn test_app() -> NewApplication {
    NewApplication {
        host_address: Some("http://localhost:11434".into()),
        models: Some(ModelList::Csv("llama3,mistral".into())),
        ..NewApplication::new("Test", "ollama")
    }
}

// ── Create / Get / List ──────────────────────────────────────

#[tokio::test]
async fn test_explicit_key_conflicts_on_second_create() {
    let reg = registry().await;
    let payload = NewApplication {
        key: Some("team-a".into()),
        ..test_app()
    };

    let key = assert_ok!(reg.create(payload.clone()).await);
    assert_eq!(key, "team-a");

    let err = assert_err!(reg.create(payload).await);
    assert!(matches!(err, AppError::Conflict(ref k) if k == "team-a"));
}

#[tokio::test]
async fn test_generated_keys_are_distinct() {
    let reg = registry().await;
    let a = reg.create(test_app()).await.unwrap();
    let b = reg.create(test_app()).await.unwrap();
    assert_ne!(a, b);
    assert!(uuid::Uuid::parse_str(&a).is_ok());
}

#[tokio::test]
async fn test_blank_explicit_key_is_rejected() {
    let reg = registry().await;
    let payload = NewApplication {
        key: Some("   ".into()),
        ..test_app()
    };
    assert!(matches!(reg.create(payload).await, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_get_returns_all_stored_fields() {
    let reg = registry().await;
    let payload = NewApplication {
        service_key: Some("sk-123".into()),
        verify_ssl: false,
        certificate_file_path: Some("/etc/ssl/ca.pem".into()),
        welcome_message: Some("Hello!".into()),
        ..test_app()
    };
    let key = reg.create(payload).await.unwrap();

    let app = reg.get(&key).await.unwrap();
    assert_eq!(app.name, "Test");
    assert_eq!(app.binding, "ollama");
    assert_eq!(app.host_address, "http://localhost:11434");
    assert_eq!(app.service_key.as_deref(), Some("sk-123"));
    assert!(!app.verify_ssl);
    assert_eq!(app.certificate_file_path.as_deref(), Some("/etc/ssl/ca.pem"));
    assert_eq!(app.allowed_models, vec!["llama3", "mistral"]);
    assert!(app.active);
    assert_eq!(app.welcome_message.as_deref(), Some("Hello!"));
}

#[tokio::test]
async fn test_list_includes_seed_and_created_records() {
    let reg = registry().await;
    let key = reg.create(test_app()).await.unwrap();

    let apps = reg.list().await.unwrap();
    assert_eq!(apps.len(), 2);
    assert!(apps.iter().any(|a| a.key == key));

    let demo = apps.iter().find(|a| a.key == DEMO_APP_KEY).unwrap();
    assert!(!demo.active, "seed application must start deactivated");
}

#[tokio::test]
async fn test_get_unknown_key_is_not_found() {
    let reg = registry().await;
    assert!(matches!(reg.get("nope").await, Err(AppError::NotFound)));
}

// ── Update / Delete ──────────────────────────────────────────

#[tokio::test]
async fn test_update_patches_only_supplied_fields() {
    let reg = registry().await;
    let key = reg.create(test_app()).await.unwrap();

    let patch = ApplicationPatch {
        models: Some(ModelList::List(vec!["phi3".into()])),
        active: Some(false),
        ..Default::default()
    };
    let updated = reg.update(&key, patch).await.unwrap();
    assert_eq!(updated.allowed_models, vec!["phi3"]);
    assert!(!updated.active);

    let stored = reg.get(&key).await.unwrap();
    assert_eq!(stored.name, "Test");
    assert_eq!(stored.host_address, "http://localhost:11434");
    assert_eq!(stored.allowed_models, vec!["phi3"]);
    assert!(!stored.active);
    assert!(stored.updated_at >= stored.created_at);
}

#[tokio::test]
async fn test_update_unknown_key_is_not_found() {
    let reg = registry().await;
    let patch = ApplicationPatch {
        name: Some("x".into()),
        ..Default::default()
    };
    assert!(matches!(reg.update("missing", patch).await, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_update_rejects_invalid_host() {
    let reg = registry().await;
    let key = reg.create(test_app()).await.unwrap();
    let patch = ApplicationPatch {
        host_address: Some("localhost:11434".into()),
        ..Default::default()
    };
    assert!(matches!(reg.update(&key, patch).await, Err(AppError::Validation(_))));
    assert_eq!(reg.get(&key).await.unwrap().host_address, "http://localhost:11434");
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let reg = registry().await;
    let key = reg.create(test_app()).await.unwrap();

    assert_ok!(reg.delete(&key).await);
    assert!(matches!(reg.get(&key).await, Err(AppError::NotFound)));
    assert!(matches!(reg.delete(&key).await, Err(AppError::NotFound)));
}

// ── Access Guard ─────────────────────────────────────────────

#[tokio::test]
async fn test_guard_allows_listed_model_and_forbids_others() {
    let reg = registry().await;
    let key = reg.create(test_app()).await.unwrap();

    let app = assert_ok!(authorize(&reg, &key, "llama3").await);
    assert_eq!(app.host_address, "http://localhost:11434");
    assert!(matches!(authorize(&reg, &key, "gpt-4").await, Err(AppError::Forbidden)));
}

#[tokio::test]
async fn test_guard_with_empty_allow_list_accepts_any_model() {
    let reg = registry().await;
    let key = reg.create(NewApplication::new("Open", "ollama")).await.unwrap();
    for model in ["llama3", "gpt-4", "some/model:latest"] {
        assert_ok!(authorize(&reg, &key, model).await);
    }
}

#[tokio::test]
async fn test_guard_forbids_every_model_once_deactivated() {
    let reg = registry().await;
    let key = reg.create(test_app()).await.unwrap();
    let patch = ApplicationPatch {
        active: Some(false),
        ..Default::default()
    };
    reg.update(&key, patch).await.unwrap();

    for model in ["llama3", "mistral", "gpt-4"] {
        assert!(matches!(authorize(&reg, &key, model).await, Err(AppError::Forbidden)));
    }
}

#[tokio::test]
async fn test_guard_unknown_or_deleted_key_is_not_found() {
    let reg = registry().await;
    assert!(matches!(authorize(&reg, "ghost", "llama3").await, Err(AppError::NotFound)));

    let key = reg.create(test_app()).await.unwrap();
    reg.delete(&key).await.unwrap();
    assert!(matches!(authorize(&reg, &key, "llama3").await, Err(AppError::NotFound)));
}

// ── Schema upgrade ───────────────────────────────────────────

#[tokio::test]
async fn test_legacy_schema_is_backfilled_without_data_loss() {
    let store = SqliteStore::connect("sqlite::memory:").await.unwrap();

    // First-revision table: no active / verify_ssl / welcome_message columns.
    sqlx::query(
        r#"CREATE TABLE applications (
            key TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            binding TEXT NOT NULL,
            host_address TEXT,
            service_key TEXT,
            allowed_models TEXT
        )"#,
    )
    .execute(store.pool())
    .await
    .unwrap();

    for (key, name, binding, host, models) in [
        ("legacy-1", "Chat Bot", "ollama", "http://gpu-box:11434", r#"["llama3"]"#),
        ("legacy-2", "Writer", "", "http://localhost:9600", "[]"),
    ] {
        sqlx::query(
            "INSERT INTO applications (key, name, binding, host_address, service_key, allowed_models) VALUES (?, ?, ?, ?, '', ?)",
        )
        .bind(key)
        .bind(name)
        .bind(binding)
        .bind(host)
        .bind(models)
        .execute(store.pool())
        .await
        .unwrap();
    }

    store.migrate().await.unwrap();
    let reg = Registry::new(store);

    let first = reg.get("legacy-1").await.unwrap();
    assert!(first.active);
    assert!(first.verify_ssl);
    assert_eq!(first.name, "Chat Bot");
    assert_eq!(first.binding, "ollama");
    assert_eq!(first.host_address, "http://gpu-box:11434");
    assert_eq!(first.allowed_models, vec!["llama3"]);
    assert_eq!(first.service_key, None);
    assert_eq!(first.welcome_message, None);

    let second = reg.get("legacy-2").await.unwrap();
    assert!(second.active);
    assert_eq!(second.binding, DEFAULT_BINDING);
    assert_eq!(second.host_address, "http://localhost:9600");

    // Seed added alongside the legacy rows.
    assert_eq!(reg.list().await.unwrap().len(), 3);

    // Upgraded rows behave like new ones.
    assert_ok!(authorize(&reg, "legacy-1", "llama3").await);
}
