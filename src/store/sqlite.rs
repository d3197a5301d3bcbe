use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::models::application::{
    non_empty, parse_model_list, Application, DEFAULT_BINDING, DEMO_APP_KEY,
};

const CREATE_APPLICATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS applications (
    key TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    binding TEXT NOT NULL DEFAULT 'lollms',
    host_address TEXT,
    service_key TEXT,
    verify_ssl INTEGER NOT NULL DEFAULT 1,
    certificate_file_path TEXT,
    allowed_models TEXT NOT NULL DEFAULT '[]',
    active INTEGER NOT NULL DEFAULT 1,
    welcome_message TEXT,
    created_at TEXT,
    updated_at TEXT
)
"#;

/// Columns added after the first schema revision, with the DDL used to
/// backfill them on older databases. SQLite only accepts constant
/// defaults in ALTER TABLE, so timestamps are filled in afterwards.
const ADDED_COLUMNS: &[(&str, &str)] = &[
    ("verify_ssl", "INTEGER NOT NULL DEFAULT 1"),
    ("certificate_file_path", "TEXT"),
    ("active", "INTEGER NOT NULL DEFAULT 1"),
    ("welcome_message", "TEXT"),
    ("created_at", "TEXT"),
    ("updated_at", "TEXT"),
];

const APPLICATION_COLUMNS: &str = "key, name, binding, host_address, service_key, verify_ssl, \
     certificate_file_path, allowed_models, active, welcome_message, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let in_memory = database_url.contains(":memory:");
        let mut options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        if !in_memory {
            if let Some(parent) = options.get_filename().parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // An in-memory database lives and dies with its connection, so the
        // pool is pinned to one connection that is never recycled.
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(8)
                .connect_with(options)
                .await?
        };

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Bring the schema up to date and ensure the demo record exists.
    ///
    /// Safe to run on every start. Databases written by older revisions
    /// get the missing columns added with their defaults; existing rows
    /// keep their data.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(CREATE_APPLICATIONS).execute(&self.pool).await?;

        let existing: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info('applications')")
                .fetch_all(&self.pool)
                .await?;

        for (column, ddl) in ADDED_COLUMNS {
            if !existing.iter().any(|c| c == column) {
                tracing::info!(column, "adding missing column to applications");
                sqlx::query(&format!("ALTER TABLE applications ADD COLUMN {} {}", column, ddl))
                    .execute(&self.pool)
                    .await?;
            }
        }

        let now = Utc::now();
        sqlx::query("UPDATE applications SET binding = ? WHERE binding IS NULL OR TRIM(binding) = ''")
            .bind(DEFAULT_BINDING)
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "UPDATE applications SET allowed_models = '[]' WHERE allowed_models IS NULL OR TRIM(allowed_models) = ''",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("UPDATE applications SET created_at = ? WHERE created_at IS NULL")
            .bind(now)
            .execute(&self.pool)
            .await?;
        sqlx::query("UPDATE applications SET updated_at = created_at WHERE updated_at IS NULL")
            .execute(&self.pool)
            .await?;

        self.ensure_demo_application().await?;
        Ok(())
    }

    async fn ensure_demo_application(&self) -> anyhow::Result<()> {
        let now = Utc::now();
        let demo = Application {
            key: DEMO_APP_KEY.to_string(),
            name: "Demo Application".to_string(),
            binding: "ollama".to_string(),
            host_address: "http://localhost:11434".to_string(),
            service_key: None,
            verify_ssl: true,
            certificate_file_path: None,
            allowed_models: vec![],
            active: false,
            welcome_message: Some(
                "This demo application is disabled. Ask an administrator to activate it."
                    .to_string(),
            ),
            created_at: now,
            updated_at: now,
        };
        if self.insert_application(&demo).await? {
            tracing::info!("seeded demo application (inactive)");
        }
        Ok(())
    }

    // -- Application Operations --

    /// Insert a record. Returns `false` when the key is already taken.
    pub async fn insert_application(&self, app: &Application) -> anyhow::Result<bool> {
        let result = sqlx::query(&format!(
            "INSERT INTO applications ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(key) DO NOTHING",
            APPLICATION_COLUMNS
        ))
        .bind(&app.key)
        .bind(&app.name)
        .bind(&app.binding)
        .bind(&app.host_address)
        .bind(&app.service_key)
        .bind(app.verify_ssl)
        .bind(&app.certificate_file_path)
        .bind(serde_json::to_string(&app.allowed_models)?)
        .bind(app.active)
        .bind(&app.welcome_message)
        .bind(app.created_at)
        .bind(app.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_application(&self, key: &str) -> anyhow::Result<Option<Application>> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {} FROM applications WHERE key = ?",
            APPLICATION_COLUMNS
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Application::from))
    }

    pub async fn list_applications(&self) -> anyhow::Result<Vec<Application>> {
        let rows = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {} FROM applications ORDER BY created_at ASC, rowid ASC",
            APPLICATION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Application::from).collect())
    }

    /// Overwrite every mutable column of an existing record.
    /// Returns `false` when no record has that key.
    pub async fn update_application(&self, app: &Application) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"UPDATE applications
               SET name = ?, binding = ?, host_address = ?, service_key = ?, verify_ssl = ?,
                   certificate_file_path = ?, allowed_models = ?, active = ?,
                   welcome_message = ?, updated_at = ?
               WHERE key = ?"#,
        )
        .bind(&app.name)
        .bind(&app.binding)
        .bind(&app.host_address)
        .bind(&app.service_key)
        .bind(app.verify_ssl)
        .bind(&app.certificate_file_path)
        .bind(serde_json::to_string(&app.allowed_models)?)
        .bind(app.active)
        .bind(&app.welcome_message)
        .bind(app.updated_at)
        .bind(&app.key)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_application(&self, key: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM applications WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ApplicationRow {
    key: String,
    name: String,
    binding: String,
    host_address: Option<String>,
    service_key: Option<String>,
    verify_ssl: bool,
    certificate_file_path: Option<String>,
    allowed_models: Option<String>,
    active: bool,
    welcome_message: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<ApplicationRow> for Application {
    fn from(row: ApplicationRow) -> Self {
        // Older rows may hold a bare comma list instead of a JSON array.
        let allowed_models = match row.allowed_models.as_deref() {
            None => vec![],
            Some(raw) => serde_json::from_str::<Vec<String>>(raw)
                .unwrap_or_else(|_| parse_model_list(raw)),
        };
        let created_at = row.created_at.unwrap_or_else(Utc::now);

        Application {
            key: row.key,
            name: row.name,
            binding: row.binding,
            host_address: row.host_address.unwrap_or_default(),
            service_key: non_empty(row.service_key),
            verify_ssl: row.verify_ssl,
            certificate_file_path: non_empty(row.certificate_file_path),
            allowed_models,
            active: row.active,
            welcome_message: non_empty(row.welcome_message),
            created_at,
            updated_at: row.updated_at.unwrap_or(created_at),
        }
    }
}
