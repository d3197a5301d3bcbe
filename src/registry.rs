//! Application Registry: CRUD over application records with the
//! gateway's error taxonomy applied.

use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{Application, ApplicationPatch, NewApplication};
use crate::store::sqlite::SqliteStore;

#[derive(Clone)]
pub struct Registry {
    store: SqliteStore,
}

impl Registry {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    /// Persist a new record. A key is generated when the caller gives none.
    pub async fn create(&self, payload: NewApplication) -> Result<String, AppError> {
        let key = match payload.key.as_deref().map(str::trim) {
            Some("") => return Err(AppError::Validation("key must not be empty".into())),
            Some(explicit) => explicit.to_string(),
            None => Uuid::new_v4().to_string(),
        };

        let app = payload.into_application(key.clone(), Utc::now());
        validate(&app)?;

        if !self.store.insert_application(&app).await? {
            tracing::warn!(key = %mask_key(&key), "create rejected: key exists");
            return Err(AppError::Conflict(key));
        }

        tracing::info!(key = %mask_key(&key), name = %app.name, binding = %app.binding, "application created");
        Ok(key)
    }

    pub async fn get(&self, key: &str) -> Result<Application, AppError> {
        self.store
            .get_application(key)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn list(&self) -> Result<Vec<Application>, AppError> {
        Ok(self.store.list_applications().await?)
    }

    /// Apply a partial update; fields absent from `patch` keep their values.
    pub async fn update(&self, key: &str, patch: ApplicationPatch) -> Result<Application, AppError> {
        let mut app = self.get(key).await?;
        patch.apply(&mut app, Utc::now());
        validate(&app)?;

        // The record may have been deleted between read and write.
        if !self.store.update_application(&app).await? {
            return Err(AppError::NotFound);
        }

        tracing::info!(key = %mask_key(key), active = app.active, "application updated");
        Ok(app)
    }

    pub async fn delete(&self, key: &str) -> Result<(), AppError> {
        if !self.store.delete_application(key).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(key = %mask_key(key), "application deleted");
        Ok(())
    }
}

fn validate(app: &Application) -> Result<(), AppError> {
    if app.name.is_empty() {
        return Err(AppError::Validation("name must not be empty".into()));
    }
    if app.binding.is_empty() {
        return Err(AppError::Validation("binding must not be empty".into()));
    }
    if !app.host_address.is_empty() {
        let url = url::Url::parse(&app.host_address).map_err(|e| {
            AppError::Validation(format!("invalid host_address '{}': {}", app.host_address, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(AppError::Validation(format!(
                "host_address must use http or https, got '{}'",
                url.scheme()
            )));
        }
    }
    Ok(())
}

/// Shorten an application key for logs.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}…{}", head, tail)
    } else {
        "****".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("0123456789abcdef"), "0123…cdef");
        assert_eq!(mask_key("demo"), "****");
    }

    #[test]
    fn test_validate_rejects_non_http_host() {
        let mut app = NewApplication::new("a", "ollama").into_application("k".into(), Utc::now());
        app.host_address = "ftp://example.com".into();
        assert!(matches!(validate(&app), Err(AppError::Validation(_))));
        app.host_address = "not a url".into();
        assert!(matches!(validate(&app), Err(AppError::Validation(_))));
        app.host_address = "https://example.com:8443".into();
        assert!(validate(&app).is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let app = NewApplication::new("  ", "ollama").into_application("k".into(), Utc::now());
        assert!(matches!(validate(&app), Err(AppError::Validation(_))));
    }
}
