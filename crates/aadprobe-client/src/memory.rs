use std::collections::HashMap;
use std::sync::Arc;

use aadprobe_domain::{Application, ObjectId};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::client::DirectoryClient;
use crate::error::ClientError;

#[derive(Debug, Default)]
struct Inner {
    applications: HashMap<String, Application>,
    fail_next: Option<ClientError>,
}

/// In-memory directory implementing [`DirectoryClient`].
///
/// Clones share the same data. Suitable for tests and the local provisioner.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new application. Empty `object_id` / `app_id` are assigned.
    pub async fn create(&self, mut app: Application) -> Application {
        if app.object_id.is_empty() {
            app.object_id = Uuid::new_v4().to_string();
        }
        if app.app_id.is_empty() {
            app.app_id = Uuid::new_v4().to_string();
        }
        debug!(object_id = %app.object_id, "InMemoryDirectory: create");
        let mut guard = self.inner.write().await;
        guard.applications.insert(app.object_id.clone(), app.clone());
        app
    }

    /// Replace an existing application, keeping its object and app IDs.
    pub async fn update(&self, id: &ObjectId, mut app: Application) -> Result<Application, ClientError> {
        let mut guard = self.inner.write().await;
        let existing = guard
            .applications
            .get_mut(id.as_str())
            .ok_or_else(|| ClientError::NotFound(format!("application {}", id)))?;
        app.object_id = existing.object_id.clone();
        app.app_id = existing.app_id.clone();
        *existing = app.clone();
        debug!(object_id = %id, "InMemoryDirectory: update");
        Ok(app)
    }

    pub async fn delete(&self, id: &ObjectId) -> Result<(), ClientError> {
        let mut guard = self.inner.write().await;
        guard
            .applications
            .remove(id.as_str())
            .map(|_| ())
            .ok_or_else(|| ClientError::NotFound(format!("application {}", id)))
    }

    /// Make the next `get_application` call fail with `err`.
    pub async fn fail_next(&self, err: ClientError) {
        self.inner.write().await.fail_next = Some(err);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.applications.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl DirectoryClient for InMemoryDirectory {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get_application(&self, id: &ObjectId) -> Result<Application, ClientError> {
        {
            let mut guard = self.inner.write().await;
            if let Some(err) = guard.fail_next.take() {
                return Err(err);
            }
        }
        let guard = self.inner.read().await;
        guard
            .applications
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("application {} does not exist", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(name: &str) -> Application {
        Application {
            object_id: String::new(),
            app_id: String::new(),
            display_name: name.into(),
            homepage: None,
            identifier_uris: vec![],
            reply_urls: vec![],
            available_to_other_tenants: false,
            oauth2_allow_implicit_flow: false,
        }
    }

    #[tokio::test]
    async fn create_assigns_ids_and_get_finds_it() {
        let dir = InMemoryDirectory::new();
        let created = dir.create(app("acctest1")).await;
        assert!(!created.object_id.is_empty());
        assert!(!created.app_id.is_empty());

        let id = ObjectId::new(created.object_id.clone()).unwrap();
        let fetched = dir.get_application(&id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn update_keeps_identity() {
        let dir = InMemoryDirectory::new();
        let created = dir.create(app("acctest1")).await;
        let id = ObjectId::new(created.object_id.clone()).unwrap();

        let updated = dir.update(&id, app("acctest2")).await.unwrap();
        assert_eq!(updated.object_id, created.object_id);
        assert_eq!(updated.app_id, created.app_id);
        assert_eq!(dir.get_application(&id).await.unwrap().display_name, "acctest2");
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let dir = InMemoryDirectory::new();
        let created = dir.create(app("acctest1")).await;
        let id = ObjectId::new(created.object_id).unwrap();

        dir.delete(&id).await.unwrap();
        assert!(dir.get_application(&id).await.unwrap_err().is_not_found());
        assert!(dir.delete(&id).await.unwrap_err().is_not_found());
        assert!(dir.is_empty().await);
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let dir = InMemoryDirectory::new();
        let id = ObjectId::new("never-created").unwrap();
        dir.fail_next(ClientError::Other("status 500".into())).await;

        assert_eq!(
            dir.get_application(&id).await.unwrap_err(),
            ClientError::Other("status 500".into())
        );
        assert!(dir.get_application(&id).await.unwrap_err().is_not_found());
    }
}
