use aadprobe_client::{DirectoryClient, InMemoryDirectory};
use aadprobe_config::{ApplicationSpec, Fixture, FIXTURE_ADDRESS};
use aadprobe_domain::{Application, ObjectId, ResourceState, StateSnapshot, APPLICATION_RESOURCE_TYPE};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::ProvisionError;
use crate::provisioner::Provisioner;

/// A provisioner that applies fixtures against an [`InMemoryDirectory`].
///
/// - Mirrors the provider's defaults (homepage `https://<name>`).
/// - Updates in place, keeping the object ID, as the real provider does.
/// - Performs no external I/O.
pub struct LocalProvisioner {
    directory: InMemoryDirectory,
    state:     Mutex<StateSnapshot>,
}

impl LocalProvisioner {
    pub fn new(directory: InMemoryDirectory) -> Self {
        Self { directory, state: Mutex::new(StateSnapshot::default()) }
    }

    pub fn directory(&self) -> &InMemoryDirectory {
        &self.directory
    }
}

fn application_from_spec(spec: &ApplicationSpec) -> Application {
    Application {
        object_id: String::new(),
        app_id: String::new(),
        display_name: spec.name.clone(),
        homepage: Some(spec.effective_homepage()),
        identifier_uris: spec.identifier_uris.clone(),
        reply_urls: spec.reply_urls.clone(),
        available_to_other_tenants: spec.available_to_other_tenants,
        oauth2_allow_implicit_flow: spec.oauth2_allow_implicit_flow,
    }
}

/// Render an application the way the provider records it in state.
fn resource_state(address: &str, app: &Application) -> ResourceState {
    let name = address.split_once('.').map(|(_, n)| n).unwrap_or(address);
    let values = json!({
        "id": app.object_id,
        "application_id": app.app_id,
        "name": app.display_name,
        "homepage": app.homepage,
        "identifier_uris": app.identifier_uris,
        "reply_urls": app.reply_urls,
        "available_to_other_tenants": app.available_to_other_tenants,
        "oauth2_allow_implicit_flow": app.oauth2_allow_implicit_flow,
    });
    ResourceState {
        address: address.to_string(),
        resource_type: APPLICATION_RESOURCE_TYPE.to_string(),
        name: name.to_string(),
        values: match values {
            Value::Object(map) => map,
            _ => Map::new(),
        },
    }
}

#[async_trait]
impl Provisioner for LocalProvisioner {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn apply(&self, fixture: &Fixture) -> Result<StateSnapshot, ProvisionError> {
        let desired = application_from_spec(&fixture.spec());
        let mut state = self.state.lock().await;

        let existing = state
            .resource(FIXTURE_ADDRESS)
            .and_then(|rs| rs.id())
            .map(ObjectId::new)
            .transpose()?;

        let app = match existing {
            Some(id) => match self.directory.update(&id, desired.clone()).await {
                Ok(app) => app,
                // Drifted away remotely: recreate.
                Err(e) if e.is_not_found() => self.directory.create(desired).await,
                Err(e) => return Err(e.into()),
            },
            None => self.directory.create(desired).await,
        };
        debug!(object_id = %app.object_id, variant = %fixture.variant, "LocalProvisioner: applied");

        *state = StateSnapshot::new(vec![resource_state(FIXTURE_ADDRESS, &app)]);
        Ok(state.clone())
    }

    async fn reimport(&self, address: &str, id: &ObjectId) -> Result<StateSnapshot, ProvisionError> {
        let mut state = self.state.lock().await;
        let app = self.directory.get_application(id).await?;
        debug!(object_id = %id, address, "LocalProvisioner: imported");

        state.resources.retain(|r| r.address != address);
        state.resources.push(resource_state(address, &app));
        Ok(state.clone())
    }

    async fn destroy(&self) -> Result<(), ProvisionError> {
        let mut state = self.state.lock().await;
        for rs in state.resources_of_type(APPLICATION_RESOURCE_TYPE) {
            let Some(raw) = rs.id() else { continue };
            let id = ObjectId::new(raw)?;
            match self.directory.delete(&id).await {
                Ok(()) => debug!(object_id = %id, "LocalProvisioner: destroyed"),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e.into()),
            }
        }
        *state = StateSnapshot::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aadprobe_config::Variant;
    use aadprobe_client::ClientError;

    #[tokio::test]
    async fn apply_creates_then_updates_in_place() {
        let p = LocalProvisioner::new(InMemoryDirectory::new());

        let first = p.apply(&Fixture::new(Variant::Basic, "one")).await.unwrap();
        let first_id = first.resource(FIXTURE_ADDRESS).unwrap().id().unwrap().to_string();
        let rs = first.resource(FIXTURE_ADDRESS).unwrap();
        assert_eq!(rs.attribute("homepage").as_deref(), Some("https://acctestone"));

        let second = p.apply(&Fixture::new(Variant::Complete, "two")).await.unwrap();
        let rs = second.resource(FIXTURE_ADDRESS).unwrap();
        assert_eq!(rs.id(), Some(first_id.as_str()));
        assert_eq!(rs.attribute("name").as_deref(), Some("acctesttwo"));
        assert_eq!(rs.attribute("reply_urls.#").as_deref(), Some("1"));
        assert_eq!(p.directory().len().await, 1);
    }

    #[tokio::test]
    async fn reimport_matches_applied_state() {
        let p = LocalProvisioner::new(InMemoryDirectory::new());
        let applied = p.apply(&Fixture::new(Variant::Complete, "imp")).await.unwrap();
        let rs = applied.resource(FIXTURE_ADDRESS).unwrap();
        let id = ObjectId::new(rs.id().unwrap()).unwrap();

        let imported = p.reimport(FIXTURE_ADDRESS, &id).await.unwrap();
        assert_eq!(
            imported.resource(FIXTURE_ADDRESS).unwrap().flat_attributes(),
            rs.flat_attributes()
        );
    }

    #[tokio::test]
    async fn failed_reimport_keeps_resource_for_destroy() {
        let p = LocalProvisioner::new(InMemoryDirectory::new());
        let applied = p.apply(&Fixture::new(Variant::Basic, "keep")).await.unwrap();
        let id = ObjectId::new(applied.resource(FIXTURE_ADDRESS).unwrap().id().unwrap()).unwrap();

        p.directory().fail_next(ClientError::Transient("status 503".into())).await;
        assert!(p.reimport(FIXTURE_ADDRESS, &id).await.is_err());

        p.destroy().await.unwrap();
        assert!(p.directory().is_empty().await);
    }

    #[tokio::test]
    async fn destroy_removes_objects_and_is_idempotent() {
        let p = LocalProvisioner::new(InMemoryDirectory::new());
        p.apply(&Fixture::new(Variant::Basic, "gone")).await.unwrap();

        p.destroy().await.unwrap();
        assert!(p.directory().is_empty().await);
        p.destroy().await.unwrap();
    }
}
