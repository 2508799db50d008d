use aadprobe_config::Fixture;
use aadprobe_domain::{ObjectId, StateSnapshot};
use async_trait::async_trait;

use crate::error::ProvisionError;

/// Drives apply / import / destroy for one scenario's workspace.
///
/// A provisioner owns exactly one workspace; steps are issued in order by the
/// scenario runner and never concurrently.
#[async_trait]
pub trait Provisioner: Send + Sync {
    fn name(&self) -> &'static str;

    /// Create or update the fixture's resources and return the new state.
    async fn apply(&self, fixture: &Fixture) -> Result<StateSnapshot, ProvisionError>;

    /// Forget `address` from state, import it again by `id`, and return the
    /// resulting state.
    async fn reimport(&self, address: &str, id: &ObjectId) -> Result<StateSnapshot, ProvisionError>;

    /// Tear down everything the workspace manages.
    async fn destroy(&self) -> Result<(), ProvisionError>;
}
