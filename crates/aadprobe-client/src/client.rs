use async_trait::async_trait;
use aadprobe_domain::{Application, ObjectId};

use crate::error::ClientError;

/// Narrow read interface to the remote directory service.
///
/// Implementations must map a missing object to [`ClientError::NotFound`] and
/// nothing else; callers never inspect raw responses.
#[async_trait]
pub trait DirectoryClient: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Read one application object by its directory object ID.
    async fn get_application(&self, id: &ObjectId) -> Result<Application, ClientError>;
}
