use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::DomainError;

/// Terraform resource type of the object this workspace verifies.
pub const APPLICATION_RESOURCE_TYPE: &str = "azuread_application";

// ── Identifiers ──────────────────────────────────────────────────────────────

/// Directory object ID assigned by the provisioning step. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(s: impl Into<String>) -> Result<Self, DomainError> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(DomainError::EmptyIdentifier);
        }
        Ok(ObjectId(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ObjectId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        ObjectId::new(s)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Enums ─────────────────────────────────────────────────────────────────────

/// The state a provisioned resource is expected to be in at a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecyclePhase {
    Created,
    Updated,
    Destroyed,
}

impl LifecyclePhase {
    /// Whether this phase expects the remote object to exist.
    pub fn expects_presence(&self) -> bool {
        match self {
            LifecyclePhase::Created | LifecyclePhase::Updated => true,
            LifecyclePhase::Destroyed => false,
        }
    }
}

impl std::fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecyclePhase::Created => write!(f, "created"),
            LifecyclePhase::Updated => write!(f, "updated"),
            LifecyclePhase::Destroyed => write!(f, "destroyed"),
        }
    }
}

impl FromStr for LifecyclePhase {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created" => Ok(LifecyclePhase::Created),
            "updated" => Ok(LifecyclePhase::Updated),
            "destroyed" => Ok(LifecyclePhase::Destroyed),
            other => Err(DomainError::InvalidPhase(other.to_string())),
        }
    }
}

// ── Application ───────────────────────────────────────────────────────────────

/// An Azure AD application object as returned by the directory Graph API.
///
/// Field names follow the Graph wire format (`objectId`, `appId`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub object_id: String,
    /// The application (client) ID. Terraform exposes it as `application_id`.
    #[serde(default)]
    pub app_id: String,
    pub display_name: String,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub identifier_uris: Vec<String>,
    #[serde(default)]
    pub reply_urls: Vec<String>,
    #[serde(default)]
    pub available_to_other_tenants: bool,
    #[serde(default)]
    pub oauth2_allow_implicit_flow: bool,
}
