use aadprobe_client::ClientError;
use aadprobe_domain::{Application, DomainError, ObjectId};
use thiserror::Error;

/// Why a single remote-state verification failed. All variants are terminal.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Azure AD application {id} does not exist")]
    ResourceMissing { id: ObjectId },

    #[error("Azure AD application {id} still exists:\n{payload:#?}")]
    ResourceStillExists { id: ObjectId, payload: Box<Application> },

    #[error("Get on Azure AD application {id}: {source}")]
    Unexpected {
        id: ObjectId,
        #[source]
        source: ClientError,
    },
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("not found in state: {0}")]
    ResourceNotInState(String),

    #[error("{address}: invalid primary id: {source}")]
    InvalidId {
        address: String,
        #[source]
        source: DomainError,
    },

    #[error("{address}: attribute '{key}' expected {expected:?}, got {actual:?}")]
    AttributeMismatch {
        address: String,
        key: String,
        expected: String,
        actual: Option<String>,
    },

    #[error("{address}: attribute '{key}' expected to be set")]
    AttributeNotSet { address: String, key: String },

    #[error("{address}: id changed from {before} to {after}")]
    IdChanged {
        address: String,
        before: String,
        after: String,
    },

    #[error("{address}: imported attribute '{key}' differs: state {before:?}, imported {after:?}")]
    ImportMismatch {
        address: String,
        key: String,
        before: Option<String>,
        after: Option<String>,
    },

    #[error(transparent)]
    Verification(#[from] VerificationError),
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("{command} failed with exit code {code}:\n{log}")]
    CommandFailed {
        command: String,
        code: i32,
        log: String,
    },

    #[error("{0} timed out")]
    Timeout(String),

    #[error("io error in {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unreadable state: {0}")]
    State(#[from] DomainError),

    #[error("directory error: {0}")]
    Directory(#[from] ClientError),

    #[error("internal provisioner error: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("test case '{0}' has no steps")]
    Empty(String),

    #[error("test case '{case}': step {step} imports before any apply")]
    ImportBeforeApply { case: String, step: usize },
}
