use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("resource identifier must not be empty")]
    EmptyIdentifier,

    #[error("invalid lifecycle phase: {0}")]
    InvalidPhase(String),

    #[error("invalid state snapshot: {0}")]
    InvalidSnapshot(String),
}
