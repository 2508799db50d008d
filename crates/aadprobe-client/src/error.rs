use thiserror::Error;

/// Failure of a directory read, classified once from the transport response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The directory explicitly reported that the object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Throttling, gateway errors, timeouts and refused connections.
    #[error("transient directory error: {0}")]
    Transient(String),

    #[error("directory error: {0}")]
    Other(String),
}

impl ClientError {
    /// Classify a non-2xx HTTP status.
    pub fn from_status(status: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match status {
            404 => ClientError::NotFound(detail),
            429 | 502 | 503 | 504 => ClientError::Transient(detail),
            _ => ClientError::Other(detail),
        }
    }

    /// Classify a request that never produced a response.
    pub fn from_transport(context: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            ClientError::Transient(format!("{}: {}", context, err))
        } else {
            ClientError::Other(format!("{}: {}", context, err))
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Transient(_))
    }
}

impl From<aadprobe_config::ConfigError> for ClientError {
    fn from(e: aadprobe_config::ConfigError) -> Self {
        ClientError::Other(format!("configuration: {}", e))
    }
}
