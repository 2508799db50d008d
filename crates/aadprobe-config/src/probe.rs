use crate::error::ConfigError;

pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.windows.net";
pub const DEFAULT_LOGIN_BASE_URL: &str = "https://login.microsoftonline.com";
pub const DEFAULT_API_VERSION: &str = "1.6";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Everything the directory client needs, passed explicitly at construction.
#[derive(Clone)]
pub struct ProbeConfig {
    /// Azure AD tenant (directory) ID.
    pub tenant_id: Option<String>,
    /// Service principal client ID. Without it the Azure CLI token is used.
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub graph_base_url: String,
    pub login_base_url: String,
    /// Graph `api-version` query parameter.
    pub api_version: String,
    pub request_timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            tenant_id: None,
            client_id: None,
            client_secret: None,
            graph_base_url: DEFAULT_GRAPH_BASE_URL.into(),
            login_base_url: DEFAULT_LOGIN_BASE_URL.into(),
            api_version: DEFAULT_API_VERSION.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for ProbeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("graph_base_url", &self.graph_base_url)
            .field("login_base_url", &self.login_base_url)
            .field("api_version", &self.api_version)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl ProbeConfig {
    /// Fail fast before any remote call is attempted.
    ///
    /// Returns the tenant ID on success. A client ID without a secret (or the
    /// reverse) is rejected rather than silently falling back to the CLI.
    pub fn precheck(&self) -> Result<&str, ConfigError> {
        let tenant = self
            .tenant_id
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingVariable("ARM_TENANT_ID"))?;

        match (&self.client_id, &self.client_secret) {
            (Some(_), None) => return Err(ConfigError::MissingVariable("ARM_CLIENT_SECRET")),
            (None, Some(_)) => return Err(ConfigError::MissingVariable("ARM_CLIENT_ID")),
            _ => {}
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be > 0".into()));
        }
        Ok(tenant)
    }

    /// True when service principal credentials are configured.
    pub fn has_service_principal(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}
