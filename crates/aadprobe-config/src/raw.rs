use serde::{Deserialize, Serialize};

/// Raw YAML representation of a probe config file. Every field is optional;
/// environment variables fill in or override what the file leaves out.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawProbeConfig {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub graph_base_url: Option<String>,
    pub login_base_url: Option<String>,
    pub api_version: Option<String>,
    pub request_timeout_secs: Option<u64>,
}
