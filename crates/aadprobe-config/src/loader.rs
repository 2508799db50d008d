use std::path::Path;

use tracing::debug;

use crate::error::ConfigError;
use crate::probe::ProbeConfig;
use crate::raw::RawProbeConfig;

/// Load probe configuration from an optional YAML file, then apply
/// environment overrides from the process environment.
///
/// Recognised variables: `ARM_TENANT_ID`, `ARM_CLIENT_ID`,
/// `ARM_CLIENT_SECRET`, `AADPROBE_GRAPH_URL`, `AADPROBE_LOGIN_URL`.
pub fn load_config(path: Option<&Path>) -> Result<ProbeConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] but with an injectable environment lookup.
pub fn load_config_with_env<F>(path: Option<&Path>, env: F) -> Result<ProbeConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = match path {
        Some(p) => read_raw(p)?,
        None => RawProbeConfig::default(),
    };

    let mut config = ProbeConfig::default();
    apply_raw(&mut config, raw);

    let env_nonempty = |key: &str| env(key).filter(|v| !v.trim().is_empty());
    if let Some(v) = env_nonempty("ARM_TENANT_ID") {
        config.tenant_id = Some(v);
    }
    if let Some(v) = env_nonempty("ARM_CLIENT_ID") {
        config.client_id = Some(v);
    }
    if let Some(v) = env_nonempty("ARM_CLIENT_SECRET") {
        config.client_secret = Some(v);
    }
    if let Some(v) = env_nonempty("AADPROBE_GRAPH_URL") {
        config.graph_base_url = v;
    }
    if let Some(v) = env_nonempty("AADPROBE_LOGIN_URL") {
        config.login_base_url = v;
    }

    config.graph_base_url = config.graph_base_url.trim_end_matches('/').to_string();
    config.login_base_url = config.login_base_url.trim_end_matches('/').to_string();

    debug!(?config, "probe configuration loaded");
    Ok(config)
}

fn read_raw(path: &Path) -> Result<RawProbeConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_yaml::from_str(&content).map_err(|e| ConfigError::YamlParse {
        path: path.display().to_string(),
        source: e,
    })
}

fn apply_raw(config: &mut ProbeConfig, raw: RawProbeConfig) {
    config.tenant_id = raw.tenant_id;
    config.client_id = raw.client_id;
    config.client_secret = raw.client_secret;
    if let Some(v) = raw.graph_base_url {
        config.graph_base_url = v;
    }
    if let Some(v) = raw.login_base_url {
        config.login_base_url = v;
    }
    if let Some(v) = raw.api_version {
        config.api_version = v;
    }
    if let Some(v) = raw.request_timeout_secs {
        config.request_timeout_secs = v;
    }
}
