use std::collections::HashMap;
use std::io::Write;

use aadprobe_config::{load_config, load_config_with_env, ConfigError};

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

fn write_yaml(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    file.write_all(content.as_bytes()).expect("write");
    file
}

#[test]
fn defaults_without_file_or_env() {
    let config = load_config_with_env(None, env_from(&[])).expect("should load");
    assert_eq!(config.graph_base_url, "https://graph.windows.net");
    assert_eq!(config.api_version, "1.6");
    assert_eq!(config.request_timeout_secs, 30);
    assert!(config.tenant_id.is_none());
}

#[test]
fn precheck_requires_tenant() {
    let config = load_config_with_env(None, env_from(&[])).unwrap();
    match config.precheck() {
        Err(ConfigError::MissingVariable(name)) => assert_eq!(name, "ARM_TENANT_ID"),
        other => panic!("expected MissingVariable, got {:?}", other),
    }
}

#[test]
fn load_yaml_file() {
    let file = write_yaml(
        "tenant_id: tenant-from-file\n\
         graph_base_url: http://localhost:8080/\n\
         request_timeout_secs: 5\n",
    );
    let config = load_config_with_env(Some(file.path()), env_from(&[])).unwrap();
    assert_eq!(config.precheck().unwrap(), "tenant-from-file");
    assert_eq!(config.graph_base_url, "http://localhost:8080");
    assert_eq!(config.request_timeout_secs, 5);
}

#[test]
fn env_overrides_file() {
    let file = write_yaml("tenant_id: tenant-from-file\n");
    let config = load_config_with_env(
        Some(file.path()),
        env_from(&[
            ("ARM_TENANT_ID", "tenant-from-env"),
            ("ARM_CLIENT_ID", "cid"),
            ("ARM_CLIENT_SECRET", "secret"),
        ]),
    )
    .unwrap();
    assert_eq!(config.tenant_id.as_deref(), Some("tenant-from-env"));
    assert!(config.has_service_principal());
    assert!(!format!("{:?}", config).contains("\"secret\""));
}

#[test]
fn empty_env_values_are_ignored() {
    let file = write_yaml("tenant_id: tenant-from-file\n");
    let config =
        load_config_with_env(Some(file.path()), env_from(&[("ARM_TENANT_ID", "  ")])).unwrap();
    assert_eq!(config.tenant_id.as_deref(), Some("tenant-from-file"));
}

#[test]
fn client_id_without_secret_fails_precheck() {
    let config = load_config_with_env(
        None,
        env_from(&[("ARM_TENANT_ID", "t"), ("ARM_CLIENT_ID", "cid")]),
    )
    .unwrap();
    assert!(matches!(
        config.precheck(),
        Err(ConfigError::MissingVariable("ARM_CLIENT_SECRET"))
    ));
}

#[test]
fn unknown_keys_are_rejected() {
    let file = write_yaml("tenant: typo\n");
    assert!(matches!(
        load_config_with_env(Some(file.path()), env_from(&[])),
        Err(ConfigError::YamlParse { .. })
    ));
}

#[test]
fn missing_file_returns_error() {
    let path = std::path::Path::new("/nonexistent/path/aadprobe.yml");
    assert!(matches!(load_config(Some(path)), Err(ConfigError::Io { .. })));
}
