use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("yaml parse error in {path}: {source}")]
    YamlParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{0} must be set for acceptance tests")]
    MissingVariable(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("unknown fixture variant: {0}")]
    UnknownVariant(String),
}
