mod raw;
mod loader;
pub mod error;
pub mod fixtures;
pub mod probe;

pub use error::ConfigError;
pub use fixtures::{ApplicationSpec, Fixture, Variant, FIXTURE_ADDRESS};
pub use loader::{load_config, load_config_with_env};
pub use probe::ProbeConfig;
