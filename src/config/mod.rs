//! Config file loading: a two-stage raw-then-validated deserialization.

pub mod error;
pub mod model;
pub mod resolved;
mod validate;

pub use error::ConfigError;
pub use model::Facility;
pub use resolved::AppConfig;

use std::path::Path;

impl resolved::AppConfig {
    /// Loads and validates the config file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file_contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let deserializer = toml::Deserializer::new(&file_contents);
        let raw: model::RawConfig =
            serde_path_to_error::deserialize(deserializer).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                path_in_doc: e.path().to_string(),
                message: e.into_inner().to_string(),
            })?;

        validate::validate(raw)
    }
}
