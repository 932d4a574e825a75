//! Configuration load and validation errors.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path} at {path_in_doc}: {message}")]
    Parse {
        path: PathBuf,
        path_in_doc: String,
        message: String,
    },
    #[error("{0}")]
    Validation(String),
}
