//! Top-level start-up errors: exit code 1, single-line diagnostic.

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    #[error("failed to start {service}: {source}")]
    FailedToStartServer {
        service: &'static str,
        #[source]
        source: std::io::Error,
    },
}
