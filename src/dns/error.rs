//! DNS-surface errors.

#[derive(Debug, thiserror::Error)]
pub enum DnsError {
    #[error("no upstream yielded a structurally valid response")]
    AllUpstreamsFailed,
    #[error("upstream exchange timed out")]
    Timeout,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to encode DNS message")]
    Encode,
    #[error("failed to decode DNS message")]
    Decode,
    #[error("query does not meet the input contract: {0}")]
    RejectedQuery(&'static str),
}
