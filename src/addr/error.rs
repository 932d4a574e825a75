//! Errors raised while embedding or extracting client addresses.

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone, Copy)]
pub enum ClientAddressError {
    /// The peer IPv4 address is not a member of `client_allowed_subnets`.
    #[error("client address not in the allow-list")]
    ClientNotAllowed,
    /// A textual IPv6 address carried a `%zone` scope identifier.
    #[error("IPv6 address carries a scope id")]
    ScopeIDPresent,
    /// The high 96 bits of the address do not match the configured prefix.
    #[error("IPv6 address does not lie under the client prefix")]
    WrongPrefix,
}
