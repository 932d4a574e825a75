//! Errors raised by the substitute address mapper and its dynamic tables.

/// Recoverable failures of a substitute translation attempt.
///
/// Both variants are resource errors: transient, translated into SERVFAIL
/// by DNS, into an ICMP-bearing error by XAX, and into a silent drop by
/// the simple-address-query service.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone, Copy)]
pub enum SubstituteError {
    /// No assignment exists for the requested key, and none may be created.
    #[error("no assignment found")]
    AssignmentNotFound,
    /// Every substitute address is in use and none has held its minimum
    /// lifetime yet, so none can be recycled.
    #[error("substitute address space is full")]
    SubstituteSpaceFull,
}
