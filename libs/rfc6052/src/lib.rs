//! Embedding and extracting IPv4 addresses in IPv6 prefixes as described in
//! [RFC6052 Section 2.2](https://datatracker.ietf.org/doc/html/rfc6052#section-2.2).
//!
//! `get4for6` only ever uses a `/96` prefix for its client-address embedding,
//! but the underlying bit manipulation is identical for every prefix length
//! the RFC allows, so this crate keeps supporting all of them.

#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;

mod embed;
mod extract;
mod substitutable;

pub use embed::{embed_ipv4_addr, embed_ipv4_addr_unchecked};
pub use extract::{extract_ipv4_addr, extract_ipv4_addr_unchecked};
pub use substitutable::is_substitutable_ipv6;

/// All allowed IPv6 prefix lengths according to [RFC6052 Section 2.2](https://datatracker.ietf.org/doc/html/rfc6052#section-2.2)
pub const ALLOWED_PREFIX_LENS: [u8; 6] = [32, 40, 48, 56, 64, 96];
