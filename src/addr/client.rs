//! Stateless IPv4<->IPv6 embedding for authorized clients.
//!
//! This is the only layer in `get4for6` that gates creation of per-client
//! state: everything downstream requires a pre-authorized client IPv4.

use ipnet::Ipv6Net;
use std::net::{Ipv4Addr, Ipv6Addr};

use super::allow_list::ClientAllowList;
use super::error::ClientAddressError;

/// Embeds/extracts client IPv4 addresses in a single configured `/96` IPv6
/// prefix, gated by a [`ClientAllowList`].
#[derive(Debug, Clone)]
pub struct ClientAddressMapper {
    prefix: Ipv6Net,
    allow_list: ClientAllowList,
}

impl ClientAddressMapper {
    /// # Panics
    /// Panics if `prefix` is not a `/96`. The caller is expected to have
    /// validated this at configuration load time.
    #[must_use]
    pub fn new(prefix: Ipv6Net, allow_list: ClientAllowList) -> Self {
        assert_eq!(prefix.prefix_len(), 96, "client prefix must be a /96");
        Self { prefix, allow_list }
    }

    #[must_use]
    pub fn allow_list(&self) -> &ClientAllowList {
        &self.allow_list
    }

    #[must_use]
    pub fn prefix(&self) -> Ipv6Net {
        self.prefix
    }

    /// Embeds `v4` in the configured prefix. Fails if `v4` is not an
    /// authorized client address.
    pub fn map_client_4to6(&self, v4: Ipv4Addr) -> Result<Ipv6Addr, ClientAddressError> {
        if !self.allow_list.contains(v4) {
            return Err(ClientAddressError::ClientNotAllowed);
        }
        // Safe: `new` asserts the prefix is a /96, which is always an allowed RFC6052 length.
        Ok(unsafe { rfc6052::embed_ipv4_addr_unchecked(v4, self.prefix) })
    }

    /// Extracts the client IPv4 embedded in `v6`.
    ///
    /// `has_scope_id` must reflect whether the textual representation `v6`
    /// was parsed from carried a `%zone` suffix -- [`Ipv6Addr`] itself has
    /// no such field, so binary-protocol callers that can never observe a
    /// scope id should simply pass `false`.
    pub fn map_client_6to4(
        &self,
        v6: Ipv6Addr,
        has_scope_id: bool,
    ) -> Result<Ipv4Addr, ClientAddressError> {
        if has_scope_id {
            return Err(ClientAddressError::ScopeIDPresent);
        }
        if !addr_under_prefix(v6, self.prefix) {
            return Err(ClientAddressError::WrongPrefix);
        }
        let v4 = unsafe { rfc6052::extract_ipv4_addr_unchecked(v6, 96) };
        if !self.allow_list.contains(v4) {
            return Err(ClientAddressError::ClientNotAllowed);
        }
        Ok(v4)
    }
}

/// `true` if the high `prefix.prefix_len()` bits of `addr` match `prefix`.
fn addr_under_prefix(addr: Ipv6Addr, prefix: Ipv6Net) -> bool {
    let mask = !0u128 << (128 - u32::from(prefix.prefix_len()));
    (u128::from(addr) & mask) == (u128::from(prefix.addr()) & mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> ClientAddressMapper {
        ClientAddressMapper::new(
            "64:ff9b::/96".parse().unwrap(),
            ClientAllowList::new(vec!["192.0.2.0/24".parse().unwrap()]),
        )
    }

    #[test]
    fn round_trip_for_allowed_client() {
        let mapper = mapper();
        let v4: Ipv4Addr = "192.0.2.5".parse().unwrap();
        let v6 = mapper.map_client_4to6(v4).unwrap();
        assert_eq!(mapper.map_client_6to4(v6, false).unwrap(), v4);
    }

    #[test]
    fn rejects_client_not_in_allow_list() {
        let mapper = mapper();
        let v4: Ipv4Addr = "203.0.113.1".parse().unwrap();
        assert_eq!(
            mapper.map_client_4to6(v4).unwrap_err(),
            ClientAddressError::ClientNotAllowed
        );
    }

    #[test]
    fn rejects_scope_id() {
        let mapper = mapper();
        let v6 = mapper.map_client_4to6("192.0.2.5".parse().unwrap()).unwrap();
        assert_eq!(
            mapper.map_client_6to4(v6, true).unwrap_err(),
            ClientAddressError::ScopeIDPresent
        );
    }

    #[test]
    fn rejects_wrong_prefix() {
        let mapper = mapper();
        let v6: Ipv6Addr = "2001:db8::c000:0205".parse().unwrap();
        assert_eq!(
            mapper.map_client_6to4(v6, false).unwrap_err(),
            ClientAddressError::WrongPrefix
        );
    }

    #[test]
    fn rejects_embedded_client_outside_allow_list() {
        let mapper = mapper();
        // Correct prefix, but the embedded v4 (203.0.113.1) isn't allowed.
        let v6: Ipv6Addr = "64:ff9b::cb00:7101".parse().unwrap();
        assert_eq!(
            mapper.map_client_6to4(v6, false).unwrap_err(),
            ClientAddressError::ClientNotAllowed
        );
    }
}
