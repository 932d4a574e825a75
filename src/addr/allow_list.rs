//! The set of IPv4 clients this instance is willing to translate on behalf of.

use ipnet::Ipv4Net;
use std::net::Ipv4Addr;

/// An immutable set of IPv4 CIDRs configured at start-up.
///
/// Membership is strict: for a prefix of `/30` or shorter, the network and
/// broadcast addresses of that prefix are never considered members, since
/// no real host can hold them.
#[derive(Debug, Clone)]
pub struct ClientAllowList {
    subnets: Vec<Ipv4Net>,
}

impl ClientAllowList {
    #[must_use]
    pub fn new(subnets: Vec<Ipv4Net>) -> Self {
        Self { subnets }
    }

    /// Returns `true` if `addr` is an authorized client address.
    #[must_use]
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.subnets.iter().any(|net| subnet_contains_host(net, addr))
    }
}

/// Returns `true` if `addr` is a usable host address of `net`: a member of
/// the prefix, and -- when the prefix is `/30` or shorter -- neither the
/// network nor the broadcast address.
#[must_use]
pub fn subnet_contains_host(net: &Ipv4Net, addr: Ipv4Addr) -> bool {
    if !net.contains(&addr) {
        return false;
    }
    if net.prefix_len() <= 30 {
        addr != net.network() && addr != net.broadcast()
    } else {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> Ipv4Net {
        s.parse().unwrap()
    }

    #[test]
    fn excludes_network_and_broadcast_for_short_prefixes() {
        let list = ClientAllowList::new(vec![net("192.0.2.0/24")]);
        assert!(!list.contains("192.0.2.0".parse().unwrap()));
        assert!(!list.contains("192.0.2.255".parse().unwrap()));
        assert!(list.contains("192.0.2.1".parse().unwrap()));
        assert!(list.contains("192.0.2.254".parse().unwrap()));
    }

    #[test]
    fn includes_every_address_for_point_to_point_prefixes() {
        let list = ClientAllowList::new(vec![net("192.0.2.0/31")]);
        assert!(list.contains("192.0.2.0".parse().unwrap()));
        assert!(list.contains("192.0.2.1".parse().unwrap()));
    }

    #[test]
    fn rejects_addresses_outside_every_subnet() {
        let list = ClientAllowList::new(vec![net("192.0.2.0/24")]);
        assert!(!list.contains("203.0.113.1".parse().unwrap()));
    }
}
