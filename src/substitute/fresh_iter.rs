//! The restartable-only-once enumeration of never-yet-assigned substitute
//! addresses.

use ipnet::{Ipv4AddrRange, Ipv4Net};
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Lazily walks the configured substitute pools in order, skipping any
/// address reserved by the static assignment table. `Ipv4Net::hosts()`
/// already excludes the network and broadcast address of each pool
/// (except for `/31` and `/32`, which have none to exclude), satisfying
/// invariant 1.
///
/// Once every pool has been walked, the iterator permanently yields
/// `None` (invariant 4).
#[derive(Debug, Clone)]
pub struct FreshAddressIterator {
    remaining_pools: std::vec::IntoIter<Ipv4Net>,
    current: Option<Ipv4AddrRange>,
    static_v4: Arc<HashSet<Ipv4Addr>>,
    exhausted: bool,
}

impl FreshAddressIterator {
    #[must_use]
    pub fn new(pools: Vec<Ipv4Net>, static_v4: Arc<HashSet<Ipv4Addr>>) -> Self {
        Self {
            remaining_pools: pools.into_iter(),
            current: None,
            static_v4,
            exhausted: false,
        }
    }

    pub fn next(&mut self) -> Option<Ipv4Addr> {
        if self.exhausted {
            return None;
        }
        loop {
            if let Some(range) = self.current.as_mut() {
                for addr in range.by_ref() {
                    if !self.static_v4.contains(&addr) {
                        return Some(addr);
                    }
                }
            }
            match self.remaining_pools.next() {
                Some(net) => self.current = Some(net.hosts()),
                None => {
                    self.exhausted = true;
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_network_and_broadcast() {
        let mut iter = FreshAddressIterator::new(
            vec!["198.51.100.0/30".parse().unwrap()],
            Arc::new(HashSet::new()),
        );
        assert_eq!(iter.next(), Some("198.51.100.1".parse().unwrap()));
        assert_eq!(iter.next(), Some("198.51.100.2".parse().unwrap()));
        assert_eq!(iter.next(), None);
        // Stays exhausted.
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn skips_static_addresses() {
        let static_v4 = Arc::new(HashSet::from(["198.51.100.2".parse().unwrap()]));
        let mut iter =
            FreshAddressIterator::new(vec!["198.51.100.0/30".parse().unwrap()], static_v4);
        assert_eq!(iter.next(), Some("198.51.100.1".parse().unwrap()));
        assert_eq!(iter.next(), None);
    }
}
