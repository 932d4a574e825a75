//! The immutable, configuration-seeded v4<->v6 bijection.

use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};

use super::error::SubstituteError;

/// Two dictionaries keyed by v4 and v6 respectively, populated once at
/// start-up and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct StaticMapper {
    v4_to_v6: HashMap<Ipv4Addr, Ipv6Addr>,
    v6_to_v4: HashMap<Ipv6Addr, Ipv4Addr>,
}

impl StaticMapper {
    /// The external cache lifetime static substitute translations are
    /// published with.
    pub const EXTERNAL_CACHE_LIFETIME_SECS: u64 = 15;

    #[must_use]
    pub fn new(assignments: Vec<(Ipv4Addr, Ipv6Addr)>) -> Self {
        let mut v4_to_v6 = HashMap::with_capacity(assignments.len());
        let mut v6_to_v4 = HashMap::with_capacity(assignments.len());
        for (v4, v6) in assignments {
            v4_to_v6.insert(v4, v6);
            v6_to_v4.insert(v6, v4);
        }
        Self { v4_to_v6, v6_to_v4 }
    }

    pub fn find_4to6(&self, v4: Ipv4Addr) -> Result<Ipv6Addr, SubstituteError> {
        self.v4_to_v6
            .get(&v4)
            .copied()
            .ok_or(SubstituteError::AssignmentNotFound)
    }

    pub fn find_6to4(&self, v6: Ipv6Addr) -> Result<Ipv4Addr, SubstituteError> {
        self.v6_to_v4
            .get(&v6)
            .copied()
            .ok_or(SubstituteError::AssignmentNotFound)
    }

    #[must_use]
    pub fn contains_v4(&self, v4: Ipv4Addr) -> bool {
        self.v4_to_v6.contains_key(&v4)
    }

    /// All statically-assigned v4 addresses, used to keep the dynamic
    /// allocator's pool disjoint from this table (invariant 5).
    pub fn v4_addresses(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.v4_to_v6.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Ipv4Addr, Ipv6Addr)> + '_ {
        self.v4_to_v6.iter().map(|(v4, v6)| (*v4, *v6))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_seeded_assignment() {
        let mapper = StaticMapper::new(vec![(
            "198.51.100.10".parse().unwrap(),
            "2001:db8::abcd".parse().unwrap(),
        )]);
        let v6 = mapper.find_4to6("198.51.100.10".parse().unwrap()).unwrap();
        assert_eq!(v6, "2001:db8::abcd".parse::<Ipv6Addr>().unwrap());
        let v4 = mapper.find_6to4(v6).unwrap();
        assert_eq!(v4, "198.51.100.10".parse::<Ipv4Addr>().unwrap());
    }

    #[test]
    fn miss_is_assignment_not_found() {
        let mapper = StaticMapper::new(vec![]);
        assert_eq!(
            mapper.find_4to6("198.51.100.10".parse().unwrap()),
            Err(SubstituteError::AssignmentNotFound)
        );
    }
}
