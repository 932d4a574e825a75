//! The substitute address mapper: owns the static table and the per-client
//! dynamic allocators, and is the sole mutator of translation state.

pub mod dynamic_mapper;
pub mod error;
mod fresh_iter;
pub mod static_mapper;

pub use dynamic_mapper::{Assignment, DynamicMapper};
pub use error::SubstituteError;
pub use static_mapper::StaticMapper;

use ipnet::Ipv4Net;
use std::collections::{HashMap, HashSet};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::time::Duration;

use crate::addr::ClientAllowList;

/// Configuration for the dynamic allocator, present only when
/// `dynamic_substitute_addr_assigning` is enabled.
#[derive(Debug, Clone)]
pub struct DynamicConfig {
    pub pool: Vec<Ipv4Net>,
    pub min_lifetime_after_last_hit: Duration,
}

/// A translated address plus how long the answer may be cached downstream.
pub type Translation<T> = (T, u64);

/// Thin coordinator in front of the static and dynamic mapping tables.
///
/// Every public operation re-validates `client_v4` against the allow-list
/// as a belt-and-braces barrier: this must never fail, and a failure here
/// is a programming fault, not a recoverable error.
pub struct SubstituteMapper {
    allow_list: ClientAllowList,
    static_mapper: StaticMapper,
    static_v4: Arc<HashSet<Ipv4Addr>>,
    dynamic_config: Option<DynamicConfig>,
    dynamic_mappers: HashMap<Ipv4Addr, DynamicMapper>,
}

impl SubstituteMapper {
    #[must_use]
    pub fn new(
        allow_list: ClientAllowList,
        static_mapper: StaticMapper,
        dynamic_config: Option<DynamicConfig>,
    ) -> Self {
        let static_v4: HashSet<Ipv4Addr> = static_mapper.v4_addresses().collect();
        Self {
            allow_list,
            static_mapper,
            static_v4: Arc::new(static_v4),
            dynamic_config,
            dynamic_mappers: HashMap::new(),
        }
    }

    #[must_use]
    pub fn static_mapper(&self) -> &StaticMapper {
        &self.static_mapper
    }

    /// Every currently-live dynamic mapper, keyed by client v4.
    pub fn dynamic_mappers(&self) -> impl Iterator<Item = (&Ipv4Addr, &DynamicMapper)> {
        self.dynamic_mappers.iter()
    }

    pub fn substitute_4to6(
        &mut self,
        v4: Ipv4Addr,
        client_v4: Ipv4Addr,
    ) -> Result<Translation<Ipv6Addr>, SubstituteError> {
        self.require_authorized(client_v4);
        if let Ok(v6) = self.static_mapper.find_4to6(v4) {
            return Ok((v6, StaticMapper::EXTERNAL_CACHE_LIFETIME_SECS));
        }
        let dynamic = self
            .dynamic_mapper_for(client_v4)
            .ok_or(SubstituteError::AssignmentNotFound)?;
        let v6 = dynamic.find_4to6(v4)?;
        Ok((v6, dynamic.cache_lifetime()))
    }

    pub fn substitute_6to4(
        &mut self,
        v6: Ipv6Addr,
        client_v4: Ipv4Addr,
        creation_allowed: bool,
    ) -> Result<Translation<Ipv4Addr>, SubstituteError> {
        self.require_authorized(client_v4);
        if let Ok(v4) = self.static_mapper.find_6to4(v6) {
            return Ok((v4, StaticMapper::EXTERNAL_CACHE_LIFETIME_SECS));
        }
        let dynamic = self
            .dynamic_mapper_for(client_v4)
            .ok_or(SubstituteError::AssignmentNotFound)?;
        let v4 = dynamic.find_or_create_6to4(v6, creation_allowed)?;
        Ok((v4, dynamic.cache_lifetime()))
    }

    /// Finds the v6 a substitute `v4` currently stands in for, without
    /// requiring a requesting client -- used by the reverse DNS resolver,
    /// whose PTR queries are answered for the whole substitute space rather
    /// than scoped to the querying peer. Checks the static table first,
    /// then every live `DynamicMapper` (a hit there is a legitimate
    /// refresh, the same as a client-driven lookup would be).
    pub fn reverse_lookup_4to6(&mut self, v4: Ipv4Addr) -> Option<(Ipv6Addr, u64)> {
        if let Ok(v6) = self.static_mapper.find_4to6(v4) {
            return Some((v6, StaticMapper::EXTERNAL_CACHE_LIFETIME_SECS));
        }
        self.dynamic_mappers
            .values_mut()
            .find_map(|dynamic| dynamic.find_4to6(v4).ok().map(|v6| (v6, dynamic.cache_lifetime())))
    }

    /// `true` if `v4` is a substitute address managed by this instance
    /// (static or within a dynamic pool), regardless of whether it
    /// currently has a live assignment. Used by the reverse DNS resolver
    /// to decide whether a PTR query is even in scope; this inclusion test
    /// is deliberately loose -- network/broadcast addresses of the pool
    /// are accepted here too.
    #[must_use]
    pub fn is_in_substitute_space(&self, v4: Ipv4Addr) -> bool {
        if self.static_mapper.contains_v4(v4) {
            return true;
        }
        self.dynamic_config
            .as_ref()
            .is_some_and(|cfg| cfg.pool.iter().any(|net| net.contains(&v4)))
    }

    fn require_authorized(&self, client_v4: Ipv4Addr) {
        if !self.allow_list.contains(client_v4) {
            crate::fault::fault(&format!(
                "substitute mapper invoked with unauthorized client {client_v4}"
            ));
        }
    }

    fn dynamic_mapper_for(&mut self, client_v4: Ipv4Addr) -> Option<&mut DynamicMapper> {
        let cfg = self.dynamic_config.as_ref()?;
        let pool = cfg.pool.clone();
        let min_lifetime = cfg.min_lifetime_after_last_hit;
        let static_v4 = self.static_v4.clone();
        Some(
            self.dynamic_mappers
                .entry(client_v4)
                .or_insert_with(|| DynamicMapper::new(client_v4, pool, static_v4, min_lifetime)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper_with_dynamic() -> SubstituteMapper {
        SubstituteMapper::new(
            ClientAllowList::new(vec!["192.0.2.0/24".parse().unwrap()]),
            StaticMapper::new(vec![]),
            Some(DynamicConfig {
                pool: vec!["198.51.100.0/24".parse().unwrap()],
                min_lifetime_after_last_hit: Duration::from_secs(60),
            }),
        )
    }

    #[test]
    fn static_hit_short_circuits_dynamic_creation() {
        let mut mapper = SubstituteMapper::new(
            ClientAllowList::new(vec!["192.0.2.0/24".parse().unwrap()]),
            StaticMapper::new(vec![(
                "198.51.100.10".parse().unwrap(),
                "2001:db8::abcd".parse().unwrap(),
            )]),
            None,
        );
        let (v6, ttl) = mapper
            .substitute_4to6("198.51.100.10".parse().unwrap(), "192.0.2.5".parse().unwrap())
            .unwrap();
        assert_eq!(v6, "2001:db8::abcd".parse::<Ipv6Addr>().unwrap());
        assert_eq!(ttl, StaticMapper::EXTERNAL_CACHE_LIFETIME_SECS);
        assert_eq!(mapper.dynamic_mappers().count(), 0);
    }

    #[test]
    fn dynamic_mapper_created_lazily_per_client() {
        let mut mapper = mapper_with_dynamic();
        mapper
            .substitute_6to4(
                "2001:db8::1".parse().unwrap(),
                "192.0.2.5".parse().unwrap(),
                true,
            )
            .unwrap();
        assert_eq!(mapper.dynamic_mappers().count(), 1);
    }

    #[test]
    fn in_substitute_space_accepts_network_and_broadcast() {
        // The reverse-query inclusion test is intentionally loose about
        // pool network/broadcast addresses.
        let mapper = mapper_with_dynamic();
        assert!(mapper.is_in_substitute_space("198.51.100.0".parse().unwrap()));
        assert!(mapper.is_in_substitute_space("198.51.100.255".parse().unwrap()));
        assert!(!mapper.is_in_substitute_space("203.0.113.1".parse().unwrap()));
    }
}
