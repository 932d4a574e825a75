//! The per-client LRU-recycled substitute address allocator.

use ipnet::Ipv4Net;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::error::SubstituteError;
use super::fresh_iter::FreshAddressIterator;

/// A single `v4 <-> v6` reservation plus the timestamp of its last use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub v4: Ipv4Addr,
    pub v6: Ipv6Addr,
    pub last_hit_at: u64,
}

/// Per-client state: the bijection between substitute v4 addresses and the
/// v6 peers they stand in for, an ordered replacement queue keyed by
/// `last_hit_at`, and the fresh-address supply.
///
/// All timestamps are seconds elapsed since this mapper was constructed,
/// taken from a monotonic clock -- never wall-clock time.
#[derive(Debug)]
pub struct DynamicMapper {
    client_v4: Ipv4Addr,
    min_lifetime: Duration,
    external_cache_lifetime: u64,
    created_at: Instant,

    v4_to_v6: HashMap<Ipv4Addr, Ipv6Addr>,
    v6_to_v4: HashMap<Ipv6Addr, Ipv4Addr>,
    last_hit_at: HashMap<Ipv4Addr, u64>,
    /// Ordered by `(last_hit_at, v4)` -- the `v4` component is also the
    /// deterministic tie-break when two assignments share a `last_hit_at`.
    replacement_queue: BTreeSet<(u64, Ipv4Addr)>,
    fresh: FreshAddressIterator,
}

impl DynamicMapper {
    #[must_use]
    pub fn new(
        client_v4: Ipv4Addr,
        pool: Vec<Ipv4Net>,
        static_v4: Arc<HashSet<Ipv4Addr>>,
        min_lifetime: Duration,
    ) -> Self {
        Self {
            client_v4,
            min_lifetime,
            external_cache_lifetime: compute_external_cache_lifetime(min_lifetime),
            created_at: Instant::now(),
            v4_to_v6: HashMap::new(),
            v6_to_v4: HashMap::new(),
            last_hit_at: HashMap::new(),
            replacement_queue: BTreeSet::new(),
            fresh: FreshAddressIterator::new(pool, static_v4),
        }
    }

    #[must_use]
    pub fn client_v4(&self) -> Ipv4Addr {
        self.client_v4
    }

    /// The external cache lifetime, in `[0, 10]` seconds.
    #[must_use]
    pub fn cache_lifetime(&self) -> u64 {
        self.external_cache_lifetime
    }

    #[must_use]
    pub fn min_lifetime_after_last_hit(&self) -> Duration {
        self.min_lifetime
    }

    fn now(&self) -> u64 {
        self.created_at.elapsed().as_secs()
    }

    pub fn find_4to6(&mut self, v4: Ipv4Addr) -> Result<Ipv6Addr, SubstituteError> {
        let v6 = *self
            .v4_to_v6
            .get(&v4)
            .ok_or(SubstituteError::AssignmentNotFound)?;
        self.refresh(v4);
        Ok(v6)
    }

    /// Looks up `v6`, treating a hit as a refresh. On miss, creates a new
    /// assignment if `creation_allowed` is set and `v6` is substitutable.
    ///
    /// # Panics (programming fault)
    /// Calling with `creation_allowed = true` for a non-substitutable `v6`
    /// is a caller-contract violation -- callers must validate `v6` with
    /// [`rfc6052::is_substitutable_ipv6`] first. This terminates the
    /// process via [`crate::fault::fault`].
    pub fn find_or_create_6to4(
        &mut self,
        v6: Ipv6Addr,
        creation_allowed: bool,
    ) -> Result<Ipv4Addr, SubstituteError> {
        if let Some(v4) = self.v6_to_v4.get(&v6).copied() {
            self.refresh(v4);
            return Ok(v4);
        }
        if !creation_allowed {
            return Err(SubstituteError::AssignmentNotFound);
        }
        if !rfc6052::is_substitutable_ipv6(v6) {
            crate::fault::fault(&format!(
                "find_or_create_6to4 called for non-substitutable address {v6}"
            ));
        }
        self.allocate(v6)
    }

    fn refresh(&mut self, v4: Ipv4Addr) {
        let now = self.now();
        let old = self
            .last_hit_at
            .insert(v4, now)
            .expect("refreshed v4 must already have a last_hit_at entry");
        self.replacement_queue.remove(&(old, v4));
        self.replacement_queue.insert((now, v4));
    }

    fn allocate(&mut self, v6: Ipv6Addr) -> Result<Ipv4Addr, SubstituteError> {
        let now = self.now();

        if let Some(v4) = self.fresh.next() {
            self.install(v4, v6, now);
            return Ok(v4);
        }

        let &(oldest_t, oldest_v4) = self
            .replacement_queue
            .iter()
            .next()
            .ok_or(SubstituteError::SubstituteSpaceFull)?;
        if now.saturating_sub(oldest_t) < self.min_lifetime.as_secs() {
            return Err(SubstituteError::SubstituteSpaceFull);
        }

        self.evict(oldest_v4, oldest_t);
        self.install(oldest_v4, v6, now);
        Ok(oldest_v4)
    }

    fn install(&mut self, v4: Ipv4Addr, v6: Ipv6Addr, now: u64) {
        self.v4_to_v6.insert(v4, v6);
        self.v6_to_v4.insert(v6, v4);
        self.last_hit_at.insert(v4, now);
        self.replacement_queue.insert((now, v4));
    }

    fn evict(&mut self, v4: Ipv4Addr, last_hit_at: u64) {
        let v6 = self
            .v4_to_v6
            .remove(&v4)
            .expect("evicted v4 must be indexed");
        self.v6_to_v4.remove(&v6);
        self.last_hit_at.remove(&v4);
        self.replacement_queue.remove(&(last_hit_at, v4));
    }

    /// A snapshot of every current assignment, ascending by `last_hit_at`.
    pub fn iter_assignments(&self) -> impl Iterator<Item = Assignment> + '_ {
        let now = self.now();
        self.replacement_queue.iter().map(move |&(t, v4)| {
            let _ = now;
            Assignment {
                v4,
                v6: self.v4_to_v6[&v4],
                last_hit_at: t,
            }
        })
    }

    /// `None` once the record may legally be replaced by a new assignment.
    #[must_use]
    pub fn remaining_guaranteed_lifetime(&self, last_hit_at: u64) -> Option<u64> {
        let elapsed = self.now().saturating_sub(last_hit_at);
        let min = self.min_lifetime.as_secs();
        if elapsed >= min {
            None
        } else {
            Some(min - elapsed)
        }
    }
}

/// `clamp(floor(min_lifetime_after_last_hit / 3) - 1, 0, 10)`.
fn compute_external_cache_lifetime(min_lifetime: Duration) -> u64 {
    let raw = (min_lifetime.as_secs() / 3) as i64 - 1;
    raw.clamp(0, 10) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper(pool: &str, min_lifetime_secs: u64) -> DynamicMapper {
        DynamicMapper::new(
            "192.0.2.5".parse().unwrap(),
            vec![pool.parse().unwrap()],
            Arc::new(HashSet::new()),
            Duration::from_secs(min_lifetime_secs),
        )
    }

    #[test]
    fn cache_lifetime_is_derived_from_min_lifetime() {
        assert_eq!(compute_external_cache_lifetime(Duration::from_secs(60)), 10);
        assert_eq!(compute_external_cache_lifetime(Duration::from_secs(0)), 0);
        assert_eq!(compute_external_cache_lifetime(Duration::from_secs(3)), 0);
    }

    #[test]
    fn round_trip_refreshes_both_directions() {
        let mut m = mapper("198.51.100.0/24", 60);
        let v6: Ipv6Addr = "2001:db8::1".parse().unwrap();
        let v4 = m.find_or_create_6to4(v6, true).unwrap();
        assert_eq!(m.find_4to6(v4).unwrap(), v6);
    }

    #[test]
    fn space_full_then_evicts_after_min_lifetime() {
        let mut m = mapper("198.51.100.0/30", 0);
        let v4_a = m
            .find_or_create_6to4("2001:db8::1".parse().unwrap(), true)
            .unwrap();
        let _v4_b = m
            .find_or_create_6to4("2001:db8::2".parse().unwrap(), true)
            .unwrap();
        // min_lifetime is 0s, so eviction succeeds immediately for a third peer.
        // v4_a and v4_b share a last_hit_at of 0 (the clock hasn't ticked a
        // whole second yet), so the replacement queue's tie-break by v4
        // picks the lower address -- v4_a, assigned first -- as oldest.
        let v4_c = m
            .find_or_create_6to4("2001:db8::3".parse().unwrap(), true)
            .unwrap();
        assert_eq!(v4_c, v4_a);
    }

    #[test]
    fn space_full_blocks_within_min_lifetime() {
        let mut m = mapper("198.51.100.0/30", 3600);
        m.find_or_create_6to4("2001:db8::1".parse().unwrap(), true)
            .unwrap();
        m.find_or_create_6to4("2001:db8::2".parse().unwrap(), true)
            .unwrap();
        let err = m
            .find_or_create_6to4("2001:db8::3".parse().unwrap(), true)
            .unwrap_err();
        assert_eq!(err, SubstituteError::SubstituteSpaceFull);
    }

    #[test]
    fn miss_without_creation_allowed_fails() {
        let mut m = mapper("198.51.100.0/24", 60);
        let err = m
            .find_or_create_6to4("2001:db8::1".parse().unwrap(), false)
            .unwrap_err();
        assert_eq!(err, SubstituteError::AssignmentNotFound);
    }

    #[test]
    fn iter_assignments_is_ascending_by_last_hit() {
        let mut m = mapper("198.51.100.0/24", 60);
        m.find_or_create_6to4("2001:db8::1".parse().unwrap(), true)
            .unwrap();
        m.find_or_create_6to4("2001:db8::2".parse().unwrap(), true)
            .unwrap();
        let ts: Vec<u64> = m.iter_assignments().map(|a| a.last_hit_at).collect();
        let mut sorted = ts.clone();
        sorted.sort_unstable();
        assert_eq!(ts, sorted);
    }
}
