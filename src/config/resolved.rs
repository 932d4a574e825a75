//! The validated, runtime-ready configuration. Everything downstream of
//! [`super::load`] consumes this, never the raw deserialized document.

use hickory_proto::rr::Name;
use ipnet::{Ipv4Net, Ipv6Net};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use super::model::FacilitySet;

#[derive(Debug, Clone, Default)]
pub struct GeneralSettings {
    pub debug_facilities: FacilitySet,
}

#[derive(Debug, Clone)]
pub struct DynamicAssigningSettings {
    pub min_lifetime_after_last_hit: Duration,
}

#[derive(Debug, Clone)]
pub struct TranslationSettings {
    pub client_allowed_subnets: Vec<Ipv4Net>,
    pub client_prefix: Ipv6Net,
    pub substitute_subnets: Vec<Ipv4Net>,
    pub static_substitute_addr_assignments: Vec<(Ipv4Addr, Ipv6Addr)>,
    pub dynamic_substitute_addr_assigning: Option<DynamicAssigningSettings>,
}

#[derive(Debug, Clone)]
pub struct AuxiliaryNamesSettings {
    pub domain: Name,
    pub use_for_rdns: bool,
    pub zone_ns_ips: Vec<IpAddr>,
}

#[derive(Debug, Clone)]
pub struct DnsSettings {
    pub listen_on: Vec<SocketAddr>,
    pub upstream_servers: Vec<SocketAddr>,
    pub max_simultaneous_queries: usize,
    pub tcp_communication_with_client_timeout: Duration,
    pub upstream_query_timeout: Duration,
    pub max_newly_assigned_substitute_addrs_per_response: usize,
    pub auxiliary_names: Option<AuxiliaryNamesSettings>,
}

#[derive(Debug, Clone, Default)]
pub struct XaxSettings {
    pub listen_on_unix: Vec<PathBuf>,
    pub listen_on_tcp: Vec<SocketAddr>,
    pub max_simultaneous_connections: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SaqSettings {
    pub listen_on_binary: Vec<SocketAddr>,
    pub listen_on_plaintext: Vec<SocketAddr>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub general: GeneralSettings,
    pub translation: TranslationSettings,
    pub dns: Option<DnsSettings>,
    pub xax: Option<XaxSettings>,
    pub saq: Option<SaqSettings>,
}
