//! Serde definitions for the config file.

use ipnet::{Ipv4Net, Ipv6Net};
use serde::{de, Deserialize, Deserializer};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

/// A log facility tag, as named by `print_debug_messages_from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facility {
    Dns,
    Xax,
    Saq,
    PrintMap,
    Mapper,
}

impl Facility {
    pub const ALL: [Facility; 5] = [
        Facility::Dns,
        Facility::Xax,
        Facility::Saq,
        Facility::PrintMap,
        Facility::Mapper,
    ];
}

impl FromStr for Facility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dns" => Ok(Facility::Dns),
            "xax" => Ok(Facility::Xax),
            "saq" => Ok(Facility::Saq),
            "print_map" => Ok(Facility::PrintMap),
            "mapper" => Ok(Facility::Mapper),
            other => Err(format!("unknown facility tag: {other}")),
        }
    }
}

/// The set of facilities debug logging is enabled for. `*` enables all.
#[derive(Debug, Clone, Default)]
pub struct FacilitySet {
    all: bool,
    enabled: std::collections::HashSet<Facility>,
}

impl FacilitySet {
    #[must_use]
    pub fn is_enabled(&self, facility: Facility) -> bool {
        self.all || self.enabled.contains(&facility)
    }
}

impl<'de> Deserialize<'de> for FacilitySet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tags: Vec<String> = Vec::deserialize(deserializer)?;
        if tags.iter().any(|t| t == "*") {
            return Ok(Self {
                all: true,
                enabled: std::collections::HashSet::new(),
            });
        }
        let mut enabled = std::collections::HashSet::new();
        for tag in tags {
            enabled.insert(Facility::from_str(&tag).map_err(de::Error::custom)?);
        }
        Ok(Self { all: false, enabled })
    }
}

/// A network endpoint, accepted from config as either a `"host:port"`
/// string or a `[host, port]` pair.
#[derive(Debug, Clone, Copy)]
pub struct Endpoint(pub SocketAddr);

impl<'de> Deserialize<'de> for Endpoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EndpointVisitor;

        impl<'de> de::Visitor<'de> for EndpointVisitor {
            type Value = Endpoint;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "a \"host:port\" string or a [host, port] pair")
            }

            fn visit_str<E>(self, v: &str) -> Result<Endpoint, E>
            where
                E: de::Error,
            {
                v.parse::<SocketAddr>().map(Endpoint).map_err(E::custom)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Endpoint, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let host: String = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let port: u16 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                format!("{host}:{port}")
                    .parse::<SocketAddr>()
                    .map(Endpoint)
                    .map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_any(EndpointVisitor)
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct GeneralConfig {
    #[serde(default)]
    pub print_debug_messages_from: FacilitySet,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct StaticAssignmentSpec {
    pub v4: Ipv4Addr,
    pub v6: Ipv6Addr,
}

#[derive(Debug, Deserialize)]
pub struct DynamicAssigningConfig {
    pub min_lifetime_after_last_hit: u64,
}

#[derive(Debug, Deserialize)]
pub struct TranslationConfig {
    pub client_allowed_subnets: Vec<Ipv4Net>,
    pub map_client_addrs_into: Ipv6Net,
    #[serde(default)]
    pub substitute_subnets: Vec<Ipv4Net>,
    #[serde(default)]
    pub static_substitute_addr_assignments: Vec<StaticAssignmentSpec>,
    pub dynamic_substitute_addr_assigning: Option<DynamicAssigningConfig>,
}

#[derive(Debug, Deserialize)]
pub struct AuxiliaryNamesConfig {
    pub domain: String,
    #[serde(default)]
    pub use_for_rdns: bool,
    #[serde(default)]
    pub zone_ns_ips: Vec<IpAddr>,
}

#[derive(Debug, Deserialize)]
pub struct DnsConfig {
    pub listen_on: Vec<Endpoint>,
    pub upstream_servers: Vec<Endpoint>,
    pub max_simultaneous_queries: usize,
    pub tcp_communication_with_client_timeout: f64,
    pub upstream_query_timeout: f64,
    pub max_newly_assigned_substitute_addrs_per_response: usize,
    pub auxiliary_names: Option<AuxiliaryNamesConfig>,
}

#[derive(Debug, Deserialize, Default)]
pub struct XaxConfig {
    #[serde(default)]
    pub listen_on_unix: Vec<PathBuf>,
    #[serde(default)]
    pub listen_on_tcp: Vec<Endpoint>,
    pub max_simultaneous_connections: usize,
}

#[derive(Debug, Deserialize, Default)]
pub struct SaqConfig {
    #[serde(default)]
    pub listen_on_binary: Vec<Endpoint>,
    #[serde(default)]
    pub listen_on_plaintext: Vec<Endpoint>,
}

/// The `.toml` document, deserialized but not yet cross-validated.
#[derive(Debug, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    pub translation: TranslationConfig,
    pub dns: Option<DnsConfig>,
    pub xax: Option<XaxConfig>,
    pub saq: Option<SaqConfig>,
}
