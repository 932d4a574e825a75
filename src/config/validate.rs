//! Cross-field validation, adapted from the source's
//! `_TranslationConfigurationValidator` and
//! `_IPNetworkSequenceHasNoOverlappingNetworksValidator`.

use hickory_proto::rr::Name;
use ipnet::Ipv4Net;
use std::str::FromStr;
use std::time::Duration;

use super::error::ConfigError;
use super::model::{AuxiliaryNamesConfig, DnsConfig, RawConfig, SaqConfig, XaxConfig};
use super::resolved::{
    AppConfig, AuxiliaryNamesSettings, DnsSettings, DynamicAssigningSettings, GeneralSettings,
    SaqSettings, TranslationSettings, XaxSettings,
};

fn fail(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation(message.into())
}

/// `true` if the closed intervals `[a.network(), a.broadcast()]` and
/// `[b.network(), b.broadcast()]` overlap.
fn overlaps(a: Ipv4Net, b: Ipv4Net) -> bool {
    let (a_lo, a_hi) = (u32::from(a.network()), u32::from(a.broadcast()));
    let (b_lo, b_hi) = (u32::from(b.network()), u32::from(b.broadcast()));
    a_lo <= b_hi && b_lo <= a_hi
}

fn require_no_overlaps(nets: &[Ipv4Net], context: &str) -> Result<(), ConfigError> {
    for (i, a) in nets.iter().enumerate() {
        for b in &nets[i + 1..] {
            if overlaps(*a, *b) {
                return Err(fail(format!(
                    "{context}: {a} and {b} overlap"
                )));
            }
        }
    }
    Ok(())
}

fn require_disjoint(a: &[Ipv4Net], b: &[Ipv4Net], context: &str) -> Result<(), ConfigError> {
    for x in a {
        for y in b {
            if overlaps(*x, *y) {
                return Err(fail(format!("{context}: {x} and {y} overlap")));
            }
        }
    }
    Ok(())
}

fn validate_timeout(name: &str, value: f64, min: f64, max: f64) -> Result<Duration, ConfigError> {
    if !(min..=max).contains(&value) {
        return Err(fail(format!(
            "{name} must be between {min} and {max} seconds, got {value}"
        )));
    }
    Ok(Duration::from_secs_f64(value))
}

fn require_positive(name: &str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(fail(format!("{name} must be a positive integer")));
    }
    Ok(())
}

fn validate_translation(
    raw: super::model::TranslationConfig,
) -> Result<TranslationSettings, ConfigError> {
    if raw.client_allowed_subnets.is_empty() {
        return Err(fail("translation.client_allowed_subnets must not be empty"));
    }
    if raw.map_client_addrs_into.prefix_len() != 96 {
        return Err(fail(
            "translation.map_client_addrs_into must be a /96 prefix",
        ));
    }

    require_no_overlaps(&raw.client_allowed_subnets, "client_allowed_subnets")?;
    require_no_overlaps(&raw.substitute_subnets, "substitute_subnets")?;
    require_disjoint(
        &raw.client_allowed_subnets,
        &raw.substitute_subnets,
        "client_allowed_subnets vs substitute_subnets",
    )?;

    for assignment in &raw.static_substitute_addr_assignments {
        let containing_pool = raw
            .substitute_subnets
            .iter()
            .find(|net| net.contains(&assignment.v4));
        let Some(pool) = containing_pool else {
            return Err(fail(format!(
                "static assignment v4 {} is not inside any substitute_subnets entry",
                assignment.v4
            )));
        };
        if pool.prefix_len() <= 30
            && (assignment.v4 == pool.network() || assignment.v4 == pool.broadcast())
        {
            return Err(fail(format!(
                "static assignment v4 {} is the network or broadcast address of {}",
                assignment.v4, pool
            )));
        }
        if addr_under_v6_prefix(assignment.v6, raw.map_client_addrs_into) {
            return Err(fail(format!(
                "static assignment v6 {} lies inside the client prefix {}",
                assignment.v6, raw.map_client_addrs_into
            )));
        }
    }

    let dynamic_substitute_addr_assigning = raw
        .dynamic_substitute_addr_assigning
        .map(|d| DynamicAssigningSettings {
            min_lifetime_after_last_hit: Duration::from_secs(d.min_lifetime_after_last_hit),
        });

    Ok(TranslationSettings {
        client_allowed_subnets: raw.client_allowed_subnets,
        client_prefix: raw.map_client_addrs_into,
        substitute_subnets: raw.substitute_subnets,
        static_substitute_addr_assignments: raw
            .static_substitute_addr_assignments
            .into_iter()
            .map(|a| (a.v4, a.v6))
            .collect(),
        dynamic_substitute_addr_assigning,
    })
}

fn addr_under_v6_prefix(addr: std::net::Ipv6Addr, prefix: ipnet::Ipv6Net) -> bool {
    let mask = !0u128 << (128 - u32::from(prefix.prefix_len()));
    (u128::from(addr) & mask) == (u128::from(prefix.addr()) & mask)
}

fn validate_dns(raw: DnsConfig) -> Result<DnsSettings, ConfigError> {
    if raw.listen_on.is_empty() {
        return Err(fail("dns.listen_on must not be empty"));
    }
    if raw.upstream_servers.is_empty() {
        return Err(fail("dns.upstream_servers must not be empty"));
    }
    require_positive("dns.max_simultaneous_queries", raw.max_simultaneous_queries)?;
    require_positive(
        "dns.max_newly_assigned_substitute_addrs_per_response",
        raw.max_newly_assigned_substitute_addrs_per_response,
    )?;
    let tcp_communication_with_client_timeout = validate_timeout(
        "dns.tcp_communication_with_client_timeout",
        raw.tcp_communication_with_client_timeout,
        0.05,
        5.0,
    )?;
    let upstream_query_timeout = validate_timeout(
        "dns.upstream_query_timeout",
        raw.upstream_query_timeout,
        0.1,
        10.0,
    )?;

    let auxiliary_names = raw
        .auxiliary_names
        .map(validate_auxiliary_names)
        .transpose()?;

    Ok(DnsSettings {
        listen_on: raw.listen_on.into_iter().map(|e| e.0).collect(),
        upstream_servers: raw.upstream_servers.into_iter().map(|e| e.0).collect(),
        max_simultaneous_queries: raw.max_simultaneous_queries,
        tcp_communication_with_client_timeout,
        upstream_query_timeout,
        max_newly_assigned_substitute_addrs_per_response: raw
            .max_newly_assigned_substitute_addrs_per_response,
        auxiliary_names,
    })
}

fn validate_auxiliary_names(
    raw: AuxiliaryNamesConfig,
) -> Result<AuxiliaryNamesSettings, ConfigError> {
    let domain = Name::from_str(&raw.domain)
        .map_err(|e| fail(format!("dns.auxiliary_names.domain {:?}: {e}", raw.domain)))?;
    Ok(AuxiliaryNamesSettings {
        domain,
        use_for_rdns: raw.use_for_rdns,
        zone_ns_ips: raw.zone_ns_ips,
    })
}

fn validate_xax(raw: XaxConfig) -> Result<XaxSettings, ConfigError> {
    if raw.listen_on_unix.is_empty() && raw.listen_on_tcp.is_empty() {
        return Err(fail(
            "xax must configure at least one of listen_on_unix or listen_on_tcp",
        ));
    }
    require_positive(
        "xax.max_simultaneous_connections",
        raw.max_simultaneous_connections,
    )?;
    Ok(XaxSettings {
        listen_on_unix: raw.listen_on_unix,
        listen_on_tcp: raw.listen_on_tcp.into_iter().map(|e| e.0).collect(),
        max_simultaneous_connections: raw.max_simultaneous_connections,
    })
}

fn validate_saq(raw: SaqConfig) -> Result<SaqSettings, ConfigError> {
    if raw.listen_on_binary.is_empty() && raw.listen_on_plaintext.is_empty() {
        return Err(fail(
            "saq must configure at least one of listen_on_binary or listen_on_plaintext",
        ));
    }
    Ok(SaqSettings {
        listen_on_binary: raw.listen_on_binary.into_iter().map(|e| e.0).collect(),
        listen_on_plaintext: raw.listen_on_plaintext.into_iter().map(|e| e.0).collect(),
    })
}

pub fn validate(raw: RawConfig) -> Result<AppConfig, ConfigError> {
    let translation = validate_translation(raw.translation)?;
    let dns = raw.dns.map(validate_dns).transpose()?;
    let xax = raw.xax.map(validate_xax).transpose()?;
    let saq = raw.saq.map(validate_saq).transpose()?;

    if dns.is_none() && xax.is_none() && saq.is_none() {
        return Err(fail(
            "at least one of [dns], [xax], or [saq] must be configured",
        ));
    }

    Ok(AppConfig {
        general: GeneralSettings {
            debug_facilities: raw.general.print_debug_messages_from,
        },
        translation,
        dns,
        xax,
        saq,
    })
}
