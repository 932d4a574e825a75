//! The authoritative synthetic zone for `r`/`ns` names.
//!
//! The `<ipv6-dashed>.<domain>` and `<ipv4-dashed>.r.<domain>` branches are
//! answered on behalf of the querying DNS peer, the same as any other
//! substitute-mapper operation: the peer's validated IPv4 is threaded
//! through from the listener and used as `client_v4`.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use std::sync::Arc;

use hickory_proto::op::ResponseCode;
use hickory_proto::rr::rdata::{A, AAAA, NS, SOA};
use hickory_proto::rr::{Name, RData, Record, RecordType};

use crate::context::AppContext;

const SOA_REFRESH: i32 = 5;
const SOA_RETRY: i32 = 3;
const SOA_EXPIRE: i32 = 10;
const SOA_MINIMUM: u32 = 0;

fn soa_record(domain: &Name) -> Record {
    let ns = ns_name(domain);
    let rname = Name::from_str(&format!("nobody.{domain}")).unwrap_or_else(|_| domain.clone());
    Record::from_rdata(
        domain.clone(),
        SOA_MINIMUM,
        RData::SOA(SOA::new(ns, rname, 1, SOA_REFRESH, SOA_RETRY, SOA_EXPIRE, SOA_MINIMUM)),
    )
}

fn ns_name(domain: &Name) -> Name {
    Name::from_str(&format!("ns.{domain}")).unwrap_or_else(|_| domain.clone())
}

/// Builds the full authoritative answer to a query already known to fall
/// under `domain`.
pub fn answer(
    ctx: &Arc<AppContext>,
    domain: &Name,
    zone_ns_ips: &[IpAddr],
    qname: &Name,
    qtype: RecordType,
    client_v4: Ipv4Addr,
) -> (ResponseCode, Vec<Record>, Vec<Record>) {
    let mut answers = Vec::new();
    let mut authority = Vec::new();

    if qname == domain {
        match qtype {
            RecordType::SOA => answers.push(soa_record(domain)),
            RecordType::NS => {
                answers.push(Record::from_rdata(domain.clone(), 0, RData::NS(NS(ns_name(domain)))));
            }
            _ => authority.push(soa_record(domain)),
        }
        return (ResponseCode::NoError, answers, authority);
    }

    if *qname == ns_name(domain) {
        for ip in zone_ns_ips {
            match (ip, qtype) {
                (IpAddr::V4(v4), RecordType::A) => {
                    answers.push(Record::from_rdata(qname.clone(), 0, RData::A(A(*v4))));
                }
                (IpAddr::V6(v6), RecordType::AAAA) => {
                    answers.push(Record::from_rdata(qname.clone(), 0, RData::AAAA(AAAA(*v6))));
                }
                _ => {}
            }
        }
        if answers.is_empty() {
            authority.push(soa_record(domain));
        }
        return (ResponseCode::NoError, answers, authority);
    }

    let Some(labels) = labels_under(qname, domain) else {
        authority.push(soa_record(domain));
        return (ResponseCode::NXDomain, answers, authority);
    };

    match labels.as_slice() {
        [v6_label] => answer_v6_label(ctx, domain, qname, qtype, v6_label, client_v4),
        [v4_label, r_label] if r_label.eq_ignore_ascii_case("r") => {
            answer_v4_label(ctx, domain, qname, qtype, v4_label, client_v4)
        }
        _ => {
            authority.push(soa_record(domain));
            (ResponseCode::NXDomain, answers, authority)
        }
    }
}

/// Answers AAAA for `<ipv6-dashed>.<domain>` with an assignment from
/// `find_or_create_6to4`: a hit refreshes it, a miss creates one.
fn answer_v6_label(
    ctx: &Arc<AppContext>,
    domain: &Name,
    qname: &Name,
    qtype: RecordType,
    label: &str,
    client_v4: Ipv4Addr,
) -> (ResponseCode, Vec<Record>, Vec<Record>) {
    let Some(v6) = dashed_to_ipv6(label) else {
        return (ResponseCode::NXDomain, Vec::new(), vec![soa_record(domain)]);
    };
    if qtype != RecordType::AAAA {
        return (ResponseCode::NoError, Vec::new(), vec![soa_record(domain)]);
    }
    let mut mapper = ctx.substitute_mapper.lock().expect("mapper mutex poisoned");
    match mapper.substitute_6to4(v6, client_v4, true) {
        Ok((_v4, ttl)) => (
            ResponseCode::NoError,
            vec![Record::from_rdata(qname.clone(), ttl as u32, RData::AAAA(AAAA(v6)))],
            Vec::new(),
        ),
        Err(_) => (ResponseCode::NXDomain, Vec::new(), vec![soa_record(domain)]),
    }
}

/// Answers A for `<ipv4-dashed>.r.<domain>` with the v6-side of a
/// static/dynamic 4→6 lookup. Lookup only -- never creates an assignment.
fn answer_v4_label(
    ctx: &Arc<AppContext>,
    domain: &Name,
    qname: &Name,
    qtype: RecordType,
    label: &str,
    client_v4: Ipv4Addr,
) -> (ResponseCode, Vec<Record>, Vec<Record>) {
    let Some(v4) = dashed_to_ipv4(label) else {
        return (ResponseCode::NXDomain, Vec::new(), vec![soa_record(domain)]);
    };
    if qtype != RecordType::A {
        return (ResponseCode::NoError, Vec::new(), vec![soa_record(domain)]);
    }
    let mut mapper = ctx.substitute_mapper.lock().expect("mapper mutex poisoned");
    match mapper.substitute_4to6(v4, client_v4) {
        Ok((_v6, ttl)) => (
            ResponseCode::NoError,
            vec![Record::from_rdata(qname.clone(), ttl as u32, RData::A(A(v4)))],
            Vec::new(),
        ),
        Err(_) => (ResponseCode::NXDomain, Vec::new(), vec![soa_record(domain)]),
    }
}

/// Synthesizes the PTR name used when `use_for_rdns` is enabled: the
/// fully-exploded v6 address with `:` replaced by `-`, under `domain`.
#[must_use]
pub fn synthetic_ptr_name(domain: &Name, v6: Ipv6Addr) -> Name {
    Name::from_str(&format!("{}.{domain}", exploded_dashed(v6))).unwrap_or_else(|_| domain.clone())
}

fn exploded_dashed(v6: Ipv6Addr) -> String {
    v6.segments()
        .iter()
        .map(|seg| format!("{seg:04x}"))
        .collect::<Vec<_>>()
        .join("-")
}

fn dashed_to_ipv6(label: &str) -> Option<Ipv6Addr> {
    label.replace('-', ":").parse().ok()
}

fn dashed_to_ipv4(label: &str) -> Option<Ipv4Addr> {
    label.replace('-', ".").parse().ok()
}

/// `Some(labels)` (apex-relative, outermost first) if `name` lies strictly
/// under `domain`; `None` otherwise.
fn labels_under(name: &Name, domain: &Name) -> Option<Vec<String>> {
    if !domain.zone_of(name) || name.num_labels() <= domain.num_labels() {
        return None;
    }
    let extra = (name.num_labels() - domain.num_labels()) as usize;
    Some(
        name.iter()
            .take(extra)
            .map(|l| String::from_utf8_lossy(l).into_owned())
            .collect(),
    )
}
