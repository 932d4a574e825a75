//! PTR rewriting for substitute IPv4 ranges.

use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::Arc;

use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::rdata::PTR;
use hickory_proto::rr::{Name, RData, Record, RecordType};

use crate::config::resolved::AuxiliaryNamesSettings;
use crate::context::AppContext;

use super::aux_zone;
use super::error::DnsError;
use super::upstream::UpstreamQuerier;
use super::{base_response, clear_authoritative};

/// Resolves a single-question, type-PTR query. Queries outside the
/// substitute address space are the caller's responsibility to proxy
/// verbatim; this function only handles the substitute-space branch.
pub async fn resolve_ptr(
    ctx: &Arc<AppContext>,
    querier: &UpstreamQuerier,
    aux: Option<&AuxiliaryNamesSettings>,
    query: &Message,
    force_tcp: bool,
) -> Result<Message, DnsError> {
    let qname = query.queries()[0].name().clone();
    let Some(v4) = reverse_name_to_ipv4(&qname) else {
        let mut response = querier.query(query, force_tcp).await?;
        clear_authoritative(&mut response);
        return Ok(response);
    };

    let in_scope = ctx
        .substitute_mapper
        .lock()
        .expect("mapper mutex poisoned")
        .is_in_substitute_space(v4);
    if !in_scope {
        let mut response = querier.query(query, force_tcp).await?;
        clear_authoritative(&mut response);
        return Ok(response);
    }

    let found = ctx
        .substitute_mapper
        .lock()
        .expect("mapper mutex poisoned")
        .reverse_lookup_4to6(v4);
    let Some((v6, cache_lifetime)) = found else {
        return Ok(base_response(query, ResponseCode::ServFail));
    };

    if let Some(aux) = aux.filter(|aux| aux.use_for_rdns) {
        let ptr_name = aux_zone::synthetic_ptr_name(&aux.domain, v6);
        let mut response = base_response(query, ResponseCode::NoError);
        response.add_answer(Record::from_rdata(
            qname,
            u32::try_from(cache_lifetime).unwrap_or(u32::MAX),
            RData::PTR(PTR(ptr_name)),
        ));
        let mut header = *response.header();
        header.set_authoritative(true);
        response.set_header(header);
        return Ok(response);
    }

    let reverse_v6_name = match ipv6_reverse_name(v6) {
        Some(name) => name,
        None => return Ok(base_response(query, ResponseCode::ServFail)),
    };
    let mut upstream_query = query.clone();
    upstream_query.queries_mut()[0].set_name(reverse_v6_name);
    let upstream_response = querier.query(&upstream_query, force_tcp).await?;

    if upstream_response.response_code() != ResponseCode::NoError {
        return Ok(base_response(query, ResponseCode::ServFail));
    }
    let ptr_records: Vec<&Record> = upstream_response
        .answers()
        .iter()
        .filter(|r| r.record_type() == RecordType::PTR)
        .collect();
    if ptr_records.is_empty() {
        return Ok(base_response(query, ResponseCode::ServFail));
    }

    let mut response = base_response(query, ResponseCode::NoError);
    for record in ptr_records {
        let ttl = record.ttl().min(u32::try_from(cache_lifetime).unwrap_or(u32::MAX));
        response.add_answer(Record::from_rdata(qname.clone(), ttl, record.data().cloned().expect("PTR record has rdata")));
    }
    Ok(response)
}

/// Decodes a `<reversed octets>.in-addr.arpa.` name back to an [`Ipv4Addr`].
fn reverse_name_to_ipv4(name: &Name) -> Option<Ipv4Addr> {
    let arpa = Name::from_str("in-addr.arpa.").ok()?;
    if !arpa.zone_of(name) || name.num_labels() != arpa.num_labels() + 4 {
        return None;
    }
    let mut octets = [0u8; 4];
    for (i, label) in name.iter().take(4).enumerate() {
        octets[i] = std::str::from_utf8(label).ok()?.parse::<u8>().ok()?;
    }
    octets.reverse();
    Some(Ipv4Addr::from(octets))
}

fn ipv6_reverse_name(v6: std::net::Ipv6Addr) -> Option<Name> {
    let mut labels = String::new();
    for byte in v6.octets().iter().rev() {
        labels.push_str(&format!("{:x}.{:x}.", byte & 0xf, byte >> 4));
    }
    labels.push_str("ip6.arpa.");
    Name::from_str(&labels).ok()
}
