//! A-record forward resolution with on-the-fly IPv6→IPv4 substitution.

use std::net::Ipv4Addr;
use std::sync::Arc;

use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{RData, Record, RecordType};

use crate::context::AppContext;

use super::error::DnsError;
use super::upstream::UpstreamQuerier;
use super::{base_response, clear_authoritative, strip_soa_authority};

/// Resolves a single-question, type-A query on behalf of `client_v4`.
/// Everything else the forward resolver sees is proxied verbatim by the
/// caller before this function is ever reached.
pub async fn resolve_a(
    ctx: &Arc<AppContext>,
    querier: &UpstreamQuerier,
    query: &Message,
    force_tcp: bool,
    max_new_assignments: usize,
    client_v4: Ipv4Addr,
) -> Result<Message, DnsError> {
    let qname = query.queries()[0].name().clone();

    let mut a_response = querier.query(query, force_tcp).await?;
    clear_authoritative(&mut a_response);

    if a_response.response_code() != ResponseCode::NoError {
        return Ok(a_response);
    }
    if a_response
        .answers()
        .iter()
        .any(|r| r.record_type() == RecordType::A)
    {
        return Ok(a_response);
    }

    let mut aaaa_query = query.clone();
    aaaa_query.queries_mut()[0].set_query_type(RecordType::AAAA);
    // A fresh, random id for the second upstream exchange -- it is a
    // distinct query on the wire and reusing the client's id would make a
    // spoofed answer easier to slip in alongside the real one.
    aaaa_query.set_id(rand::random());
    let mut aaaa_response = querier.query(&aaaa_query, force_tcp).await?;
    clear_authoritative(&mut aaaa_response);

    if aaaa_response.response_code() != ResponseCode::NoError {
        return Ok(base_response(query, ResponseCode::ServFail));
    }

    let aaaa_targets: Vec<(std::net::Ipv6Addr, u32)> = aaaa_response
        .answers()
        .iter()
        .filter_map(|r| match r.data() {
            Some(RData::AAAA(addr)) => Some((addr.0, r.ttl())),
            _ => None,
        })
        .collect();

    if aaaa_targets.is_empty() {
        return Ok(a_response);
    }

    let mut synthesized: Vec<(Ipv4Addr, u64, u32)> = Vec::new();
    let mut unresolved = Vec::new();
    {
        let mut mapper = ctx.substitute_mapper.lock().expect("mapper mutex poisoned");
        for (v6, ttl) in &aaaa_targets {
            match mapper.substitute_6to4(*v6, client_v4, false) {
                Ok((v4, cache_lifetime)) => synthesized.push((v4, cache_lifetime, *ttl)),
                Err(_) => unresolved.push((*v6, *ttl)),
            }
        }
        for (v6, ttl) in unresolved.into_iter().take(max_new_assignments) {
            if let Ok((v4, cache_lifetime)) = mapper.substitute_6to4(v6, client_v4, true) {
                synthesized.push((v4, cache_lifetime, ttl));
            }
        }
    }

    if synthesized.is_empty() {
        return Ok(base_response(query, ResponseCode::ServFail));
    }

    let mut response = a_response;
    strip_soa_authority(&mut response);
    let records: Vec<Record> = synthesized
        .into_iter()
        .map(|(v4, cache_lifetime, original_ttl)| {
            let ttl = original_ttl.min(u32::try_from(cache_lifetime).unwrap_or(u32::MAX));
            Record::from_rdata(qname.clone(), ttl, RData::A(A(v4)))
        })
        .collect();
    for record in records {
        response.add_answer(record);
    }
    let mut header = *response.header();
    header.set_authentic_data(false);
    response.set_header(header);

    Ok(response)
}
