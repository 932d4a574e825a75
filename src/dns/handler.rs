//! Per-query dispatch: validates the input contract, then routes to the
//! auxiliary zone, the reverse resolver, or the forward resolver.

use std::net::Ipv4Addr;
use std::sync::Arc;

use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::DNSClass;
use hickory_proto::rr::RecordType;

use crate::config::resolved::DnsSettings;
use crate::context::AppContext;

use super::upstream::UpstreamQuerier;
use super::{aux_zone, base_response, clear_authoritative, forward, reverse};

pub async fn handle(
    ctx: &Arc<AppContext>,
    querier: &UpstreamQuerier,
    settings: &DnsSettings,
    peer_v4: Option<Ipv4Addr>,
    force_tcp: bool,
    raw: &[u8],
) -> Option<Vec<u8>> {
    let query = Message::from_vec(raw).ok()?;
    if !meets_input_contract(&query) {
        crate::debug_for!(crate::config::Facility::Dns, "dropping malformed DNS query");
        return None;
    }

    let question = query.queries()[0].clone();
    let Some(peer_v4) = peer_v4 else {
        crate::debug_for!(crate::config::Facility::Dns, "dropping DNS query from a non-IPv4 peer");
        return None;
    };
    if !ctx.client_mapper.allow_list().contains(peer_v4) {
        crate::debug_for!(crate::config::Facility::Dns, "dropping DNS query from unauthorized peer {peer_v4}");
        return None;
    }

    let aux = settings.auxiliary_names.as_ref();
    if let Some(aux) = aux {
        if question.name() == &aux.domain || aux.domain.zone_of(question.name()) {
            let (rcode, answers, authority) = aux_zone::answer(
                ctx,
                &aux.domain,
                &aux.zone_ns_ips,
                question.name(),
                question.query_type(),
                peer_v4,
            );
            let mut response = base_response(&query, rcode);
            let mut header = *response.header();
            header.set_authoritative(true);
            response.set_header(header);
            for record in answers {
                response.add_answer(record);
            }
            for record in authority {
                response.add_name_server(record);
            }
            return encode(&response);
        }
    }

    let response = match question.query_type() {
        RecordType::PTR => reverse::resolve_ptr(ctx, querier, aux, &query, force_tcp).await,
        RecordType::A => {
            forward::resolve_a(
                ctx,
                querier,
                &query,
                force_tcp,
                settings.max_newly_assigned_substitute_addrs_per_response,
                peer_v4,
            )
            .await
        }
        _ => querier.query(&query, force_tcp).await.map(|mut r| {
            clear_authoritative(&mut r);
            r
        }),
    };

    match response {
        Ok(response) => encode(&response),
        Err(_) => encode(&base_response(&query, ResponseCode::ServFail)),
    }
}

fn meets_input_contract(query: &Message) -> bool {
    let header = query.header();
    query.queries().len() == 1
        && query.queries()[0].query_class() == DNSClass::IN
        && query.queries()[0].query_type() != RecordType::ANY
        && query.answer_count() == 0
        && query.name_server_count() == 0
        && query.additional_count() == 0
        && header.message_type() != hickory_proto::op::MessageType::Response
        && !header.authoritative()
        && !header.truncated()
        && !header.recursion_available()
        && query.response_code() == ResponseCode::NoError
}

fn encode(message: &Message) -> Option<Vec<u8>> {
    message.to_vec().ok()
}
