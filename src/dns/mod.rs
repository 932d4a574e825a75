//! The DNS request surface: forward/reverse resolution, the authoritative
//! auxiliary zone, and UDP/TCP listener setup.

mod aux_zone;
pub mod error;
mod forward;
mod handler;
mod reverse;
mod tcp;
mod udp;
mod upstream;

use std::sync::Arc;

use hickory_proto::op::{Header, Message, MessageType, OpCode, ResponseCode};
use hickory_proto::rr::RecordType;

use crate::config::resolved::DnsSettings;
use crate::context::AppContext;

use upstream::UpstreamQuerier;

/// Spawns the UDP and TCP listener tasks for every configured endpoint.
pub fn spawn(ctx: Arc<AppContext>, settings: Arc<DnsSettings>) -> Vec<tokio::task::JoinHandle<()>> {
    let querier = Arc::new(UpstreamQuerier::new(
        settings.upstream_servers.clone(),
        settings.upstream_query_timeout,
    ));

    let mut handles = Vec::new();
    for addr in settings.listen_on.clone() {
        handles.push(udp::spawn(ctx.clone(), querier.clone(), settings.clone(), addr));
        handles.push(tcp::spawn(ctx.clone(), querier.clone(), settings.clone(), addr));
    }
    handles
}

fn base_response(query: &Message, rcode: ResponseCode) -> Message {
    let mut header = Header::new();
    header.set_id(query.id());
    header.set_message_type(MessageType::Response);
    header.set_op_code(OpCode::Query);
    header.set_recursion_desired(query.recursion_desired());
    header.set_recursion_available(true);
    header.set_response_code(rcode);
    let mut response = Message::new();
    response.set_header(header);
    for query in query.queries() {
        response.add_query(query.clone());
    }
    response
}

fn clear_authoritative(message: &mut Message) {
    let mut header = *message.header();
    header.set_authoritative(false);
    message.set_header(header);
}

fn strip_soa_authority(message: &mut Message) {
    let kept: Vec<_> = message
        .name_servers()
        .iter()
        .filter(|r| r.record_type() != RecordType::SOA)
        .cloned()
        .collect();
    message.take_name_servers();
    for record in kept {
        message.add_name_server(record);
    }
}
