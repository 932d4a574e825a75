//! Sequential upstream querier.

use std::net::SocketAddr;
use std::time::Duration;

use hickory_proto::op::{Message, MessageType, ResponseCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;

use super::error::DnsError;

pub struct UpstreamQuerier {
    servers: Vec<SocketAddr>,
    per_query_timeout: Duration,
}

impl UpstreamQuerier {
    #[must_use]
    pub fn new(servers: Vec<SocketAddr>, per_query_timeout: Duration) -> Self {
        Self { servers, per_query_timeout }
    }

    /// Tries each configured upstream in turn, returning the first
    /// structurally valid response. `force_tcp` mirrors the querying
    /// client's own transport: a query is always transmitted over TCP iff
    /// the client's own connection is TCP.
    pub async fn query(&self, query: &Message, force_tcp: bool) -> Result<Message, DnsError> {
        for server in &self.servers {
            let attempt = if force_tcp {
                self.exchange_tcp(*server, query).await
            } else {
                match self.exchange_udp(*server, query).await {
                    Ok(response) if response.header().truncated() => {
                        self.exchange_tcp(*server, query).await
                    }
                    other => other,
                }
            };
            if let Ok(response) = attempt {
                if is_structurally_valid(query, &response) {
                    return Ok(response);
                }
            }
        }
        Err(DnsError::AllUpstreamsFailed)
    }

    async fn exchange_udp(&self, server: SocketAddr, query: &Message) -> Result<Message, DnsError> {
        let bind_addr: SocketAddr = if server.is_ipv6() { "[::]:0" } else { "0.0.0.0:0" }
            .parse()
            .expect("valid bind address");
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(server).await?;
        let bytes = query.to_vec().map_err(|_| DnsError::Encode)?;
        timeout(self.per_query_timeout, socket.send(&bytes))
            .await
            .map_err(|_| DnsError::Timeout)??;
        let mut buf = [0u8; 4096];
        let len = timeout(self.per_query_timeout, socket.recv(&mut buf))
            .await
            .map_err(|_| DnsError::Timeout)??;
        Message::from_vec(&buf[..len]).map_err(|_| DnsError::Decode)
    }

    async fn exchange_tcp(&self, server: SocketAddr, query: &Message) -> Result<Message, DnsError> {
        let mut stream = timeout(self.per_query_timeout, TcpStream::connect(server))
            .await
            .map_err(|_| DnsError::Timeout)??;

        let bytes = query.to_vec().map_err(|_| DnsError::Encode)?;
        let len = u16::try_from(bytes.len()).map_err(|_| DnsError::Encode)?;
        let mut framed = Vec::with_capacity(2 + bytes.len());
        framed.extend_from_slice(&len.to_be_bytes());
        framed.extend_from_slice(&bytes);
        timeout(self.per_query_timeout, stream.write_all(&framed))
            .await
            .map_err(|_| DnsError::Timeout)??;

        let mut len_buf = [0u8; 2];
        timeout(self.per_query_timeout, stream.read_exact(&mut len_buf))
            .await
            .map_err(|_| DnsError::Timeout)??;
        let response_len = u16::from_be_bytes(len_buf) as usize;
        let mut buf = vec![0u8; response_len];
        timeout(self.per_query_timeout, stream.read_exact(&mut buf))
            .await
            .map_err(|_| DnsError::Timeout)??;
        Message::from_vec(&buf).map_err(|_| DnsError::Decode)
    }
}

fn is_structurally_valid(query: &Message, response: &Message) -> bool {
    let q = query.header();
    let r = response.header();
    response.message_type() == MessageType::Response
        && r.id() == q.id()
        && r.op_code() == q.op_code()
        && r.query_count() == q.query_count()
        && matches!(response.response_code(), ResponseCode::NoError | ResponseCode::NXDomain)
        && !r.truncated()
        && r.recursion_available()
        && r.recursion_desired() == q.recursion_desired()
}
