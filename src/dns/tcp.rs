//! TCP DNS listener: 2-byte length-prefixed framing per RFC 1035, with a
//! per-client read/write deadline.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::time::timeout;

use crate::config::resolved::DnsSettings;
use crate::config::Facility;
use crate::context::AppContext;
use crate::debug_for;

use super::handler;
use super::upstream::UpstreamQuerier;

pub fn spawn(
    ctx: Arc<AppContext>,
    querier: Arc<UpstreamQuerier>,
    settings: Arc<DnsSettings>,
    addr: SocketAddr,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(err) => {
                log::error!("failed to bind DNS TCP listener {addr}: {err}");
                return;
            }
        };
        let semaphore = Arc::new(Semaphore::new(settings.max_simultaneous_queries));
        loop {
            tokio::select! {
                () = ctx.shutdown_requested() => return,
                accepted = listener.accept() => {
                    let Ok((stream, peer)) = accepted else { continue };
                    let Ok(permit) = semaphore.clone().try_acquire_owned() else {
                        debug_for!(Facility::Dns, "refusing TCP connection: admission semaphore full");
                        continue;
                    };
                    let ctx = ctx.clone();
                    let querier = querier.clone();
                    let settings = settings.clone();
                    tokio::spawn(async move {
                        handle_connection(ctx, querier, settings, stream, peer).await;
                        drop(permit);
                    });
                }
            }
        }
    })
}

async fn handle_connection(
    ctx: Arc<AppContext>,
    querier: Arc<UpstreamQuerier>,
    settings: Arc<DnsSettings>,
    mut stream: TcpStream,
    peer: SocketAddr,
) {
    let deadline = settings.tcp_communication_with_client_timeout;
    let peer_v4 = match peer.ip() {
        std::net::IpAddr::V4(v4) => Some(v4),
        std::net::IpAddr::V6(_) => None,
    };

    loop {
        let mut len_buf = [0u8; 2];
        let read = tokio::select! {
            () = ctx.shutdown_requested() => return,
            result = timeout(deadline, stream.read_exact(&mut len_buf)) => result,
        };
        match read {
            Ok(Ok(_)) => {}
            _ => return,
        }
        let len = u16::from_be_bytes(len_buf) as usize;
        if len == 0 {
            return;
        }
        let mut buf = vec![0u8; len];
        match timeout(deadline, stream.read_exact(&mut buf)).await {
            Ok(Ok(_)) => {}
            _ => return,
        }

        let response = tokio::select! {
            () = ctx.shutdown_requested() => return,
            response = handler::handle(&ctx, &querier, &settings, peer_v4, true, &buf) => response,
        };
        let Some(response) = response else { continue };
        let Ok(response_len) = u16::try_from(response.len()) else { continue };

        let mut framed = Vec::with_capacity(2 + response.len());
        framed.extend_from_slice(&response_len.to_be_bytes());
        framed.extend_from_slice(&response);
        if timeout(deadline, stream.write_all(&framed)).await.is_err() {
            return;
        }
    }
}
