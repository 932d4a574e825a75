//! UDP DNS listener: one task per configured endpoint, admitted through the
//! shared `max_simultaneous_queries` semaphore.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::Semaphore;

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
        let socket = match UdpSocket::bind(addr).await {
            Ok(socket) => Arc::new(socket),
            Err(err) => {
                log::error!("failed to bind DNS UDP listener {addr}: {err}");
                return;
            }
        };
        let semaphore = Arc::new(Semaphore::new(settings.max_simultaneous_queries));
        run(ctx, querier, settings, socket, semaphore).await;
    })
}

async fn run(
    ctx: Arc<AppContext>,
    querier: Arc<UpstreamQuerier>,
    settings: Arc<DnsSettings>,
    socket: Arc<UdpSocket>,
    semaphore: Arc<Semaphore>,
) {
    let mut buf = [0u8; 4096];
    loop {
        tokio::select! {
            () = ctx.shutdown_requested() => return,
            received = socket.recv_from(&mut buf) => {
                let Ok((len, peer)) = received else { continue };
                let Ok(permit) = semaphore.clone().try_acquire_owned() else {
                    debug_for!(Facility::Dns, "refusing UDP query: admission semaphore full");
                    continue;
                };
                let datagram = buf[..len].to_vec();
                let ctx = ctx.clone();
                let querier = querier.clone();
                let settings = settings.clone();
                let socket = socket.clone();
                tokio::spawn(async move {
                    let peer_v4 = match peer.ip() {
                        std::net::IpAddr::V4(v4) => Some(v4),
                        std::net::IpAddr::V6(_) => None,
                    };
                    // Racing against the shutdown signal drops the handler
                    // future instead of waiting for it to finish, so the
                    // dispatcher cancels every outstanding handler task on
                    // its own cancellation.
                    tokio::select! {
                        () = ctx.shutdown_requested() => {}
                        response = handler::handle(&ctx, &querier, &settings, peer_v4, false, &datagram) => {
                            if let Some(response) = response {
                                let _ = socket.send_to(&response, peer).await;
                            }
                        }
                    }
                    drop(permit);
                });
            }
        }
    }
}
