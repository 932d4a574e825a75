//! Simple-address-query listener setup: unbounded, synchronous-per-datagram
//! UDP services. No admission semaphore -- it's cheap enough not to need one.

pub mod error;
pub mod handler;

use std::sync::Arc;

use tokio::net::UdpSocket;

use crate::context::AppContext;

use handler::Encoding;

/// Spawns one task per configured binary/plaintext UDP endpoint.
pub async fn spawn(
    ctx: Arc<AppContext>,
    settings: &crate::config::resolved::SaqSettings,
) -> Vec<tokio::task::JoinHandle<()>> {
    let mut handles = Vec::new();

    for addr in settings.listen_on_binary.clone() {
        if let Some(handle) = spawn_listener(ctx.clone(), addr, Encoding::Binary).await {
            handles.push(handle);
        }
    }
    for addr in settings.listen_on_plaintext.clone() {
        if let Some(handle) = spawn_listener(ctx.clone(), addr, Encoding::Plaintext).await {
            handles.push(handle);
        }
    }

    handles
}

async fn spawn_listener(
    ctx: Arc<AppContext>,
    addr: std::net::SocketAddr,
    encoding: Encoding,
) -> Option<tokio::task::JoinHandle<()>> {
    let socket = match UdpSocket::bind(addr).await {
        Ok(socket) => socket,
        Err(err) => {
            log::error!("failed to bind simple-address-query listener {addr}: {err}");
            return None;
        }
    };
    Some(tokio::spawn(async move { run(ctx, socket, encoding).await }))
}

async fn run(ctx: Arc<AppContext>, socket: UdpSocket, encoding: Encoding) {
    let mut buf = [0u8; 512];
    loop {
        tokio::select! {
            () = ctx.shutdown_requested() => return,
            received = socket.recv_from(&mut buf) => {
                let Ok((len, peer)) = received else { continue };
                if let Ok(response) = handler::handle(&ctx, peer, &buf[..len], encoding) {
                    let _ = socket.send_to(&response, peer).await;
                }
            }
        }
    }
}
