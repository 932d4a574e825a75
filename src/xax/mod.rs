//! XAX listener setup: one task per configured Unix or TCP endpoint, each
//! accepting connections under a shared admission semaphore.

pub mod error;
mod frame;
mod handler;
mod request;

use std::sync::Arc;

use tokio::net::{TcpListener, UnixListener};
use tokio::sync::Semaphore;

use crate::config::Facility;
use crate::config::resolved::XaxSettings;
use crate::context::AppContext;
use crate::debug_for;

/// Spawns one accept-loop task per configured endpoint. Returns immediately;
/// the tasks themselves run until shutdown.
pub fn spawn(ctx: Arc<AppContext>, settings: &XaxSettings) -> Vec<tokio::task::JoinHandle<()>> {
    let semaphore = Arc::new(Semaphore::new(settings.max_simultaneous_connections));
    let mut handles = Vec::new();

    for path in settings.listen_on_unix.clone() {
        let _ = std::fs::remove_file(&path);
        let listener = match UnixListener::bind(&path) {
            Ok(listener) => listener,
            Err(err) => {
                log::error!("failed to bind XAX unix socket {}: {err}", path.display());
                continue;
            }
        };
        handles.push(spawn_unix_accept_loop(ctx.clone(), listener, semaphore.clone()));
    }

    for addr in settings.listen_on_tcp.clone() {
        let ctx = ctx.clone();
        let semaphore = semaphore.clone();
        let handle = tokio::spawn(async move {
            let listener = match TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(err) => {
                    log::error!("failed to bind XAX TCP listener {addr}: {err}");
                    return;
                }
            };
            accept_loop_tcp(ctx, listener, semaphore).await;
        });
        handles.push(handle);
    }

    handles
}

fn spawn_unix_accept_loop(
    ctx: Arc<AppContext>,
    listener: UnixListener,
    semaphore: Arc<Semaphore>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = ctx.shutdown_requested() => return,
                accepted = listener.accept() => {
                    let Ok((stream, _)) = accepted else { continue };
                    let Ok(permit) = semaphore.clone().try_acquire_owned() else {
                        debug_for!(Facility::Xax, "refusing XAX connection: admission semaphore full");
                        continue;
                    };
                    let ctx = ctx.clone();
                    tokio::spawn(async move {
                        handler::handle(ctx, stream).await;
                        drop(permit);
                    });
                }
            }
        }
    })
}

async fn accept_loop_tcp(ctx: Arc<AppContext>, listener: TcpListener, semaphore: Arc<Semaphore>) {
    loop {
        tokio::select! {
            () = ctx.shutdown_requested() => return,
            accepted = listener.accept() => {
                let Ok((stream, _)) = accepted else { continue };
                let Ok(permit) = semaphore.clone().try_acquire_owned() else {
                    debug_for!(Facility::Xax, "refusing XAX connection: admission semaphore full");
                    continue;
                };
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    handler::handle(ctx, stream).await;
                    drop(permit);
                });
            }
        }
    }
}
