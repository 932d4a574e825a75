//! Two disjoint signal sets: termination and print-map.

use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};

use crate::context::AppContext;

/// Spawns the task that turns OS signals into the two process-wide events
/// carried by [`AppContext`]. Runs until a termination signal arrives.
pub fn spawn(ctx: Arc<AppContext>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
        let mut sigint =
            signal(SignalKind::interrupt()).expect("failed to register SIGINT handler");
        let mut sigusr1 =
            signal(SignalKind::user_defined1()).expect("failed to register SIGUSR1 handler");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    log::info!("Received SIGTERM, shutting down");
                    ctx.request_shutdown();
                    break;
                }
                _ = sigint.recv() => {
                    log::info!("Received SIGINT, shutting down");
                    ctx.request_shutdown();
                    break;
                }
                _ = sigusr1.recv() => {
                    log::info!("Received SIGUSR1, dumping assignment map");
                    ctx.request_print_map();
                }
            }
        }
    })
}
