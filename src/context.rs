//! The immutable context value threaded into every task: a plain value
//! passed explicitly instead of a process-wide provider.

use std::sync::Mutex;

use tokio::sync::{watch, Notify};

use crate::addr::ClientAddressMapper;
use crate::config::resolved::AppConfig;
use crate::substitute::SubstituteMapper;

/// Shared, immutable (at the field level) state every listener and handler
/// needs: configuration, the two mapping engines, and the two signal
/// primitives.
pub struct AppContext {
    pub config: AppConfig,
    pub client_mapper: ClientAddressMapper,
    /// Guards the one piece of genuinely mutable state: each
    /// `SubstituteMapper` must be guarded by a single mutex, held only
    /// across synchronous lookups/allocations, never across an `.await`.
    pub substitute_mapper: Mutex<SubstituteMapper>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    print_map: Notify,
}

impl AppContext {
    #[must_use]
    pub fn new(
        config: AppConfig,
        client_mapper: ClientAddressMapper,
        substitute_mapper: SubstituteMapper,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            config,
            client_mapper,
            substitute_mapper: Mutex::new(substitute_mapper),
            shutdown_tx,
            shutdown_rx,
            print_map: Notify::new(),
        }
    }

    /// Resolves once termination has been requested, and immediately again
    /// on every subsequent call -- suitable for a `tokio::select!` arm in a
    /// listener's accept loop.
    pub async fn shutdown_requested(&self) {
        let mut rx = self.shutdown_rx.clone();
        if *rx.borrow() {
            return;
        }
        let _ = rx.changed().await;
    }

    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    pub fn request_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn request_print_map(&self) {
        self.print_map.notify_one();
    }

    pub async fn print_map_requested(&self) {
        self.print_map.notified().await;
    }
}
