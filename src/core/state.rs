//! Process state for serve mode.
//!
//! - `SHUTDOWN`: Has shutdown been requested? (Ctrl+C received)
//! - `SERVER`: HTTP server to unblock on shutdown
//! - `SHUTDOWN_TX`: wakes the pipeline waiting in watch mode

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tiny_http::Server;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown signal sender for the watch pipeline
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start
///
/// - Before `register_shutdown()`: exits immediately (initial build in progress)
/// - After `register_shutdown()`: graceful shutdown (unblock server, stop watchers)
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        let Some(tx) = SHUTDOWN_TX.get() else {
            std::process::exit(130);
        };

        crate::log!("serve"; "shutting down...");
        let _ = tx.send(());
        if let Some(server) = SERVER.get() {
            server.unblock();
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the shutdown channel that the watch pipeline waits on.
pub fn register_shutdown(shutdown_tx: crossbeam::channel::Sender<()>) {
    let _ = SHUTDOWN_TX.set(shutdown_tx);
}

/// Register the HTTP server so Ctrl+C unblocks its request loop.
pub fn register_server(server: Arc<Server>) {
    let _ = SERVER.set(server);
}

/// Check if shutdown has been requested
///
/// Relaxed ordering: worst case one more request is handled before stopping
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
