//! Reload notifier: file server plus WebSocket push.
//!
//! ```text
//! WatchDispatcher --notify(reason)--> ReloadNotifier --{"type":"reload"}--> browsers
//!                                          |
//!                                          +-- HTTP: serves base_dir, injects client
//! ```
//!
//! Both ports are bound in [`ReloadNotifier::start`]; a bind failure is
//! returned to the caller and nothing is retried.

mod message;
mod ws;

#[cfg(test)]
mod tests;

pub use message::HotReloadMessage;

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tiny_http::Server;

use crate::config::ServeConfig;
use crate::{debug, log, serve};

use ws::Clients;

/// Receiver of "outputs changed, refresh" signals.
pub trait ReloadSignal: Send + Sync {
    fn notify(&self, reason: &str);
}

/// Live HTTP + WebSocket session over one output directory.
pub struct ReloadNotifier {
    http_addr: SocketAddr,
    ws_port: u16,
    server: Arc<Server>,
    clients: Clients,
}

impl ReloadNotifier {
    /// Bind both endpoints and start serving `base_dir`.
    pub fn start(base_dir: &Path, config: &ServeConfig) -> Result<Self> {
        fs::create_dir_all(base_dir)
            .with_context(|| format!("failed to create {}", base_dir.display()))?;

        let (listener, ws_port) = ws::bind(config.interface, config.ws_port)?;
        let (server, http_addr) = serve::bind(config.interface, config.port)?;

        let clients = Clients::default();
        ws::spawn(listener, clients.clone())?;
        serve::spawn(Arc::clone(&server), base_dir.to_path_buf(), ws_port)?;

        log!("serve"; "http://{}", http_addr);
        debug!("reload"; "ws://{}:{}", config.interface, ws_port);

        Ok(Self {
            http_addr,
            ws_port,
            server,
            clients,
        })
    }

    /// Actual HTTP address (differs from the config for port 0).
    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    pub fn ws_port(&self) -> u16 {
        self.ws_port
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// HTTP server handle, for unblocking on shutdown.
    pub fn server(&self) -> Arc<Server> {
        Arc::clone(&self.server)
    }

    /// Stop accepting HTTP requests.
    pub fn stop(&self) {
        self.server.unblock();
    }
}

impl ReloadSignal for ReloadNotifier {
    fn notify(&self, reason: &str) {
        self.clients.broadcast(&HotReloadMessage::reload_with_reason(reason));
    }
}
