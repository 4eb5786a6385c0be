//! Development file server over the output root.
//!
//! `GET`/`HEAD` only. Request paths are percent-decoded, query strings are
//! dropped, directories serve their `index.html`, and anything resolving
//! outside the root is a 404. HTML responses carry the live-reload client.

mod path;
mod response;

use path::resolve_path;

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result, anyhow};
use tiny_http::{Method, Request, Server};

use crate::{debug, log};

/// Requests handled concurrently.
const REQUEST_THREADS: usize = 4;

/// Bind the HTTP server. No retry on failure.
///
/// Port 0 binds an ephemeral port; the returned address is the actual one.
pub fn bind(interface: IpAddr, port: u16) -> Result<(Arc<Server>, SocketAddr)> {
    let requested = SocketAddr::new(interface, port);
    let server = Server::http(requested).map_err(|e| anyhow!("failed to bind http://{requested}: {e}"))?;
    let addr = server
        .server_addr()
        .to_ip()
        .ok_or_else(|| anyhow!("server bound to a non-IP address"))?;
    Ok((Arc::new(server), addr))
}

/// Serve `root` on a background thread until the server is unblocked.
pub fn spawn(server: Arc<Server>, root: PathBuf, ws_port: u16) -> Result<JoinHandle<()>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(REQUEST_THREADS)
        .thread_name(|i| format!("kiln-http-{i}"))
        .build()
        .context("failed to create request thread pool")?;
    let root = Arc::new(root);

    thread::Builder::new()
        .name("kiln-http".to_owned())
        .spawn(move || {
            for request in server.incoming_requests() {
                if crate::core::is_shutdown() {
                    break;
                }
                let root = Arc::clone(&root);
                pool.spawn(move || {
                    if let Err(e) = handle_request(request, &root, ws_port) {
                        log!("serve"; "request error: {e:#}");
                    }
                });
            }
            debug!("serve"; "request loop stopped");
        })
        .context("failed to spawn HTTP thread")
}

fn handle_request(request: Request, root: &Path, ws_port: u16) -> Result<()> {
    if !matches!(request.method(), Method::Get | Method::Head) {
        return response::respond_method_not_allowed(request);
    }

    debug!("serve"; "{} {}", request.method(), request.url());
    match resolve_path(request.url(), root) {
        Some(path) => response::respond_file(request, &path, ws_port),
        None => response::respond_not_found(request),
    }
}
