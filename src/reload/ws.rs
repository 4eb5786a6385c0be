//! WebSocket endpoint: acceptor thread, reader thread, broadcast.

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::message::HotReloadMessage;
use crate::{debug, log};

/// Interval of the non-blocking read poll.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Connected browsers.
#[derive(Clone, Default)]
pub struct Clients(Arc<Mutex<Vec<WebSocket<TcpStream>>>>);

impl Clients {
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    /// Send `msg` to every client, dropping those that fail.
    pub fn broadcast(&self, msg: &HotReloadMessage) {
        let mut clients = self.0.lock();
        if clients.is_empty() {
            debug!("reload"; "no clients connected");
            return;
        }

        let text = Message::Text(msg.to_json().into());
        clients.retain_mut(|ws| match ws.send(text.clone()) {
            Ok(()) => true,
            Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => true,
            Err(e) => {
                debug!("reload"; "client disconnected: {}", e);
                false
            }
        });
        debug!("reload"; "broadcast to {} clients", clients.len());
    }

    fn add(&self, stream: TcpStream) {
        let mut ws = match tungstenite::accept(stream) {
            Ok(ws) => ws,
            Err(e) => {
                log!("reload"; "handshake failed: {}", e);
                return;
            }
        };
        if let Err(e) = ws.send(Message::Text(HotReloadMessage::connected().to_json().into())) {
            log!("reload"; "failed to send connected message: {}", e);
            return;
        }
        // Reads are polled from the reader thread
        let _ = ws.get_ref().set_nonblocking(true);

        let mut clients = self.0.lock();
        clients.push(ws);
        debug!("reload"; "client connected (total: {})", clients.len());
    }

    /// Drain incoming frames and prune clients that closed.
    fn poll(&self) {
        self.0.lock().retain_mut(|ws| loop {
            match ws.read() {
                Ok(Message::Close(_)) => break false,
                Ok(_) => continue,
                Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => break true,
                Err(_) => break false,
            }
        });
    }
}

/// Bind the WebSocket listener. Port 0 binds an ephemeral port.
pub fn bind(interface: IpAddr, port: u16) -> Result<(TcpListener, u16)> {
    let addr = SocketAddr::new(interface, port);
    let listener = TcpListener::bind(addr).with_context(|| format!("failed to bind ws://{addr}"))?;
    let port = listener.local_addr()?.port();
    Ok((listener, port))
}

/// Accept clients on `listener` and poll their frames, each on its own thread.
pub fn spawn(listener: TcpListener, clients: Clients) -> Result<()> {
    let acceptor = clients.clone();
    thread::Builder::new()
        .name("kiln-ws-accept".to_owned())
        .spawn(move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => acceptor.add(stream),
                    Err(e) => {
                        log!("reload"; "accept error: {}", e);
                        thread::sleep(POLL_INTERVAL);
                    }
                }
            }
        })
        .context("failed to spawn WebSocket acceptor")?;

    thread::Builder::new()
        .name("kiln-ws-read".to_owned())
        .spawn(move || loop {
            thread::sleep(POLL_INTERVAL);
            clients.poll();
        })
        .context("failed to spawn WebSocket reader")?;
    Ok(())
}
