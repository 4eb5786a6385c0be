use std::fs;
use std::io::{Read, Write};
use std::net::{Ipv4Addr, TcpListener, TcpStream};
use std::time::{Duration, Instant};

use super::*;

fn ephemeral() -> ServeConfig {
    ServeConfig {
        interface: Ipv4Addr::LOCALHOST.into(),
        port: 0,
        ws_port: 0,
    }
}

fn wait_for(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met within 5s");
        std::thread::sleep(Duration::from_millis(20));
    }
}

fn get(notifier: &ReloadNotifier, path: &str) -> String {
    let mut stream = TcpStream::connect(notifier.http_addr()).unwrap();
    write!(stream, "GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    response
}

#[test]
fn test_notify_without_clients_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let notifier = ReloadNotifier::start(dir.path(), &ephemeral()).unwrap();
    assert_ne!(notifier.http_addr().port(), 0);
    assert_ne!(notifier.ws_port(), 0);
    assert_eq!(notifier.client_count(), 0);
    notifier.notify("styles");
    assert_eq!(notifier.client_count(), 0);
    notifier.stop();
}

#[test]
fn test_reload_delivered_to_client() {
    let dir = tempfile::tempdir().unwrap();
    let notifier = ReloadNotifier::start(dir.path(), &ephemeral()).unwrap();

    let url = format!("ws://127.0.0.1:{}", notifier.ws_port());
    let (mut client, _) = tungstenite::connect(url.as_str()).unwrap();

    let first = client.read().unwrap();
    let connected = HotReloadMessage::from_json(first.to_text().unwrap()).unwrap();
    assert!(matches!(connected, HotReloadMessage::Connected { .. }));

    wait_for(|| notifier.client_count() == 1);
    notifier.notify("styles");

    let msg = client.read().unwrap();
    assert_eq!(
        HotReloadMessage::from_json(msg.to_text().unwrap()),
        Some(HotReloadMessage::reload_with_reason("styles"))
    );

    client.close(None).unwrap();
    // Flush the close frame, then wait for the reader thread to prune
    while client.read().is_ok() {}
    wait_for(|| notifier.client_count() == 0);
    notifier.stop();
}

#[test]
fn test_http_serves_html_with_client() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "<html><body><p>hi</p></body></html>").unwrap();
    fs::write(dir.path().join("data.json"), "{}").unwrap();
    let notifier = ReloadNotifier::start(dir.path(), &ephemeral()).unwrap();

    let page = get(&notifier, "/");
    assert!(page.starts_with("HTTP/1.1 200"));
    assert!(page.contains("<p>hi</p><script>"));
    assert!(page.contains(&format!("var port = {};", notifier.ws_port())));

    let json = get(&notifier, "/data.json?cache=1");
    assert!(json.starts_with("HTTP/1.1 200"));
    assert!(!json.contains("<script>"));

    assert!(get(&notifier, "/missing.html").starts_with("HTTP/1.1 404"));
    notifier.stop();
}

#[test]
fn test_bind_failure_is_error() {
    let taken = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let port = taken.local_addr().unwrap().port();
    let dir = tempfile::tempdir().unwrap();

    let config = ServeConfig {
        ws_port: port,
        ..ephemeral()
    };
    let err = ReloadNotifier::start(dir.path(), &config).err().unwrap();
    assert!(err.to_string().contains("failed to bind"));
}
