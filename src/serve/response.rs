//! HTTP response handlers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::embed::serve::hotreload_tag;
use crate::utils::mime::{self, types};

/// Respond with a static file, injecting the reload client into HTML.
pub fn respond_file(request: Request, path: &Path, ws_port: u16) -> Result<()> {
    let content_type = mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let body = if content_type == types::HTML {
        inject_hotreload(&body, ws_port)
    } else {
        body
    };
    send_body(request, 200, content_type, body)
}

pub fn respond_not_found(request: Request) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 404, types::PLAIN);
    }
    send_body(request, 404, types::PLAIN, b"404 Not Found".to_vec())
}

pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    let response = Response::from_data(b"405 Method Not Allowed".to_vec())
        .with_status_code(StatusCode(405))
        .with_header(header("Content-Type", types::PLAIN)?)
        .with_header(header("Allow", "GET, HEAD")?);
    request.respond(response)?;
    Ok(())
}

/// Insert the reload client before the last `</body>`, or append it.
pub fn inject_hotreload(content: &[u8], ws_port: u16) -> Vec<u8> {
    const PATTERN: &[u8] = b"</body>";

    let script = hotreload_tag(ws_port);
    let script_bytes = script.as_bytes();
    let mut result = Vec::with_capacity(content.len() + script_bytes.len());

    match content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
    {
        Some(pos) => {
            result.extend_from_slice(&content[..pos]);
            result.extend_from_slice(script_bytes);
            result.extend_from_slice(&content[pos..]);
        }
        None => {
            result.extend_from_slice(content);
            result.extend_from_slice(script_bytes);
        }
    }
    result
}

pub fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response = Response::empty(StatusCode(status)).with_header(header("Content-Type", content_type)?);
    request.respond(response)?;
    Ok(())
}

fn send_body(request: Request, status: u16, content_type: &'static str, body: Vec<u8>) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(header("Content-Type", content_type)?)
        .with_header(header("Cache-Control", "no-cache")?);
    request.respond(response)?;
    Ok(())
}

fn header(key: &'static str, value: &'static str) -> Result<Header> {
    Header::from_bytes(key, value).map_err(|()| anyhow!("invalid header {key}: {value}"))
}
