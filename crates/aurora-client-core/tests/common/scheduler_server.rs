//! Minimal HTTP/1.1 scheduler for integration tests.
//!
//! Accepts Thrift JSON calls POSTed to any path and answers them from a
//! script of replies (then `OK`). Every request is recorded so tests can
//! inspect headers and decoded calls. One request per connection.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use aurora_client_core::rpc::{decode_call, encode_reply};
use aurora_client_core::Response;
use serde_json::Value;

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum Reply {
    Response(Response),
    /// Bare HTTP status with an empty body, e.g. 401.
    Status(u16),
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    /// RPC name and arguments decoded from the body.
    pub call: Option<(String, Vec<Value>)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn rpc(&self) -> Option<&str> {
        self.call.as_ref().map(|(name, _)| name.as_str())
    }
}

#[derive(Default)]
struct State {
    script: VecDeque<Reply>,
    requests: Vec<RecordedRequest>,
}

pub struct SchedulerServer {
    /// Base URL, e.g. "http://127.0.0.1:12345".
    pub url: String,
    pub port: u16,
    state: Arc<Mutex<State>>,
}

impl SchedulerServer {
    /// Starts a server in a background thread. The server runs until the process exits.
    pub fn start(script: Vec<Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(Mutex::new(State {
            script: script.into(),
            requests: Vec::new(),
        }));
        let shared = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&shared);
                thread::spawn(move || handle(stream, &state));
            }
        });
        Self {
            url: format!("http://127.0.0.1:{}", port),
            port,
            state,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }
}

fn handle(mut stream: TcpStream, state: &Mutex<State>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));

    // Connect-only probes close without sending anything.
    let Some((head, body)) = read_request(&mut stream) else {
        return;
    };
    let mut lines = head.lines();
    let mut request_line = lines.next().unwrap_or("").split_whitespace();
    let method = request_line.next().unwrap_or("").to_string();
    let path = request_line.next().unwrap_or("").to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    let decoded = decode_call(&body).ok();

    let reply = {
        let mut state = state.lock().unwrap();
        state.requests.push(RecordedRequest {
            method,
            path,
            headers,
            call: decoded.clone().map(|(name, _, args)| (name, args)),
        });
        state
            .script
            .pop_front()
            .unwrap_or_else(|| Reply::Response(Response::ok()))
    };

    let (status, payload) = match (reply, decoded) {
        (Reply::Status(code), _) => (code, Vec::new()),
        (Reply::Response(resp), Some((name, seqid, _))) => (200, encode_reply(&name, seqid, &resp)),
        (Reply::Response(_), None) => (400, Vec::new()),
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/x-thrift\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason(status),
        payload.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(&payload);
}

/// Reads the request head and a `Content-Length` body.
fn read_request(stream: &mut TcpStream) -> Option<(String, Vec<u8>)> {
    let mut data = Vec::new();
    let mut buf = [0u8; 8192];
    let head_end = loop {
        if let Some(pos) = find(&data, b"\r\n\r\n") {
            break pos;
        }
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return None,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
    };
    let head = String::from_utf8_lossy(&data[..head_end]).into_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = data[head_end + 4..].to_vec();
    while body.len() < content_length {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => body.extend_from_slice(&buf[..n]),
        }
    }
    body.truncate(content_length);
    Some((head, body))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
