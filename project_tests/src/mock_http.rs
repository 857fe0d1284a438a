//! # Mock HTTP Server
//!
//! A blocking, thread-backed HTTP/1.1 server on a random local port. Every
//! connection serves exactly one request and is closed afterwards, so the
//! client under test opens a fresh connection per request.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// What the server answers.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body (omitted for `HEAD`).
    pub body: String,
    /// Delay before answering.
    pub delay: Duration,
}

impl MockResponse {
    /// `200 OK` with a JSON body.
    pub fn json(body: impl Into<String>) -> Self {
        Self { status: 200, body: body.into(), delay: Duration::ZERO }
    }

    /// Any status with a text body.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into(), delay: Duration::ZERO }
    }

    /// Answers after `delay`.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A recorded request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    /// HTTP method.
    pub method: String,
    /// Request target, e.g. `/api/arrivals/6300`.
    pub path: String,
    /// Lowercased header block.
    pub headers: String,
}

/// # Mock Server
///
/// Stops when dropped.
pub struct MockServer {
    addr: SocketAddr,
    stop: Arc<AtomicBool>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    handle: Option<JoinHandle<()>>,
}

impl MockServer {
    /// Starts the server; `handler` maps `(method, path)` to a response.
    pub fn start<H>(handler: H) -> Self
    where
        H: Fn(&str, &str) -> MockResponse + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to random port");
        let addr = listener.local_addr().expect("local addr");
        let stop = Arc::new(AtomicBool::new(false));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let thread_stop = Arc::clone(&stop);
        let thread_seen = Arc::clone(&seen);
        let handle = thread::spawn(move || {
            for stream in listener.incoming() {
                if thread_stop.load(Ordering::SeqCst) {
                    break;
                }
                let Ok(mut stream) = stream else { continue };
                let Some(request) = read_request(&mut stream) else { continue };
                thread_seen.lock().unwrap().push(request.clone());

                let response = handler(&request.method, &request.path);
                thread::sleep(response.delay);
                let body = if request.method == "HEAD" { "" } else { response.body.as_str() };
                let head = format!(
                    "HTTP/1.1 {} Mock\r\nContent-Length: {}\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n",
                    response.status,
                    body.len()
                );
                // The client may have given up already.
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(body.as_bytes());
                let _ = stream.flush();
            }
        });

        Self { addr, stop, seen, handle: Some(handle) }
    }

    /// `http://127.0.0.1:{port}/api/`
    pub fn api_base(&self) -> String {
        format!("http://{}/api/", self.addr)
    }

    /// `http://127.0.0.1:{port}{path}`
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Requests received so far.
    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        // Wake the blocking accept.
        let _ = TcpStream::connect(self.addr);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn read_request(stream: &mut TcpStream) -> Option<SeenRequest> {
    stream.set_read_timeout(Some(Duration::from_secs(5))).ok()?;
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        raw.extend_from_slice(&buf[..n]);
    }

    let text = String::from_utf8_lossy(&raw).to_string();
    let (line, headers) = text.split_once("\r\n").unwrap_or((&text, ""));
    let mut parts = line.split_whitespace();
    Some(SeenRequest {
        method: parts.next()?.to_string(),
        path: parts.next()?.to_string(),
        headers: headers.to_ascii_lowercase(),
    })
}
