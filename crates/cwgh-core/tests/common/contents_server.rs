//! Minimal HTTP/1.1 server speaking the GET/PUT subset of the contents API.
//!
//! Files are keyed by the percent-encoded path segment after `/contents/`.
//! PUT onto an existing file requires its current `sha`; a mismatch or a
//! missing `sha` answers 409. Requests without the expected bearer token get
//! 401. One request per connection.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub target: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub sha: String,
    /// Base64 as it was sent.
    pub content: String,
}

#[derive(Default)]
struct State {
    files: HashMap<String, StoredFile>,
    seen: Vec<SeenRequest>,
    revisions: u64,
}

pub struct ContentsServer {
    /// API base, e.g. "http://127.0.0.1:12345/".
    pub base: String,
    state: Arc<Mutex<State>>,
}

impl ContentsServer {
    pub fn file(&self, encoded_path: &str) -> Option<StoredFile> {
        self.state.lock().unwrap().files.get(encoded_path).cloned()
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.state.lock().unwrap().seen.clone()
    }
}

/// Starts a server in a background thread that accepts `token` only.
pub fn start(token: &str) -> ContentsServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let state = Arc::new(Mutex::new(State::default()));
    let auth = format!("Bearer {}", token);
    {
        let state = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&state);
                let auth = auth.clone();
                thread::spawn(move || handle(stream, &state, &auth));
            }
        });
    }
    ContentsServer {
        base: format!("http://127.0.0.1:{}/", port),
        state,
    }
}

struct Request {
    method: String,
    target: String,
    authorization: Option<String>,
    body: String,
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut data = Vec::new();
    let mut buf = [0u8; 8192];
    let header_end = loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(i) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break i + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).into_owned();
    let mut lines = head.lines();
    let mut first = lines.next()?.split_whitespace();
    let method = first.next()?.to_string();
    let target = first.next()?.to_string();
    let mut length = 0usize;
    let mut authorization = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            if name.eq_ignore_ascii_case("content-length") {
                length = value.trim().parse().unwrap_or(0);
            } else if name.eq_ignore_ascii_case("authorization") {
                authorization = Some(value.trim().to_string());
            }
        }
    }

    while data.len() < header_end + length {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }
    let end = (header_end + length).min(data.len());
    Some(Request {
        method,
        target,
        authorization,
        body: String::from_utf8_lossy(&data[header_end..end]).into_owned(),
    })
}

fn respond(stream: &mut TcpStream, status: &str, body: &serde_json::Value) {
    let body = body.to_string();
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}

fn handle(mut stream: TcpStream, state: &Mutex<State>, auth: &str) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let Some(req) = read_request(&mut stream) else {
        return;
    };

    let mut state = state.lock().unwrap();
    state.seen.push(SeenRequest {
        method: req.method.clone(),
        target: req.target.clone(),
        body: req.body.clone(),
    });

    if req.authorization.as_deref() != Some(auth) {
        respond(
            &mut stream,
            "401 Unauthorized",
            &serde_json::json!({"message": "Bad credentials"}),
        );
        return;
    }

    let path = req.target.split('?').next().unwrap_or("");
    let Some((_, key)) = path.split_once("/contents/") else {
        respond(&mut stream, "404 Not Found", &serde_json::json!({"message": "Not Found"}));
        return;
    };
    let key = key.to_string();

    match req.method.as_str() {
        "GET" => match state.files.get(&key) {
            Some(f) => {
                let body = serde_json::json!({"type": "file", "sha": f.sha, "content": f.content});
                respond(&mut stream, "200 OK", &body);
            }
            None => {
                let body = serde_json::json!({"message": "Not Found"});
                respond(&mut stream, "404 Not Found", &body);
            }
        },
        "PUT" => {
            let Ok(body) = serde_json::from_str::<serde_json::Value>(&req.body) else {
                let body = serde_json::json!({"message": "Problems parsing JSON"});
                respond(&mut stream, "400 Bad Request", &body);
                return;
            };
            let sent = body.get("sha").and_then(|s| s.as_str());
            let existing = state.files.get(&key).map(|f| f.sha.clone());
            match (existing.as_deref(), sent) {
                (Some(_), None) => {
                    respond(
                        &mut stream,
                        "409 Conflict",
                        &serde_json::json!({"message": "Invalid request.\n\n\"sha\" wasn't supplied."}),
                    );
                    return;
                }
                (Some(current), Some(s)) if current != s => {
                    respond(
                        &mut stream,
                        "409 Conflict",
                        &serde_json::json!({"message": format!("{} does not match {}", key, s)}),
                    );
                    return;
                }
                _ => {}
            }
            state.revisions += 1;
            let sha = format!("rev{}", state.revisions);
            state.files.insert(
                key,
                StoredFile {
                    sha: sha.clone(),
                    content: body["content"].as_str().unwrap_or("").to_string(),
                },
            );
            let status = if existing.is_some() { "200 OK" } else { "201 Created" };
            respond(&mut stream, status, &serde_json::json!({"content": {"sha": sha}}));
        }
        _ => respond(
            &mut stream,
            "405 Method Not Allowed",
            &serde_json::json!({"message": "Method Not Allowed"}),
        ),
    }
}
