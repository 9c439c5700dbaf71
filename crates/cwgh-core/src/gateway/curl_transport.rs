//! libcurl-backed transport.

use super::transport::{HttpRequest, HttpResponse, Method, Transport, TransportError, TransportKind};
use std::time::Duration;

/// Sends requests with a fresh `curl::easy::Easy` handle per call.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    connect_timeout: Duration,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl CurlTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn perform(&self, request: &HttpRequest) -> Result<HttpResponse, curl::Error> {
        let mut body = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(&request.url)?;
        easy.follow_location(true)?;
        easy.max_redirections(5)?;
        easy.connect_timeout(self.connect_timeout.min(request.timeout))?;
        easy.timeout(request.timeout)?;

        match request.method {
            Method::Get => easy.get(true)?,
            Method::Put => {
                easy.custom_request("PUT")?;
                easy.post_fields_copy(request.body.as_deref().unwrap_or("").as_bytes())?;
            }
        }

        let mut list = curl::easy::List::new();
        for (k, v) in &request.headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        // Bodies go out in one shot; no 100-continue round trip.
        list.append("Expect:")?;
        easy.http_headers(list)?;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        Ok(HttpResponse {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

impl Transport for CurlTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.perform(request)
            .map_err(|e| TransportError::new(classify_curl_error(&e), e.to_string()))
    }
}

/// Classify a curl error into a transport failure kind.
pub fn classify_curl_error(e: &curl::Error) -> TransportKind {
    if e.is_operation_timedout() {
        return TransportKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_ssl_connect_error()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return TransportKind::Connection;
    }
    TransportKind::Other
}
