//! HTTP gateway: the single seam every remote operation passes through.
//!
//! Maps a logical (verb, path, body) request onto the [`Transport`] primitive,
//! attaches the bearer credential and a fixed time bound, and normalizes the
//! outcome into a parsed success payload or a classified [`GatewayError`].
//! One failed attempt is one failed call: nothing here retries.

mod classify;
mod curl_transport;
mod transport;

pub use classify::{classify_status, error_message, StatusClass, STATUS_NOT_FOUND};
pub use curl_transport::{classify_curl_error, CurlTransport};
pub use transport::{HttpRequest, HttpResponse, Method, Transport, TransportError, TransportKind};

use std::sync::Arc;
use std::time::Duration;

/// Slack on top of the transport's own bound before the gateway gives up waiting.
const GUARD_GRACE: Duration = Duration::from_secs(2);

/// Classified failure of one gateway call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// No response at all.
    #[error("Network error: {0}")]
    Transport(TransportError),
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}")]
    Status {
        status: u32,
        message: Option<String>,
    },
    /// 2xx, but the payload was not the expected JSON.
    #[error("bad payload: {0}")]
    Decode(String),
    /// The API base cannot form request URLs. Raised before anything is sent.
    #[error("invalid API base: {0}")]
    InvalidBase(String),
}

impl GatewayError {
    /// True for the "resource absent" signal (404), decided on the status alone.
    pub fn is_absent(&self) -> bool {
        matches!(
            self,
            GatewayError::Status { status, .. } if classify_status(*status) == StatusClass::NotFound
        )
    }
}

/// Connection parameters threaded in explicitly by the caller.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_base: String,
    pub token: String,
    pub timeout: Duration,
}

/// Builds requests against the API base and runs them on a [`Transport`].
#[derive(Clone)]
pub struct HttpGateway {
    transport: Arc<dyn Transport>,
    config: GatewayConfig,
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("api_base", &self.config.api_base)
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

impl HttpGateway {
    pub fn new(transport: Arc<dyn Transport>, config: GatewayConfig) -> Self {
        Self { transport, config }
    }

    /// Absolute URL for `segments` under the API base. Each segment is
    /// percent-encoded on its own, so a `/` inside a segment becomes `%2F`.
    pub fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<String, GatewayError> {
        let mut url = url::Url::parse(&self.config.api_base)
            .map_err(|e| GatewayError::InvalidBase(format!("{}: {}", self.config.api_base, e)))?;
        url.path_segments_mut()
            .map_err(|_| {
                GatewayError::InvalidBase(format!("{} cannot hold a path", self.config.api_base))
            })?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url.into())
    }

    fn build(&self, method: Method, url: &str, body: Option<&serde_json::Value>) -> HttpRequest {
        let mut headers = vec![
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.config.token),
            ),
            (
                "Accept".to_string(),
                "application/vnd.github+json".to_string(),
            ),
            (
                "User-Agent".to_string(),
                concat!("cwgh/", env!("CARGO_PKG_VERSION")).to_string(),
            ),
        ];
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        HttpRequest {
            method,
            url: url.to_string(),
            headers,
            body: body.map(|b| b.to_string()),
            timeout: self.config.timeout,
        }
    }

    /// Issue one request. Returns the parsed JSON payload on 2xx.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, GatewayError> {
        let request = self.build(method, url, body);
        let bound = request.timeout + GUARD_GRACE;
        let transport = Arc::clone(&self.transport);

        tracing::debug!(%method, url, "gateway request");
        let handle = tokio::task::spawn_blocking(move || transport.send(&request));
        let response = match tokio::time::timeout(bound, handle).await {
            Err(_) => {
                return Err(GatewayError::Transport(TransportError::new(
                    TransportKind::Timeout,
                    format!("no response within {:?}", bound),
                )))
            }
            Ok(Err(join)) => {
                return Err(GatewayError::Transport(TransportError::new(
                    TransportKind::Other,
                    format!("transport task failed: {}", join),
                )))
            }
            Ok(Ok(result)) => result.map_err(GatewayError::Transport)?,
        };

        interpret(response)
    }
}

/// Turn a raw response into the parsed payload or a classified failure.
fn interpret(response: HttpResponse) -> Result<serde_json::Value, GatewayError> {
    if response.is_success() {
        if response.body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        return serde_json::from_str(&response.body)
            .map_err(|e| GatewayError::Decode(e.to_string()));
    }
    Err(GatewayError::Status {
        status: response.status,
        message: error_message(&response.body),
    })
}
