//! Error taxonomy for a save attempt.
//!
//! Validation errors never reach the network. Transport and remote errors come
//! out of the gateway; "absent" on a probe is not an error and never shows up
//! here.

use crate::gateway::{GatewayError, TransportKind};
use crate::readiness::ReadinessError;

/// Why a save attempt stopped. Every variant is terminal for that attempt.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("No solution code found in editor")]
    EmptySolution,

    #[error("no file extension known for language '{0}'")]
    UnmappedLanguage(String),

    #[error("repository settings were not completed")]
    ConfigurationCancelled,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Network error: {detail}")]
    Transport { kind: TransportKind, detail: String },

    #[error("GitHub API error: {status}{}", remote_suffix(.message))]
    Remote {
        status: u32,
        message: Option<String>,
    },

    /// A 2xx answer whose body was not what the contents API returns.
    #[error("Unexpected response from GitHub: {0}")]
    UnexpectedResponse(String),

    #[error("page not ready: {0}")]
    Readiness(#[from] ReadinessError),
}

fn remote_suffix(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(" - {}", m),
        None => String::new(),
    }
}

impl SaveError {
    /// True for errors raised before any network call was made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SaveError::EmptySolution
                | SaveError::UnmappedLanguage(_)
                | SaveError::ConfigurationCancelled
                | SaveError::InvalidConfiguration(_)
        )
    }
}

impl From<GatewayError> for SaveError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Transport(t) => SaveError::Transport {
                kind: t.kind,
                detail: t.detail,
            },
            GatewayError::Status { status, message } => SaveError::Remote { status, message },
            GatewayError::Decode(detail) => SaveError::UnexpectedResponse(detail),
            GatewayError::InvalidBase(detail) => SaveError::InvalidConfiguration(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::TransportError;

    #[test]
    fn remote_error_appends_message_when_present() {
        let e = SaveError::Remote {
            status: 409,
            message: Some("sha wasn't supplied".to_string()),
        };
        assert_eq!(e.to_string(), "GitHub API error: 409 - sha wasn't supplied");

        let bare = SaveError::Remote {
            status: 502,
            message: None,
        };
        assert_eq!(bare.to_string(), "GitHub API error: 502");
    }

    #[test]
    fn transport_error_is_reported_as_network_failure() {
        let e: SaveError = GatewayError::Transport(TransportError {
            kind: TransportKind::Timeout,
            detail: "timed out after 10s".to_string(),
        })
        .into();
        assert!(matches!(e, SaveError::Transport { kind: TransportKind::Timeout, .. }));
        assert_eq!(e.to_string(), "Network error: timed out after 10s");
        assert!(!e.is_validation());
    }

    #[test]
    fn decode_and_base_errors_are_not_network_errors() {
        let e: SaveError = GatewayError::Decode("expected a file entry".to_string()).into();
        assert!(matches!(e, SaveError::UnexpectedResponse(_)));
        assert_eq!(e.to_string(), "Unexpected response from GitHub: expected a file entry");

        let e: SaveError = GatewayError::InvalidBase("not a url".to_string()).into();
        assert!(matches!(e, SaveError::InvalidConfiguration(_)));
        assert!(e.is_validation());
    }

    #[test]
    fn validation_errors_are_local() {
        assert!(SaveError::EmptySolution.is_validation());
        assert!(SaveError::UnmappedLanguage("cobol".into()).is_validation());
        assert!(SaveError::ConfigurationCancelled.is_validation());
    }
}
