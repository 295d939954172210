//! Error taxonomy for block invocations
//!
//! Every failure a block can surface to the host platform is one of these
//! variants. Nothing is retried or recovered internally; the host owns any
//! retry policy.

use std::time::Duration;

/// Errors raised by credential resolution, URL templating, and request
/// execution.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Neither an access token nor a service account key was configured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The configured service account key is not a valid JSON key document.
    #[error("invalid service account key: {0}")]
    CredentialParse(String),

    /// The identity provider rejected or was unreachable during the token
    /// exchange.
    #[error("failed to acquire access token: {0}")]
    TokenAcquisition(String),

    /// A path template placeholder had no value in the invocation input or
    /// the ambient configuration.
    #[error("unresolved path parameter: {{{0}}}")]
    MissingPathParameter(String),

    /// The requested block key is not present in the endpoint registry.
    #[error("unknown block: {0}")]
    UnknownEndpoint(String),

    /// The cloud API returned a non-2xx status.
    #[error("API request failed: {status} {status_text}")]
    UpstreamApi { status: u16, status_text: String },

    /// The request exceeded the bounded execution duration.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The request failed before a status was received (DNS, TLS, connect).
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// A 2xx response carried a body that is not valid JSON.
    #[error("failed to parse response JSON: {0}")]
    ResponseDecode(#[source] serde_json::Error),
}

impl Error {
    /// Numeric status code for upstream failures, if this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::UpstreamApi { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_embeds_status_and_text() {
        let err = Error::UpstreamApi {
            status: 404,
            status_text: "Not Found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("Not Found"));
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_missing_parameter_names_placeholder() {
        let err = Error::MissingPathParameter("firewallPolicy".to_string());
        assert!(err.to_string().contains("{firewallPolicy}"));
        assert_eq!(err.status(), None);
    }
}
