//! HTTP execution for GCP REST API calls
//!
//! One request per invocation: bearer header, optional JSON body, bounded
//! duration. Non-2xx statuses fail fast without parsing the error payload;
//! 2xx bodies normalize to a JSON object.

use crate::error::Error;
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;

/// Bound on a single request; exceeding it surfaces as `Error::Timeout`
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and masks potentially sensitive patterns
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        format!("{}... [truncated, {} bytes total]", &body[..MAX_LOG_BODY_LENGTH], body.len())
    } else {
        body.to_string()
    };

    truncated
        .replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

fn map_send_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(REQUEST_TIMEOUT)
    } else {
        Error::Transport(e)
    }
}

/// HTTP client wrapper for GCP API calls
#[derive(Clone)]
pub struct HttpExecutor {
    client: Client,
}

impl HttpExecutor {
    /// Create a new HTTP client
    pub fn new() -> Result<Self, Error> {
        let client = Client::builder()
            .user_agent(concat!("gcpflow/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(Error::Transport)?;

        Ok(Self { client })
    }

    /// Execute one request and normalize the response.
    ///
    /// The body, when given, is serialized as JSON. A non-2xx status fails
    /// with the numeric code and status text; the error payload is logged
    /// sanitized but never parsed. A 2xx response parses as JSON, with an
    /// empty or null body normalized to `{}` so callers always receive an
    /// object.
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<Value, Error> {
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method, url).bearer_auth(token);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(map_send_error)?;

        let status = response.status();
        let response_body = response.text().await.map_err(map_send_error)?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&response_body));
            return Err(Error::UpstreamApi {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        // Handle empty response: callers always receive an object
        if response_body.is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        let parsed: Value =
            serde_json::from_str(&response_body).map_err(Error::ResponseDecode)?;

        if parsed.is_null() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        Ok(parsed)
    }
}

impl Default for HttpExecutor {
    fn default() -> Self {
        Self::new().expect("Failed to create default HTTP client")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("truncated"));
        assert!(sanitized.contains("500 bytes"));
    }

    #[test]
    fn test_sanitize_strips_control_characters() {
        let sanitized = sanitize_for_log("ab\u{7}cd\n");
        assert_eq!(sanitized, "abcd");
    }
}
