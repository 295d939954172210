//! Block Invoker
//!
//! The one executor behind every block: resolve credentials, resolve the
//! URL, issue the request, emit the response event. Per-endpoint variation
//! lives entirely in the registry descriptors.

use super::registry::{get_endpoint, EndpointDef};
use crate::config::AppConfig;
use crate::error::Error;
use crate::event::{BlockEvent, EventSink};
use crate::gcp::auth::Credentials;
use crate::gcp::http::HttpExecutor;
use crate::gcp::template::{join_url, resolve_path};
use serde_json::Value;
use std::collections::HashSet;

/// Executes registered blocks against the configured GCP application.
///
/// Invocations are independent and stateless; a single `Invoker` may serve
/// concurrent invocations of any mix of endpoints. The only shared state is
/// the token cache inside [`Credentials`].
#[derive(Clone)]
pub struct Invoker {
    config: AppConfig,
    credentials: Credentials,
    http: HttpExecutor,
    events: Option<EventSink>,
}

impl Invoker {
    /// Create an invoker from application configuration.
    ///
    /// Credential problems (nothing configured, malformed key) surface here,
    /// before any invocation runs.
    pub fn new(config: AppConfig) -> Result<Self, Error> {
        let credentials = Credentials::from_config(&config)?;
        let http = HttpExecutor::new()?;

        Ok(Self {
            config,
            credentials,
            http,
            events: None,
        })
    }

    /// Attach a sink that receives one [`BlockEvent`] per successful
    /// invocation. Failed invocations emit nothing.
    pub fn with_event_sink(mut self, sink: EventSink) -> Self {
        self.events = Some(sink);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run one block invocation.
    ///
    /// `input` is the block's field map (a JSON object; `null` is treated as
    /// empty). Returns the parsed response payload, which is also delivered
    /// to the event sink when one is attached.
    pub async fn invoke(&self, key: &str, input: &Value) -> Result<Value, Error> {
        let endpoint =
            get_endpoint(key).ok_or_else(|| Error::UnknownEndpoint(key.to_string()))?;

        let input_map = match input {
            Value::Null => serde_json::Map::new(),
            Value::Object(map) => map.clone(),
            _ => {
                return Err(Error::Configuration(format!(
                    "invocation input for {} must be a JSON object",
                    key
                )))
            }
        };

        tracing::debug!("invoke: block={}, method={}", key, endpoint.http_method);

        let token = self.credentials.token(&endpoint.scopes).await?;

        let project = self.config.effective_project();
        let resolved = resolve_path(
            &endpoint.path,
            &input_map,
            project.as_deref(),
            self.config.location.as_deref(),
        )?;

        let base_url = self.config.base_url_for(&endpoint.service, &endpoint.base_url);
        let mut url = join_url(base_url, &resolved.path);

        let (query, body) = partition_fields(endpoint, &input_map, &resolved.consumed);
        url = append_query(&url, &query);

        let body = (endpoint.is_write() && !body.is_empty()).then(|| Value::Object(body));

        let payload = self
            .http
            .execute(endpoint.method(), &url, &token, body.as_ref())
            .await?;

        tracing::info!("invoke: block={} succeeded", key);

        if let Some(sink) = &self.events {
            if sink.send(BlockEvent::new(key, payload.clone())).is_err() {
                tracing::warn!("event sink closed, dropping event for {}", key);
            }
        }

        Ok(payload)
    }
}

/// Split the input fields left over after path resolution into query
/// parameters and body fields.
///
/// Reads (GET/DELETE) never carry a body, so everything becomes query
/// parameters. Writes put fields in the JSON body except those the
/// descriptor pins to the query string (create-call ids, updateMask).
/// Null fields are omitted entirely.
fn partition_fields(
    endpoint: &EndpointDef,
    input: &serde_json::Map<String, Value>,
    consumed: &HashSet<String>,
) -> (Vec<(String, String)>, serde_json::Map<String, Value>) {
    let query_names = endpoint.query_field_names();
    let mut query: Vec<(String, String)> = Vec::new();
    let mut body = serde_json::Map::new();

    for (name, value) in input {
        if consumed.contains(name) || value.is_null() {
            continue;
        }

        let to_query = !endpoint.is_write() || query_names.contains(&name.as_str());
        if to_query {
            push_query_pairs(&mut query, name, value);
        } else {
            body.insert(name.clone(), value.clone());
        }
    }

    (query, body)
}

/// Render one field as query pairs. Arrays repeat the key per item;
/// non-scalar values have no query representation and are skipped.
fn push_query_pairs(query: &mut Vec<(String, String)>, name: &str, value: &Value) {
    match value {
        Value::String(s) => query.push((name.to_string(), s.clone())),
        Value::Number(n) => query.push((name.to_string(), n.to_string())),
        Value::Bool(b) => query.push((name.to_string(), b.to_string())),
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::String(s) => query.push((name.to_string(), s.clone())),
                    Value::Number(n) => query.push((name.to_string(), n.to_string())),
                    Value::Bool(b) => query.push((name.to_string(), b.to_string())),
                    _ => {},
                }
            }
        },
        _ => {},
    }
}

/// Append encoded query parameters to a URL
fn append_query(url: &str, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return url.to_string();
    }

    let parts: Vec<String> = query
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect();

    if url.contains('?') {
        format!("{}&{}", url, parts.join("&"))
    } else {
        format!("{}?{}", url, parts.join("&"))
    }
}
