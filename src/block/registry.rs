//! Endpoint Registry - Load block definitions from JSON
//!
//! This module loads all endpoint descriptors from embedded JSON catalogs
//! and provides lookup functions for the invoker and the CLI. The registry
//! is a pure lookup table; nothing mutates it at runtime.

use crate::gcp::template::validate_template;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;
use url::Url;

/// Embedded catalog JSON files (compiled into the binary)
const CATALOG_FILES: &[&str] = &[
    include_str!("../catalog/compute.json"),
    include_str!("../catalog/gke.json"),
    include_str!("../catalog/run.json"),
    include_str!("../catalog/cloudbuild.json"),
];

/// Input field declaration from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: Option<String>,
    /// Force this field into the query string even on write methods
    /// (e.g. `connectionId` on a create call)
    #[serde(default)]
    pub query: bool,
}

/// Endpoint descriptor from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointDef {
    pub display_name: String,
    pub service: String,
    pub http_method: String,
    pub base_url: String,
    pub path: String,
    /// OAuth scopes this exact operation needs. Preserved per endpoint:
    /// requesting excess scopes is a security anti-pattern, requesting too
    /// few fails authorization upstream.
    pub scopes: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    /// Advisory output shape; never validated against at runtime
    #[serde(default)]
    pub output: Value,
}

impl EndpointDef {
    /// Parsed HTTP method. Validated at registry load, so this cannot fail
    /// for a registered endpoint.
    pub fn method(&self) -> Method {
        Method::from_bytes(self.http_method.as_bytes()).expect("validated at registry load")
    }

    /// Whether this operation carries a JSON request body. Idempotent reads
    /// (GET/DELETE) never do; their leftover fields become query parameters.
    pub fn is_write(&self) -> bool {
        let method = self.method();
        method == Method::POST || method == Method::PATCH || method == Method::PUT
    }

    /// Names of fields forced into the query string
    pub fn query_field_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.query)
            .map(|f| f.name.as_str())
            .collect()
    }
}

/// Root structure of catalog/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub endpoints: HashMap<String, EndpointDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<CatalogConfig> = OnceLock::new();

/// Get the endpoint registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static CatalogConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = CatalogConfig {
            endpoints: HashMap::new(),
        };

        for content in CATALOG_FILES {
            let partial: CatalogConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded catalog JSON: {}", e));
            final_config.endpoints.extend(partial.endpoints);
        }

        for (key, endpoint) in &final_config.endpoints {
            validate_endpoint(key, endpoint);
        }

        final_config
    })
}

/// Reject malformed embedded catalog entries at load rather than at the
/// first invocation that happens to hit them.
fn validate_endpoint(key: &str, endpoint: &EndpointDef) {
    if Method::from_bytes(endpoint.http_method.as_bytes()).is_err() {
        panic!("Invalid HTTP method '{}' for {}", endpoint.http_method, key);
    }
    if let Err(e) = Url::parse(&endpoint.base_url) {
        panic!("Invalid base URL for {}: {}", key, e);
    }
    if let Err(e) = validate_template(&endpoint.path) {
        panic!("Invalid path template for {}: {}", key, e);
    }
    if endpoint.scopes.is_empty() {
        panic!("No scopes declared for {}", key);
    }
}

/// Get an endpoint descriptor by key
pub fn get_endpoint(key: &str) -> Option<&'static EndpointDef> {
    get_registry().endpoints.get(key)
}

/// Get all endpoint keys, sorted for stable listings
pub fn get_all_endpoint_keys() -> Vec<&'static str> {
    let mut keys: Vec<&str> = get_registry().endpoints.keys().map(|s| s.as_str()).collect();
    keys.sort_unstable();
    keys
}

/// Get all endpoint keys for one service, sorted
pub fn get_service_endpoint_keys(service: &str) -> Vec<&'static str> {
    let mut keys: Vec<&str> = get_registry()
        .endpoints
        .iter()
        .filter(|(_, e)| e.service == service)
        .map(|(k, _)| k.as_str())
        .collect();
    keys.sort_unstable();
    keys
}
