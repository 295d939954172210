//! GCP Authentication
//!
//! Resolves the configured credential (literal access token or service
//! account key) into a bearer token for one invocation. Service account keys
//! go through gcp_auth's signed-JWT OAuth2 exchange; literal tokens are
//! returned unchanged and never validated or refreshed.

use crate::config::AppConfig;
use crate::error::Error;
use futures::future::BoxFuture;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Token expiry buffer - refresh tokens this much before they actually expire
/// This prevents using tokens that are about to expire during a request
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL if we can't determine expiry (conservative: 30 minutes)
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// A source of bearer tokens for a given scope list.
///
/// Object-safe so the resolver can hold either credential shape (and tests a
/// counting fake) behind one `Arc`.
pub trait TokenSource: Send + Sync {
    fn fetch<'a>(&'a self, scopes: &'a [String]) -> BoxFuture<'a, Result<String, Error>>;
}

/// Pre-generated bearer token. The caller owns freshness; no network calls.
struct StaticToken(String);

impl TokenSource for StaticToken {
    fn fetch<'a>(&'a self, _scopes: &'a [String]) -> BoxFuture<'a, Result<String, Error>> {
        Box::pin(async move { Ok(self.0.clone()) })
    }
}

/// Service account key backed source: one token-exchange call per fetch,
/// scoped exactly to the requested scope list.
struct ServiceAccountSource {
    account: CustomServiceAccount,
}

impl TokenSource for ServiceAccountSource {
    fn fetch<'a>(&'a self, scopes: &'a [String]) -> BoxFuture<'a, Result<String, Error>> {
        Box::pin(async move {
            let scope_refs: Vec<&str> = scopes.iter().map(String::as_str).collect();
            let token = self
                .account
                .token(&scope_refs)
                .await
                .map_err(|e| Error::TokenAcquisition(e.to_string()))?;
            Ok(token.as_str().to_string())
        })
    }
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    /// Check if this cached token is still valid
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Credential resolver with a per-scope-set token cache.
///
/// Endpoints declare distinct scope lists (read endpoints add `.readonly`),
/// so the cache is keyed by the joined scope list rather than a single slot.
/// Concurrent invocations share the cache behind an RwLock; an expired entry
/// is never returned.
#[derive(Clone)]
pub struct Credentials {
    source: Arc<dyn TokenSource>,
    token_cache: Arc<RwLock<HashMap<String, CachedToken>>>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

impl Credentials {
    /// Resolve the configured credential into a token source.
    ///
    /// Fails with `Configuration` when neither an access token nor a service
    /// account key is present, and with `CredentialParse` when the key is not
    /// a valid JSON key document. Key parsing performs no network calls.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        if let Some(token) = config.effective_access_token() {
            return Ok(Self::from_source(Arc::new(StaticToken(token))));
        }

        if let Some(key) = config.effective_service_account_key() {
            let account = CustomServiceAccount::from_json(&key)
                .map_err(|e| Error::CredentialParse(e.to_string()))?;
            return Ok(Self::from_source(Arc::new(ServiceAccountSource { account })));
        }

        Err(Error::Configuration(
            "no accessToken or serviceAccountKey configured".to_string(),
        ))
    }

    /// Build a resolver over an explicit token source.
    pub fn from_source(source: Arc<dyn TokenSource>) -> Self {
        Self {
            source,
            token_cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get an access token for the given scope list
    /// Security: Checks token expiry before returning cached token
    pub async fn token(&self, scopes: &[String]) -> Result<String, Error> {
        let cache_key = scopes.join(" ");

        // Check cache first - but only return if token is still valid
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.get(&cache_key) {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                // Token expired or about to expire, will fetch new one
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        // Fetch new token
        let token = self.source.fetch(scopes).await?;

        // Calculate expiry time with buffer; gcp_auth does not expose the
        // upstream expires_in here, so use a conservative default TTL
        let expires_at = Instant::now() + DEFAULT_TOKEN_TTL - TOKEN_EXPIRY_BUFFER;

        {
            let mut cache = self.token_cache.write().await;
            cache.insert(
                cache_key,
                CachedToken {
                    token: token.clone(),
                    expires_at,
                },
            );
        }

        tracing::debug!(
            "New token cached, expires in ~{} minutes",
            (DEFAULT_TOKEN_TTL - TOKEN_EXPIRY_BUFFER).as_secs() / 60
        );

        Ok(token)
    }

    /// Drop all cached tokens so the next call fetches fresh ones
    pub async fn invalidate(&self) {
        let mut cache = self.token_cache.write().await;
        cache.clear();
    }
}
