// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Security
//!
//! - JWKS is fetched from the configured identity provider only
//! - Keys are cached with a configurable TTL (zero disables caching)
//! - An unknown `kid` triggers one refetch so key rotation is picked up
//!   without waiting for the TTL, rate limited by a cooldown
//! - Only one fetch is in flight at a time; concurrent requests share it
//! - A stale cached key is used when a refresh fails and the key is known
//! - A key set listing the same `kid` twice is rejected as a whole

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, PublicKeyUse};
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use super::AuthError;

/// Default JWKS cache TTL (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default minimum age of the cached set before an unknown `kid` forces a refetch.
pub const DEFAULT_REFETCH_COOLDOWN: Duration = Duration::from_secs(10);

/// Default HTTP timeout for the JWKS endpoint.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Base delay between fetch retries; multiplied by the attempt number.
const RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// Errors while obtaining a signing key set.
#[derive(Debug, Error)]
pub enum KeySetError {
    /// Connection, TLS or timeout failure.
    #[error("JWKS request failed: {0}")]
    Transport(String),

    /// Non-success HTTP status from the JWKS endpoint.
    #[error("HTTP {0} from JWKS endpoint")]
    Status(u16),

    /// The body is not a JWKS document.
    #[error("invalid JWKS document: {0}")]
    InvalidDocument(String),

    /// Two keys share a key id.
    #[error("duplicate key id {0:?} in JWKS")]
    DuplicateKeyId(String),
}

impl KeySetError {
    /// Transient failures are worth retrying; a bad document is not.
    pub fn is_transient(&self) -> bool {
        match self {
            KeySetError::Transport(_) => true,
            KeySetError::Status(status) => *status >= 500 || *status == 429,
            KeySetError::InvalidDocument(_) | KeySetError::DuplicateKeyId(_) => false,
        }
    }
}

/// RSA public key descriptor usable for signature verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKey {
    pub kty: String,
    pub kid: String,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Base64url modulus
    pub n: String,
    /// Base64url exponent
    pub e: String,
}

impl SigningKey {
    /// Build the verification key from the RSA components.
    pub fn decoding_key(&self) -> Result<DecodingKey, AuthError> {
        DecodingKey::from_rsa_components(&self.n, &self.e)
            .map_err(|e| AuthError::InvalidKey(format!("kid {}: {e}", self.kid)))
    }
}

/// Signing keys indexed by key id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningKeySet {
    keys: HashMap<String, SigningKey>,
}

impl SigningKeySet {
    /// Parse a JWKS JSON document.
    pub fn from_json(bytes: &[u8]) -> Result<Self, KeySetError> {
        let jwks: JwkSet = serde_json::from_slice(bytes)
            .map_err(|e| KeySetError::InvalidDocument(e.to_string()))?;
        Self::from_jwk_set(jwks)
    }

    /// Keep the RSA signing keys of `jwks`.
    pub fn from_jwk_set(jwks: JwkSet) -> Result<Self, KeySetError> {
        let mut keys = HashMap::with_capacity(jwks.keys.len());

        for jwk in jwks.keys {
            let Some(key) = signing_key_from_jwk(jwk) else {
                continue;
            };
            if keys.contains_key(&key.kid) {
                return Err(KeySetError::DuplicateKeyId(key.kid));
            }
            keys.insert(key.kid.clone(), key);
        }

        Ok(Self { keys })
    }

    /// Build a set from already-parsed keys, rejecting duplicate ids.
    pub fn from_keys(keys: impl IntoIterator<Item = SigningKey>) -> Result<Self, KeySetError> {
        let mut set = HashMap::new();
        for key in keys {
            if set.contains_key(&key.kid) {
                return Err(KeySetError::DuplicateKeyId(key.kid));
            }
            set.insert(key.kid.clone(), key);
        }
        Ok(Self { keys: set })
    }

    pub fn get(&self, kid: &str) -> Option<&SigningKey> {
        self.keys.get(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Convert a JWK to a [`SigningKey`], or `None` when it cannot verify RS* signatures.
fn signing_key_from_jwk(jwk: Jwk) -> Option<SigningKey> {
    let AlgorithmParameters::RSA(rsa) = jwk.algorithm else {
        debug!(kid = ?jwk.common.key_id, "skipping non-RSA key");
        return None;
    };

    let key_use = match jwk.common.public_key_use {
        None => None,
        Some(PublicKeyUse::Signature) => Some("sig".to_string()),
        Some(other) => {
            debug!(kid = ?jwk.common.key_id, key_use = ?other, "skipping non-signing key");
            return None;
        }
    };

    let Some(kid) = jwk.common.key_id else {
        debug!("skipping RSA key without kid");
        return None;
    };

    Some(SigningKey {
        kty: "RSA".to_string(),
        kid,
        key_use,
        alg: jwk.common.key_algorithm.map(|alg| format!("{alg:?}")),
        n: rsa.n,
        e: rsa.e,
    })
}

/// Where signing key sets come from.
#[async_trait]
pub trait KeySetSource: Send + Sync {
    async fn fetch(&self) -> Result<SigningKeySet, KeySetError>;
}

/// Fetches the key set from an HTTPS JWKS endpoint.
pub struct HttpKeySetSource {
    url: String,
    client: reqwest::Client,
    retries: u32,
}

impl HttpKeySetSource {
    /// Create a source for `url` with a request timeout and a number of
    /// extra attempts on transient failures.
    pub fn new(url: impl Into<String>, timeout: Duration, retries: u32) -> Result<Self, KeySetError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KeySetError::Transport(e.to_string()))?;

        Ok(Self {
            url: url.into(),
            client,
            retries,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_once(&self) -> Result<SigningKeySet, KeySetError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| KeySetError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KeySetError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| KeySetError::Transport(e.to_string()))?;

        SigningKeySet::from_json(&body)
    }
}

#[async_trait]
impl KeySetSource for HttpKeySetSource {
    async fn fetch(&self) -> Result<SigningKeySet, KeySetError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once().await {
                Ok(keys) => return Ok(keys),
                Err(e) if e.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    warn!(url = %self.url, attempt, error = %e, "JWKS fetch failed, retrying");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// JWKS cache entry.
struct CacheEntry {
    keys: Arc<SigningKeySet>,
    fetched_at: Instant,
}

/// Outcome of the most recent fetch, kept for requests that waited on it.
struct RefreshAttempt {
    finished_at: Instant,
    error: Option<AuthError>,
}

/// JWKS manager with caching.
///
/// Hands out signing keys by `kid`, refreshing from the [`KeySetSource`] when
/// the cached set is older than the TTL or does not know the requested key.
/// At most one fetch runs at a time; requests that queued behind it reuse
/// its outcome instead of fetching again.
pub struct JwksCache {
    source: Arc<dyn KeySetSource>,
    /// Cache TTL
    cache_ttl: Duration,
    /// Minimum age before an unknown kid triggers a refetch
    refetch_cooldown: Duration,
    /// Cached key set
    cache: RwLock<Option<CacheEntry>>,
    /// Held for the duration of a fetch
    refresh_gate: Mutex<Option<RefreshAttempt>>,
}

impl JwksCache {
    pub fn new(source: Arc<dyn KeySetSource>) -> Self {
        Self {
            source,
            cache_ttl: DEFAULT_CACHE_TTL,
            refetch_cooldown: DEFAULT_REFETCH_COOLDOWN,
            cache: RwLock::new(None),
            refresh_gate: Mutex::new(None),
        }
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Create with custom unknown-kid refetch cooldown.
    pub fn with_refetch_cooldown(mut self, cooldown: Duration) -> Self {
        self.refetch_cooldown = cooldown;
        self
    }

    async fn snapshot(&self) -> Option<(Arc<SigningKeySet>, Instant)> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .map(|entry| (entry.keys.clone(), entry.fetched_at))
    }

    /// Look up the signing key for `kid`.
    pub async fn signing_key(&self, kid: &str) -> Result<SigningKey, AuthError> {
        let requested_at = Instant::now();
        let cached = self.snapshot().await;

        if let Some((keys, fetched_at)) = &cached {
            let age = fetched_at.elapsed();
            if age < self.cache_ttl {
                if let Some(key) = keys.get(kid) {
                    return Ok(key.clone());
                }
                if age < self.refetch_cooldown {
                    return Err(AuthError::NoMatchingKey(kid.to_string()));
                }
                debug!(kid, "unknown kid, refetching signing keys");
            }
        }

        let mut last_attempt = self.refresh_gate.lock().await;

        // A fetch that finished while this request waited answers for it too.
        if let Some((keys, fetched_at)) = self.snapshot().await {
            if fetched_at > requested_at {
                return keys
                    .get(kid)
                    .cloned()
                    .ok_or_else(|| AuthError::NoMatchingKey(kid.to_string()));
            }
        }
        let shared_failure = last_attempt
            .as_ref()
            .filter(|attempt| attempt.finished_at > requested_at)
            .and_then(|attempt| attempt.error.clone());
        if let Some(e) = shared_failure {
            return self.fall_back(kid, cached.as_ref(), e);
        }

        let result = self.fetch_and_store().await;
        *last_attempt = Some(RefreshAttempt {
            finished_at: Instant::now(),
            error: result.as_ref().err().cloned(),
        });
        drop(last_attempt);

        match result {
            Ok(keys) => keys
                .get(kid)
                .cloned()
                .ok_or_else(|| AuthError::NoMatchingKey(kid.to_string())),
            Err(e) => self.fall_back(kid, cached.as_ref(), e),
        }
    }

    /// Answer from the previously cached set after a failed refresh.
    fn fall_back(
        &self,
        kid: &str,
        cached: Option<&(Arc<SigningKeySet>, Instant)>,
        error: AuthError,
    ) -> Result<SigningKey, AuthError> {
        let Some((keys, fetched_at)) = cached else {
            return Err(error);
        };

        if let Some(key) = keys.get(kid) {
            warn!(kid, error = %error, "JWKS refresh failed, using stale key");
            return Ok(key.clone());
        }
        // A set within its TTL is still authoritative for unknown kids.
        if fetched_at.elapsed() < self.cache_ttl {
            debug!(kid, error = %error, "unknown kid refetch failed, cached set stands");
            return Err(AuthError::NoMatchingKey(kid.to_string()));
        }
        Err(error)
    }

    /// Force refresh the JWKS cache.
    pub async fn refresh(&self) -> Result<Arc<SigningKeySet>, AuthError> {
        let mut last_attempt = self.refresh_gate.lock().await;
        let result = self.fetch_and_store().await;
        *last_attempt = Some(RefreshAttempt {
            finished_at: Instant::now(),
            error: result.as_ref().err().cloned(),
        });
        result
    }

    /// Fetch from the source and replace the cached set. Callers hold the gate.
    async fn fetch_and_store(&self) -> Result<Arc<SigningKeySet>, AuthError> {
        let keys = match self.source.fetch().await {
            Ok(keys) => Arc::new(keys),
            Err(e) => {
                warn!(error = %e, "JWKS fetch failed");
                return Err(AuthError::KeySetUnavailable(e.to_string()));
            }
        };

        debug!(keys = keys.len(), "fetched signing key set");

        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            keys: keys.clone(),
            fetched_at: Instant::now(),
        });
        Ok(keys)
    }

    /// Check if JWKS is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .is_some_and(|entry| entry.fetched_at.elapsed() < self.cache_ttl)
    }
}
