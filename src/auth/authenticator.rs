// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification and permission checks.

use std::sync::Arc;

use axum::http::HeaderMap;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};
use tracing::debug;

use super::jwks::{HttpKeySetSource, JwksCache, KeySetError, KeySetSource};
use super::{bearer_token, AuthError, TokenClaims};
use crate::config::AuthConfig;

/// Verifies bearer tokens against the identity provider's signing keys.
///
/// One instance is shared by all requests; the only shared state is the
/// JWKS cache.
pub struct TokenAuthenticator {
    config: AuthConfig,
    issuer: String,
    keys: JwksCache,
}

impl TokenAuthenticator {
    /// Create an authenticator fetching keys over HTTPS from the configured
    /// JWKS endpoint.
    pub fn new(config: AuthConfig) -> Result<Self, KeySetError> {
        let source = HttpKeySetSource::new(
            config.jwks_url(),
            config.jwks_fetch_timeout,
            config.jwks_fetch_retries,
        )?;
        Ok(Self::with_key_source(config, Arc::new(source)))
    }

    /// Create an authenticator using `source` for signing keys.
    pub fn with_key_source(config: AuthConfig, source: Arc<dyn KeySetSource>) -> Self {
        let keys = JwksCache::new(source)
            .with_cache_ttl(config.jwks_cache_ttl)
            .with_refetch_cooldown(config.jwks_refetch_cooldown);

        Self {
            issuer: config.issuer(),
            config,
            keys,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn keys(&self) -> &JwksCache {
        &self.keys
    }

    /// Authorize a request: extract the bearer token from `headers`, verify
    /// it, and check that `required_permission` is granted.
    pub async fn authorize(
        &self,
        required_permission: &str,
        headers: &HeaderMap,
    ) -> Result<TokenClaims, AuthError> {
        let token = bearer_token(headers)?;
        let claims = self.verify(token).await?;
        claims.require_permission(required_permission)?;
        Ok(claims)
    }

    /// Verify signature, `aud`, `iss` and `exp` of `token` and decode its claims.
    pub async fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        // Decode header to get kid (key ID)
        let header = decode_header(token).map_err(|e| AuthError::MalformedToken(e.to_string()))?;
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;

        if !self.config.algorithms.contains(&header.alg) {
            return Err(AuthError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        let decoding_key = self.keys.signing_key(&kid).await?.decoding_key()?;

        let mut validation = Validation::new(header.alg);
        validation.algorithms = self.config.algorithms.clone();
        validation.leeway = self.config.leeway_secs;
        validation.validate_nbf = true;
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);

        let claims = decode::<TokenClaims>(token, &decoding_key, &validation)
            .map_err(|e| map_decode_error(e.kind()))?
            .claims;

        // Both are optional at the serde level; never hand out claims without them.
        if !claims.has_audience(&self.config.audience) {
            return Err(AuthError::InvalidAudience);
        }
        if claims.iss.as_deref() != Some(self.issuer.as_str()) {
            return Err(AuthError::InvalidIssuer);
        }

        debug!(kid = %kid, sub = ?claims.sub, "token verified");
        Ok(claims)
    }
}

fn map_decode_error(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
        ErrorKind::InvalidAudience => AuthError::InvalidAudience,
        ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
        ErrorKind::MissingRequiredClaim(claim) if claim == "aud" => AuthError::InvalidAudience,
        ErrorKind::MissingRequiredClaim(claim) if claim == "iss" => AuthError::InvalidIssuer,
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::InvalidAlgorithm | ErrorKind::MissingAlgorithm | ErrorKind::InvalidAlgorithmName => {
            AuthError::UnsupportedAlgorithm(format!("{kind:?}"))
        }
        other => AuthError::MalformedPayload(format!("{other:?}")),
    }
}
