// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Decoded token claims.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::AuthError;

/// The `aud` claim: identity providers emit either a single string or an
/// array when the token is valid for several APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == audience,
            Audience::Multiple(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

/// Claims of a verified access token.
///
/// `iss`, `aud` and `exp` are checked by the verifier before this value is
/// handed out. `iss` and `aud` may be absent at the serde level so that a
/// token lacking them is rejected as a claim failure, not a payload failure.
/// `permissions` stays optional because its absence is a distinct failure
/// reported by [`TokenClaims::require_permission`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer (`https://<domain>/`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// Expiration timestamp
    pub exp: i64,

    /// Subject (identity-provider user id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Issued at timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Not before timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Granted permission strings, e.g. `post:drinks`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,

    /// Any other claims (`azp`, `scope`, custom namespaced claims, ...)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl TokenClaims {
    /// Check that `permission` is granted.
    pub fn require_permission(&self, permission: &str) -> Result<(), AuthError> {
        let Some(permissions) = &self.permissions else {
            return Err(AuthError::MissingPermissions);
        };

        if permissions.iter().any(|granted| granted == permission) {
            Ok(())
        } else {
            Err(AuthError::PermissionDenied(permission.to_string()))
        }
    }

    /// Whether the `aud` claim names `audience`.
    pub fn has_audience(&self, audience: &str) -> bool {
        self.aud.as_ref().is_some_and(|aud| aud.contains(audience))
    }
}
