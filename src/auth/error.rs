// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization errors.
//!
//! Every failure of the bearer-token pipeline is one of these variants. The
//! variants are finer grained than the wire taxonomy: several of them share a
//! `code`/status pair (e.g. signature and payload failures are all reported as
//! `invalid_header` / 400) while logs keep the precise cause.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Authorization error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No `Authorization` header, or an empty one.
    #[error("authorization header missing")]
    MissingAuthHeader,

    /// Scheme is not `Bearer`.
    #[error("authorization scheme is not bearer")]
    InvalidAuthScheme,

    /// `Bearer` with no token after it.
    #[error("bearer token missing")]
    MissingToken,

    /// More than two parts, or a header value that is not visible ASCII.
    #[error("authorization header is not a bearer token")]
    MalformedAuthHeader,

    /// The unverified token header could not be decoded.
    #[error("token header is malformed: {0}")]
    MalformedToken(String),

    /// The token header carries no `kid`.
    #[error("token header has no key id")]
    MissingKeyId,

    /// The signing key set could not be obtained.
    #[error("signing key set unavailable: {0}")]
    KeySetUnavailable(String),

    /// No key in the signing key set matches the token's `kid`.
    #[error("no signing key matches kid {0:?}")]
    NoMatchingKey(String),

    /// The matched key could not be turned into a verification key.
    #[error("signing key is unusable: {0}")]
    InvalidKey(String),

    /// Signature does not verify against the matched key.
    #[error("token signature is invalid")]
    InvalidSignature,

    /// Token algorithm is not in the accepted list.
    #[error("unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Payload could not be decoded or lacks a required claim.
    #[error("token payload is malformed: {0}")]
    MalformedPayload(String),

    /// `exp` has passed.
    #[error("token expired")]
    TokenExpired,

    /// `nbf` lies in the future.
    #[error("token not yet valid")]
    TokenNotYetValid,

    /// `aud` does not match the configured audience.
    #[error("token audience is invalid")]
    InvalidAudience,

    /// `iss` does not match the configured issuer.
    #[error("token issuer is invalid")]
    InvalidIssuer,

    /// The claims carry no `permissions` entry.
    #[error("permissions claim missing")]
    MissingPermissions,

    /// The required permission is not granted.
    #[error("permission {0:?} not granted")]
    PermissionDenied(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    success: bool,
    error: u16,
    code: &'static str,
    description: &'static str,
    message: &'static str,
}

impl AuthError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "authorization_header_missing",
            AuthError::InvalidAuthScheme
            | AuthError::MissingToken
            | AuthError::MalformedAuthHeader
            | AuthError::MalformedToken(_)
            | AuthError::MissingKeyId
            | AuthError::KeySetUnavailable(_)
            | AuthError::NoMatchingKey(_)
            | AuthError::InvalidKey(_)
            | AuthError::InvalidSignature
            | AuthError::UnsupportedAlgorithm(_)
            | AuthError::MalformedPayload(_) => "invalid_header",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenNotYetValid
            | AuthError::InvalidAudience
            | AuthError::InvalidIssuer
            | AuthError::MissingPermissions => "invalid_claims",
            AuthError::PermissionDenied(_) => "unauthorized",
        }
    }

    /// Human-readable description returned to the client.
    pub fn description(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "Authorization header is expected.",
            AuthError::InvalidAuthScheme => "Authorization header must start with \"Bearer\".",
            AuthError::MissingToken => "Token not found.",
            AuthError::MalformedAuthHeader => "Authorization header must be bearer token.",
            AuthError::MissingKeyId => "Authorization malformed.",
            AuthError::NoMatchingKey(_) => "Unable to find the appropriate key.",
            AuthError::MalformedToken(_)
            | AuthError::KeySetUnavailable(_)
            | AuthError::InvalidKey(_)
            | AuthError::InvalidSignature
            | AuthError::UnsupportedAlgorithm(_)
            | AuthError::MalformedPayload(_) => "Unable to parse authentication token.",
            AuthError::TokenExpired => "Token expired.",
            AuthError::TokenNotYetValid | AuthError::InvalidAudience | AuthError::InvalidIssuer => {
                "Incorrect claims. Please, check the audience and issuer."
            }
            AuthError::MissingPermissions => "Permissions not included in JWT.",
            AuthError::PermissionDenied(_) => "Specific permission not found.",
        }
    }

    /// HTTP status carried to the client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthScheme
            | AuthError::MissingToken
            | AuthError::MalformedAuthHeader
            | AuthError::MissingKeyId
            | AuthError::TokenExpired
            | AuthError::TokenNotYetValid
            | AuthError::InvalidAudience
            | AuthError::InvalidIssuer => StatusCode::UNAUTHORIZED,
            AuthError::MalformedToken(_)
            | AuthError::KeySetUnavailable(_)
            | AuthError::NoMatchingKey(_)
            | AuthError::InvalidKey(_)
            | AuthError::InvalidSignature
            | AuthError::UnsupportedAlgorithm(_)
            | AuthError::MalformedPayload(_)
            | AuthError::MissingPermissions => StatusCode::BAD_REQUEST,
            AuthError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Whether the same request may succeed if simply retried later.
    ///
    /// Only key-set fetch failures qualify; every other variant is a property
    /// of the presented token.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::KeySetUnavailable(_))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            success: false,
            error: status.as_u16(),
            code: self.code(),
            description: self.description(),
            message: self.description(),
        });
        (status, body).into_response()
    }
}
