// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for permission-guarded handlers.
//!
//! Use `Authorized<P>` in a handler to require a verified token granting
//! permission `P`:
//!
//! ```rust,ignore
//! async fn create_drink(auth: Authorized<PostDrinks>) -> impl IntoResponse {
//!     // auth.claims is the verified TokenClaims
//! }
//! ```

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use super::{AuthError, Permission, TokenClaims};
use crate::state::AppState;

/// Verified claims of a request whose token grants permission `P`.
///
/// Rejection is an [`AuthError`], rendered with its own status code.
pub struct Authorized<P: Permission> {
    pub claims: TokenClaims,
    permission: PhantomData<P>,
}

impl<P: Permission> Authorized<P> {
    #[cfg(test)]
    pub(crate) fn from_claims(claims: TokenClaims) -> Self {
        Self {
            claims,
            permission: PhantomData,
        }
    }

    /// The permission this extractor checked.
    pub fn permission(&self) -> &'static str {
        P::NAME
    }
}

impl<P: Permission> FromRequestParts<AppState> for Authorized<P> {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match state.authenticator.authorize(P::NAME, &parts.headers).await {
            Ok(claims) => Ok(Self {
                claims,
                permission: PhantomData,
            }),
            Err(e) => {
                warn!(
                    method = %parts.method,
                    path = %parts.uri.path(),
                    permission = P::NAME,
                    code = e.code(),
                    status = e.status_code().as_u16(),
                    retryable = e.is_retryable(),
                    error = %e,
                    "authorization failed"
                );
                Err(e)
            }
        }
    }
}
