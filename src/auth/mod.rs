// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token authorization for the drink catalog routes.
//!
//! ## Auth Flow
//!
//! 1. The client obtains an RS256 access token from the identity provider
//! 2. The client sends `Authorization: Bearer <token>`
//! 3. The server:
//!    - Reads the token's `kid` and finds the matching key in the provider's
//!      JWKS (`https://<domain>/.well-known/jwks.json`), cached with a TTL
//!    - Verifies signature, expiry, issuer (`https://<domain>/`) and audience
//!    - Requires the route's permission in the `permissions` claim
//!
//! Every failure is an [`AuthError`] carrying a stable `code`, a human
//! readable `description` and the HTTP status to answer with.

pub mod authenticator;
pub mod bearer;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod permissions;
#[cfg(test)]
pub(crate) mod testutil;

pub use authenticator::TokenAuthenticator;
pub use bearer::bearer_token;
pub use claims::{Audience, TokenClaims};
pub use error::AuthError;
pub use extractor::Authorized;
pub use jwks::JwksCache;
pub use permissions::Permission;
