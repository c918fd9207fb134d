// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Trivia & Coffee Shop API server
//!
//! Two REST APIs served from one process: a public trivia game and a
//! coffee-shop drink catalog whose write routes require bearer tokens
//! issued by an external identity provider.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Bearer-token verification against the provider's JWKS
//! - `config` - Environment configuration
//! - `store` - In-memory drink and question storage

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod state;
pub mod store;
