// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::TokenAuthenticator;
use crate::store::InMemoryStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<InMemoryStore>>,
    pub authenticator: Arc<TokenAuthenticator>,
}

impl AppState {
    pub fn new(store: InMemoryStore, authenticator: TokenAuthenticator) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            authenticator: Arc::new(authenticator),
        }
    }

    /// Seeded store with an authenticator trusting the test signing key.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self::for_tests_with_source().0
    }

    #[cfg(test)]
    pub fn for_tests_with_source() -> (Self, Arc<crate::auth::testutil::StaticKeySource>) {
        let (authenticator, source) = crate::auth::testutil::test_authenticator();
        (Self::new(InMemoryStore::seeded(), authenticator), source)
    }
}
