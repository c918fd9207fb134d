// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Permissions required by the drink catalog routes.
//!
//! Each permission is a marker type so a handler states its requirement in
//! its signature: `Authorized<PostDrinks>`.

/// A permission string that must appear in the token's `permissions` claim.
pub trait Permission: Send + Sync + 'static {
    const NAME: &'static str;
}

/// Read full drink recipes.
pub struct GetDrinksDetail;

/// Create drinks.
pub struct PostDrinks;

/// Modify drinks.
pub struct PatchDrinks;

/// Delete drinks.
pub struct DeleteDrinks;

impl Permission for GetDrinksDetail {
    const NAME: &'static str = "get:drinks-detail";
}

impl Permission for PostDrinks {
    const NAME: &'static str = "post:drinks";
}

impl Permission for PatchDrinks {
    const NAME: &'static str = "patch:drinks";
}

impl Permission for DeleteDrinks {
    const NAME: &'static str = "delete:drinks";
}
