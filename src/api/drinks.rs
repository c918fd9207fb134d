// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Drink catalog handlers. Only the public menu is unauthenticated.

use axum::{extract::State, Json};
use tracing::info;

use super::extract::{ApiJson, ApiPath};
use crate::{
    auth::{
        permissions::{DeleteDrinks, GetDrinksDetail, PatchDrinks, PostDrinks},
        Authorized,
    },
    error::ApiError,
    models::{
        CreateDrinkRequest, DrinkDeletedResponse, DrinkMenuResponse, DrinksResponse,
        UpdateDrinkRequest,
    },
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/drinks",
    tag = "Drinks",
    responses((status = 200, body = DrinkMenuResponse))
)]
pub async fn list_drinks(State(state): State<AppState>) -> Json<DrinkMenuResponse> {
    let store = state.store.read().await;
    Json(DrinkMenuResponse {
        success: true,
        drinks: store.list_drinks().iter().map(|drink| drink.summary()).collect(),
    })
}

#[utoipa::path(
    get,
    path = "/drinks-detail",
    tag = "Drinks",
    security(("bearer" = ["get:drinks-detail"])),
    responses(
        (status = 200, body = DrinksResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Token lacks get:drinks-detail")
    )
)]
pub async fn list_drinks_detail(
    _auth: Authorized<GetDrinksDetail>,
    State(state): State<AppState>,
) -> Json<DrinksResponse> {
    let store = state.store.read().await;
    Json(DrinksResponse {
        success: true,
        drinks: store.list_drinks(),
    })
}

#[utoipa::path(
    post,
    path = "/drinks",
    request_body = CreateDrinkRequest,
    tag = "Drinks",
    security(("bearer" = ["post:drinks"])),
    responses(
        (status = 200, body = DrinksResponse),
        (status = 422, description = "Title missing or already taken")
    )
)]
pub async fn create_drink(
    auth: Authorized<PostDrinks>,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateDrinkRequest>,
) -> Result<Json<DrinksResponse>, ApiError> {
    let recipe = request.recipe.map(|recipe| recipe.into_parts()).unwrap_or_default();
    let drink = state.store.write().await.create_drink(request.title, recipe)?;

    info!(
        drink_id = drink.id,
        title = %drink.title,
        subject = auth.claims.sub.as_deref().unwrap_or("-"),
        "drink created"
    );
    Ok(Json(DrinksResponse {
        success: true,
        drinks: vec![drink],
    }))
}

#[utoipa::path(
    patch,
    path = "/drinks/{drink_id}",
    params(
        ("drink_id" = i64, Path, description = "Identifier of the drink to update")
    ),
    request_body = UpdateDrinkRequest,
    tag = "Drinks",
    security(("bearer" = ["patch:drinks"])),
    responses(
        (status = 200, body = DrinksResponse),
        (status = 404, description = "Unknown drink"),
        (status = 422, description = "Title already taken")
    )
)]
pub async fn update_drink(
    auth: Authorized<PatchDrinks>,
    ApiPath(drink_id): ApiPath<i64>,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateDrinkRequest>,
) -> Result<Json<DrinksResponse>, ApiError> {
    let drink = state.store.write().await.update_drink(drink_id, request)?;

    info!(
        drink_id,
        subject = auth.claims.sub.as_deref().unwrap_or("-"),
        "drink updated"
    );
    Ok(Json(DrinksResponse {
        success: true,
        drinks: vec![drink],
    }))
}

#[utoipa::path(
    delete,
    path = "/drinks/{drink_id}",
    params(
        ("drink_id" = i64, Path, description = "Identifier of the drink to delete")
    ),
    tag = "Drinks",
    security(("bearer" = ["delete:drinks"])),
    responses(
        (status = 200, body = DrinkDeletedResponse),
        (status = 404, description = "Unknown drink")
    )
)]
pub async fn delete_drink(
    auth: Authorized<DeleteDrinks>,
    ApiPath(drink_id): ApiPath<i64>,
    State(state): State<AppState>,
) -> Result<Json<DrinkDeletedResponse>, ApiError> {
    state.store.write().await.delete_drink(drink_id)?;

    info!(
        drink_id,
        subject = auth.claims.sub.as_deref().unwrap_or("-"),
        "drink deleted"
    );
    Ok(Json(DrinkDeletedResponse {
        success: true,
        delete: drink_id,
    }))
}
