// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies for the drink catalog and the trivia game.
//! All types derive `ToSchema` for the OpenAPI document served at `/docs`.
//!
//! ## Model Categories
//!
//! - **Drinks**: coffee-shop menu items with a layered recipe
//! - **Trivia**: categories, questions and the quiz round

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Drink Models
// =============================================================================

/// One layer of a drink.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RecipePart {
    /// Ingredient name, hidden from the public menu.
    pub name: String,
    /// Display color of the layer.
    pub color: String,
    /// Relative size of the layer.
    pub parts: u32,
}

/// Recipe layer as shown on the public menu.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RecipeColor {
    pub color: String,
    pub parts: u32,
}

/// A drink with its full recipe.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Drink {
    pub id: i64,
    /// Unique across the catalog.
    pub title: String,
    pub recipe: Vec<RecipePart>,
}

/// A drink as listed on the public menu, without ingredient names.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DrinkSummary {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<RecipeColor>,
}

impl Drink {
    pub fn summary(&self) -> DrinkSummary {
        DrinkSummary {
            id: self.id,
            title: self.title.clone(),
            recipe: self
                .recipe
                .iter()
                .map(|part| RecipeColor {
                    color: part.color.clone(),
                    parts: part.parts,
                })
                .collect(),
        }
    }
}

/// A recipe supplied either as a single layer or as a list of layers.
#[derive(Debug, Clone, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum RecipeInput {
    Many(Vec<RecipePart>),
    One(RecipePart),
}

impl RecipeInput {
    pub fn into_parts(self) -> Vec<RecipePart> {
        match self {
            RecipeInput::Many(parts) => parts,
            RecipeInput::One(part) => vec![part],
        }
    }
}

/// Request to add a drink to the catalog.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateDrinkRequest {
    pub title: String,
    /// Defaults to an empty recipe.
    #[serde(default)]
    pub recipe: Option<RecipeInput>,
}

/// Partial update of a drink; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateDrinkRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub recipe: Option<RecipeInput>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DrinkMenuResponse {
    pub success: bool,
    pub drinks: Vec<DrinkSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DrinksResponse {
    pub success: bool,
    pub drinks: Vec<Drink>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DrinkDeletedResponse {
    pub success: bool,
    /// Id of the removed drink.
    pub delete: i64,
}

// =============================================================================
// Trivia Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub answer: String,
    /// Id of the owning category.
    pub category: i64,
    /// 1 (easy) to 5 (hard).
    pub difficulty: i32,
}

/// Body of `POST /questions`: a search when `searchTerm` is non-empty,
/// otherwise a new question.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct QuestionsPostBody {
    #[serde(default, rename = "searchTerm")]
    pub search_term: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    #[schema(value_type = Option<i64>)]
    pub category: Option<i64>,
    #[serde(default)]
    pub difficulty: Option<i32>,
}

impl QuestionsPostBody {
    /// The trimmed search term, if this body is a search.
    pub fn search(&self) -> Option<&str> {
        self.search_term
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

/// A validated question ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: i32,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct QuizCategory {
    /// `0` selects every category.
    #[serde(deserialize_with = "required_lenient_id")]
    #[schema(value_type = i64)]
    pub id: i64,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct QuizRequest {
    #[serde(default)]
    pub previous_questions: Vec<i64>,
    pub quiz_category: QuizCategory,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoriesResponse {
    pub success: bool,
    /// Category type keyed by id.
    pub categories: BTreeMap<i64, String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionsResponse {
    pub success: bool,
    pub questions: Vec<Question>,
    pub total_questions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<BTreeMap<i64, String>>,
    pub current_category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionCreatedResponse {
    pub success: bool,
    pub created: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionDeletedResponse {
    pub success: bool,
    pub deleted: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuizResponse {
    pub success: bool,
    /// `null` once every question of the round has been asked.
    pub question: Option<Question>,
}

/// Form clients send ids as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Int(i64),
    Text(String),
}

fn parse_id<E: serde::de::Error>(repr: IdRepr) -> Result<i64, E> {
    match repr {
        IdRepr::Int(id) => Ok(id),
        IdRepr::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| E::custom(format!("invalid id `{text}`"))),
    }
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    match Option::<IdRepr>::deserialize(deserializer)? {
        Some(repr) => parse_id(repr).map(Some),
        None => Ok(None),
    }
}

fn required_lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    parse_id(IdRepr::deserialize(deserializer)?)
}
