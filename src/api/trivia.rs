// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Trivia game handlers: category and question browsing, question
//! management and quiz rounds. None of these routes require a token.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{debug, info};
use utoipa::IntoParams;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::{
    error::ApiError,
    models::{
        CategoriesResponse, NewQuestion, QuestionCreatedResponse, QuestionDeletedResponse,
        QuestionsPostBody, QuestionsResponse, QuizRequest, QuizResponse,
    },
    state::AppState,
};

const DIFFICULTY_RANGE: std::ops::RangeInclusive<i32> = 1..=5;

#[derive(Debug, Deserialize, IntoParams)]
pub struct PageQuery {
    /// 1-based page number, ten questions per page.
    #[serde(default = "first_page")]
    pub page: usize,
}

fn first_page() -> usize {
    1
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: first_page() }
    }
}

#[utoipa::path(
    get,
    path = "/categories",
    tag = "Trivia",
    responses((status = 200, body = CategoriesResponse))
)]
pub async fn list_categories(State(state): State<AppState>) -> Json<CategoriesResponse> {
    let store = state.store.read().await;
    Json(CategoriesResponse {
        success: true,
        categories: store.category_map(),
    })
}

#[utoipa::path(
    get,
    path = "/questions",
    params(PageQuery),
    tag = "Trivia",
    responses(
        (status = 200, body = QuestionsResponse),
        (status = 404, description = "Page past the last question")
    )
)]
pub async fn list_questions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<QuestionsResponse>, ApiError> {
    let store = state.store.read().await;
    let page = store.questions_page(query.page)?;
    Ok(Json(QuestionsResponse {
        success: true,
        questions: page.items,
        total_questions: page.total,
        categories: Some(store.category_map()),
        current_category: None,
    }))
}

#[utoipa::path(
    get,
    path = "/categories/{category_id}/questions",
    params(
        ("category_id" = i64, Path, description = "Category to list questions for"),
        PageQuery
    ),
    tag = "Trivia",
    responses(
        (status = 200, body = QuestionsResponse),
        (status = 404, description = "Unknown category or empty page")
    )
)]
pub async fn list_category_questions(
    ApiPath(category_id): ApiPath<i64>,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<QuestionsResponse>, ApiError> {
    let store = state.store.read().await;
    let (category, page) = store.category_questions_page(category_id, query.page)?;
    Ok(Json(QuestionsResponse {
        success: true,
        questions: page.items,
        total_questions: page.total,
        categories: None,
        current_category: Some(category.kind),
    }))
}

/// Searches questions when `searchTerm` is set, otherwise creates one.
#[utoipa::path(
    post,
    path = "/questions",
    params(PageQuery),
    request_body = QuestionsPostBody,
    tag = "Trivia",
    responses(
        (status = 200, description = "Search results, or a QuestionCreatedResponse for a new question", body = QuestionsResponse),
        (status = 422, description = "Missing fields, unknown category or difficulty outside 1..=5")
    )
)]
pub async fn search_or_create_question(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
    ApiJson(body): ApiJson<QuestionsPostBody>,
) -> Result<Response, ApiError> {
    if let Some(term) = body.search() {
        let store = state.store.read().await;
        let page = store.search_questions(term, query.page);
        debug!(term, matches = page.total, "question search");
        return Ok(Json(QuestionsResponse {
            success: true,
            questions: page.items,
            total_questions: page.total,
            categories: None,
            current_category: None,
        })
        .into_response());
    }

    let new = validate_new_question(body)?;
    let question = state.store.write().await.create_question(new)?;
    info!(question_id = question.id, category = question.category, "question created");
    Ok(Json(QuestionCreatedResponse {
        success: true,
        created: question.id,
    })
    .into_response())
}

#[utoipa::path(
    delete,
    path = "/questions/{question_id}",
    params(
        ("question_id" = i64, Path, description = "Identifier of the question to delete")
    ),
    tag = "Trivia",
    responses(
        (status = 200, body = QuestionDeletedResponse),
        (status = 404, description = "Unknown question")
    )
)]
pub async fn delete_question(
    ApiPath(question_id): ApiPath<i64>,
    State(state): State<AppState>,
) -> Result<Json<QuestionDeletedResponse>, ApiError> {
    state.store.write().await.delete_question(question_id)?;
    info!(question_id, "question deleted");
    Ok(Json(QuestionDeletedResponse {
        success: true,
        deleted: question_id,
    }))
}

#[utoipa::path(
    post,
    path = "/quizzes",
    request_body = QuizRequest,
    tag = "Trivia",
    responses(
        (status = 200, body = QuizResponse),
        (status = 404, description = "Unknown category")
    )
)]
pub async fn next_quiz_question(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<QuizRequest>,
) -> Result<Json<QuizResponse>, ApiError> {
    let store = state.store.read().await;
    let question = store.quiz_question(request.quiz_category.id, &request.previous_questions)?;
    Ok(Json(QuizResponse {
        success: true,
        question,
    }))
}

fn required_text(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ApiError::unprocessable(format!("`{field}` is required")))
}

fn validate_new_question(body: QuestionsPostBody) -> Result<NewQuestion, ApiError> {
    let question = required_text(body.question, "question")?;
    let answer = required_text(body.answer, "answer")?;
    let category = body
        .category
        .ok_or_else(|| ApiError::unprocessable("`category` is required"))?;
    let difficulty = body
        .difficulty
        .ok_or_else(|| ApiError::unprocessable("`difficulty` is required"))?;
    if !DIFFICULTY_RANGE.contains(&difficulty) {
        return Err(ApiError::unprocessable("`difficulty` must be between 1 and 5"));
    }

    Ok(NewQuestion {
        question,
        answer,
        category,
        difficulty,
    })
}
