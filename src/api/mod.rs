// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ApiError,
    models::{
        CategoriesResponse, Category, CreateDrinkRequest, Drink, DrinkDeletedResponse,
        DrinkMenuResponse, DrinkSummary, DrinksResponse, Question, QuestionCreatedResponse,
        QuestionDeletedResponse, QuestionsPostBody, QuestionsResponse, QuizCategory, QuizRequest,
        QuizResponse, RecipeColor, RecipeInput, RecipePart, UpdateDrinkRequest,
    },
    state::AppState,
};

pub mod drinks;
pub mod extract;
pub mod health;
pub mod trivia;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/drinks", get(drinks::list_drinks).post(drinks::create_drink))
        .route("/drinks-detail", get(drinks::list_drinks_detail))
        .route(
            "/drinks/{drink_id}",
            patch(drinks::update_drink).delete(drinks::delete_drink),
        )
        .route("/categories", get(trivia::list_categories))
        .route(
            "/categories/{category_id}/questions",
            get(trivia::list_category_questions),
        )
        .route(
            "/questions",
            get(trivia::list_questions).post(trivia::search_or_create_question),
        )
        .route("/questions/{question_id}", delete(trivia::delete_question))
        .route("/quizzes", post(trivia::next_quiz_question))
        // Applies to the routes registered above.
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(CorsLayer::permissive())
}

async fn not_found() -> ApiError {
    ApiError::not_found("resource not found")
}

async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        drinks::list_drinks,
        drinks::list_drinks_detail,
        drinks::create_drink,
        drinks::update_drink,
        drinks::delete_drink,
        trivia::list_categories,
        trivia::list_questions,
        trivia::list_category_questions,
        trivia::search_or_create_question,
        trivia::delete_question,
        trivia::next_quiz_question
    ),
    components(
        schemas(
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            RecipePart,
            RecipeColor,
            RecipeInput,
            Drink,
            DrinkSummary,
            CreateDrinkRequest,
            UpdateDrinkRequest,
            DrinkMenuResponse,
            DrinksResponse,
            DrinkDeletedResponse,
            Category,
            Question,
            QuestionsPostBody,
            QuizCategory,
            QuizRequest,
            CategoriesResponse,
            QuestionsResponse,
            QuestionCreatedResponse,
            QuestionDeletedResponse,
            QuizResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Drinks", description = "Coffee-shop menu, guarded by token permissions"),
        (name = "Trivia", description = "Trivia questions, categories and quizzes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testutil::{now, sign, token_a, valid_claims, KID_A, PRIVATE_KEY_B};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn all_permissions() -> String {
        token_a(&valid_claims(&[
            "get:drinks-detail",
            "post:drinks",
            "patch:drinks",
            "delete:drinks",
        ]))
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(AppState::for_tests());
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn public_menu_needs_no_token() {
        let app = router(AppState::for_tests());

        let response = app
            .oneshot(request(Method::GET, "/drinks", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["drinks"][0]["recipe"][0], json!({"color": "blue", "parts": 1}));
    }

    #[tokio::test]
    async fn guarded_route_without_header_is_401() {
        let app = router(AppState::for_tests());

        let response = app
            .oneshot(request(Method::GET, "/drinks-detail", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], 401);
        assert_eq!(body["code"], "authorization_header_missing");
    }

    #[tokio::test]
    async fn guarded_route_without_permission_is_403() {
        let app = router(AppState::for_tests());
        let token = token_a(&valid_claims(&["get:drinks-detail"]));

        let response = app
            .oneshot(request(Method::DELETE, "/drinks/1", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["code"], "unauthorized");
    }

    #[tokio::test]
    async fn expired_token_is_401() {
        let app = router(AppState::for_tests());
        let mut claims = valid_claims(&["get:drinks-detail"]);
        claims["exp"] = json!(now() - 60);

        let response = app
            .oneshot(request(Method::GET, "/drinks-detail", Some(&token_a(&claims)), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["code"], "token_expired");
    }

    #[tokio::test]
    async fn token_signed_by_unknown_key_is_rejected() {
        let app = router(AppState::for_tests());
        let forged = sign(Some(KID_A), PRIVATE_KEY_B, &valid_claims(&["get:drinks-detail"]));

        let response = app
            .oneshot(request(Method::GET, "/drinks-detail", Some(&forged), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "invalid_header");
    }

    #[tokio::test]
    async fn drink_lifecycle_through_router() {
        let app = router(AppState::for_tests());
        let token = all_permissions();

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/drinks",
                Some(&token),
                Some(json!({
                    "title": "latte",
                    "recipe": [
                        {"name": "espresso", "color": "brown", "parts": 1},
                        {"name": "milk", "color": "white", "parts": 3}
                    ]
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let created = json_body(response).await;
        let id = created["drinks"][0]["id"].as_i64().unwrap();

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/drinks",
                Some(&token),
                Some(json!({"title": "latte"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = app
            .clone()
            .oneshot(request(
                Method::PATCH,
                &format!("/drinks/{id}"),
                Some(&token),
                Some(json!({"title": "oat latte"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let patched = json_body(response).await;
        assert_eq!(patched["drinks"][0]["title"], "oat latte");
        assert_eq!(patched["drinks"][0]["recipe"][1]["name"], "milk");

        let response = app
            .clone()
            .oneshot(request(Method::DELETE, &format!("/drinks/{id}"), Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"success": true, "delete": id}));

        let response = app
            .oneshot(request(Method::PATCH, &format!("/drinks/{id}"), Some(&token), Some(json!({}))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn auth_is_checked_before_the_body() {
        let app = router(AppState::for_tests());

        let response = app
            .oneshot(request(Method::POST, "/drinks", None, Some(json!({"nonsense": true}))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_json_is_400_and_invalid_shape_is_422() {
        let app = router(AppState::for_tests());
        let token = all_permissions();

        let malformed = Request::builder()
            .method(Method::POST)
            .uri("/drinks")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(malformed).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["message"], "bad request");

        let response = app
            .oneshot(request(Method::POST, "/drinks", Some(&token), Some(json!({"recipe": []}))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn unknown_route_is_404_json() {
        let app = router(AppState::for_tests());

        let response = app
            .oneshot(request(Method::GET, "/nowhere", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            json_body(response).await,
            json!({"success": false, "error": 404, "message": "resource not found"})
        );
    }

    #[tokio::test]
    async fn wrong_method_is_405_json() {
        let app = router(AppState::for_tests());

        let response = app
            .oneshot(request(Method::PUT, "/drinks", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(json_body(response).await["error"], 405);
    }

    #[tokio::test]
    async fn non_numeric_id_is_404() {
        let app = router(AppState::for_tests());

        let response = app
            .oneshot(request(Method::DELETE, "/questions/abc", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn questions_are_paginated_through_router() {
        let app = router(AppState::for_tests());

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/questions?page=2", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["questions"].as_array().unwrap().len(), 5);
        assert_eq!(body["total_questions"], 15);
        assert_eq!(body["categories"]["1"], "Science");
        assert_eq!(body["current_category"], Value::Null);

        let response = app
            .oneshot(request(Method::GET, "/questions?page=9", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn quiz_round_through_router() {
        let app = router(AppState::for_tests());

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/quizzes",
                None,
                Some(json!({"previous_questions": [], "quiz_category": {"id": "5", "type": "Entertainment"}})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["question"]["answer"], "Apollo 13");

        let response = app
            .oneshot(request(
                Method::POST,
                "/quizzes",
                None,
                Some(json!({"previous_questions": [13], "quiz_category": {"id": 5}})),
            ))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["question"], Value::Null);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = router(AppState::for_tests());

        let response = app
            .oneshot(request(Method::GET, "/api-doc/openapi.json", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let doc = json_body(response).await;
        assert!(doc["paths"]["/drinks/{drink_id}"].is_object());
        assert!(doc["components"]["securitySchemes"]["bearer"].is_object());
    }
}
