//! Integration tests for the HTTP surface, backed by the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use quiz_question_api::{create_router, InMemoryStore, SharedStore, StoreError};
use serde_json::{json, Value};
use tower::ServiceExt;

fn setup() -> (axum::Router, InMemoryStore) {
    let store = InMemoryStore::new();
    let shared: SharedStore = Arc::new(store.clone());
    (create_router(shared, Duration::from_secs(30)), store)
}

fn post_question(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/question/")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn scenario_a() -> Value {
    json!({
        "question_text": "2+2?",
        "choice": [
            { "choice_txt": "4", "is_correct": true },
            { "choice_txt": "5", "is_correct": false }
        ]
    })
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_health_check_ignores_unreachable_store() {
    let (app, store) = setup();
    store.set_unavailable(true).await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_readiness_reflects_store_state() {
    let (app, store) = setup();

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ready" }));

    store.set_unavailable(true).await;
    let response = app
        .oneshot(Request::builder().uri("/health/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert!(json["detail"].as_str().unwrap().starts_with("Store unavailable"));
}

#[tokio::test]
async fn test_create_question_with_choices() {
    let (app, store) = setup();

    let response = app
        .oneshot(post_question(scenario_a().to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "message": "Question created successfully" })
    );

    let questions = store.questions().await;
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].question_text, "2+2?");

    let choices = store.choices().await;
    assert_eq!(choices.len(), 2);
    assert!(choices.iter().all(|c| c.question_id == questions[0].id));
    assert_eq!((choices[0].choice_txt.as_str(), choices[0].is_correct), ("4", true));
    assert_eq!((choices[1].choice_txt.as_str(), choices[1].is_correct), ("5", false));
}

#[tokio::test]
async fn test_route_without_trailing_slash() {
    let (app, store) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/question")
                .header("content-type", "application/json")
                .body(Body::from(scenario_a().to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.questions().await.len(), 1);
}

#[tokio::test]
async fn test_missing_choice_text_is_unprocessable() {
    let (app, store) = setup();

    let body = json!({
        "question_text": "2+2?",
        "choice": [
            { "choice_txt": "4", "is_correct": true },
            { "is_correct": false }
        ]
    });

    let response = app.oneshot(post_question(body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    let detail = json["detail"].as_str().unwrap();
    assert!(detail.contains("choice[1]"), "detail was: {}", detail);
    assert!(detail.contains("choice_txt"), "detail was: {}", detail);

    assert!(store.questions().await.is_empty());
    assert!(store.choices().await.is_empty());
}

#[tokio::test]
async fn test_missing_top_level_fields_are_unprocessable() {
    let bodies = [
        json!({ "choice": [{ "choice_txt": "4", "is_correct": true }] }),
        json!({ "question_text": "2+2?" }),
        json!({ "question_text": 4, "choice": [] }),
    ];

    for body in bodies {
        let (app, store) = setup();
        let response = app.oneshot(post_question(body.to_string())).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "body: {}", body);
        assert!(store.questions().await.is_empty());
    }
}

#[tokio::test]
async fn test_malformed_json_is_unprocessable() {
    let (app, store) = setup();

    let response = app
        .oneshot(post_question("{\"question_text\": ".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_json(response).await["detail"].is_string());
    assert!(store.questions().await.is_empty());
}

#[tokio::test]
async fn test_missing_content_type_is_unprocessable() {
    let (app, store) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/question/")
                .body(Body::from(scenario_a().to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert!(json["detail"].as_str().unwrap().contains("Content-Type"));
    assert!(store.questions().await.is_empty());
    assert!(store.choices().await.is_empty());
}

#[tokio::test]
async fn test_empty_choice_list_is_rejected() {
    let (app, store) = setup();

    let body = json!({ "question_text": "2+2?", "choice": [] });
    let response = app.oneshot(post_question(body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body_json(response).await,
        json!({ "detail": "choice: at least one choice is required" })
    );
    assert!(store.questions().await.is_empty());
}

#[tokio::test]
async fn test_unavailable_store_returns_server_error() {
    let (app, store) = setup();
    store.set_unavailable(true).await;

    let response = app
        .oneshot(post_question(scenario_a().to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert!(json["detail"]
        .as_str()
        .unwrap()
        .starts_with("Error creating question: "));

    store.set_unavailable(false).await;
    assert!(store.questions().await.is_empty());
}

#[tokio::test]
async fn test_failed_choice_insert_leaves_no_question() {
    let (app, store) = setup();
    store
        .fail_choice_insert_at(1, StoreError::integrity("violates foreign key constraint"))
        .await;

    let response = app
        .oneshot(post_question(scenario_a().to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(
        json["detail"],
        "Error creating question: integrity error: violates foreign key constraint"
    );

    assert!(store.questions().await.is_empty());
    assert!(store.choices().await.is_empty());
}

#[tokio::test]
async fn test_repeated_requests_create_independent_questions() {
    let (app, store) = setup();

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_question(scenario_a().to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let questions = store.questions().await;
    assert_eq!(questions.len(), 2);
    assert_ne!(questions[0].id, questions[1].id);
    for question in &questions {
        assert_eq!(store.choices_for(question.id).await.len(), 2);
    }
}

#[tokio::test]
async fn test_all_incorrect_choices_are_accepted() {
    let (app, store) = setup();

    let body = json!({
        "question_text": "",
        "choice": [
            { "choice_txt": "", "is_correct": false },
            { "choice_txt": "maybe", "is_correct": false }
        ]
    });
    let response = app.oneshot(post_question(body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.choices().await.len(), 2);
}
