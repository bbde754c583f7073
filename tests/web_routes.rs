//! Browser UI routes, driven with `Router::oneshot`.

use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use duelbot::agent::{CompletionError, CompletionService};
use duelbot::config::GameConfig;
use duelbot::web::{self, AppState, ServiceFactory};
use tower::ServiceExt;

struct Canned(Mutex<Vec<&'static str>>);

impl CompletionService for Canned {
    fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        let mut replies = self.0.lock().map_err(|_| CompletionError::EmptyResponse)?;
        if replies.is_empty() { return Err(CompletionError::EmptyResponse); }
        Ok(replies.remove(0).to_string())
    }
}

fn canned_factory(replies: &'static [&'static str]) -> ServiceFactory {
    Arc::new(move |_key: &str, _cfg: &GameConfig| {
        Ok(Box::new(Canned(Mutex::new(replies.to_vec()))) as Box<dyn CompletionService + Send>)
    })
}

fn app(state: &AppState) -> Router { web::router(state.clone()) }

async fn get_page(state: &AppState) -> String {
    let response = app(state)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

async fn post_form(state: &AppState, uri: &str, body: &str) -> StatusCode {
    let response = app(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    response.status()
}

#[tokio::test]
async fn page_without_key_shows_warning() {
    let state = AppState::new(GameConfig::default(), canned_factory(&[]));
    let html = get_page(&state).await;
    assert!(html.contains("Agent White vs Agent Black"));
    assert!(html.contains("Enter your Gemini API key in the sidebar."));
    assert!(html.contains("value=\"10\""), "default turn cap");
    assert!(!html.contains("Start Game"));
}

#[tokio::test]
async fn saving_key_reveals_board() {
    let state = AppState::new(GameConfig::default(), canned_factory(&[]));
    assert_eq!(post_form(&state, "/credential", "api_key=secret").await, StatusCode::SEE_OTHER);
    let html = get_page(&state).await;
    assert!(html.contains("API key saved!"));
    assert!(html.contains("Start Game"));
    assert!(html.contains("<svg"));
    assert!(!html.contains("secret"), "key must not be echoed");
}

#[tokio::test]
async fn start_plays_until_turn_cap() {
    let state = AppState::new(GameConfig::default(), canned_factory(&["e2e4", "e7e5", "g1f3"]));
    post_form(&state, "/credential", "api_key=secret").await;
    assert_eq!(post_form(&state, "/start", "max_turns=2").await, StatusCode::SEE_OTHER);
    let html = get_page(&state).await;
    assert!(html.contains("Game over: Turn limit reached."));
    assert!(html.contains("Move 1 by White (e2e4)"));
    assert!(html.contains("Move 2 by Black (e7e5)"));
    assert!(!html.contains("Move 3 by"));
    assert!(html.contains("value=\"2\""));
}

#[tokio::test]
async fn bad_replies_are_reported_per_turn() {
    let state = AppState::new(GameConfig::default(), canned_factory(&["castle kingside", "e2e5", "d2d4"]));
    post_form(&state, "/credential", "api_key=secret").await;
    post_form(&state, "/start", "max_turns=1").await;
    let html = get_page(&state).await;
    assert!(html.contains("Failed to parse move from White: castle"));
    assert!(html.contains("Invalid move suggested by White: e2e5"));
    assert!(html.contains("Move 1 by White (d2d4)"));
}

#[tokio::test]
async fn start_without_key_runs_nothing() {
    let state = AppState::new(GameConfig::default(), canned_factory(&["e2e4"]));
    assert_eq!(post_form(&state, "/start", "max_turns=3").await, StatusCode::SEE_OTHER);
    let html = get_page(&state).await;
    assert!(!html.contains("Move 1 by"));
    assert!(html.contains("Enter your Gemini API key in the sidebar."));
}

#[tokio::test]
async fn out_of_range_turn_cap_is_rejected() {
    let state = AppState::new(GameConfig::default(), canned_factory(&["e2e4"]));
    post_form(&state, "/credential", "api_key=secret").await;
    post_form(&state, "/start", "max_turns=101").await;
    let html = get_page(&state).await;
    assert!(html.contains("max_turns must be between 1 and 100, got 101"));
    assert!(!html.contains("Move 1 by"));
}

#[tokio::test]
async fn reset_clears_history() {
    let state = AppState::new(GameConfig::default(), canned_factory(&["e2e4"]));
    post_form(&state, "/credential", "api_key=secret").await;
    post_form(&state, "/start", "max_turns=1").await;
    assert!(get_page(&state).await.contains("Move 1 by White"));
    assert_eq!(post_form(&state, "/reset", "").await, StatusCode::SEE_OTHER);
    let html = get_page(&state).await;
    assert!(html.contains("Game reset!"));
    assert!(!html.contains("Move 1 by"));
}

#[tokio::test]
async fn blank_or_wordy_turn_cap_gets_a_banner() {
    let state = AppState::new(GameConfig::default(), canned_factory(&["e2e4"]));
    post_form(&state, "/credential", "api_key=secret").await;
    for body in ["max_turns=", "max_turns=ten", ""] {
        assert_eq!(post_form(&state, "/start", body).await, StatusCode::SEE_OTHER, "{body}");
        let html = get_page(&state).await;
        assert!(html.contains("max_turns must be a whole number between 1 and 100"), "{body}");
        assert!(!html.contains("Move 1 by"));
    }
}
