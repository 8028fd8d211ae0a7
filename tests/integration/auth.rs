//! Login, registration and token propagation over real HTTP

use bookshelf::{api::BookApi, nav::Route, services::auth::AuthOutcome, Session};
use tokio_test::assert_ok;

use crate::server::{book, FakeApi};

#[tokio::test]
async fn test_login_then_requests_carry_bearer_token() {
    let api = FakeApi::start().await;
    api.seed(vec![book("Dune", "Frank Herbert", "Sci-Fi")]);
    let services = api.services();

    assert_ok!(services.books.list_books().await);
    assert_eq!(api.last_request("GET").and_then(|r| r.authorization), None);

    let outcome = services.auth.login("ada@example.com", "secret").await;
    assert_eq!(outcome, AuthOutcome::Redirect(Route::Books));
    assert_eq!(services.session.token().as_deref(), Some("tok-123"));
    assert_eq!(services.session.username(), "ada");

    assert_ok!(services.books.list_books().await);
    assert_eq!(
        api.last_request("GET").and_then(|r| r.authorization).as_deref(),
        Some("Bearer tok-123")
    );
}

#[tokio::test]
async fn test_login_without_token_leaves_session_empty() {
    let api = FakeApi::start().await;
    let services = api.services();

    let outcome = services.auth.login("notoken@example.com", "secret").await;
    assert_eq!(
        outcome,
        AuthOutcome::Rejected("Authentication failed: No token received".into())
    );
    assert!(!services.session.is_signed_in());
}

#[tokio::test]
async fn test_login_bad_credentials_shows_server_message() {
    let api = FakeApi::start().await;
    let services = api.services();

    let outcome = services.auth.login("ada@example.com", "wrong").await;
    assert_eq!(outcome, AuthOutcome::Rejected("Invalid credentials".into()));
    assert_eq!(services.auth.error().as_deref(), Some("Invalid credentials"));
    assert!(!services.auth.is_loading());
}

#[tokio::test]
async fn test_login_not_found_shows_server_message() {
    let api = FakeApi::start().await;
    let services = api.services();

    let outcome = services.auth.login("missing@example.com", "secret").await;
    assert_eq!(
        outcome,
        AuthOutcome::Rejected("User missing@example.com not found".into())
    );
}

#[tokio::test]
async fn test_login_non_json_body() {
    let api = FakeApi::start().await;
    let services = api.services();

    let outcome = services.auth.login("html@example.com", "secret").await;
    assert_eq!(
        outcome,
        AuthOutcome::Rejected("Invalid response format from server".into())
    );
}

#[tokio::test]
async fn test_login_unreachable_server() {
    let api = FakeApi::start().await;
    let mut config = api.config();
    config.api.base_url = "http://127.0.0.1:9".to_string();
    let services = bookshelf::Services::new(config, Session::in_memory()).unwrap();

    let outcome = services.auth.login("ada@example.com", "secret").await;
    assert_eq!(
        outcome,
        AuthOutcome::Rejected(
            "Cannot connect to the server. Please check if the server is running.".into()
        )
    );
}

#[tokio::test]
async fn test_register_maps_name_to_username() {
    let api = FakeApi::start().await;
    let services = api.services();

    let outcome = services
        .auth
        .register("Ada Lovelace", "ada@example.com", "pw", "pw")
        .await;
    assert_eq!(outcome, AuthOutcome::Redirect(Route::Login));

    let request = api.last_request("POST").expect("register request");
    assert_eq!(request.path, "/auth/regist");
    assert_eq!(request.body["username"], "Ada Lovelace");
    assert_eq!(request.body["email"], "ada@example.com");
    assert!(request.body.get("confirmPassword").is_none());
}

#[tokio::test]
async fn test_register_plain_text_created_is_success() {
    let api = FakeApi::start().await;
    let services = api.services();

    let outcome = services
        .auth
        .register("Ada", "plain@example.com", "pw", "pw")
        .await;
    assert_eq!(outcome, AuthOutcome::Redirect(Route::Login));
    assert!(services.auth.error().is_none());
}

#[tokio::test]
async fn test_register_conflict_and_mismatch() {
    let api = FakeApi::start().await;
    let services = api.services();

    let outcome = services
        .auth
        .register("Ada", "taken@example.com", "pw", "pw")
        .await;
    assert_eq!(outcome, AuthOutcome::Rejected("Email already used".into()));

    let before = api.requests().len();
    let outcome = services.auth.register("Ada", "ada@example.com", "pw", "other").await;
    assert_eq!(outcome, AuthOutcome::Rejected("Passwords do not match".into()));
    assert_eq!(api.requests().len(), before);
}

#[tokio::test]
async fn test_session_survives_restart() {
    let api = FakeApi::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let services = api.services_with(Session::from_path(&path).unwrap());
    assert_eq!(
        services.auth.login("ada@example.com", "secret").await,
        AuthOutcome::Redirect(Route::Books)
    );

    let restored = Session::from_path(&path).unwrap();
    assert_eq!(restored.token().as_deref(), Some("tok-123"));
    assert_eq!(restored.username(), "ada");

    let services = api.services_with(restored);
    assert_eq!(services.auth.logout().unwrap(), Route::Login);
    assert!(!Session::from_path(&path).unwrap().is_signed_in());
}
