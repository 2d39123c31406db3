mod common;

use client_core::AppError;
use common::{cookie_header, json_body, TestApp, TEST_EMAIL, TEST_PASSWORD};
use docqa_frontend::models::{LoginForm, NotificationKind, Screen, SessionPhase, SignupForm};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn login_sets_session_and_moves_to_upload() {
    let mut app = TestApp::spawn().await;
    app.mock_login_success().await;

    let session = app
        .state
        .login(LoginForm::new(TEST_EMAIL, TEST_PASSWORD))
        .await
        .expect("Login should succeed");

    assert_eq!(session.email, TEST_EMAIL);
    assert!(app.state.backend.credentials().is_present());
    assert_eq!(app.state.session.screen(), Screen::Upload);
    assert_eq!(app.state.phase(), SessionPhase::Authenticated);

    let notifications = app.drain_notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::Success);
    assert_eq!(notifications[0].message, "Login successful! Redirecting...");

    let requests = app.requests_to("/login").await;
    assert_eq!(
        json_body(&requests[0]),
        json!({"email_id": TEST_EMAIL, "password": TEST_PASSWORD})
    );
}

#[tokio::test]
async fn rejected_login_shows_backend_message_verbatim() {
    let mut app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!("Invalid email or password")))
        .mount(&app.backend)
        .await;

    let err = app
        .state
        .login(LoginForm::new(TEST_EMAIL, TEST_PASSWORD))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Auth(ref message) if message == "Invalid email or password"));
    assert!(!app.state.backend.credentials().is_present());
    assert_eq!(app.state.session.screen(), Screen::Landing);
    assert_eq!(app.state.phase(), SessionPhase::Anonymous);
    assert!(app.state.conversation.messages().await.is_empty());

    let notifications = app.drain_notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::Error);
    assert_eq!(notifications[0].message, "Invalid email or password");
}

#[tokio::test]
async fn structured_error_bodies_are_passed_through() {
    let mut app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"detail":"User not found"}"#))
        .mount(&app.backend)
        .await;

    let err = app
        .state
        .login(LoginForm::new(TEST_EMAIL, TEST_PASSWORD))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), r#"{"detail":"User not found"}"#);
    assert_eq!(
        app.drain_notifications()[0].message,
        r#"{"detail":"User not found"}"#
    );
}

#[tokio::test]
async fn invalid_login_form_never_reaches_backend() {
    let mut app = TestApp::spawn().await;
    app.mock_login_success().await;

    for form in [
        LoginForm::new("not-an-email", TEST_PASSWORD),
        LoginForm::new(TEST_EMAIL, "12345"),
    ] {
        let err = app.state.login(form).await.unwrap_err();
        assert!(err.is_validation(), "unexpected error: {}", err);
    }

    assert_eq!(app.request_count().await, 0);
    assert!(app.drain_notifications().is_empty());
}

#[tokio::test]
async fn signup_posts_all_fields_and_returns_to_landing() {
    let mut app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/register/user"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", common::SESSION_COOKIE)
                .set_body_json(json!({"message": "User created"})),
        )
        .mount(&app.backend)
        .await;

    app.state
        .signup(SignupForm::new("Ada", "Lovelace", TEST_EMAIL, TEST_PASSWORD))
        .await
        .expect("Signup should succeed");

    let requests = app.requests_to("/register/user").await;
    assert_eq!(
        json_body(&requests[0]),
        json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email_id": TEST_EMAIL,
            "password": TEST_PASSWORD,
        })
    );

    assert_eq!(
        app.drain_notifications()[0].message,
        "Signup successful! Redirecting..."
    );
    // Landing is public, so the fresh session does not survive the redirect
    assert_eq!(app.state.session.screen(), Screen::Landing);
    assert!(!app.state.backend.credentials().is_present());
}

#[tokio::test]
async fn signup_requires_names() {
    let app = TestApp::spawn().await;

    let err = app
        .state
        .signup(SignupForm::new("", "Lovelace", TEST_EMAIL, TEST_PASSWORD))
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(app.request_count().await, 0);
}

#[tokio::test]
async fn signup_transport_failure_uses_fallback_message() {
    let mut app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/register/user"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.backend)
        .await;

    let err = app
        .state
        .signup(SignupForm::new("Ada", "Lovelace", TEST_EMAIL, TEST_PASSWORD))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Signup failed");
    assert_eq!(app.drain_notifications()[0].message, "Signup failed");
}

#[tokio::test]
async fn later_requests_carry_the_session_cookie() {
    let app = TestApp::spawn().await;
    app.login().await;
    Mock::given(method("POST"))
        .and(path("/protected/logout/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Logged out"})))
        .mount(&app.backend)
        .await;

    app.state.logout().await.expect("Logout should succeed");

    let requests = app.requests_to("/protected/logout/").await;
    assert_eq!(
        cookie_header(&requests[0]).as_deref(),
        Some("session=test-session-token")
    );
    assert_eq!(json_body(&requests[0]), json!({}));
    assert!(requests[0].headers.get("x-request-id").is_some());
}

#[tokio::test]
async fn failed_logout_still_clears_local_state() {
    let app = TestApp::spawn().await;
    app.login_with_documents(&["report.pdf"]).await;
    Mock::given(method("POST"))
        .and(path("/protected/logout/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&app.backend)
        .await;

    let err = app.state.logout().await.unwrap_err();

    assert!(err.is_transport());
    assert_eq!(app.state.phase(), SessionPhase::Anonymous);
    assert_eq!(app.state.session.screen(), Screen::Landing);
    assert!(app.state.registry.is_empty());
    assert!(!app.state.backend.credentials().is_present());
}

#[tokio::test]
async fn public_screens_end_the_session() {
    let app = TestApp::spawn().await;
    app.login_with_documents(&["report.pdf"]).await;
    app.state.open_chat().expect("Chat should open");

    app.state.navigate(Screen::Auth).await.unwrap();

    assert_eq!(app.state.phase(), SessionPhase::Anonymous);
    assert!(app.state.registry.is_empty());
    assert!(matches!(
        app.state.navigate(Screen::Upload).await,
        Err(AppError::NotAuthenticated)
    ));
}
