#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use serde_json::json;

use common::{bearer, register, registration, send};

fn looks_like_token(token: &str) -> bool {
    let Some((id, secret)) = token.split_once('|') else {
        return false;
    };
    !id.is_empty()
        && id.chars().all(|c| c.is_ascii_digit())
        && secret.len() == 40
        && secret.chars().all(|c| c.is_ascii_alphanumeric())
}

#[actix_web::test]
async fn register_issues_a_token() {
    let app = spawn_app!(false);

    let (status, body) = send(
        &app,
        TestRequest::post()
            .uri("/api/register")
            .set_json(registration("Reader@Example.com")),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["name"], "Test User");
    assert_eq!(body["user"]["email"], "reader@example.com");
    assert!(body["user"].get("password_hash").is_none());
    assert!(looks_like_token(body["token"].as_str().unwrap()), "{body}");
}

#[actix_web::test]
async fn register_rejects_taken_email() {
    let app = spawn_app!(false);
    register(&app, "reader@example.com").await;

    let (status, body) = send(
        &app,
        TestRequest::post()
            .uri("/api/register")
            .set_json(registration("reader@example.com")),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["email"][0], "The email has already been taken.");
}

#[actix_web::test]
async fn register_reports_every_invalid_field() {
    let app = spawn_app!(false);

    let (status, body) = send(
        &app,
        TestRequest::post().uri("/api/register").set_json(json!({
            "email": "not-an-email",
            "password": "short",
            "password_confirmation": "different",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let errors = body["errors"].as_object().unwrap();
    assert!(errors.contains_key("name"));
    assert!(errors.contains_key("email"));
    assert_eq!(errors["password"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn login_with_correct_password() {
    let app = spawn_app!(false);
    let first = register(&app, "reader@example.com").await;

    let (status, body) = send(
        &app,
        TestRequest::post().uri("/api/login").set_json(json!({
            "email": "reader@example.com",
            "password": "password123",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "reader@example.com");
    let second = body["token"].as_str().unwrap();
    assert!(looks_like_token(second));
    assert_ne!(second, first);
}

#[actix_web::test]
async fn login_with_wrong_password_is_rejected() {
    let app = spawn_app!(false);
    register(&app, "reader@example.com").await;

    for email in ["reader@example.com", "nobody@example.com"] {
        let (status, body) = send(
            &app,
            TestRequest::post().uri("/api/login").set_json(json!({
                "email": email,
                "password": "wrong-password",
            })),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body["errors"]["email"][0],
            "The provided credentials are incorrect."
        );
    }
}

#[actix_web::test]
async fn me_returns_the_token_owner() {
    let app = spawn_app!(false);
    let token = register(&app, "reader@example.com").await;

    let (status, body) = send(
        &app,
        TestRequest::get().uri("/api/me").insert_header(bearer(&token)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "reader@example.com");

    let (status, body) = send(&app, TestRequest::get().uri("/api/me")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthenticated.");
}

#[actix_web::test]
async fn logout_revokes_only_the_presented_token() {
    let app = spawn_app!(false);
    let first = register(&app, "reader@example.com").await;
    let (_, body) = send(
        &app,
        TestRequest::post().uri("/api/login").set_json(json!({
            "email": "reader@example.com",
            "password": "password123",
        })),
    )
    .await;
    let second = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        TestRequest::post().uri("/api/logout").insert_header(bearer(&first)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");

    let (status, _) = send(
        &app,
        TestRequest::get().uri("/api/posts").insert_header(bearer(&first)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        TestRequest::get().uri("/api/posts").insert_header(bearer(&second)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn logout_without_token_is_unauthorized() {
    let app = spawn_app!(false);

    let (status, _) = send(&app, TestRequest::post().uri("/api/logout")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
