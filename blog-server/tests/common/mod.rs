#![allow(dead_code)]

use std::sync::Arc;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::test::{self, TestRequest};
use serde_json::{Value, json};

use blog_server::application::auth_service::AuthService;
use blog_server::application::post_service::PostService;
use blog_server::data::post_repository::MemoryPostStore;
use blog_server::data::token_repository::MemoryTokenStore;
use blog_server::data::user_repository::MemoryUserStore;

pub fn services() -> (PostService, AuthService) {
    let posts = PostService::new(Arc::new(MemoryPostStore::new()));
    let auth = AuthService::new(
        Arc::new(MemoryUserStore::new()),
        Arc::new(MemoryTokenStore::new()),
        None,
    );
    (posts, auth)
}

/// Builds the `/api` app on fresh in-memory stores.
macro_rules! spawn_app {
    ($public_reads:expr) => {{
        let (posts, auth) = $crate::common::services();
        actix_web::test::init_service(actix_web::App::new().configure(
            blog_server::server::configure_api(posts, auth, $public_reads),
        ))
        .await
    }};
}

/// Sends `req` and returns the status with the JSON body (`Null` when empty).
pub async fn send<S, B>(app: &S, req: TestRequest) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(app, req.to_request()).await;
    let status = res.status();
    let bytes = test::read_body(res).await;
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}

pub fn registration(email: &str) -> Value {
    json!({
        "name": "Test User",
        "email": email,
        "password": "password123",
        "password_confirmation": "password123",
    })
}

/// Registers a user and returns the plain-text token.
pub async fn register<S, B>(app: &S, email: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = send(
        app,
        TestRequest::post()
            .uri("/api/register")
            .set_json(registration(email)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["token"].as_str().unwrap().to_string()
}

/// Creates a post and returns its `data` object.
pub async fn create_post<S, B>(app: &S, token: &str, payload: Value) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = send(
        app,
        TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(token))
            .set_json(payload),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}
