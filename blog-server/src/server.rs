use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::application::auth_service::AuthService;
use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::infrastructure::config::AppConfig;
use crate::presentation::handlers;
use crate::presentation::middleware::{AuthPolicy, RequestIdMiddleware, TimingMiddleware};

/// Mounts the whole `/api` surface. Shared by `run` and the HTTP tests.
pub fn configure_api(
    posts: PostService,
    auth: AuthService,
    public_reads: bool,
) -> impl FnOnce(&mut web::ServiceConfig) {
    let read_policy = if public_reads {
        AuthPolicy::WritesOnly
    } else {
        AuthPolicy::Always
    };

    move |cfg| {
        cfg.service(
            web::scope("/api")
                .app_data(json_config())
                .app_data(web::Data::new(posts))
                .app_data(web::Data::new(auth.clone()))
                .route("/health", web::get().to(health))
                .configure(handlers::auth::routes(auth.clone()))
                .service(handlers::post::scope(auth, read_policy)),
        );
    }
}

/// Largest accepted JSON request body (8 MiB). Post content has no length rule
/// of its own, so this is the only ceiling on it.
pub const MAX_JSON_BODY: usize = 8 * 1024 * 1024;

/// Malformed or non-JSON bodies become a 400 with the usual `{message}` body.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_JSON_BODY)
        .error_handler(|err, _req| DomainError::BadRequest(err.to_string()).into())
}

pub async fn run(
    config: AppConfig,
    posts: PostService,
    auth: AuthService,
) -> anyhow::Result<()> {
    let bind_address = (config.host.clone(), config.port);

    info!(
        host = %bind_address.0,
        port = bind_address.1,
        public_reads = config.posts_public_reads,
        "HTTP server starting"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Referrer-Policy", "no-referrer"))
                    .add(("Permissions-Policy", "geolocation=()"))
                    .add(("Cross-Origin-Opener-Policy", "same-origin")),
            )
            .wrap(build_cors(&config.cors_origins))
            .configure(configure_api(
                posts.clone(),
                auth.clone(),
                config.posts_public_reads,
            ))
    })
    .bind(bind_address)?
    .run()
    .await
    .map_err(anyhow::Error::new)?;

    info!("HTTP server stopped");
    Ok(())
}

pub fn build_cors(origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ])
        .expose_headers(vec![header::HeaderName::from_static("x-request-id")])
        .max_age(3600);

    if origins.iter().any(|origin| origin == "*") {
        return cors.allow_any_origin();
    }

    origins
        .iter()
        .fold(cors.supports_credentials(), |cors, origin| {
            cors.allowed_origin(origin)
        })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}
