use actix_web::{HttpResponse, Responder, post, web};
use serde_json::Value;
use tracing::info;

use crate::application::auth_service::{AuthService, IssuedToken};
use crate::domain::error::DomainError;
use crate::presentation::dto::into_payload;
use crate::presentation::middleware::BearerAuth;
use crate::presentation::resource::{AuthResponse, MessageResponse, UserResource};
use crate::presentation::utils::AuthenticatedUser;

/// Registers `/register`, `/login`, `/logout` and `/me` on the enclosing scope.
pub fn routes(auth: AuthService) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.service(register)
            .service(login)
            .service(
                web::resource("/logout")
                    .wrap(BearerAuth::required(auth.clone()))
                    .route(web::post().to(logout)),
            )
            .service(
                web::resource("/me")
                    .wrap(BearerAuth::required(auth))
                    .route(web::get().to(me)),
            );
    }
}

fn auth_response(issued: IssuedToken) -> AuthResponse {
    AuthResponse {
        user: issued.user.into(),
        token: issued.token,
    }
}

#[post("/register")]
async fn register(
    service: web::Data<AuthService>,
    payload: web::Json<Value>,
) -> Result<impl Responder, DomainError> {
    let issued = service.register(&into_payload(payload.into_inner())).await?;

    info!(user_id = issued.user.id, email = %issued.user.email, "user registered");

    Ok(HttpResponse::Created().json(auth_response(issued)))
}

#[post("/login")]
async fn login(
    service: web::Data<AuthService>,
    payload: web::Json<Value>,
) -> Result<impl Responder, DomainError> {
    let issued = service.login(&into_payload(payload.into_inner())).await?;

    info!(user_id = issued.user.id, email = %issued.user.email, "user logged in");

    Ok(HttpResponse::Ok().json(auth_response(issued)))
}

async fn logout(
    service: web::Data<AuthService>,
    user: AuthenticatedUser,
) -> Result<impl Responder, DomainError> {
    service.logout(user.token_id).await?;

    info!(user_id = user.id, token_id = user.token_id, "user logged out");

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Logged out successfully",
    }))
}

async fn me(
    service: web::Data<AuthService>,
    user: AuthenticatedUser,
) -> Result<impl Responder, DomainError> {
    let user = service.get_user(user.id).await?;
    Ok(HttpResponse::Ok().json(UserResource::from(user)))
}
