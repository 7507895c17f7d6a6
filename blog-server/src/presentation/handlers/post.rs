use actix_web::dev::HttpServiceFactory;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, delete, get, patch, post, put, web};
use serde_json::Value;
use tracing::info;

use crate::application::auth_service::AuthService;
use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::domain::post::PostId;
use crate::presentation::dto::{ListPostsQuery, into_payload};
use crate::presentation::middleware::{AuthPolicy, BearerAuth, RequestId};
use crate::presentation::resource::{Data, MessageResponse};
use crate::presentation::utils::AuthenticatedUser;

/// `/posts` routes. Writes always need a token; reads follow `read_policy`.
pub fn scope(auth: AuthService, read_policy: AuthPolicy) -> impl HttpServiceFactory {
    web::scope("/posts")
        .wrap(BearerAuth::new(auth, read_policy))
        .service(get_posts)
        .service(create_post)
        .service(get_post)
        .service(update_post)
        .service(patch_post)
        .service(delete_post)
}

#[get("")]
async fn get_posts(
    req: HttpRequest,
    posts: web::Data<PostService>,
    query: web::Query<ListPostsQuery>,
) -> Result<HttpResponse, DomainError> {
    let filter = query.to_filter();
    let found = posts.list_posts(&filter).await?;

    info!(
        request_id = %request_id(&req),
        count = found.len(),
        "posts retrieved"
    );

    Ok(HttpResponse::Ok().json(Data::posts(found)))
}

#[post("")]
async fn create_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    payload: web::Json<Value>,
) -> Result<HttpResponse, DomainError> {
    let post = posts.create_post(&into_payload(payload.into_inner())).await?;

    info!(
        request_id = %request_id(&req),
        user_id = user.id,
        post_id = post.id,
        "post created"
    );

    Ok(HttpResponse::Created().json(Data::post(post)))
}

#[get("/{id}")]
async fn get_post(
    posts: web::Data<PostService>,
    path: web::Path<PostId>,
) -> Result<HttpResponse, DomainError> {
    let post = posts.get_post(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(Data::post(post)))
}

#[put("/{id}")]
async fn update_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    path: web::Path<PostId>,
    payload: web::Json<Value>,
) -> Result<HttpResponse, DomainError> {
    apply_update(req, user, posts, path.into_inner(), payload.into_inner()).await
}

#[patch("/{id}")]
async fn patch_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    path: web::Path<PostId>,
    payload: web::Json<Value>,
) -> Result<HttpResponse, DomainError> {
    apply_update(req, user, posts, path.into_inner(), payload.into_inner()).await
}

async fn apply_update(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    post_id: PostId,
    payload: Value,
) -> Result<HttpResponse, DomainError> {
    let post = posts.update_post(post_id, &into_payload(payload)).await?;

    info!(
        request_id = %request_id(&req),
        user_id = user.id,
        post_id,
        "post updated"
    );

    Ok(HttpResponse::Ok().json(Data::post(post)))
}

#[delete("/{id}")]
async fn delete_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    path: web::Path<PostId>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    posts.delete_post(post_id).await?;

    info!(
        request_id = %request_id(&req),
        user_id = user.id,
        post_id,
        "post deleted"
    );

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Post deleted successfully",
    }))
}

fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_else(|| "unknown".into())
}
