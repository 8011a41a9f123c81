use crate::application::{
    Access, AuthService, BlogService, CommentService, ProfileService, Redirect, WriteOutcome,
};
use crate::domain::comment::CommentForm;
use crate::domain::post::PostForm;
use crate::domain::user::{LoginUserRequest, RegisterUserRequest, UpdateProfileRequest};
use crate::domain::{DomainError, PageRequest, PostOrdering};
use crate::infrastructure::jwt::JwtService;
use crate::presentation::middleware::{current_user_id, viewer_id};
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// Параметры ленты
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub page: Option<String>,
    #[serde(default)]
    pub order: PostOrdering,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

// Преобразование DomainError в HttpResponse
pub(crate) fn error_to_response(err: DomainError) -> HttpResponse {
    let status_code = err.to_status_code();
    let message = err.to_string();

    match (status_code, err) {
        (400, DomainError::Validation(fields)) => HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "Validation failed", "fields": fields })),
        (400, _) => HttpResponse::BadRequest().json(serde_json::json!({ "error": message })),
        (401, _) => HttpResponse::Unauthorized().json(serde_json::json!({ "error": message })),
        (403, _) => HttpResponse::Forbidden().json(serde_json::json!({ "error": message })),
        (404, _) => HttpResponse::NotFound().json(serde_json::json!({ "error": message })),
        (409, _) => HttpResponse::Conflict().json(serde_json::json!({ "error": message })),
        _ => {
            tracing::error!("Request failed: {}", message);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "Internal server error" }))
        }
    }
}

/// 302 back to where a refused requester belongs.
pub(crate) fn refused_response(redirect: Redirect) -> HttpResponse {
    let location = redirect.location();
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.clone()))
        .json(serde_json::json!({ "redirect_to": location }))
}

/// 303 to the next page after a write, or 302 when it was refused.
pub(crate) fn outcome_to_response<T: Serialize>(outcome: WriteOutcome<T>) -> HttpResponse {
    match outcome {
        WriteOutcome::Done { value, redirect } => {
            let location = redirect.location();
            HttpResponse::SeeOther()
                .insert_header((header::LOCATION, location.clone()))
                .json(serde_json::json!({ "redirect_to": location, "data": value }))
        }
        WriteOutcome::Refused(redirect) => refused_response(redirect),
    }
}

pub(crate) fn access_to_response<T: Serialize>(access: Access<T>) -> HttpResponse {
    match access {
        Access::Granted(form) => HttpResponse::Ok().json(form),
        Access::Redirected(redirect) => refused_response(redirect),
    }
}

fn page_from(raw: Option<&str>) -> Result<PageRequest, HttpResponse> {
    PageRequest::parse(raw).map_err(error_to_response)
}

// ============== Auth Handlers ==============

pub async fn register(
    auth_service: web::Data<Arc<AuthService>>,
    req: web::Json<RegisterUserRequest>,
) -> impl Responder {
    match auth_service.register(req.into_inner()).await {
        Ok(auth) => HttpResponse::Created().json(auth),
        Err(err) => error_to_response(err),
    }
}

pub async fn login(
    auth_service: web::Data<Arc<AuthService>>,
    req: web::Json<LoginUserRequest>,
) -> impl Responder {
    match auth_service.login(req.into_inner()).await {
        Ok(auth) => HttpResponse::Ok().json(auth),
        Err(err) => error_to_response(err),
    }
}

// ============== Feeds ==============

pub async fn home_feed(
    blog_service: web::Data<Arc<BlogService>>,
    query: web::Query<FeedQuery>,
) -> impl Responder {
    let page = match page_from(query.page.as_deref()) {
        Ok(page) => page,
        Err(resp) => return resp,
    };

    tracing::debug!("Home feed: page={:?}, order={:?}", page, query.order);

    match blog_service.home_feed(page, query.order).await {
        Ok(posts) => HttpResponse::Ok().json(posts),
        Err(err) => error_to_response(err),
    }
}

pub async fn category_feed(
    blog_service: web::Data<Arc<BlogService>>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    let page = match page_from(query.page.as_deref()) {
        Ok(page) => page,
        Err(resp) => return resp,
    };

    match blog_service.category_feed(&path.into_inner(), page).await {
        Ok(feed) => HttpResponse::Ok().json(feed),
        Err(err) => error_to_response(err),
    }
}

pub async fn profile_feed(
    blog_service: web::Data<Arc<BlogService>>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    let page = match page_from(query.page.as_deref()) {
        Ok(page) => page,
        Err(resp) => return resp,
    };

    match blog_service.profile_feed(&path.into_inner(), page).await {
        Ok(feed) => HttpResponse::Ok().json(feed),
        Err(err) => error_to_response(err),
    }
}

pub async fn post_detail(
    blog_service: web::Data<Arc<BlogService>>,
    jwt_service: web::Data<Arc<JwtService>>,
    credentials: Option<BearerAuth>,
    path: web::Path<i64>,
) -> impl Responder {
    let post_id = path.into_inner();
    let viewer = viewer_id(&jwt_service, credentials.as_ref());

    tracing::debug!("Post detail id={} for viewer={:?}", post_id, viewer);

    match blog_service.post_detail(post_id, viewer).await {
        Ok(detail) => HttpResponse::Ok().json(detail),
        Err(err) => error_to_response(err),
    }
}

// ============== Post Handlers ==============

pub async fn create_post(
    req: HttpRequest,
    blog_service: web::Data<Arc<BlogService>>,
    form: web::Json<PostForm>,
) -> impl Responder {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(err) => return error_to_response(err),
    };

    match blog_service.create_post(user_id, form.into_inner()).await {
        Ok(outcome) => outcome_to_response(outcome),
        Err(err) => error_to_response(err),
    }
}

pub async fn post_form(
    req: HttpRequest,
    blog_service: web::Data<Arc<BlogService>>,
    path: web::Path<i64>,
) -> impl Responder {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(err) => return error_to_response(err),
    };

    match blog_service.post_form(path.into_inner(), user_id).await {
        Ok(access) => access_to_response(access),
        Err(err) => error_to_response(err),
    }
}

pub async fn update_post(
    req: HttpRequest,
    blog_service: web::Data<Arc<BlogService>>,
    path: web::Path<i64>,
    form: web::Json<PostForm>,
) -> impl Responder {
    let post_id = path.into_inner();
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(err) => return error_to_response(err),
    };

    tracing::info!("Updating post id={} for user_id={}", post_id, user_id);

    match blog_service
        .update_post(post_id, user_id, form.into_inner())
        .await
    {
        Ok(outcome) => outcome_to_response(outcome),
        Err(err) => error_to_response(err),
    }
}

pub async fn delete_post(
    req: HttpRequest,
    blog_service: web::Data<Arc<BlogService>>,
    path: web::Path<i64>,
) -> impl Responder {
    let post_id = path.into_inner();
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(err) => return error_to_response(err),
    };

    tracing::info!("Deleting post id={} for user_id={}", post_id, user_id);

    match blog_service.delete_post(post_id, user_id).await {
        Ok(outcome) => outcome_to_response(outcome),
        Err(err) => error_to_response(err),
    }
}

// ============== Comment Handlers ==============

pub async fn add_comment(
    req: HttpRequest,
    comment_service: web::Data<Arc<CommentService>>,
    path: web::Path<i64>,
    form: web::Json<CommentForm>,
) -> impl Responder {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(err) => return error_to_response(err),
    };

    match comment_service
        .add_comment(path.into_inner(), user_id, form.into_inner())
        .await
    {
        Ok(outcome) => outcome_to_response(outcome),
        Err(err) => error_to_response(err),
    }
}

pub async fn comment_form(
    req: HttpRequest,
    comment_service: web::Data<Arc<CommentService>>,
    path: web::Path<(i64, i64)>,
) -> impl Responder {
    let (post_id, comment_id) = path.into_inner();
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(err) => return error_to_response(err),
    };

    match comment_service
        .comment_form(post_id, comment_id, user_id)
        .await
    {
        Ok(access) => access_to_response(access),
        Err(err) => error_to_response(err),
    }
}

pub async fn update_comment(
    req: HttpRequest,
    comment_service: web::Data<Arc<CommentService>>,
    path: web::Path<(i64, i64)>,
    form: web::Json<CommentForm>,
) -> impl Responder {
    let (post_id, comment_id) = path.into_inner();
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(err) => return error_to_response(err),
    };

    match comment_service
        .update_comment(post_id, comment_id, user_id, form.into_inner())
        .await
    {
        Ok(outcome) => outcome_to_response(outcome),
        Err(err) => error_to_response(err),
    }
}

pub async fn delete_comment(
    req: HttpRequest,
    comment_service: web::Data<Arc<CommentService>>,
    path: web::Path<(i64, i64)>,
) -> impl Responder {
    let (post_id, comment_id) = path.into_inner();
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(err) => return error_to_response(err),
    };

    match comment_service
        .delete_comment(post_id, comment_id, user_id)
        .await
    {
        Ok(outcome) => outcome_to_response(outcome),
        Err(err) => error_to_response(err),
    }
}

// ============== Profile Handlers ==============

pub async fn profile_form(
    req: HttpRequest,
    profile_service: web::Data<Arc<ProfileService>>,
) -> impl Responder {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(err) => return error_to_response(err),
    };

    match profile_service.current(user_id).await {
        Ok(form) => HttpResponse::Ok().json(form),
        Err(err) => error_to_response(err),
    }
}

pub async fn update_profile(
    req: HttpRequest,
    profile_service: web::Data<Arc<ProfileService>>,
    form: web::Json<UpdateProfileRequest>,
) -> impl Responder {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(err) => return error_to_response(err),
    };

    match profile_service.update(user_id, form.into_inner()).await {
        Ok(outcome) => outcome_to_response(outcome),
        Err(err) => error_to_response(err),
    }
}
