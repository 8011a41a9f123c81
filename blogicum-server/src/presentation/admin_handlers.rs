use crate::application::AdminService;
use crate::domain::category::{CategoryUpdate, NewCategory};
use crate::domain::location::{LocationUpdate, NewLocation};
use crate::domain::post::PostAdminUpdate;
use crate::domain::query::AdminPostFilter;
use crate::presentation::http_handlers::error_to_response;
use crate::presentation::middleware::current_user_id;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

macro_rules! staff_id {
    ($req:expr) => {
        match current_user_id(&$req) {
            Ok(id) => id,
            Err(err) => return error_to_response(err),
        }
    };
}

// ============== Categories ==============

pub async fn list_categories(
    req: HttpRequest,
    admin_service: web::Data<Arc<AdminService>>,
    query: web::Query<SearchQuery>,
) -> impl Responder {
    let user_id = staff_id!(req);
    match admin_service
        .list_categories(user_id, query.q.as_deref())
        .await
    {
        Ok(listing) => HttpResponse::Ok().json(listing),
        Err(err) => error_to_response(err),
    }
}

pub async fn category_detail(
    req: HttpRequest,
    admin_service: web::Data<Arc<AdminService>>,
    path: web::Path<i64>,
) -> impl Responder {
    let user_id = staff_id!(req);
    match admin_service.category_detail(user_id, path.into_inner()).await {
        Ok(detail) => HttpResponse::Ok().json(detail),
        Err(err) => error_to_response(err),
    }
}

pub async fn create_category(
    req: HttpRequest,
    admin_service: web::Data<Arc<AdminService>>,
    body: web::Json<NewCategory>,
) -> impl Responder {
    let user_id = staff_id!(req);
    match admin_service
        .create_category(user_id, body.into_inner())
        .await
    {
        Ok(category) => HttpResponse::Created().json(category),
        Err(err) => error_to_response(err),
    }
}

pub async fn update_category(
    req: HttpRequest,
    admin_service: web::Data<Arc<AdminService>>,
    path: web::Path<i64>,
    body: web::Json<CategoryUpdate>,
) -> impl Responder {
    let user_id = staff_id!(req);
    match admin_service
        .update_category(user_id, path.into_inner(), body.into_inner())
        .await
    {
        Ok(category) => HttpResponse::Ok().json(category),
        Err(err) => error_to_response(err),
    }
}

pub async fn delete_category(
    req: HttpRequest,
    admin_service: web::Data<Arc<AdminService>>,
    path: web::Path<i64>,
) -> impl Responder {
    let user_id = staff_id!(req);
    match admin_service.delete_category(user_id, path.into_inner()).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => error_to_response(err),
    }
}

// ============== Locations ==============

pub async fn list_locations(
    req: HttpRequest,
    admin_service: web::Data<Arc<AdminService>>,
    query: web::Query<SearchQuery>,
) -> impl Responder {
    let user_id = staff_id!(req);
    match admin_service
        .list_locations(user_id, query.q.as_deref())
        .await
    {
        Ok(listing) => HttpResponse::Ok().json(listing),
        Err(err) => error_to_response(err),
    }
}

pub async fn location_detail(
    req: HttpRequest,
    admin_service: web::Data<Arc<AdminService>>,
    path: web::Path<i64>,
) -> impl Responder {
    let user_id = staff_id!(req);
    match admin_service.location_detail(user_id, path.into_inner()).await {
        Ok(detail) => HttpResponse::Ok().json(detail),
        Err(err) => error_to_response(err),
    }
}

pub async fn create_location(
    req: HttpRequest,
    admin_service: web::Data<Arc<AdminService>>,
    body: web::Json<NewLocation>,
) -> impl Responder {
    let user_id = staff_id!(req);
    match admin_service
        .create_location(user_id, body.into_inner())
        .await
    {
        Ok(location) => HttpResponse::Created().json(location),
        Err(err) => error_to_response(err),
    }
}

pub async fn update_location(
    req: HttpRequest,
    admin_service: web::Data<Arc<AdminService>>,
    path: web::Path<i64>,
    body: web::Json<LocationUpdate>,
) -> impl Responder {
    let user_id = staff_id!(req);
    match admin_service
        .update_location(user_id, path.into_inner(), body.into_inner())
        .await
    {
        Ok(location) => HttpResponse::Ok().json(location),
        Err(err) => error_to_response(err),
    }
}

pub async fn delete_location(
    req: HttpRequest,
    admin_service: web::Data<Arc<AdminService>>,
    path: web::Path<i64>,
) -> impl Responder {
    let user_id = staff_id!(req);
    match admin_service.delete_location(user_id, path.into_inner()).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => error_to_response(err),
    }
}

// ============== Posts ==============

pub async fn list_posts(
    req: HttpRequest,
    admin_service: web::Data<Arc<AdminService>>,
    filter: web::Query<AdminPostFilter>,
) -> impl Responder {
    let user_id = staff_id!(req);
    match admin_service.list_posts(user_id, filter.into_inner()).await {
        Ok(listing) => HttpResponse::Ok().json(listing),
        Err(err) => error_to_response(err),
    }
}

pub async fn update_post(
    req: HttpRequest,
    admin_service: web::Data<Arc<AdminService>>,
    path: web::Path<i64>,
    body: web::Json<PostAdminUpdate>,
) -> impl Responder {
    let user_id = staff_id!(req);
    match admin_service
        .update_post(user_id, path.into_inner(), body.into_inner())
        .await
    {
        Ok(post) => HttpResponse::Ok().json(post),
        Err(err) => error_to_response(err),
    }
}
