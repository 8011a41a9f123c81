use crate::domain::DomainError;
use crate::infrastructure::jwt::JwtService;
use actix_web::{dev::ServiceRequest, web, Error, HttpMessage, HttpRequest};
use actix_web_httpauth::extractors::bearer::{BearerAuth, Config};
use actix_web_httpauth::extractors::AuthenticationError;
use std::sync::Arc;

/// Identity put into request extensions by `jwt_middleware`. Only the id:
/// the username in the token goes stale after a profile rename.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i64,
}

pub async fn jwt_middleware(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let jwt_service = match req.app_data::<web::Data<Arc<JwtService>>>() {
        Some(service) => service.get_ref().clone(),
        None => {
            return Err((
                actix_web::error::ErrorInternalServerError("JWT service not configured"),
                req,
            ));
        }
    };

    match jwt_service.verify_token(credentials.token()) {
        Ok(claims) => {
            req.extensions_mut().insert(AuthenticatedUser { id: claims.user_id });
            Ok(req)
        }
        Err(_) => {
            let config = req.app_data::<Config>().cloned().unwrap_or_default();
            Err((AuthenticationError::from(config).into(), req))
        }
    }
}

// user_id из расширений запроса, его кладёт jwt_middleware
pub fn current_user_id(req: &HttpRequest) -> Result<i64, DomainError> {
    req.extensions()
        .get::<AuthenticatedUser>()
        .map(|user| user.id)
        .ok_or_else(|| DomainError::Unauthorized("User not authenticated".to_string()))
}

/// Who is looking at a public page. A missing or invalid token means an
/// anonymous viewer, never an error.
pub fn viewer_id(jwt_service: &JwtService, credentials: Option<&BearerAuth>) -> Option<i64> {
    credentials
        .and_then(|auth| jwt_service.verify_token(auth.token()).ok())
        .map(|claims| claims.user_id)
}
