use crate::application::{AdminService, AuthService, BlogService, CommentService, ProfileService};
use crate::data::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};
use crate::infrastructure::jwt::JwtService;
use crate::presentation::{admin_handlers, http_handlers, middleware::jwt_middleware};
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;
use std::sync::Arc;

/// Everything the handlers pull out of `app_data`.
#[derive(Clone)]
pub struct Services {
    pub auth: Arc<AuthService>,
    pub blog: Arc<BlogService>,
    pub comments: Arc<CommentService>,
    pub profiles: Arc<ProfileService>,
    pub admin: Arc<AdminService>,
    pub jwt: Arc<JwtService>,
}

impl Services {
    pub fn new(
        user_repo: Arc<dyn UserRepository + Send + Sync>,
        post_repo: Arc<dyn PostRepository + Send + Sync>,
        comment_repo: Arc<dyn CommentRepository + Send + Sync>,
        category_repo: Arc<dyn CategoryRepository + Send + Sync>,
        location_repo: Arc<dyn LocationRepository + Send + Sync>,
        jwt: Arc<JwtService>,
    ) -> Self {
        Self {
            auth: Arc::new(AuthService::new(user_repo.clone(), jwt.clone())),
            blog: Arc::new(BlogService::new(
                post_repo.clone(),
                comment_repo.clone(),
                category_repo.clone(),
                location_repo.clone(),
                user_repo.clone(),
            )),
            comments: Arc::new(CommentService::new(post_repo.clone(), comment_repo)),
            profiles: Arc::new(ProfileService::new(user_repo.clone())),
            admin: Arc::new(AdminService::new(
                user_repo,
                category_repo,
                location_repo,
                post_repo,
            )),
            jwt,
        }
    }

    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.auth.clone()))
            .app_data(web::Data::new(self.blog.clone()))
            .app_data(web::Data::new(self.comments.clone()))
            .app_data(web::Data::new(self.profiles.clone()))
            .app_data(web::Data::new(self.admin.clone()))
            .app_data(web::Data::new(self.jwt.clone()));
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    let auth_middleware = HttpAuthentication::bearer(jwt_middleware);

    cfg
        // Public routes - authentication
        .service(
            web::scope("/api/auth")
                .route("/register", web::post().to(http_handlers::register))
                .route("/login", web::post().to(http_handlers::login)),
        )
        // Public routes - feeds and post detail
        .service(
            web::scope("/api/posts")
                .route("", web::get().to(http_handlers::home_feed))
                .route("/{id}", web::get().to(http_handlers::post_detail)),
        )
        .route(
            "/api/category/{slug}",
            web::get().to(http_handlers::category_feed),
        )
        .route(
            "/api/profile/{username}",
            web::get().to(http_handlers::profile_feed),
        )
        // Protected routes - writes by logged in users
        .service(
            web::scope("/api/protected")
                .wrap(auth_middleware.clone())
                .route("/posts", web::post().to(http_handlers::create_post))
                .route("/posts/{id}", web::get().to(http_handlers::post_form))
                .route("/posts/{id}", web::put().to(http_handlers::update_post))
                .route("/posts/{id}", web::delete().to(http_handlers::delete_post))
                .route(
                    "/posts/{id}/comments",
                    web::post().to(http_handlers::add_comment),
                )
                .route(
                    "/posts/{id}/comments/{comment_id}",
                    web::get().to(http_handlers::comment_form),
                )
                .route(
                    "/posts/{id}/comments/{comment_id}",
                    web::put().to(http_handlers::update_comment),
                )
                .route(
                    "/posts/{id}/comments/{comment_id}",
                    web::delete().to(http_handlers::delete_comment),
                )
                .route("/profile", web::get().to(http_handlers::profile_form))
                .route("/profile", web::put().to(http_handlers::update_profile)),
        )
        // Staff-only backoffice
        .service(
            web::scope("/api/admin")
                .wrap(auth_middleware)
                .route("/categories", web::get().to(admin_handlers::list_categories))
                .route("/categories", web::post().to(admin_handlers::create_category))
                .route("/categories/{id}", web::get().to(admin_handlers::category_detail))
                .route("/categories/{id}", web::put().to(admin_handlers::update_category))
                .route(
                    "/categories/{id}",
                    web::delete().to(admin_handlers::delete_category),
                )
                .route("/locations", web::get().to(admin_handlers::list_locations))
                .route("/locations", web::post().to(admin_handlers::create_location))
                .route("/locations/{id}", web::get().to(admin_handlers::location_detail))
                .route("/locations/{id}", web::put().to(admin_handlers::update_location))
                .route(
                    "/locations/{id}",
                    web::delete().to(admin_handlers::delete_location),
                )
                .route("/posts", web::get().to(admin_handlers::list_posts))
                .route("/posts/{id}", web::put().to(admin_handlers::update_post)),
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryStore;
    use crate::domain::User;
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, App};
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};

    fn services(store: &Arc<InMemoryStore>) -> Services {
        Services::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(JwtService::new("test-secret-that-is-long-enough-1234")),
        )
    }

    fn bearer(services: &Services, user: &User) -> (header::HeaderName, String) {
        let token = services.jwt.generate_token(user.id, &user.username).unwrap();
        (header::AUTHORIZATION, format!("Bearer {}", token))
    }

    macro_rules! app {
        ($services:expr) => {{
            let services = $services.clone();
            test::init_service(App::new().configure(move |cfg| {
                services.register(cfg);
                configure(cfg);
            }))
            .await
        }};
    }

    #[actix_rt::test]
    async fn register_and_login() {
        let store = Arc::new(InMemoryStore::new());
        let app = app!(services(&store));

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "username": "anna",
                "email": "anna@example.com",
                "password": "correct-horse"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["user"]["username"], "anna");
        assert!(body["token"].is_string());

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "username": "anna", "password": "wrong-horse" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn home_feed_pages() {
        let store = Arc::new(InMemoryStore::new());
        let author = store.seed_user("author", false);
        let open = store.seed_category("open", true);
        for hours in 1..=11 {
            store.seed_post(author.id, Some(open.id), true, Duration::hours(hours));
        }
        let app = app!(services(&store));

        let req = test::TestRequest::get().uri("/api/posts?page=2").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["num_pages"], 2);
        assert_eq!(body["has_previous"], true);
        assert_eq!(body["items"][0]["comment_count"], 0);

        for uri in ["/api/posts?page=3", "/api/posts?page=abc", "/api/posts?page=0"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
        }

        let req = test::TestRequest::get().uri("/api/posts?page=last&order=id").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_rt::test]
    async fn hidden_post_is_404_except_for_its_author() {
        let store = Arc::new(InMemoryStore::new());
        let author = store.seed_user("author", false);
        let reader = store.seed_user("reader", false);
        let open = store.seed_category("open", true);
        let draft = store.seed_post(author.id, Some(open.id), false, Duration::hours(1));
        let services = services(&store);
        let app = app!(services);

        let uri = format!("/api/posts/{}", draft.id);

        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header(bearer(&services, &reader))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header(bearer(&services, &author))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["post"]["id"], draft.id);
        assert_eq!(body["form"]["text"], "");
    }

    #[actix_rt::test]
    async fn create_post_redirects_to_profile() {
        let store = Arc::new(InMemoryStore::new());
        let author = store.seed_user("author", false);
        let open = store.seed_category("open", true);
        let services = services(&store);
        let app = app!(services);

        let req = test::TestRequest::post()
            .uri("/api/protected/posts")
            .insert_header(bearer(&services, &author))
            .set_json(json!({
                "title": "Заголовок",
                "text": "Текст",
                "pub_date": Utc::now(),
                "category_id": open.id
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/api/profile/author"
        );
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["author"]["username"], "author");
    }

    #[actix_rt::test]
    async fn profile_redirect_for_non_ascii_username_is_encoded() {
        let store = Arc::new(InMemoryStore::new());
        let author = store.seed_user("анна", false);
        let open = store.seed_category("open", true);
        let services = services(&store);
        let app = app!(services);

        let req = test::TestRequest::post()
            .uri("/api/protected/posts")
            .insert_header(bearer(&services, &author))
            .set_json(json!({
                "title": "Заголовок",
                "text": "Текст",
                "pub_date": Utc::now(),
                "category_id": open.id
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let location = resp
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert_eq!(location, "/api/profile/%D0%B0%D0%BD%D0%BD%D0%B0");

        // Закодированный адрес ведёт на тот же профиль
        let req = test::TestRequest::get().uri(&location).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["profile"]["username"], "анна");
        assert_eq!(body["posts"]["total"], 1);
    }

    #[actix_rt::test]
    async fn invalid_post_form_lists_field_errors() {
        let store = Arc::new(InMemoryStore::new());
        let author = store.seed_user("author", false);
        let services = services(&store);
        let app = app!(services);

        let req = test::TestRequest::post()
            .uri("/api/protected/posts")
            .insert_header(bearer(&services, &author))
            .set_json(json!({ "title": "", "text": "" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        for field in ["title", "text", "pub_date", "category_id"] {
            assert!(body["fields"][field].is_array(), "{field}");
        }
    }

    #[actix_rt::test]
    async fn non_author_edit_is_redirected_to_detail() {
        let store = Arc::new(InMemoryStore::new());
        let author = store.seed_user("author", false);
        let intruder = store.seed_user("intruder", false);
        let open = store.seed_category("open", true);
        let post = store.seed_post(author.id, Some(open.id), true, Duration::hours(1));
        let services = services(&store);
        let app = app!(services);

        let uri = format!("/api/protected/posts/{}", post.id);
        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&services, &intruder))
            .set_json(json!({
                "title": "Взлом",
                "text": "Текст",
                "pub_date": Utc::now(),
                "category_id": open.id
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap().to_str().unwrap(),
            format!("/api/posts/{}", post.id)
        );
        assert_eq!(store.post(post.id).unwrap().title, post.title);

        let req = test::TestRequest::delete()
            .uri(&uri)
            .insert_header(bearer(&services, &intruder))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert!(store.post(post.id).is_some());
    }

    #[actix_rt::test]
    async fn comment_flow() {
        let store = Arc::new(InMemoryStore::new());
        let author = store.seed_user("author", false);
        let reader = store.seed_user("reader", false);
        let open = store.seed_category("open", true);
        let post = store.seed_post(author.id, Some(open.id), true, Duration::hours(1));
        let scheduled = store.seed_post(author.id, Some(open.id), true, Duration::days(-1));
        let services = services(&store);
        let app = app!(services);

        let req = test::TestRequest::post()
            .uri(&format!("/api/protected/posts/{}/comments", post.id))
            .insert_header(bearer(&services, &reader))
            .set_json(json!({ "text": "Отличная статья" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let body: Value = test::read_body_json(resp).await;
        let comment_id = body["data"]["id"].as_i64().unwrap();

        let req = test::TestRequest::post()
            .uri(&format!("/api/protected/posts/{}/comments", scheduled.id))
            .insert_header(bearer(&services, &reader))
            .set_json(json!({ "text": "Рано" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let comment_uri = format!("/api/protected/posts/{}/comments/{}", post.id, comment_id);
        let req = test::TestRequest::delete()
            .uri(&comment_uri)
            .insert_header(bearer(&services, &author))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);

        let req = test::TestRequest::delete()
            .uri(&comment_uri)
            .insert_header(bearer(&services, &reader))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert!(store.comment(comment_id).is_none());
    }

    #[actix_rt::test]
    async fn protected_routes_require_a_token() {
        let store = Arc::new(InMemoryStore::new());
        let app = app!(services(&store));

        let req = test::TestRequest::get().uri("/api/protected/profile").to_request();
        let status = match test::try_call_service(&app, req).await {
            Ok(resp) => resp.status(),
            Err(err) => err.as_response_error().status_code(),
        };
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn admin_api_is_staff_only() {
        let store = Arc::new(InMemoryStore::new());
        let staff = store.seed_user("admin", true);
        let regular = store.seed_user("anna", false);
        let services = services(&store);
        let app = app!(services);

        let req = test::TestRequest::get()
            .uri("/api/admin/categories")
            .insert_header(bearer(&services, &regular))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri("/api/admin/categories")
            .insert_header(bearer(&services, &staff))
            .set_json(json!({
                "title": "Путешествия",
                "description": "Куда поехать",
                "slug": "travel"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["is_published"], true);

        let req = test::TestRequest::get()
            .uri("/api/category/travel")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["category"]["slug"], "travel");
        assert_eq!(body["posts"]["total"], 0);
    }
}
