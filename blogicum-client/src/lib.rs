pub mod error;
pub mod http_client;
pub mod models;

use error::BlogClientError;
use http_client::{read_empty, read_json, read_redirect, HttpClient};
use models::*;
use reqwest::Method;

/// Blogicum API client with one method per server route.
#[derive(Debug, Clone)]
pub struct BlogClient {
    http: HttpClient,
}

fn page_query(page: Option<&str>) -> Vec<(&'static str, String)> {
    page.map(|p| vec![("page", p.to_string())]).unwrap_or_default()
}

impl BlogClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, BlogClientError> {
        Ok(Self {
            http: HttpClient::new(base_url)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Set the JWT token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.http.set_token(token);
    }

    pub fn get_token(&self) -> Option<&String> {
        self.http.get_token()
    }

    pub fn clear_token(&mut self) {
        self.http.clear_token();
    }

    // ============== Auth ==============

    /// Registers and keeps the returned token.
    pub async fn register(&mut self, req: &RegisterRequest) -> Result<AuthResponse, BlogClientError> {
        let response = self
            .http
            .request(Method::POST, "/api/auth/register")
            .json(req)
            .send()
            .await?;
        let auth: AuthResponse = read_json(response).await?;
        self.set_token(auth.token.clone());
        Ok(auth)
    }

    /// Logs in and keeps the returned token.
    pub async fn login(
        &mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<AuthResponse, BlogClientError> {
        let req = LoginRequest {
            username: username.into(),
            password: password.into(),
        };
        tracing::debug!("Login called for username: {}", req.username);

        let response = self
            .http
            .request(Method::POST, "/api/auth/login")
            .json(&req)
            .send()
            .await?;
        let auth: AuthResponse = read_json(response).await?;
        self.set_token(auth.token.clone());
        Ok(auth)
    }

    // ============== Feeds ==============

    pub async fn home_feed(
        &self,
        page: Option<&str>,
        order: Option<&str>,
    ) -> Result<Page<Post>, BlogClientError> {
        let mut query = page_query(page);
        if let Some(order) = order {
            query.push(("order", order.to_string()));
        }
        let response = self
            .http
            .request(Method::GET, "/api/posts")
            .query(&query)
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn category_feed(
        &self,
        slug: &str,
        page: Option<&str>,
    ) -> Result<CategoryFeed, BlogClientError> {
        let response = self
            .http
            .request(Method::GET, &format!("/api/category/{}", path_segment(slug)))
            .query(&page_query(page))
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn profile_feed(
        &self,
        username: &str,
        page: Option<&str>,
    ) -> Result<ProfileFeed, BlogClientError> {
        let response = self
            .http
            .request(Method::GET, &format!("/api/profile/{}", path_segment(username)))
            .query(&page_query(page))
            .send()
            .await?;
        read_json(response).await
    }

    /// The token, when set, lets an author see their own hidden posts.
    pub async fn post_detail(&self, id: i64) -> Result<PostDetail, BlogClientError> {
        let response = self
            .http
            .request(Method::GET, &format!("/api/posts/{}", id))
            .send()
            .await?;
        read_json(response).await
    }

    // ============== Posts ==============

    pub async fn create_post(&self, form: &PostForm) -> Result<Redirected<Post>, BlogClientError> {
        let response = self
            .http
            .request(Method::POST, "/api/protected/posts")
            .json(form)
            .send()
            .await?;
        read_redirect(response).await
    }

    pub async fn post_form(&self, id: i64) -> Result<PostEditForm, BlogClientError> {
        let response = self
            .http
            .request(Method::GET, &format!("/api/protected/posts/{}", id))
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn update_post(
        &self,
        id: i64,
        form: &PostForm,
    ) -> Result<Redirected<Post>, BlogClientError> {
        let response = self
            .http
            .request(Method::PUT, &format!("/api/protected/posts/{}", id))
            .json(form)
            .send()
            .await?;
        read_redirect(response).await
    }

    pub async fn delete_post(&self, id: i64) -> Result<Redirected<()>, BlogClientError> {
        let response = self
            .http
            .request(Method::DELETE, &format!("/api/protected/posts/{}", id))
            .send()
            .await?;
        read_redirect(response).await
    }

    // ============== Comments ==============

    pub async fn add_comment(
        &self,
        post_id: i64,
        text: impl Into<String>,
    ) -> Result<Redirected<CommentRecord>, BlogClientError> {
        let form = CommentForm { text: text.into() };
        let response = self
            .http
            .request(Method::POST, &format!("/api/protected/posts/{}/comments", post_id))
            .json(&form)
            .send()
            .await?;
        read_redirect(response).await
    }

    pub async fn comment_form(
        &self,
        post_id: i64,
        comment_id: i64,
    ) -> Result<CommentEditForm, BlogClientError> {
        let response = self
            .http
            .request(Method::GET, &comment_path(post_id, comment_id))
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn update_comment(
        &self,
        post_id: i64,
        comment_id: i64,
        text: impl Into<String>,
    ) -> Result<Redirected<CommentRecord>, BlogClientError> {
        let form = CommentForm { text: text.into() };
        let response = self
            .http
            .request(Method::PUT, &comment_path(post_id, comment_id))
            .json(&form)
            .send()
            .await?;
        read_redirect(response).await
    }

    pub async fn delete_comment(
        &self,
        post_id: i64,
        comment_id: i64,
    ) -> Result<Redirected<()>, BlogClientError> {
        let response = self
            .http
            .request(Method::DELETE, &comment_path(post_id, comment_id))
            .send()
            .await?;
        read_redirect(response).await
    }

    // ============== Profile ==============

    pub async fn profile_form(&self) -> Result<ProfileEditForm, BlogClientError> {
        let response = self
            .http
            .request(Method::GET, "/api/protected/profile")
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn update_profile(
        &self,
        form: &ProfileForm,
    ) -> Result<Redirected<User>, BlogClientError> {
        let response = self
            .http
            .request(Method::PUT, "/api/protected/profile")
            .json(form)
            .send()
            .await?;
        read_redirect(response).await
    }

    // ============== Admin ==============

    pub async fn list_categories(
        &self,
        search: Option<&str>,
    ) -> Result<AdminListing<Category>, BlogClientError> {
        self.admin_list("/api/admin/categories", search).await
    }

    pub async fn category_detail(
        &self,
        id: i64,
    ) -> Result<AdminDetail<Category>, BlogClientError> {
        let response = self
            .http
            .request(Method::GET, &format!("/api/admin/categories/{}", id))
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn create_category(&self, req: &NewCategory) -> Result<Category, BlogClientError> {
        let response = self
            .http
            .request(Method::POST, "/api/admin/categories")
            .json(req)
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn update_category(
        &self,
        id: i64,
        req: &CategoryUpdate,
    ) -> Result<Category, BlogClientError> {
        let response = self
            .http
            .request(Method::PUT, &format!("/api/admin/categories/{}", id))
            .json(req)
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn delete_category(&self, id: i64) -> Result<(), BlogClientError> {
        let response = self
            .http
            .request(Method::DELETE, &format!("/api/admin/categories/{}", id))
            .send()
            .await?;
        read_empty(response).await
    }

    pub async fn list_locations(
        &self,
        search: Option<&str>,
    ) -> Result<AdminListing<Location>, BlogClientError> {
        self.admin_list("/api/admin/locations", search).await
    }

    pub async fn location_detail(
        &self,
        id: i64,
    ) -> Result<AdminDetail<Location>, BlogClientError> {
        let response = self
            .http
            .request(Method::GET, &format!("/api/admin/locations/{}", id))
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn create_location(&self, req: &NewLocation) -> Result<Location, BlogClientError> {
        let response = self
            .http
            .request(Method::POST, "/api/admin/locations")
            .json(req)
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn update_location(
        &self,
        id: i64,
        req: &LocationUpdate,
    ) -> Result<Location, BlogClientError> {
        let response = self
            .http
            .request(Method::PUT, &format!("/api/admin/locations/{}", id))
            .json(req)
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn delete_location(&self, id: i64) -> Result<(), BlogClientError> {
        let response = self
            .http
            .request(Method::DELETE, &format!("/api/admin/locations/{}", id))
            .send()
            .await?;
        read_empty(response).await
    }

    pub async fn list_admin_posts(
        &self,
        filter: &AdminPostFilter,
    ) -> Result<AdminListing<Post>, BlogClientError> {
        let response = self
            .http
            .request(Method::GET, "/api/admin/posts")
            .query(filter)
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn update_admin_post(
        &self,
        id: i64,
        update: &AdminPostUpdate,
    ) -> Result<PostRecord, BlogClientError> {
        let response = self
            .http
            .request(Method::PUT, &format!("/api/admin/posts/{}", id))
            .json(update)
            .send()
            .await?;
        read_json(response).await
    }

    async fn admin_list<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        search: Option<&str>,
    ) -> Result<AdminListing<T>, BlogClientError> {
        let query: Vec<(&str, &str)> = search.map(|q| vec![("q", q)]).unwrap_or_default();
        let response = self
            .http
            .request(Method::GET, path)
            .query(&query)
            .send()
            .await?;
        read_json(response).await
    }
}

/// Percent-encodes a slug or username for use as one path segment.
fn path_segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

fn comment_path(post_id: i64, comment_id: i64) -> String {
    format!("/api/protected/posts/{}/comments/{}", post_id, comment_id)
}
