//! In-memory repositories used by the service and handler tests. They honor
//! the same foreign-key rules as the migrations: deleting a post removes its
//! comments, deleting a category or location clears the reference on posts.

use crate::data::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};
use crate::domain::category::{CategorySummary, CategoryUpdate, NewCategory};
use crate::domain::comment::CommentForm;
use crate::domain::location::{LocationSummary, LocationUpdate, NewLocation};
use crate::domain::post::{PostAdminUpdate, PostForm};
use crate::domain::query::AdminPostFilter;
use crate::domain::user::{AuthorSummary, RegisterUserRequest, UpdateProfileRequest};
use crate::domain::{
    Category, Comment, CommentView, DomainError, Location, Post, PostOrdering, PostQuery,
    PostView, User,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    categories: Vec<Category>,
    locations: Vec<Location>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn view(&self, post: &Post) -> PostView {
        let author = self
            .users
            .iter()
            .find(|u| u.id == post.author_id)
            .map(|u| AuthorSummary {
                id: u.id,
                username: u.username.clone(),
            })
            .unwrap_or(AuthorSummary {
                id: post.author_id,
                username: String::new(),
            });
        let location = post.location_id.and_then(|id| {
            self.locations.iter().find(|l| l.id == id).map(|l| LocationSummary {
                id: l.id,
                name: l.name.clone(),
                is_published: l.is_published,
            })
        });
        let category = post.category_id.and_then(|id| {
            self.categories.iter().find(|c| c.id == id).map(|c| CategorySummary {
                id: c.id,
                title: c.title.clone(),
                slug: c.slug.clone(),
                is_published: c.is_published,
            })
        });
        PostView {
            id: post.id,
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: post.pub_date,
            image: post.image.clone(),
            is_published: post.is_published,
            created_at: post.created_at,
            author,
            location,
            category,
            comment_count: self.comments.iter().filter(|c| c.post_id == post.id).count() as i64,
        }
    }

    fn matching(&self, query: &PostQuery) -> Vec<PostView> {
        let mut posts: Vec<PostView> = self
            .posts
            .iter()
            .map(|p| self.view(p))
            .filter(|p| query.matches(p))
            .collect();
        match query.ordering {
            PostOrdering::PubDateDesc => {
                posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)))
            }
            PostOrdering::IdAsc => posts.sort_by_key(|p| p.id),
        }
        posts
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("store lock poisoned")
    }

    pub fn seed_user(&self, username: &str, is_staff: bool) -> User {
        let mut tables = self.lock();
        let user = User {
            id: tables.next_id(),
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: format!("{username}@example.com"),
            password_hash: String::new(),
            is_staff,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        user
    }

    pub fn seed_category(&self, slug: &str, is_published: bool) -> Category {
        let mut tables = self.lock();
        let category = Category {
            id: tables.next_id(),
            title: slug.to_uppercase(),
            description: format!("About {slug}"),
            slug: slug.to_string(),
            is_published,
            created_at: Utc::now(),
        };
        tables.categories.push(category.clone());
        category
    }

    pub fn seed_location(&self, name: &str) -> Location {
        let mut tables = self.lock();
        let location = Location {
            id: tables.next_id(),
            name: name.to_string(),
            is_published: true,
            created_at: Utc::now(),
        };
        tables.locations.push(location.clone());
        location
    }

    /// A post published `age` ago; a negative age schedules it.
    pub fn seed_post(
        &self,
        author_id: i64,
        category_id: Option<i64>,
        is_published: bool,
        age: Duration,
    ) -> Post {
        let mut tables = self.lock();
        let id = tables.next_id();
        let post = Post {
            id,
            title: format!("Post {id}"),
            text: "Lorem ipsum".into(),
            pub_date: Utc::now() - age,
            image: None,
            is_published,
            created_at: Utc::now(),
            author_id,
            location_id: None,
            category_id,
        };
        tables.posts.push(post.clone());
        post
    }

    pub fn seed_comment(&self, author_id: i64, post_id: i64, text: &str) -> Comment {
        let mut tables = self.lock();
        let comment = Comment {
            id: tables.next_id(),
            text: text.to_string(),
            is_published: true,
            created_at: Utc::now(),
            author_id,
            post_id,
        };
        tables.comments.push(comment.clone());
        comment
    }

    pub fn post(&self, id: i64) -> Option<Post> {
        self.lock().posts.iter().find(|p| p.id == id).cloned()
    }

    pub fn comment(&self, id: i64) -> Option<Comment> {
        self.lock().comments.iter().find(|c| c.id == id).cloned()
    }

    pub fn user(&self, id: i64) -> Option<User> {
        self.lock().users.iter().find(|u| u.id == id).cloned()
    }

    pub fn set_password_hash(&self, user_id: i64, hash: String) {
        if let Some(user) = self.lock().users.iter_mut().find(|u| u.id == user_id) {
            user.password_hash = hash;
        }
    }
}

fn title_contains(title: &str, term: &str) -> bool {
    title.to_lowercase().contains(&term.to_lowercase())
}

fn search_term(search: Option<&str>) -> Option<&str> {
    search.map(str::trim).filter(|s| !s.is_empty())
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(
        &self,
        req: RegisterUserRequest,
        password_hash: String,
    ) -> Result<User, DomainError> {
        let mut tables = self.lock();
        if tables
            .users
            .iter()
            .any(|u| u.username == req.username || u.email == req.email)
        {
            return Err(DomainError::UserAlreadyExists);
        }
        let user = User {
            id: tables.next_id(),
            username: req.username,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            password_hash,
            is_staff: false,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<User, DomainError> {
        self.lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(DomainError::UserNotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, DomainError> {
        self.lock()
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(DomainError::UserNotFound)
    }

    async fn find_by_id(&self, id: i64) -> Result<User, DomainError> {
        self.user(id).ok_or(DomainError::UserNotFound)
    }

    async fn update_profile(
        &self,
        id: i64,
        req: &UpdateProfileRequest,
    ) -> Result<User, DomainError> {
        let mut tables = self.lock();
        if tables
            .users
            .iter()
            .any(|u| u.id != id && (u.username == req.username || u.email == req.email))
        {
            return Err(DomainError::UserAlreadyExists);
        }
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(DomainError::UserNotFound)?;
        user.username = req.username.clone();
        user.first_name = req.first_name.clone();
        user.last_name = req.last_name.clone();
        user.email = req.email.clone();
        Ok(user.clone())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn create(&self, req: &NewCategory) -> Result<Category, DomainError> {
        let mut tables = self.lock();
        if tables.categories.iter().any(|c| c.slug == req.slug) {
            return Err(DomainError::invalid(
                "slug",
                "Category with this slug already exists.",
            ));
        }
        let category = Category {
            id: tables.next_id(),
            title: req.title.clone(),
            description: req.description.clone(),
            slug: req.slug.clone(),
            is_published: req.is_published,
            created_at: Utc::now(),
        };
        tables.categories.push(category.clone());
        Ok(category)
    }

    async fn find_by_id(&self, id: i64) -> Result<Category, DomainError> {
        self.lock()
            .categories
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(DomainError::CategoryNotFound)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Category, DomainError> {
        self.lock()
            .categories
            .iter()
            .find(|c| c.slug == slug)
            .cloned()
            .ok_or(DomainError::CategoryNotFound)
    }

    async fn list(&self, search: Option<&str>) -> Result<Vec<Category>, DomainError> {
        let term = search_term(search);
        Ok(self
            .lock()
            .categories
            .iter()
            .filter(|c| term.map_or(true, |t| title_contains(&c.title, t)))
            .cloned()
            .collect())
    }

    async fn update(&self, id: i64, req: &CategoryUpdate) -> Result<Category, DomainError> {
        let mut tables = self.lock();
        if let Some(slug) = &req.slug {
            if tables.categories.iter().any(|c| c.id != id && &c.slug == slug) {
                return Err(DomainError::invalid(
                    "slug",
                    "Category with this slug already exists.",
                ));
            }
        }
        let category = tables
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(DomainError::CategoryNotFound)?;
        if let Some(title) = &req.title {
            category.title = title.clone();
        }
        if let Some(description) = &req.description {
            category.description = description.clone();
        }
        if let Some(slug) = &req.slug {
            category.slug = slug.clone();
        }
        if let Some(is_published) = req.is_published {
            category.is_published = is_published;
        }
        Ok(category.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let mut tables = self.lock();
        let before = tables.categories.len();
        tables.categories.retain(|c| c.id != id);
        if tables.categories.len() == before {
            return Err(DomainError::CategoryNotFound);
        }
        for post in tables.posts.iter_mut().filter(|p| p.category_id == Some(id)) {
            post.category_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl LocationRepository for InMemoryStore {
    async fn create(&self, req: &NewLocation) -> Result<Location, DomainError> {
        let mut tables = self.lock();
        let location = Location {
            id: tables.next_id(),
            name: req.name.clone(),
            is_published: req.is_published,
            created_at: Utc::now(),
        };
        tables.locations.push(location.clone());
        Ok(location)
    }

    async fn find_by_id(&self, id: i64) -> Result<Location, DomainError> {
        self.lock()
            .locations
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or(DomainError::LocationNotFound)
    }

    async fn list(&self, search: Option<&str>) -> Result<Vec<Location>, DomainError> {
        let term = search_term(search);
        Ok(self
            .lock()
            .locations
            .iter()
            .filter(|l| term.map_or(true, |t| title_contains(&l.name, t)))
            .cloned()
            .collect())
    }

    async fn update(&self, id: i64, req: &LocationUpdate) -> Result<Location, DomainError> {
        let mut tables = self.lock();
        let location = tables
            .locations
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(DomainError::LocationNotFound)?;
        if let Some(name) = &req.name {
            location.name = name.clone();
        }
        if let Some(is_published) = req.is_published {
            location.is_published = is_published;
        }
        Ok(location.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let mut tables = self.lock();
        let before = tables.locations.len();
        tables.locations.retain(|l| l.id != id);
        if tables.locations.len() == before {
            return Err(DomainError::LocationNotFound);
        }
        for post in tables.posts.iter_mut().filter(|p| p.location_id == Some(id)) {
            post.location_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, author_id: i64, form: &PostForm) -> Result<Post, DomainError> {
        let mut tables = self.lock();
        let post = Post {
            id: tables.next_id(),
            title: form.title.clone(),
            text: form.text.clone(),
            pub_date: form.pub_date_or_now(),
            image: form.image_path(),
            is_published: form.is_published,
            created_at: Utc::now(),
            author_id,
            location_id: form.location_id,
            category_id: form.category_id,
        };
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn find_view(&self, id: i64) -> Result<PostView, DomainError> {
        let tables = self.lock();
        tables
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|p| tables.view(p))
            .ok_or(DomainError::PostNotFound)
    }

    async fn find_in(&self, query: &PostQuery, id: i64) -> Result<PostView, DomainError> {
        self.lock()
            .matching(query)
            .into_iter()
            .find(|p| p.id == id)
            .ok_or(DomainError::PostNotFound)
    }

    async fn count(&self, query: &PostQuery) -> Result<i64, DomainError> {
        Ok(self.lock().matching(query).len() as i64)
    }

    async fn list(
        &self,
        query: &PostQuery,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostView>, DomainError> {
        Ok(self
            .lock()
            .matching(query)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn update(&self, id: i64, form: &PostForm) -> Result<Post, DomainError> {
        let mut tables = self.lock();
        let post = tables
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(DomainError::PostNotFound)?;
        post.title = form.title.clone();
        post.text = form.text.clone();
        post.pub_date = form.pub_date_or_now();
        if form.clear_image {
            post.image = None;
        } else if let Some(image) = form.image_path() {
            post.image = Some(image);
        }
        post.is_published = form.is_published;
        post.location_id = form.location_id;
        post.category_id = form.category_id;
        Ok(post.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let mut tables = self.lock();
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        if tables.posts.len() == before {
            return Err(DomainError::PostNotFound);
        }
        tables.comments.retain(|c| c.post_id != id);
        Ok(())
    }

    async fn admin_list(&self, filter: &AdminPostFilter) -> Result<Vec<PostView>, DomainError> {
        let tables = self.lock();
        let term = filter.search_term();
        let mut posts: Vec<PostView> = tables
            .posts
            .iter()
            .filter(|p| term.map_or(true, |t| title_contains(&p.title, t)))
            .filter(|p| filter.is_published.map_or(true, |v| p.is_published == v))
            .filter(|p| filter.category_id.map_or(true, |id| p.category_id == Some(id)))
            .filter(|p| filter.location_id.map_or(true, |id| p.location_id == Some(id)))
            .map(|p| tables.view(p))
            .collect();
        posts.sort_by(|a, b| a.pub_date.cmp(&b.pub_date).then(a.title.cmp(&b.title)));
        Ok(posts)
    }

    async fn admin_update(&self, id: i64, update: &PostAdminUpdate) -> Result<Post, DomainError> {
        let mut tables = self.lock();
        let post = tables
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(DomainError::PostNotFound)?;
        if let Some(is_published) = update.is_published {
            post.is_published = is_published;
        }
        if let Some(pub_date) = update.pub_date {
            post.pub_date = pub_date;
        }
        if let Some(author_id) = update.author_id {
            post.author_id = author_id;
        }
        if let Some(category_id) = update.category_id {
            post.category_id = category_id;
        }
        if let Some(location_id) = update.location_id {
            post.location_id = location_id;
        }
        Ok(post.clone())
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn create(
        &self,
        author_id: i64,
        post_id: i64,
        form: &CommentForm,
    ) -> Result<Comment, DomainError> {
        let mut tables = self.lock();
        let comment = Comment {
            id: tables.next_id(),
            text: form.text.clone(),
            is_published: true,
            created_at: Utc::now(),
            author_id,
            post_id,
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn find(&self, post_id: i64, comment_id: i64) -> Result<Comment, DomainError> {
        self.lock()
            .comments
            .iter()
            .find(|c| c.id == comment_id && c.post_id == post_id)
            .cloned()
            .ok_or(DomainError::CommentNotFound)
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentView>, DomainError> {
        let tables = self.lock();
        let mut comments: Vec<CommentView> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| CommentView {
                id: c.id,
                text: c.text.clone(),
                is_published: c.is_published,
                created_at: c.created_at,
                post_id: c.post_id,
                author: AuthorSummary {
                    id: c.author_id,
                    username: tables
                        .users
                        .iter()
                        .find(|u| u.id == c.author_id)
                        .map(|u| u.username.clone())
                        .unwrap_or_default(),
                },
            })
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn update(&self, id: i64, form: &CommentForm) -> Result<Comment, DomainError> {
        let mut tables = self.lock();
        let comment = tables
            .comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(DomainError::CommentNotFound)?;
        comment.text = form.text.clone();
        Ok(comment.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let mut tables = self.lock();
        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != id);
        if tables.comments.len() == before {
            Err(DomainError::CommentNotFound)
        } else {
            Ok(())
        }
    }
}
