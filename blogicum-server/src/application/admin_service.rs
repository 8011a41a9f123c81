//! Staff backoffice: categories, locations and posts with search, inline
//! edits and deletes.

use crate::data::{CategoryRepository, LocationRepository, PostRepository, UserRepository};
use crate::domain::category::{self, CategoryUpdate, NewCategory};
use crate::domain::location::{self, LocationUpdate, NewLocation};
use crate::domain::post::{self, PostAdminUpdate};
use crate::domain::query::AdminPostFilter;
use crate::domain::validation::FieldErrors;
use crate::domain::{Category, DomainError, Location, Post, PostView, User};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct AdminListing<T> {
    pub title: &'static str,
    pub count: usize,
    pub items: Vec<T>,
}

impl<T> AdminListing<T> {
    fn new(title: &'static str, items: Vec<T>) -> Self {
        Self {
            title,
            count: items.len(),
            items,
        }
    }
}

/// A record with its posts shown inline.
#[derive(Debug, Serialize)]
pub struct AdminDetail<T> {
    pub verbose_name: &'static str,
    #[serde(flatten)]
    pub record: T,
    pub posts: Vec<PostView>,
}

pub struct AdminService {
    user_repo: Arc<dyn UserRepository + Send + Sync>,
    category_repo: Arc<dyn CategoryRepository + Send + Sync>,
    location_repo: Arc<dyn LocationRepository + Send + Sync>,
    post_repo: Arc<dyn PostRepository + Send + Sync>,
}

impl AdminService {
    pub fn new(
        user_repo: Arc<dyn UserRepository + Send + Sync>,
        category_repo: Arc<dyn CategoryRepository + Send + Sync>,
        location_repo: Arc<dyn LocationRepository + Send + Sync>,
        post_repo: Arc<dyn PostRepository + Send + Sync>,
    ) -> Self {
        Self {
            user_repo,
            category_repo,
            location_repo,
            post_repo,
        }
    }

    pub async fn ensure_staff(&self, user_id: i64) -> Result<User, DomainError> {
        let user = match self.user_repo.find_by_id(user_id).await {
            Ok(user) => user,
            Err(DomainError::UserNotFound) => return Err(DomainError::Forbidden),
            Err(e) => return Err(e),
        };
        if !user.is_staff {
            tracing::warn!("User {} tried to reach the admin API", user.username);
            return Err(DomainError::Forbidden);
        }
        Ok(user)
    }

    // Категории

    pub async fn list_categories(
        &self,
        user_id: i64,
        search: Option<&str>,
    ) -> Result<AdminListing<Category>, DomainError> {
        self.ensure_staff(user_id).await?;
        let items = self.category_repo.list(search).await?;
        Ok(AdminListing::new(category::VERBOSE_NAME_PLURAL, items))
    }

    pub async fn category_detail(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<AdminDetail<Category>, DomainError> {
        self.ensure_staff(user_id).await?;
        let record = self.category_repo.find_by_id(id).await?;
        let posts = self
            .post_repo
            .admin_list(&AdminPostFilter::for_category(id))
            .await?;
        Ok(AdminDetail {
            verbose_name: category::VERBOSE_NAME,
            record,
            posts,
        })
    }

    pub async fn create_category(
        &self,
        user_id: i64,
        req: NewCategory,
    ) -> Result<Category, DomainError> {
        self.ensure_staff(user_id).await?;
        req.validate()?;
        self.check_slug_free(&req.slug, None).await?;

        let category = self.category_repo.create(&req).await?;
        tracing::info!("Category created: id={}, slug={}", category.id, category.slug);
        Ok(category)
    }

    pub async fn update_category(
        &self,
        user_id: i64,
        id: i64,
        req: CategoryUpdate,
    ) -> Result<Category, DomainError> {
        self.ensure_staff(user_id).await?;
        req.validate()?;
        if let Some(slug) = &req.slug {
            self.check_slug_free(slug, Some(id)).await?;
        }

        let category = self.category_repo.update(id, &req).await?;
        tracing::info!("Category updated: id={}", category.id);
        Ok(category)
    }

    pub async fn delete_category(&self, user_id: i64, id: i64) -> Result<(), DomainError> {
        self.ensure_staff(user_id).await?;
        self.category_repo.delete(id).await?;
        tracing::info!("Category deleted: id={}", id);
        Ok(())
    }

    async fn check_slug_free(&self, slug: &str, own_id: Option<i64>) -> Result<(), DomainError> {
        match self.category_repo.find_by_slug(slug).await {
            Ok(existing) if Some(existing.id) != own_id => Err(DomainError::invalid(
                "slug",
                "Category with this slug already exists.",
            )),
            Ok(_) | Err(DomainError::CategoryNotFound) => Ok(()),
            Err(e) => Err(e),
        }
    }

    // Местоположения

    pub async fn list_locations(
        &self,
        user_id: i64,
        search: Option<&str>,
    ) -> Result<AdminListing<Location>, DomainError> {
        self.ensure_staff(user_id).await?;
        let items = self.location_repo.list(search).await?;
        Ok(AdminListing::new(location::VERBOSE_NAME_PLURAL, items))
    }

    pub async fn location_detail(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<AdminDetail<Location>, DomainError> {
        self.ensure_staff(user_id).await?;
        let record = self.location_repo.find_by_id(id).await?;
        let posts = self
            .post_repo
            .admin_list(&AdminPostFilter::for_location(id))
            .await?;
        Ok(AdminDetail {
            verbose_name: location::VERBOSE_NAME,
            record,
            posts,
        })
    }

    pub async fn create_location(
        &self,
        user_id: i64,
        req: NewLocation,
    ) -> Result<Location, DomainError> {
        self.ensure_staff(user_id).await?;
        req.validate()?;

        let location = self.location_repo.create(&req).await?;
        tracing::info!("Location created: id={}, name={}", location.id, location.name);
        Ok(location)
    }

    pub async fn update_location(
        &self,
        user_id: i64,
        id: i64,
        req: LocationUpdate,
    ) -> Result<Location, DomainError> {
        self.ensure_staff(user_id).await?;
        req.validate()?;

        let location = self.location_repo.update(id, &req).await?;
        tracing::info!("Location updated: id={}", location.id);
        Ok(location)
    }

    pub async fn delete_location(&self, user_id: i64, id: i64) -> Result<(), DomainError> {
        self.ensure_staff(user_id).await?;
        self.location_repo.delete(id).await?;
        tracing::info!("Location deleted: id={}", id);
        Ok(())
    }

    // Публикации

    pub async fn list_posts(
        &self,
        user_id: i64,
        filter: AdminPostFilter,
    ) -> Result<AdminListing<PostView>, DomainError> {
        self.ensure_staff(user_id).await?;
        let items = self.post_repo.admin_list(&filter).await?;
        Ok(AdminListing::new(post::VERBOSE_NAME_PLURAL, items))
    }

    pub async fn update_post(
        &self,
        user_id: i64,
        id: i64,
        update: PostAdminUpdate,
    ) -> Result<Post, DomainError> {
        self.ensure_staff(user_id).await?;
        if update.is_empty() {
            return Err(DomainError::invalid("__all__", "Nothing to update."));
        }
        self.check_post_references(&update).await?;

        let post = self.post_repo.admin_update(id, &update).await?;
        tracing::info!("Post updated from admin: id={}", post.id);
        Ok(post)
    }

    async fn check_post_references(&self, update: &PostAdminUpdate) -> Result<(), DomainError> {
        let mut errors = FieldErrors::default();
        if let Some(author_id) = update.author_id {
            if missing(self.user_repo.find_by_id(author_id).await)? {
                errors.add("author_id", "Select a valid choice.");
            }
        }
        if let Some(Some(category_id)) = update.category_id {
            if missing(self.category_repo.find_by_id(category_id).await)? {
                errors.add("category_id", "Select a valid choice.");
            }
        }
        if let Some(Some(location_id)) = update.location_id {
            if missing(self.location_repo.find_by_id(location_id).await)? {
                errors.add("location_id", "Select a valid choice.");
            }
        }
        errors.into_result()
    }
}

fn missing<T>(lookup: Result<T, DomainError>) -> Result<bool, DomainError> {
    match lookup {
        Ok(_) => Ok(false),
        Err(e) if e.is_not_found() => Ok(true),
        Err(e) => Err(e),
    }
}
