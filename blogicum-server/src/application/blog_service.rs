use crate::application::redirect::{author_only, ensure_author, Access, Redirect, WriteOutcome};
use crate::data::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};
use crate::domain::comment::CommentForm;
use crate::domain::pagination::POSTS_PER_PAGE;
use crate::domain::post::PostForm;
use crate::domain::user::ProfileResponse;
use crate::domain::validation::FieldErrors;
use crate::domain::visibility::{visibility_for, Visibility};
use crate::domain::{
    Category, CommentView, DomainError, Page, PageRequest, PostOrdering, PostQuery, PostView,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct CategoryFeed {
    pub category: Category,
    pub posts: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct ProfileFeed {
    pub profile: ProfileResponse,
    pub posts: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct PostDetail {
    pub post: PostView,
    pub comments: Vec<CommentView>,
    /// Blank comment form shown under the post.
    pub form: CommentForm,
}

#[derive(Debug, Serialize)]
pub struct PostEditForm {
    pub post: PostView,
    pub form: PostForm,
}

pub struct BlogService {
    post_repo: Arc<dyn PostRepository + Send + Sync>,
    comment_repo: Arc<dyn CommentRepository + Send + Sync>,
    category_repo: Arc<dyn CategoryRepository + Send + Sync>,
    location_repo: Arc<dyn LocationRepository + Send + Sync>,
    user_repo: Arc<dyn UserRepository + Send + Sync>,
}

impl BlogService {
    pub fn new(
        post_repo: Arc<dyn PostRepository + Send + Sync>,
        comment_repo: Arc<dyn CommentRepository + Send + Sync>,
        category_repo: Arc<dyn CategoryRepository + Send + Sync>,
        location_repo: Arc<dyn LocationRepository + Send + Sync>,
        user_repo: Arc<dyn UserRepository + Send + Sync>,
    ) -> Self {
        Self {
            post_repo,
            comment_repo,
            category_repo,
            location_repo,
            user_repo,
        }
    }

    async fn paginate(
        &self,
        query: &PostQuery,
        page: PageRequest,
    ) -> Result<Page<PostView>, DomainError> {
        let total = self.post_repo.count(query).await?;
        let window = page.resolve(total, POSTS_PER_PAGE)?;
        let posts = self
            .post_repo
            .list(query, window.limit(), window.offset())
            .await?;
        Ok(Page::new(posts, window))
    }

    pub async fn home_feed(
        &self,
        page: PageRequest,
        ordering: PostOrdering,
    ) -> Result<Page<PostView>, DomainError> {
        let query = PostQuery::public(Utc::now()).ordered_by(ordering);
        self.paginate(&query, page).await
    }

    pub async fn category_feed(
        &self,
        slug: &str,
        page: PageRequest,
    ) -> Result<CategoryFeed, DomainError> {
        let category = self.category_repo.find_by_slug(slug).await?;
        if !category.is_published {
            return Err(DomainError::CategoryNotFound);
        }

        let query = PostQuery::category(slug, Utc::now());
        let posts = self.paginate(&query, page).await?;
        Ok(CategoryFeed { category, posts })
    }

    pub async fn profile_feed(
        &self,
        username: &str,
        page: PageRequest,
    ) -> Result<ProfileFeed, DomainError> {
        let author = self.user_repo.find_by_username(username).await?;

        let query = PostQuery::profile(author.id, Utc::now());
        let posts = self.paginate(&query, page).await?;
        Ok(ProfileFeed {
            profile: ProfileResponse::from(author),
            posts,
        })
    }

    pub async fn post_detail(
        &self,
        id: i64,
        viewer: Option<i64>,
    ) -> Result<PostDetail, DomainError> {
        let post = self.post_repo.find_view(id).await?;

        if visibility_for(&post, viewer, Utc::now()) == Visibility::Hidden {
            tracing::debug!("Post {} is hidden from viewer {:?}", id, viewer);
            return Err(DomainError::PostNotFound);
        }

        let comments = self.comment_repo.list_for_post(id).await?;
        Ok(PostDetail {
            post,
            comments,
            form: CommentForm::default(),
        })
    }

    /// Current values of a post for its edit or delete page.
    pub async fn post_form(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<Access<PostEditForm>, DomainError> {
        let post = self.post_repo.find_view(id).await?;

        if let Err(redirect) = ensure_author(post.author.id, user_id, Redirect::PostDetail(id)) {
            return Ok(Access::Redirected(redirect));
        }

        let form = PostForm::from(&post);
        Ok(Access::Granted(PostEditForm { post, form }))
    }

    pub async fn create_post(
        &self,
        author_id: i64,
        form: PostForm,
    ) -> Result<WriteOutcome<PostView>, DomainError> {
        form.validate()?;
        self.check_references(&form).await?;

        let author = self.user_repo.find_by_id(author_id).await?;
        let post = self.post_repo.create(author_id, &form).await?;

        tracing::info!("Post created: id={}, author_id={}", post.id, author_id);

        let view = self.post_repo.find_view(post.id).await?;
        Ok(WriteOutcome::Done {
            value: view,
            redirect: Redirect::Profile(author.username),
        })
    }

    pub async fn update_post(
        &self,
        id: i64,
        user_id: i64,
        form: PostForm,
    ) -> Result<WriteOutcome<PostView>, DomainError> {
        let post = self.post_repo.find_view(id).await?;

        author_only(
            post.author.id,
            user_id,
            Redirect::PostDetail(id),
            Redirect::PostDetail(id),
            || async {
                form.validate()?;
                self.check_references(&form).await?;
                self.post_repo.update(id, &form).await?;

                tracing::info!("Post updated: id={}, author_id={}", id, user_id);

                self.post_repo.find_view(id).await
            },
        )
        .await
    }

    pub async fn delete_post(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<WriteOutcome<()>, DomainError> {
        let post = self.post_repo.find_view(id).await?;
        let requester = self.user_repo.find_by_id(user_id).await?;

        author_only(
            post.author.id,
            user_id,
            Redirect::PostDetail(id),
            Redirect::Profile(requester.username),
            || async {
                self.post_repo.delete(id).await?;
                tracing::info!("Post deleted: id={}, author_id={}", id, user_id);
                Ok(())
            },
        )
        .await
    }

    /// The form may only point at categories and locations that exist.
    async fn check_references(&self, form: &PostForm) -> Result<(), DomainError> {
        let mut errors = FieldErrors::default();
        if let Some(category_id) = form.category_id {
            if let Err(err) = self.category_repo.find_by_id(category_id).await {
                if !err.is_not_found() {
                    return Err(err);
                }
                errors.add("category_id", "Select a valid choice.");
            }
        }
        if let Some(location_id) = form.location_id {
            if let Err(err) = self.location_repo.find_by_id(location_id).await {
                if !err.is_not_found() {
                    return Err(err);
                }
                errors.add("location_id", "Select a valid choice.");
            }
        }
        errors.into_result()
    }
}
