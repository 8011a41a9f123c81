use crate::domain::comment::CommentForm;
use crate::domain::user::AuthorSummary;
use crate::domain::{Comment, CommentView, DomainError};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(
        &self,
        author_id: i64,
        post_id: i64,
        form: &CommentForm,
    ) -> Result<Comment, DomainError>;
    /// A comment by id, only when it belongs to `post_id`.
    async fn find(&self, post_id: i64, comment_id: i64) -> Result<Comment, DomainError>;
    /// Oldest first.
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentView>, DomainError>;
    async fn update(&self, id: i64, form: &CommentForm) -> Result<Comment, DomainError>;
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
}

pub struct PostgresCommentRepository {
    pool: PgPool,
}

impl PostgresCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_comment(row: &PgRow) -> Result<Comment, DomainError> {
    Ok(Comment {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        is_published: row.try_get("is_published")?,
        created_at: row.try_get("created_at")?,
        author_id: row.try_get("author_id")?,
        post_id: row.try_get("post_id")?,
    })
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create(
        &self,
        author_id: i64,
        post_id: i64,
        form: &CommentForm,
    ) -> Result<Comment, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO comments (text, is_published, created_at, author_id, post_id)
            VALUES ($1, TRUE, NOW(), $2, $3)
            RETURNING id, text, is_published, created_at, author_id, post_id
            "#,
        )
        .bind(&form.text)
        .bind(author_id)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create comment: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        map_comment(&row)
    }

    async fn find(&self, post_id: i64, comment_id: i64) -> Result<Comment, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, text, is_published, created_at, author_id, post_id
            FROM comments
            WHERE id = $1 AND post_id = $2
            "#,
        )
        .bind(comment_id)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => map_comment(&row),
            None => Err(DomainError::CommentNotFound),
        }
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentView>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT cm.id, cm.text, cm.is_published, cm.created_at, cm.post_id,
                   u.id AS author_id, u.username AS author_username
            FROM comments cm
            JOIN users u ON u.id = cm.author_id
            WHERE cm.post_id = $1
            ORDER BY cm.created_at ASC, cm.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                Ok(CommentView {
                    id: row.try_get("id")?,
                    text: row.try_get("text")?,
                    is_published: row.try_get("is_published")?,
                    created_at: row.try_get("created_at")?,
                    post_id: row.try_get("post_id")?,
                    author: AuthorSummary {
                        id: row.try_get("author_id")?,
                        username: row.try_get("author_username")?,
                    },
                })
            })
            .collect::<Result<Vec<CommentView>, DomainError>>()
    }

    async fn update(&self, id: i64, form: &CommentForm) -> Result<Comment, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE comments
            SET text = $1
            WHERE id = $2
            RETURNING id, text, is_published, created_at, author_id, post_id
            "#,
        )
        .bind(&form.text)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => map_comment(&row),
            None => Err(DomainError::CommentNotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            Err(DomainError::CommentNotFound)
        } else {
            Ok(())
        }
    }
}
