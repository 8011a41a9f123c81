use crate::domain::category::{CategoryUpdate, NewCategory};
use crate::domain::{Category, DomainError};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, req: &NewCategory) -> Result<Category, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Category, DomainError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Category, DomainError>;
    /// All categories, optionally narrowed by a case-insensitive title search.
    async fn list(&self, search: Option<&str>) -> Result<Vec<Category>, DomainError>;
    async fn update(&self, id: i64, req: &CategoryUpdate) -> Result<Category, DomainError>;
    /// Posts of the category stay, with their category cleared.
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
}

pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_category(row: &PgRow) -> Result<Category, DomainError> {
    Ok(Category {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        slug: row.try_get("slug")?,
        is_published: row.try_get("is_published")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_write_error(e: sqlx::Error) -> DomainError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DomainError::invalid("slug", "Category with this slug already exists.")
        }
        _ => {
            tracing::error!("Failed to write category: {}", e);
            DomainError::DatabaseError(e.to_string())
        }
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn create(&self, req: &NewCategory) -> Result<Category, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO categories (title, description, slug, is_published, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id, title, description, slug, is_published, created_at
            "#,
        )
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.slug)
        .bind(req.is_published)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        map_category(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Category, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, slug, is_published, created_at
            FROM categories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => map_category(&row),
            None => Err(DomainError::CategoryNotFound),
        }
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Category, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, slug, is_published, created_at
            FROM categories
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => map_category(&row),
            None => Err(DomainError::CategoryNotFound),
        }
    }

    async fn list(&self, search: Option<&str>) -> Result<Vec<Category>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, slug, is_published, created_at
            FROM categories
            WHERE $1::TEXT IS NULL OR title ILIKE '%' || $1 || '%'
            ORDER BY id
            "#,
        )
        .bind(search)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        rows.iter().map(map_category).collect()
    }

    async fn update(&self, id: i64, req: &CategoryUpdate) -> Result<Category, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE categories
            SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                slug = COALESCE($3, slug),
                is_published = COALESCE($4, is_published)
            WHERE id = $5
            RETURNING id, title, description, slug, is_published, created_at
            "#,
        )
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.slug)
        .bind(req.is_published)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;

        match row {
            Some(row) => map_category(&row),
            None => Err(DomainError::CategoryNotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            Err(DomainError::CategoryNotFound)
        } else {
            Ok(())
        }
    }
}
