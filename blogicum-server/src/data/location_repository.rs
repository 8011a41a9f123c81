use crate::domain::location::{LocationUpdate, NewLocation};
use crate::domain::{DomainError, Location};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn create(&self, req: &NewLocation) -> Result<Location, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Location, DomainError>;
    async fn list(&self, search: Option<&str>) -> Result<Vec<Location>, DomainError>;
    async fn update(&self, id: i64, req: &LocationUpdate) -> Result<Location, DomainError>;
    /// Posts keep existing with their location cleared.
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
}

pub struct PostgresLocationRepository {
    pool: PgPool,
}

impl PostgresLocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_location(row: &PgRow) -> Result<Location, DomainError> {
    Ok(Location {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        is_published: row.try_get("is_published")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl LocationRepository for PostgresLocationRepository {
    async fn create(&self, req: &NewLocation) -> Result<Location, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO locations (name, is_published, created_at)
            VALUES ($1, $2, NOW())
            RETURNING id, name, is_published, created_at
            "#,
        )
        .bind(&req.name)
        .bind(req.is_published)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create location: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        map_location(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Location, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, is_published, created_at
            FROM locations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => map_location(&row),
            None => Err(DomainError::LocationNotFound),
        }
    }

    async fn list(&self, search: Option<&str>) -> Result<Vec<Location>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, is_published, created_at
            FROM locations
            WHERE $1::TEXT IS NULL OR name ILIKE '%' || $1 || '%'
            ORDER BY id
            "#,
        )
        .bind(search)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        rows.iter().map(map_location).collect()
    }

    async fn update(&self, id: i64, req: &LocationUpdate) -> Result<Location, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE locations
            SET
                name = COALESCE($1, name),
                is_published = COALESCE($2, is_published)
            WHERE id = $3
            RETURNING id, name, is_published, created_at
            "#,
        )
        .bind(&req.name)
        .bind(req.is_published)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => map_location(&row),
            None => Err(DomainError::LocationNotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            Err(DomainError::LocationNotFound)
        } else {
            Ok(())
        }
    }
}
