use crate::domain::category::CategorySummary;
use crate::domain::location::LocationSummary;
use crate::domain::post::{PostAdminUpdate, PostForm};
use crate::domain::query::{AdminPostFilter, PostOrdering, PostScope};
use crate::domain::user::AuthorSummary;
use crate::domain::{DomainError, Post, PostQuery, PostView};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, author_id: i64, form: &PostForm) -> Result<Post, DomainError>;
    /// Any post by id, without visibility filtering.
    async fn find_view(&self, id: i64) -> Result<PostView, DomainError>;
    /// A post by id, only if it belongs to `query`'s result set.
    async fn find_in(&self, query: &PostQuery, id: i64) -> Result<PostView, DomainError>;
    async fn count(&self, query: &PostQuery) -> Result<i64, DomainError>;
    async fn list(
        &self,
        query: &PostQuery,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostView>, DomainError>;
    async fn update(&self, id: i64, form: &PostForm) -> Result<Post, DomainError>;
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
    async fn admin_list(&self, filter: &AdminPostFilter) -> Result<Vec<PostView>, DomainError>;
    async fn admin_update(&self, id: i64, update: &PostAdminUpdate) -> Result<Post, DomainError>;
}

const POST_COLUMNS: &str =
    "id, title, text, pub_date, image, is_published, created_at, author_id, location_id, category_id";

// Posts joined with author, location and category, annotated with comment_count.
const POST_VIEW_SELECT: &str = r#"
SELECT p.id, p.title, p.text, p.pub_date, p.image, p.is_published, p.created_at,
       u.id AS author_id, u.username AS author_username,
       l.id AS location_id, l.name AS location_name, l.is_published AS location_is_published,
       c.id AS category_id, c.title AS category_title, c.slug AS category_slug,
       c.is_published AS category_is_published,
       (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count
FROM posts p
JOIN users u ON u.id = p.author_id
LEFT JOIN locations l ON l.id = p.location_id
LEFT JOIN categories c ON c.id = p.category_id"#;

const POST_COUNT_SELECT: &str =
    "SELECT COUNT(*) AS count FROM posts p LEFT JOIN categories c ON c.id = p.category_id";

fn push_public_filter(builder: &mut QueryBuilder<'_, Postgres>, now: DateTime<Utc>) {
    builder
        .push(" WHERE p.is_published = TRUE AND c.is_published = TRUE AND p.pub_date <= ")
        .push_bind(now);
}

/// Appends the WHERE clause of `query`. Every scope opens a WHERE, so callers
/// may continue with `AND`.
fn push_scope(builder: &mut QueryBuilder<'_, Postgres>, query: &PostQuery) {
    match &query.scope {
        PostScope::Public => push_public_filter(builder, query.now),
        PostScope::Profile { author_id } => {
            builder.push(" WHERE p.author_id = ").push_bind(*author_id);
        }
        PostScope::Category { slug } => {
            push_public_filter(builder, query.now);
            builder.push(" AND c.slug = ").push_bind(slug.clone());
        }
    }
}

fn push_ordering(builder: &mut QueryBuilder<'_, Postgres>, ordering: PostOrdering) {
    match ordering {
        PostOrdering::PubDateDesc => builder.push(" ORDER BY p.pub_date DESC, p.id DESC"),
        PostOrdering::IdAsc => builder.push(" ORDER BY p.id ASC"),
    };
}

pub(crate) fn select_posts(
    query: &PostQuery,
    limit: i64,
    offset: i64,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(POST_VIEW_SELECT);
    push_scope(&mut builder, query);
    push_ordering(&mut builder, query.ordering);
    builder
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    builder
}

pub(crate) fn count_posts(query: &PostQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(POST_COUNT_SELECT);
    push_scope(&mut builder, query);
    builder
}

pub(crate) fn select_post_in(query: &PostQuery, id: i64) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(POST_VIEW_SELECT);
    push_scope(&mut builder, query);
    builder.push(" AND p.id = ").push_bind(id);
    builder
}

pub(crate) fn select_admin_posts(filter: &AdminPostFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(POST_VIEW_SELECT);
    builder.push(" WHERE TRUE");
    if let Some(term) = filter.search_term() {
        builder
            .push(" AND p.title ILIKE ")
            .push_bind(format!("%{}%", escape_like(term)));
    }
    if let Some(is_published) = filter.is_published {
        builder.push(" AND p.is_published = ").push_bind(is_published);
    }
    if let Some(category_id) = filter.category_id {
        builder.push(" AND p.category_id = ").push_bind(category_id);
    }
    if let Some(location_id) = filter.location_id {
        builder.push(" AND p.location_id = ").push_bind(location_id);
    }
    builder.push(" ORDER BY p.pub_date ASC, p.title ASC");
    builder
}

/// `None` when the update carries no fields.
pub(crate) fn update_post_admin(
    id: i64,
    update: &PostAdminUpdate,
) -> Option<QueryBuilder<'static, Postgres>> {
    if update.is_empty() {
        return None;
    }

    let mut builder = QueryBuilder::new("UPDATE posts SET ");
    {
        let mut set = builder.separated(", ");
        if let Some(is_published) = update.is_published {
            set.push("is_published = ").push_bind_unseparated(is_published);
        }
        if let Some(pub_date) = update.pub_date {
            set.push("pub_date = ").push_bind_unseparated(pub_date);
        }
        if let Some(author_id) = update.author_id {
            set.push("author_id = ").push_bind_unseparated(author_id);
        }
        if let Some(category_id) = update.category_id {
            set.push("category_id = ").push_bind_unseparated(category_id);
        }
        if let Some(location_id) = update.location_id {
            set.push("location_id = ").push_bind_unseparated(location_id);
        }
    }
    builder
        .push(" WHERE id = ")
        .push_bind(id)
        .push(" RETURNING ")
        .push(POST_COLUMNS);
    Some(builder)
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn map_post(row: &PgRow) -> Result<Post, DomainError> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        text: row.try_get("text")?,
        pub_date: row.try_get("pub_date")?,
        image: row.try_get("image")?,
        is_published: row.try_get("is_published")?,
        created_at: row.try_get("created_at")?,
        author_id: row.try_get("author_id")?,
        location_id: row.try_get("location_id")?,
        category_id: row.try_get("category_id")?,
    })
}

fn map_post_view(row: &PgRow) -> Result<PostView, DomainError> {
    let location = match row.try_get::<Option<i64>, _>("location_id")? {
        Some(id) => Some(LocationSummary {
            id,
            name: row.try_get("location_name")?,
            is_published: row.try_get("location_is_published")?,
        }),
        None => None,
    };
    let category = match row.try_get::<Option<i64>, _>("category_id")? {
        Some(id) => Some(CategorySummary {
            id,
            title: row.try_get("category_title")?,
            slug: row.try_get("category_slug")?,
            is_published: row.try_get("category_is_published")?,
        }),
        None => None,
    };

    Ok(PostView {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        text: row.try_get("text")?,
        pub_date: row.try_get("pub_date")?,
        image: row.try_get("image")?,
        is_published: row.try_get("is_published")?,
        created_at: row.try_get("created_at")?,
        author: AuthorSummary {
            id: row.try_get("author_id")?,
            username: row.try_get("author_username")?,
        },
        location,
        category,
        comment_count: row.try_get("comment_count")?,
    })
}

pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, author_id: i64, form: &PostForm) -> Result<Post, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO posts
                (title, text, pub_date, image, is_published, created_at, author_id, location_id, category_id)
            VALUES ($1, $2, $3, $4, $5, NOW(), $6, $7, $8)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(&form.title)
        .bind(&form.text)
        .bind(form.pub_date_or_now())
        .bind(form.image_path())
        .bind(form.is_published)
        .bind(author_id)
        .bind(form.location_id)
        .bind(form.category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create post: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        map_post(&row)
    }

    async fn find_view(&self, id: i64) -> Result<PostView, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new(POST_VIEW_SELECT);
        builder.push(" WHERE p.id = ").push_bind(id);

        let row = builder
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => map_post_view(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn find_in(&self, query: &PostQuery, id: i64) -> Result<PostView, DomainError> {
        let row = select_post_in(query, id)
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => map_post_view(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn count(&self, query: &PostQuery) -> Result<i64, DomainError> {
        let row = count_posts(query)
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        Ok(row.try_get("count")?)
    }

    async fn list(
        &self,
        query: &PostQuery,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostView>, DomainError> {
        let rows = select_posts(query, limit, offset)
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        rows.iter().map(map_post_view).collect()
    }

    async fn update(&self, id: i64, form: &PostForm) -> Result<Post, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE posts
            SET
                title = $1,
                text = $2,
                pub_date = $3,
                image = CASE WHEN $9 THEN NULL ELSE COALESCE($4, image) END,
                is_published = $5,
                location_id = $6,
                category_id = $7
            WHERE id = $8
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(&form.title)
        .bind(&form.text)
        .bind(form.pub_date_or_now())
        .bind(form.image_path())
        .bind(form.is_published)
        .bind(form.location_id)
        .bind(form.category_id)
        .bind(id)
        .bind(form.clear_image)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => map_post(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            Err(DomainError::PostNotFound)
        } else {
            Ok(())
        }
    }

    async fn admin_list(&self, filter: &AdminPostFilter) -> Result<Vec<PostView>, DomainError> {
        let rows = select_admin_posts(filter)
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        rows.iter().map(map_post_view).collect()
    }

    async fn admin_update(&self, id: i64, update: &PostAdminUpdate) -> Result<Post, DomainError> {
        let Some(mut builder) = update_post_admin(id, update) else {
            let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::DatabaseError(e.to_string()))?;
            return match row {
                Some(row) => map_post(&row),
                None => Err(DomainError::PostNotFound),
            };
        };

        let row = builder
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => map_post(&row),
            None => Err(DomainError::PostNotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn public_listing_filters_joins_and_orders() {
        let builder = select_posts(&PostQuery::public(now()), 10, 0);
        let sql = builder.sql();

        assert!(sql.contains("JOIN users u ON u.id = p.author_id"));
        assert!(sql.contains("LEFT JOIN categories c ON c.id = p.category_id"));
        assert!(sql.contains("AS comment_count"));
        assert!(sql.contains(
            "WHERE p.is_published = TRUE AND c.is_published = TRUE AND p.pub_date <= $1"
        ));
        assert!(sql.contains("ORDER BY p.pub_date DESC, p.id DESC LIMIT $2 OFFSET $3"));
    }

    #[test]
    fn profile_listing_only_filters_by_author() {
        let builder = select_posts(&PostQuery::profile(7, now()), 10, 10);
        let sql = builder.sql();

        assert!(sql.contains("WHERE p.author_id = $1"));
        assert!(!sql.contains("p.is_published = TRUE"));
        assert!(!sql.contains("pub_date <="));
    }

    #[test]
    fn category_listing_adds_slug_to_public_filter() {
        let builder = select_posts(&PostQuery::category("travel", now()), 10, 0);
        let sql = builder.sql();

        assert!(sql.contains("p.pub_date <= $1 AND c.slug = $2"));
        assert!(sql.contains("LIMIT $3 OFFSET $4"));
    }

    #[test]
    fn id_ordering_is_ascending() {
        let query = PostQuery::public(now()).ordered_by(PostOrdering::IdAsc);
        let builder = select_posts(&query, 10, 0);
        assert!(builder.sql().contains("ORDER BY p.id ASC"));
    }

    #[test]
    fn count_uses_the_same_filter() {
        let builder = count_posts(&PostQuery::category("travel", now()));
        let sql = builder.sql();

        assert!(sql.starts_with("SELECT COUNT(*)"));
        assert!(sql.contains("c.is_published = TRUE"));
        assert!(sql.contains("c.slug = $2"));
        assert!(!sql.contains("ORDER BY"));
    }

    #[test]
    fn lookup_in_scope_appends_id() {
        let builder = select_post_in(&PostQuery::public(now()), 42);
        assert!(builder.sql().ends_with("p.pub_date <= $1 AND p.id = $2"));
    }

    #[test]
    fn admin_listing_combines_filters() {
        let filter = AdminPostFilter {
            q: Some("rust".into()),
            is_published: Some(false),
            category_id: None,
            location_id: Some(3),
        };
        let builder = select_admin_posts(&filter);
        let sql = builder.sql();

        assert!(sql.contains(
            "WHERE TRUE AND p.title ILIKE $1 AND p.is_published = $2 AND p.location_id = $3"
        ));
        assert!(sql.ends_with("ORDER BY p.pub_date ASC, p.title ASC"));
    }

    #[test]
    fn admin_update_sets_only_given_fields() {
        let update = PostAdminUpdate {
            is_published: Some(false),
            category_id: Some(None),
            ..Default::default()
        };
        let builder = update_post_admin(5, &update).unwrap();
        let sql = builder.sql();

        assert!(sql.starts_with("UPDATE posts SET is_published = $1, category_id = $2 WHERE id = $3"));
        assert!(!sql.contains("location_id ="));
        assert!(update_post_admin(5, &PostAdminUpdate::default()).is_none());
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
    }
}
