use super::post::PostView;
use super::visibility::is_publicly_visible;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Which posts a listing draws from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostScope {
    /// Published posts in published categories whose time has come.
    Public,
    /// Every post of one author, whatever its flags or date.
    Profile { author_id: i64 },
    /// `Public` narrowed to one category slug.
    Category { slug: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum PostOrdering {
    #[default]
    #[serde(rename = "-pub_date")]
    PubDateDesc,
    #[serde(rename = "id")]
    IdAsc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub scope: PostScope,
    pub ordering: PostOrdering,
    pub now: DateTime<Utc>,
}

impl PostQuery {
    pub fn public(now: DateTime<Utc>) -> Self {
        Self::new(PostScope::Public, now)
    }

    pub fn profile(author_id: i64, now: DateTime<Utc>) -> Self {
        Self::new(PostScope::Profile { author_id }, now)
    }

    pub fn category(slug: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::new(PostScope::Category { slug: slug.into() }, now)
    }

    fn new(scope: PostScope, now: DateTime<Utc>) -> Self {
        Self {
            scope,
            ordering: PostOrdering::default(),
            now,
        }
    }

    pub fn ordered_by(mut self, ordering: PostOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Whether `post` belongs to this query's result set.
    pub fn matches(&self, post: &PostView) -> bool {
        match &self.scope {
            PostScope::Public => is_publicly_visible(post, self.now),
            PostScope::Profile { author_id } => post.author.id == *author_id,
            PostScope::Category { slug } => {
                is_publicly_visible(post, self.now)
                    && post.category.as_ref().is_some_and(|c| &c.slug == slug)
            }
        }
    }
}

/// Filters of the admin post listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminPostFilter {
    /// Case-insensitive substring of the title.
    pub q: Option<String>,
    pub is_published: Option<bool>,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
}

impl AdminPostFilter {
    pub fn for_category(category_id: i64) -> Self {
        Self {
            category_id: Some(category_id),
            ..Default::default()
        }
    }

    pub fn for_location(location_id: i64) -> Self {
        Self {
            location_id: Some(location_id),
            ..Default::default()
        }
    }

    pub fn search_term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}
