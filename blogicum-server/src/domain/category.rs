use super::validation::{is_valid_slug, FieldErrors};
use super::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const VERBOSE_NAME: &str = "категория";
pub const VERBOSE_NAME_PLURAL: &str = "Категории";

pub const TITLE_MAX_LEN: usize = 256;
pub const SLUG_MAX_LEN: usize = 50;

const SLUG_HELP: &str = "Идентификатор страницы для URL; разрешены символы латиницы, цифры, дефис и подчёркивание.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Category reference embedded in post listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub is_published: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub title: String,
    pub description: String,
    pub slug: String,
    #[serde(default = "super::default_published")]
    pub is_published: bool,
}

impl NewCategory {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = FieldErrors::default();
        validate_title(&mut errors, &self.title);
        errors.require("description", &self.description);
        validate_slug(&mut errors, &self.slug);
        errors.into_result()
    }
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub is_published: Option<bool>,
}

impl CategoryUpdate {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = FieldErrors::default();
        if let Some(title) = &self.title {
            validate_title(&mut errors, title);
        }
        if let Some(description) = &self.description {
            errors.require("description", description);
        }
        if let Some(slug) = &self.slug {
            validate_slug(&mut errors, slug);
        }
        errors.into_result()
    }
}

fn validate_title(errors: &mut FieldErrors, title: &str) {
    errors.require("title", title);
    errors.max_chars("title", title, TITLE_MAX_LEN);
}

fn validate_slug(errors: &mut FieldErrors, slug: &str) {
    errors.require("slug", slug);
    errors.max_chars("slug", slug, SLUG_MAX_LEN);
    if !slug.is_empty() && !is_valid_slug(slug) {
        errors.add("slug", SLUG_HELP);
    }
}
