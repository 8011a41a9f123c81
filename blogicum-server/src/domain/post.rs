use super::category::CategorySummary;
use super::location::LocationSummary;
use super::user::AuthorSummary;
use super::validation::{FieldErrors, REQUIRED};
use super::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub const VERBOSE_NAME_PLURAL: &str = "Публикации";

pub const TITLE_MAX_LEN: usize = 256;
pub const IMAGE_UPLOAD_DIR: &str = "post_images/";
pub const IMAGE_MAX_LEN: usize = 100;

/// A row of the `posts` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub author_id: i64,
    pub location_id: Option<i64>,
    pub category_id: Option<i64>,
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// A post joined with its author, location and category, annotated with
/// the number of comments. This is what every listing and detail page shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostView {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub author: AuthorSummary,
    pub location: Option<LocationSummary>,
    pub category: Option<CategorySummary>,
    pub comment_count: i64,
}

impl fmt::Display for PostView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Data submitted by the post create/edit form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    /// Setting a date in the future schedules the publication.
    pub pub_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location_id: Option<i64>,
    #[serde(default)]
    pub category_id: Option<i64>,
    /// Without an image the stored one is kept on edit.
    #[serde(default)]
    pub image: Option<String>,
    /// Removes the stored image on edit.
    #[serde(default)]
    pub clear_image: bool,
    #[serde(default = "super::default_published")]
    pub is_published: bool,
}

impl PostForm {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = FieldErrors::default();
        errors.require("title", &self.title);
        errors.max_chars("title", &self.title, TITLE_MAX_LEN);
        errors.require("text", &self.text);
        if self.pub_date.is_none() {
            errors.add("pub_date", REQUIRED);
        }
        if self.category_id.is_none() {
            errors.add("category_id", REQUIRED);
        }
        if let Some(image) = &self.image {
            if self.clear_image {
                errors.add(
                    "image",
                    "Please either submit a file or check the clear checkbox, not both.",
                );
            } else if image.is_empty() || image.contains(['/', '\\']) || image.contains("..") {
                errors.add("image", "Upload a valid image file name.");
            } else {
                errors.max_chars("image", &self.image_path().unwrap_or_default(), IMAGE_MAX_LEN);
            }
        }
        errors.into_result()
    }

    /// Where the image is stored relative to the media root.
    pub fn image_path(&self) -> Option<String> {
        self.image
            .as_deref()
            .map(|name| format!("{}{}", IMAGE_UPLOAD_DIR, name))
    }

    /// `validate` has already rejected a missing date.
    pub fn pub_date_or_now(&self) -> DateTime<Utc> {
        self.pub_date.unwrap_or_else(Utc::now)
    }
}

impl From<&PostView> for PostForm {
    fn from(post: &PostView) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: Some(post.pub_date),
            location_id: post.location.as_ref().map(|l| l.id),
            category_id: post.category.as_ref().map(|c| c.id),
            image: post
                .image
                .as_deref()
                .map(|path| path.trim_start_matches(IMAGE_UPLOAD_DIR).to_string()),
            clear_image: false,
            is_published: post.is_published,
        }
    }
}

/// Inline edit from the admin post listing. For nullable references
/// `Some(None)` clears the reference and `None` leaves it untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostAdminUpdate {
    pub is_published: Option<bool>,
    pub pub_date: Option<DateTime<Utc>>,
    pub author_id: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub location_id: Option<Option<i64>>,
}

impl PostAdminUpdate {
    pub fn is_empty(&self) -> bool {
        self.is_published.is_none()
            && self.pub_date.is_none()
            && self.author_id.is_none()
            && self.category_id.is_none()
            && self.location_id.is_none()
    }
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
