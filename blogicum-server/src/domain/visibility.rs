//! Who may see a post.
//!
//! A post is public when it is published, its category exists and is
//! published, and its publication time has come. The author always sees their
//! own posts; everyone else gets "not found" for a hidden post, exactly as if
//! it did not exist.

use super::post::PostView;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

pub fn is_publicly_visible(post: &PostView, now: DateTime<Utc>) -> bool {
    post.is_published
        && post.category.as_ref().is_some_and(|c| c.is_published)
        && post.pub_date <= now
}

pub fn visibility_for(post: &PostView, viewer: Option<i64>, now: DateTime<Utc>) -> Visibility {
    if viewer == Some(post.author.id) || is_publicly_visible(post, now) {
        Visibility::Visible
    } else {
        Visibility::Hidden
    }
}
