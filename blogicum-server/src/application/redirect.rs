//! Where a request sends the client next, and the author-only guard shared by
//! every edit and delete route.

use crate::domain::DomainError;
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    PostDetail(i64),
    Profile(String),
}

impl Redirect {
    pub fn location(&self) -> String {
        match self {
            Self::PostDetail(id) => format!("/api/posts/{}", id),
            Self::Profile(username) => format!("/api/profile/{}", path_segment(username)),
        }
    }
}

/// Percent-encodes one path segment; usernames may hold any letter.
fn path_segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

/// Result of a write: either applied, with the page to go to next, or
/// refused because the requester is not the author.
#[derive(Debug)]
pub enum WriteOutcome<T> {
    Done { value: T, redirect: Redirect },
    Refused(Redirect),
}

impl<T> WriteOutcome<T> {
    pub fn redirect(&self) -> &Redirect {
        match self {
            Self::Done { redirect, .. } | Self::Refused(redirect) => redirect,
        }
    }

    pub fn is_refused(&self) -> bool {
        matches!(self, Self::Refused(_))
    }
}

/// Result of opening an edit form.
#[derive(Debug)]
pub enum Access<T> {
    Granted(T),
    Redirected(Redirect),
}

pub fn ensure_author(author_id: i64, user_id: i64, refused: Redirect) -> Result<(), Redirect> {
    if author_id == user_id {
        Ok(())
    } else {
        Err(refused)
    }
}

/// Runs `apply` only for the author. Anyone else is sent to `refused` and
/// nothing is written.
pub async fn author_only<T, F, Fut>(
    author_id: i64,
    user_id: i64,
    refused: Redirect,
    success: Redirect,
    apply: F,
) -> Result<WriteOutcome<T>, DomainError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, DomainError>>,
{
    if let Err(redirect) = ensure_author(author_id, user_id, refused) {
        tracing::warn!(
            "User {} is not the author ({}); redirecting to {}",
            user_id,
            author_id,
            redirect.location()
        );
        return Ok(WriteOutcome::Refused(redirect));
    }

    let value = apply().await?;
    Ok(WriteOutcome::Done {
        value,
        redirect: success,
    })
}
