pub mod category;
pub mod comment;
pub mod error;
pub mod location;
pub mod pagination;
pub mod post;
pub mod query;
pub mod user;
pub mod validation;
pub mod visibility;

pub use category::Category;
pub use comment::{Comment, CommentView};
pub use error::DomainError;
pub use location::Location;
pub use pagination::{Page, PageRequest};
pub use post::{Post, PostView};
pub use query::{PostOrdering, PostQuery};
pub use user::User;

/// New records are published unless the form says otherwise.
pub(crate) fn default_published() -> bool {
    true
}
