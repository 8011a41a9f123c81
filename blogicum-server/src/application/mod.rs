pub mod admin_service;
pub mod auth_service;
pub mod blog_service;
pub mod comment_service;
pub mod profile_service;
pub mod redirect;

pub use admin_service::AdminService;
pub use auth_service::AuthService;
pub use blog_service::BlogService;
pub use comment_service::CommentService;
pub use profile_service::ProfileService;
pub use redirect::{Access, Redirect, WriteOutcome};
