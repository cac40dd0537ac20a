/// Business logic layer
///
/// Services are cheap to build per request from the shared [`Repositories`].
///
/// [`Repositories`]: crate::repository::Repositories
pub mod auth;
pub mod comments;
pub mod posts;
pub mod users;

pub use auth::{AuthService, Registration};
pub use comments::{CommentBody, CommentService};
pub use posts::{PostCreation, PostDraft, PostEdit, PostService};
pub use users::{ProfileUpdate, UserService};
