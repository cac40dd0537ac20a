mod memory;
mod postgres;
mod r#trait;

use std::sync::Arc;

use sqlx::PgPool;

pub use memory::{MemoryEdges, MemoryRepository};
pub use postgres::{PgFollowEdges, PgLikeEdges, PostgresRepository};
pub use r#trait::{
    CommentRepository, EdgeSet, HealthCheck, PostRepository, ScheduledPostRepository,
    TokenRevocationRepository, UserRepository,
};

/// Handles to every store the service talks to
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub likes: Arc<dyn EdgeSet>,
    pub follows: Arc<dyn EdgeSet>,
    pub revoked_tokens: Arc<dyn TokenRevocationRepository>,
    pub scheduled_posts: Arc<dyn ScheduledPostRepository>,
    pub health: Arc<dyn HealthCheck>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        let repo = Arc::new(PostgresRepository::new(pool.clone()));
        Self {
            users: repo.clone(),
            posts: repo.clone(),
            comments: repo.clone(),
            likes: Arc::new(PgLikeEdges::new(pool.clone())),
            follows: Arc::new(PgFollowEdges::new(pool)),
            revoked_tokens: repo.clone(),
            scheduled_posts: repo.clone(),
            health: repo,
        }
    }

    pub fn in_memory() -> Self {
        let repo = Arc::new(MemoryRepository::new());
        Self {
            users: repo.clone(),
            posts: repo.clone(),
            comments: repo.clone(),
            likes: repo.likes.clone(),
            follows: repo.follows.clone(),
            revoked_tokens: repo.clone(),
            scheduled_posts: repo.clone(),
            health: repo,
        }
    }
}
