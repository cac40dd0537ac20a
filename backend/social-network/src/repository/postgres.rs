use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::r#trait::{
    CommentRepository, EdgeSet, HealthCheck, PostRepository, ScheduledPostRepository,
    TokenRevocationRepository, UserRepository,
};
use crate::domain::SearchQuery;
use crate::error::{map_unique_violation, Result};
use crate::models::{
    Comment, NewComment, NewPost, NewScheduledPost, NewUser, Post, PostChanges, ScheduledPost,
    ScheduledPostStatus, User, UserChanges, UserFilter, UserProfile,
};

const USER_COLUMNS: &str = r#"
    u.id, u.email, u.username, u.first_name, u.last_name, u.bio, u.picture, u.is_staff,
    u.password_hash, u.last_login, u.last_request, u.created_at
"#;

const USER_RETURNING: &str = r#"
    id, email, username, first_name, last_name, bio, picture, is_staff,
    password_hash, last_login, last_request, created_at
"#;

const PROFILE_COUNTS: &str = r#"
    (SELECT COUNT(*) FROM follows f WHERE f.followee_id = u.id) AS followers_count,
    (SELECT COUNT(*) FROM follows f WHERE f.follower_id = u.id) AS following_count,
    (SELECT COUNT(*) FROM posts p WHERE p.owner_id = u.id) AS posts_count
"#;

const POST_SELECT: &str = r#"
    SELECT p.id, p.owner_id, u.username AS owner_username, p.title, p.text, p.content,
           p.is_updated, p.created_at,
           (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) AS likes_count
    FROM posts p
    JOIN users u ON u.id = p.owner_id
"#;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.post_id, c.user_id, u.username, c.text, c.is_updated, c.created_at
    FROM comments c
    JOIN users u ON u.id = c.user_id
"#;

const SCHEDULED_COLUMNS: &str = r#"
    id, owner_id, title, text, content_path, run_at, status, attempts, last_error,
    post_id, claimed_at, created_at
"#;

fn profile_select() -> String {
    format!("SELECT {USER_COLUMNS}, {PROFILE_COUNTS} FROM users u")
}

/// PostgreSQL-backed storage for users, posts, comments, tokens and jobs
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let query = format!(
            r#"
            INSERT INTO users (id, email, username, first_name, last_name, password_hash, is_staff)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_RETURNING}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(&new_user.email)
            .bind(&new_user.username)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(&new_user.password_hash)
            .bind(new_user.is_staff)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "A user with that email or username already exists."))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users u WHERE LOWER(u.email) = LOWER($1)");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>> {
        let query = format!(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                username = COALESCE($3, username),
                first_name = COALESCE($4, first_name),
                last_name = COALESCE($5, last_name),
                bio = COALESCE($6, bio),
                picture = COALESCE($7, picture),
                password_hash = COALESCE($8, password_hash)
            WHERE id = $1
            RETURNING {USER_RETURNING}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(changes.email)
            .bind(changes.username)
            .bind(changes.first_name)
            .bind(changes.last_name)
            .bind(changes.bio)
            .bind(changes.picture)
            .bind(changes.password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "A user with that email or username already exists."))
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<UserProfile>> {
        let query = format!("{} WHERE u.id = $1", profile_select());
        let profile = sqlx::query_as::<_, UserProfile>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn search_profiles(&self, filter: &UserFilter) -> Result<Vec<UserProfile>> {
        let pattern = SearchQuery::parse(filter.search.as_deref()).map(|q| q.like_pattern());
        let email = SearchQuery::parse(filter.email.as_deref()).map(|q| q.like_pattern());

        let query = format!(
            r#"
            {}
            WHERE ($1::text IS NULL
                   OR u.username ILIKE $1
                   OR u.first_name ILIKE $1
                   OR u.last_name ILIKE $1)
              AND ($2::text IS NULL OR u.email ILIKE $2)
            ORDER BY u.created_at, u.id
            "#,
            profile_select()
        );

        let profiles = sqlx::query_as::<_, UserProfile>(&query)
            .bind(pattern)
            .bind(email)
            .fetch_all(&self.pool)
            .await?;
        Ok(profiles)
    }

    async fn list_followers(&self, user_id: Uuid) -> Result<Vec<UserProfile>> {
        let query = format!(
            r#"
            {}
            JOIN follows edge ON edge.follower_id = u.id
            WHERE edge.followee_id = $1
            ORDER BY edge.created_at DESC
            "#,
            profile_select()
        );
        let profiles = sqlx::query_as::<_, UserProfile>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(profiles)
    }

    async fn list_following(&self, user_id: Uuid) -> Result<Vec<UserProfile>> {
        let query = format!(
            r#"
            {}
            JOIN follows edge ON edge.followee_id = u.id
            WHERE edge.follower_id = $1
            ORDER BY edge.created_at DESC
            "#,
            profile_select()
        );
        let profiles = sqlx::query_as::<_, UserProfile>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(profiles)
    }

    async fn record_request(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<User>> {
        let query =
            format!("UPDATE users SET last_request = $2 WHERE id = $1 RETURNING {USER_RETURNING}");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PostRepository for PostgresRepository {
    async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO posts (id, owner_id, title, text, content)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_post.owner_id)
        .bind(&new_post.title)
        .bind(&new_post.text)
        .bind(&new_post.content)
        .fetch_one(&self.pool)
        .await?;

        let query = format!("{POST_SELECT} WHERE p.id = $1");
        let post = sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(post)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        let query = format!("{POST_SELECT} WHERE p.id = $1");
        let post = sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn list_posts(&self, search: Option<&SearchQuery>) -> Result<Vec<Post>> {
        let query = format!(
            r#"
            {POST_SELECT}
            WHERE ($1::text IS NULL OR p.title ILIKE $1 OR p.text ILIKE $1)
            ORDER BY p.created_at DESC, p.id
            "#
        );
        let posts = sqlx::query_as::<_, Post>(&query)
            .bind(search.map(|q| q.like_pattern()))
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    async fn list_posts_by_owner(&self, owner_id: Uuid) -> Result<Vec<Post>> {
        let query = format!("{POST_SELECT} WHERE p.owner_id = $1 ORDER BY p.created_at DESC, p.id");
        let posts = sqlx::query_as::<_, Post>(&query)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    async fn list_liked_posts(&self, user_id: Uuid) -> Result<Vec<Post>> {
        let query = format!(
            r#"
            {POST_SELECT}
            JOIN post_likes liked ON liked.post_id = p.id
            WHERE liked.user_id = $1
            ORDER BY liked.created_at DESC
            "#
        );
        let posts = sqlx::query_as::<_, Post>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>> {
        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE posts
            SET title = COALESCE($2, title),
                text = COALESCE($3, text),
                content = CASE WHEN $5 THEN $4 ELSE content END,
                is_updated = TRUE
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.text)
        .bind(changes.content.clone().flatten())
        .bind(changes.content.is_some())
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(id) => self.find_post(id).await,
            None => Ok(None),
        }
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        // comments and likes go with the post via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CommentRepository for PostgresRepository {
    async fn create_comment(&self, new_comment: NewComment) -> Result<Comment> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO comments (id, post_id, user_id, text)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_comment.post_id)
        .bind(new_comment.user_id)
        .bind(&new_comment.text)
        .fetch_one(&self.pool)
        .await?;

        let query = format!("{COMMENT_SELECT} WHERE c.id = $1");
        let comment = sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(comment)
    }

    async fn find_comment(&self, post_id: Uuid, id: Uuid) -> Result<Option<Comment>> {
        let query = format!("{COMMENT_SELECT} WHERE c.id = $1 AND c.post_id = $2");
        let comment = sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        let query = format!("{COMMENT_SELECT} WHERE c.post_id = $1 ORDER BY c.created_at, c.id");
        let comments = sqlx::query_as::<_, Comment>(&query)
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(comments)
    }

    async fn update_comment(&self, id: Uuid, text: String) -> Result<Option<Comment>> {
        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE comments
            SET text = $2, is_updated = TRUE
            WHERE id = $1
            RETURNING post_id
            "#,
        )
        .bind(id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(post_id) => self.find_comment(post_id, id).await,
            None => Ok(None),
        }
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TokenRevocationRepository for PostgresRepository {
    async fn revoke(&self, jti: &str, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (jti, user_id, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool> {
        let revoked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE jti = $1)",
        )
        .bind(jti)
        .fetch_one(&self.pool)
        .await?;
        Ok(revoked)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ScheduledPostRepository for PostgresRepository {
    async fn enqueue(&self, job: NewScheduledPost) -> Result<ScheduledPost> {
        let query = format!(
            r#"
            INSERT INTO scheduled_posts (id, owner_id, title, text, content_path, run_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SCHEDULED_COLUMNS}
            "#
        );
        let scheduled = sqlx::query_as::<_, ScheduledPost>(&query)
            .bind(Uuid::new_v4())
            .bind(job.owner_id)
            .bind(&job.title)
            .bind(&job.text)
            .bind(&job.content_path)
            .bind(job.run_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(scheduled)
    }

    async fn find_job(&self, id: Uuid) -> Result<Option<ScheduledPost>> {
        let query = format!("SELECT {SCHEDULED_COLUMNS} FROM scheduled_posts WHERE id = $1");
        let job = sqlx::query_as::<_, ScheduledPost>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease: Duration,
        limit: i64,
    ) -> Result<Vec<ScheduledPost>> {
        // SKIP LOCKED lets several workers poll the same table without
        // claiming the same row twice.
        let query = format!(
            r#"
            UPDATE scheduled_posts
            SET status = 'running', attempts = attempts + 1, claimed_at = $1
            WHERE id IN (
                SELECT id FROM scheduled_posts
                WHERE (status = 'pending' AND run_at <= $1)
                   OR (status = 'running' AND claimed_at < $2)
                ORDER BY run_at
                LIMIT $3
                FOR UPDATE SKIP LOCKED
            )
            RETURNING {SCHEDULED_COLUMNS}
            "#
        );
        let jobs = sqlx::query_as::<_, ScheduledPost>(&query)
            .bind(now)
            .bind(now - lease)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(jobs)
    }

    async fn mark_completed(&self, id: Uuid, post_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE scheduled_posts
            SET status = 'completed', post_id = $2, last_error = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(post_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str, give_up: bool) -> Result<()> {
        let status = if give_up {
            ScheduledPostStatus::Failed
        } else {
            ScheduledPostStatus::Pending
        };
        sqlx::query(
            r#"
            UPDATE scheduled_posts
            SET status = $2, last_error = $3, claimed_at = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for PostgresRepository {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Like edges stored in `post_likes`
#[derive(Clone)]
pub struct PgLikeEdges {
    pool: PgPool,
}

impl PgLikeEdges {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EdgeSet for PgLikeEdges {
    async fn contains(&self, user_id: Uuid, post_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM post_likes WHERE user_id = $1 AND post_id = $2)",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert(&self, user_id: Uuid, post_id: Uuid) -> Result<bool> {
        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO post_likes (user_id, post_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id, post_id) DO NOTHING
            RETURNING user_id
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(inserted.is_some())
    }

    async fn remove(&self, user_id: Uuid, post_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM post_likes WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Follow edges stored in `follows`
#[derive(Clone)]
pub struct PgFollowEdges {
    pool: PgPool,
}

impl PgFollowEdges {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EdgeSet for PgFollowEdges {
    async fn contains(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND followee_id = $2)",
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO follows (follower_id, followee_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (follower_id, followee_id) DO NOTHING
            RETURNING follower_id
            "#,
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(inserted.is_some())
    }

    async fn remove(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
                .bind(follower_id)
                .bind(followee_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
